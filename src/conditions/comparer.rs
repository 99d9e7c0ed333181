//! Comparison strategies and the per-type registries they are selected from.
//!
//! Each value family (`bool`, `f32`, `i64`, [`ObjectRef`]) declares the set
//! of strategies that make sense for it through [`ComparableValue`]. A
//! condition names its strategy by tag and the registry builds it; the
//! condition never names a concrete strategy type.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::EntityId;

/// A pure two-argument boolean strategy over `T`.
pub trait Comparer<T> {
    /// Compare `a` against `b`.
    fn compare(&self, a: &T, b: &T) -> bool;
}

/// `a == b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Equal;

/// `a != b`
#[derive(Clone, Copy, Debug, Default)]
pub struct NotEqual;

/// `a > b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Greater;

/// `a < b`
#[derive(Clone, Copy, Debug, Default)]
pub struct Less;

/// `a >= b`
#[derive(Clone, Copy, Debug, Default)]
pub struct GreaterOrEqual;

/// `a <= b`
#[derive(Clone, Copy, Debug, Default)]
pub struct LessOrEqual;

impl<T: PartialEq> Comparer<T> for Equal {
    fn compare(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

impl<T: PartialEq> Comparer<T> for NotEqual {
    fn compare(&self, a: &T, b: &T) -> bool {
        a != b
    }
}

impl<T: PartialOrd> Comparer<T> for Greater {
    fn compare(&self, a: &T, b: &T) -> bool {
        a > b
    }
}

impl<T: PartialOrd> Comparer<T> for Less {
    fn compare(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

impl<T: PartialOrd> Comparer<T> for GreaterOrEqual {
    fn compare(&self, a: &T, b: &T) -> bool {
        a >= b
    }
}

impl<T: PartialOrd> Comparer<T> for LessOrEqual {
    fn compare(&self, a: &T, b: &T) -> bool {
        a <= b
    }
}

/// Builds a fresh comparer instance.
pub type ComparerFactory<T> = fn() -> Box<dyn Comparer<T>>;

/// Registry of comparer strategies for one value type, keyed by tag.
pub struct ComparerRegistry<T> {
    factories: FxHashMap<String, ComparerFactory<T>>,
}

impl<T> Default for ComparerRegistry<T> {
    fn default() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }
}

impl<T> ComparerRegistry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategy (builder pattern).
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>, factory: ComparerFactory<T>) -> Self {
        self.register(tag, factory);
        self
    }

    /// Add or replace a strategy.
    pub fn register(&mut self, tag: impl Into<String>, factory: ComparerFactory<T>) {
        self.factories.insert(tag.into(), factory);
    }

    /// Instantiate the strategy registered under `tag`.
    #[must_use]
    pub fn create(&self, tag: &str) -> Option<Box<dyn Comparer<T>>> {
        self.factories.get(tag).map(|factory| factory())
    }

    /// Whether `tag` names a registered strategy.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<_> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl<T> std::fmt::Debug for ComparerRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparerRegistry").field("tags", &self.tags()).finish()
    }
}

/// Standard strategy tags.
pub mod tags {
    pub const EQUAL: &str = "equal";
    pub const NOT_EQUAL: &str = "not-equal";
    pub const GREATER: &str = "greater-than";
    pub const LESS: &str = "less-than";
    pub const GREATER_OR_EQUAL: &str = "greater-or-equal";
    pub const LESS_OR_EQUAL: &str = "less-or-equal";
}

fn equality<T: PartialEq + 'static>() -> ComparerRegistry<T> {
    ComparerRegistry::new()
        .with(tags::EQUAL, || Box::new(Equal))
        .with(tags::NOT_EQUAL, || Box::new(NotEqual))
}

fn ordering<T: PartialOrd + 'static>() -> ComparerRegistry<T> {
    equality()
        .with(tags::GREATER, || Box::new(Greater))
        .with(tags::LESS, || Box::new(Less))
        .with(tags::GREATER_OR_EQUAL, || Box::new(GreaterOrEqual))
        .with(tags::LESS_OR_EQUAL, || Box::new(LessOrEqual))
}

/// A value type with its own family of comparers.
pub trait ComparableValue: Sized + 'static {
    /// Family name, used in condition aliases such as `Compare/Float`.
    const FAMILY: &'static str;

    /// The default strategies for this family.
    fn comparers() -> ComparerRegistry<Self>;
}

impl ComparableValue for bool {
    const FAMILY: &'static str = "Bool";

    fn comparers() -> ComparerRegistry<Self> {
        equality()
    }
}

impl ComparableValue for f32 {
    const FAMILY: &'static str = "Float";

    fn comparers() -> ComparerRegistry<Self> {
        ordering()
    }
}

impl ComparableValue for i64 {
    const FAMILY: &'static str = "Int";

    fn comparers() -> ComparerRegistry<Self> {
        ordering()
    }
}

/// A possibly-empty reference to a game object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef(pub Option<EntityId>);

impl ObjectRef {
    /// The empty reference.
    pub const NONE: ObjectRef = ObjectRef(None);

    /// Reference to `entity`.
    #[must_use]
    pub const fn to(entity: EntityId) -> Self {
        Self(Some(entity))
    }

    /// Whether the reference points at an object.
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0.is_some()
    }
}

impl ComparableValue for ObjectRef {
    const FAMILY: &'static str = "Object";

    fn comparers() -> ComparerRegistry<Self> {
        equality()
    }
}
