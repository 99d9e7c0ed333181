//! Conditions: two providers and a comparer folded into a predicate.

use std::cell::OnceCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriggerError};

use super::comparer::{ComparableValue, Comparer, ComparerRegistry};
use super::provider::{SharedProvider, ValueProvider};

/// A boolean predicate that actions can consult.
pub trait Predicate {
    /// Evaluate the predicate against the current provider values.
    fn evaluate(&self) -> Result<bool>;
}

/// Serializable reference to one strategy of a registry, by tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSelector(Option<String>);

impl TypeSelector {
    /// Select the strategy registered under `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Some(tag.into()))
    }

    /// A selector that names nothing yet.
    #[must_use]
    pub const fn unset() -> Self {
        Self(None)
    }

    /// The selected tag.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Whether a tag is selected.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl From<&str> for TypeSelector {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Compares the values of two providers with a strategy chosen by tag.
///
/// The comparer is resolved on the first [`evaluate`](Predicate::evaluate)
/// and cached for the life of the condition. An unset or unknown selector
/// is reported then, not at construction, so a condition can be built
/// before tooling has finished configuring it.
///
/// ```
/// use std::rc::Rc;
///
/// use rust_triggers::conditions::{Constant, FloatCondition, Predicate};
///
/// let mut condition = FloatCondition::new(
///     Rc::new(Constant(3.0f32)),
///     Rc::new(Constant(5.0f32)),
///     "less-than",
/// );
/// assert!(condition.evaluate().unwrap());
///
/// condition.set_selector("greater-than");
/// assert!(!condition.evaluate().unwrap());
/// ```
pub struct Condition<T: ComparableValue> {
    selector: TypeSelector,
    provider_a: SharedProvider<T>,
    provider_b: SharedProvider<T>,
    registry: Option<Rc<ComparerRegistry<T>>>,
    comparer: OnceCell<Box<dyn Comparer<T>>>,
}

/// Condition over boolean flags.
pub type BoolCondition = Condition<bool>;
/// Condition over floating point values.
pub type FloatCondition = Condition<f32>;
/// Condition over integers.
pub type IntCondition = Condition<i64>;
/// Condition over object references.
pub type ObjectCondition = Condition<super::comparer::ObjectRef>;

impl<T: ComparableValue> Condition<T> {
    /// Create a condition comparing `provider_a` against `provider_b`.
    pub fn new(
        provider_a: SharedProvider<T>,
        provider_b: SharedProvider<T>,
        selector: impl Into<TypeSelector>,
    ) -> Self {
        Self {
            selector: selector.into(),
            provider_a,
            provider_b,
            registry: None,
            comparer: OnceCell::new(),
        }
    }

    /// Resolve strategies from `registry` instead of the family defaults.
    #[must_use]
    pub fn with_registry(mut self, registry: Rc<ComparerRegistry<T>>) -> Self {
        self.registry = Some(registry);
        self.comparer = OnceCell::new();
        self
    }

    /// Tooling alias of this condition family, e.g. `Compare/Float`.
    #[must_use]
    pub fn alias() -> String {
        format!("Compare/{}", T::FAMILY)
    }

    /// The current selector.
    #[must_use]
    pub fn selector(&self) -> &TypeSelector {
        &self.selector
    }

    /// Select another strategy. The cached comparer is dropped.
    pub fn set_selector(&mut self, selector: impl Into<TypeSelector>) {
        self.selector = selector.into();
        self.comparer.take();
    }

    /// Whether the comparer has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.comparer.get().is_some()
    }

    fn resolve(&self) -> Result<Box<dyn Comparer<T>>> {
        let invalid = || TriggerError::InvalidComparerType {
            selector: self.selector.tag().map(str::to_owned),
        };
        let tag = self.selector.tag().ok_or_else(invalid)?;

        let comparer = match &self.registry {
            Some(registry) => registry.create(tag),
            None => T::comparers().create(tag),
        };
        comparer.ok_or_else(invalid)
    }
}

impl<T: ComparableValue> Predicate for Condition<T> {
    fn evaluate(&self) -> Result<bool> {
        let comparer = match self.comparer.get() {
            Some(comparer) => comparer,
            None => {
                let resolved = self.resolve()?;
                self.comparer.get_or_init(|| resolved)
            }
        };
        Ok(comparer.compare(&self.provider_a.value(), &self.provider_b.value()))
    }
}

impl<T: ComparableValue> std::fmt::Debug for Condition<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("family", &T::FAMILY)
            .field("selector", &self.selector)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// True when every inner predicate is true. Stops at the first false.
pub struct AllOf(pub Vec<Box<dyn Predicate>>);

/// True when any inner predicate is true. Stops at the first true.
pub struct AnyOf(pub Vec<Box<dyn Predicate>>);

/// Negates the inner predicate.
pub struct Not(pub Box<dyn Predicate>);

impl Predicate for AllOf {
    fn evaluate(&self) -> Result<bool> {
        for predicate in &self.0 {
            if !predicate.evaluate()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Predicate for AnyOf {
    fn evaluate(&self) -> Result<bool> {
        for predicate in &self.0 {
            if predicate.evaluate()? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Predicate for Not {
    fn evaluate(&self) -> Result<bool> {
        self.0.evaluate().map(|value| !value)
    }
}
