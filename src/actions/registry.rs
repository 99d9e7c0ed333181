//! Registry of action kinds.
//!
//! Tooling creates actions by kind name ("Wait", "Sequence", ...). The
//! registry maps each kind to a factory producing a default-configured
//! behavior; callers then adjust parameters through
//! [`Runtime::with_behavior`](crate::Runtime::with_behavior).

use rustc_hash::FxHashMap;

use super::builtin::{EmitEvent, Sequence, Wait, WaitUntil};
use super::Behavior;

/// Builds a fresh behavior.
pub type ActionFactory = fn() -> Box<dyn Behavior>;

/// Maps action kind names to factories.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    factories: FxHashMap<String, ActionFactory>,
}

impl ActionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in behaviors.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_default::<Sequence>(Sequence::KIND);
        registry.register_default::<Wait>(Wait::KIND);
        registry.register_default::<EmitEvent>(EmitEvent::KIND);
        registry.register_default::<WaitUntil>(WaitUntil::KIND);
        registry
    }

    /// Register a factory under `kind`, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, factory: ActionFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// Register `B::default()` under `kind`.
    pub fn register_default<B: Behavior + Default>(&mut self, kind: impl Into<String>) {
        self.register(kind, || Box::new(B::default()));
    }

    /// Build a behavior of the given kind.
    #[must_use]
    pub fn create(&self, kind: &str) -> Option<Box<dyn Behavior>> {
        self.factories.get(kind).map(|factory| factory())
    }

    /// Whether `kind` is registered.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<_> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry").field("kinds", &self.kinds()).finish()
    }
}
