//! Stable integer handles for runtime objects.
//!
//! Handlers and actions reference each other (an action's parent handler,
//! a handler's attached action, successor links between actions) only
//! through these handles. The [`Runtime`](crate::Runtime) owns the objects
//! in arenas; a handle never keeps its target alive.

use serde::{Deserialize, Serialize};

/// Handle to an [`EventHandler`](crate::handler::EventHandler) owned by a runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub u32);

impl HandlerId {
    /// Create a new handler ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler({})", self.0)
    }
}

/// Handle to an action owned by a runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl ActionId {
    /// Create a new action ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action({})", self.0)
    }
}

/// Identifier of a game object living outside the runtime.
///
/// The runtime never interprets these; they are compared by
/// object-reference conditions and carried in event payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(HandlerId::new(4).to_string(), "Handler(4)");
        assert_eq!(ActionId::new(9).to_string(), "Action(9)");
        assert_eq!(EntityId(2).to_string(), "Entity(2)");
        assert_eq!(ActionId::new(9).raw(), 9);
    }
}
