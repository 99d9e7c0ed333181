//! Actions: behavior state machines started by handlers.
//!
//! An action is a [`Behavior`] (the concrete variant, supplied by the game)
//! wrapped in a lifecycle the runtime enforces:
//!
//! ```text
//! None ──trigger──▶ Running ──end()──▶ Terminated
//!   ▲                                      │
//!   └────────────────reset─────────────────┘
//! ```
//!
//! - `trigger` starts the behavior (`on_trigger`). Triggering a running
//!   action restarts it; triggering a terminated one is refused until it
//!   is reset.
//! - `update` runs `on_update` every tick until the action terminates.
//! - `stop` asks a running behavior to stop (`on_interrupt`). It does not
//!   terminate the action; the behavior decides whether to call
//!   [`ActionContext::end`].
//! - [`ActionContext::end`] is the only way out of `Running`; it runs
//!   `on_terminate` once the current hook returns.
//!
//! Actions can be linked into a successor graph. The runtime only stores
//! the links; composite behaviors such as [`Sequence`] decide what a link
//! means.

mod builtin;
mod context;
mod record;
mod registry;
mod slot;

pub use builtin::{EmitEvent, Sequence, Wait, WaitUntil};
pub use context::ActionContext;
pub use record::{ActionGraphRecord, ActionRecord, GraphNode};
pub use registry::{ActionFactory, ActionRegistry};

pub(crate) use slot::ActionSlot;

use std::any::Any;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{ActionId, HandlerId};
use crate::error::Result;

/// Lifecycle state of an action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionState {
    /// Created or reset, not started.
    #[default]
    None,
    /// Started and receiving updates.
    Running,
    /// Ended; receives no more updates until reset.
    Terminated,
}

impl ActionState {
    /// True while running.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// True once terminated.
    #[must_use]
    pub const fn has_ended(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// True when running or terminated.
    #[must_use]
    pub const fn has_started(self) -> bool {
        matches!(self, Self::Running | Self::Terminated)
    }
}

/// Downcasting support for behaviors.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A concrete action variant.
///
/// All hooks default to doing nothing. A behavior that never calls
/// [`ActionContext::end`] runs until it is stopped and chooses to end.
pub trait Behavior: AsAny {
    /// Type descriptor, matching the kind it is registered under.
    fn kind(&self) -> &str;

    /// Called when the action is triggered.
    fn on_trigger(&mut self, _ctx: &mut ActionContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called every tick while the action has not terminated.
    fn on_update(&mut self, _ctx: &mut ActionContext<'_>, _dt: f32) -> Result<()> {
        Ok(())
    }

    /// Called when the action is stopped while running.
    fn on_interrupt(&mut self, _ctx: &mut ActionContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called after the action has terminated.
    fn on_terminate(&mut self, _ctx: &mut ActionContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called when the action is reset to `None`.
    fn on_reset(&mut self) {}

    /// Serialize behavior parameters for export.
    fn save(&self) -> Option<serde_json::Value> {
        None
    }

    /// Restore behavior parameters written by [`save`](Self::save).
    fn load(&mut self, _params: serde_json::Value) -> Result<()> {
        Ok(())
    }
}

/// Read-only snapshot of an action, for diagnostics and tooling.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionInfo {
    pub id: ActionId,
    /// Unique identity token.
    pub name: String,
    /// Optional display label.
    pub edition_name: Option<String>,
    /// Type descriptor the behavior was created from.
    pub kind: String,
    pub enabled: bool,
    pub state: ActionState,
    /// Owning handler (back-reference).
    pub parent: Option<HandlerId>,
    pub successors: SmallVec<[ActionId; 2]>,
    pub predecessors: SmallVec<[ActionId; 2]>,
}

impl ActionInfo {
    /// See [`ActionState::is_running`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// See [`ActionState::has_ended`].
    #[must_use]
    pub fn has_ended(&self) -> bool {
        self.state.has_ended()
    }

    /// See [`ActionState::has_started`].
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.state.has_started()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(!ActionState::None.has_started());
        assert!(ActionState::Running.is_running());
        assert!(ActionState::Running.has_started());
        assert!(ActionState::Terminated.has_ended());
        assert!(ActionState::Terminated.has_started());
        assert!(!ActionState::Terminated.is_running());
    }
}
