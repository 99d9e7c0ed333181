//! The view of the runtime a behavior gets inside its hooks.

use smallvec::SmallVec;

use crate::core::{ActionId, HandlerId};
use crate::error::Result;
use crate::events::{DispatchReport, Event};
use crate::runtime::Shared;

use super::slot::ActionSlot;
use super::ActionState;

/// Passed to every [`Behavior`](super::Behavior) hook.
///
/// Through the context a behavior can end itself, inspect its links, raise
/// further events and drive other actions. Everything it does happens
/// synchronously, before the hook returns.
pub struct ActionContext<'a> {
    id: ActionId,
    slot: &'a ActionSlot,
    shared: &'a Shared,
    ended: bool,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(id: ActionId, slot: &'a ActionSlot, shared: &'a Shared) -> Self {
        Self {
            id,
            slot,
            shared,
            ended: false,
        }
    }

    pub(crate) fn ended(&self) -> bool {
        self.ended
    }

    /// This action's id.
    #[must_use]
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// This action's state.
    #[must_use]
    pub fn state(&self) -> ActionState {
        self.slot.state.get()
    }

    /// Terminate this action.
    ///
    /// The state changes immediately; `on_terminate` runs after the current
    /// hook returns. Has no effect unless the action is running.
    pub fn end(&mut self) {
        if self.slot.state.get().is_running() {
            self.slot.state.set(ActionState::Terminated);
            self.ended = true;
        }
    }

    /// Owning handler.
    #[must_use]
    pub fn parent(&self) -> Option<HandlerId> {
        self.slot.meta.borrow().parent
    }

    /// Unique identity token.
    #[must_use]
    pub fn name(&self) -> String {
        self.slot.meta.borrow().name.clone()
    }

    /// Linked successors, in link order.
    #[must_use]
    pub fn successors(&self) -> SmallVec<[ActionId; 2]> {
        self.slot.meta.borrow().successors.clone()
    }

    /// Actions linking to this one.
    #[must_use]
    pub fn predecessors(&self) -> SmallVec<[ActionId; 2]> {
        self.slot.meta.borrow().predecessors.clone()
    }

    /// The event held by the owning handler, if any.
    #[must_use]
    pub fn current_event(&self) -> Option<Event> {
        let parent = self.parent()?;
        let handler = self.shared.handler(parent).ok()?;
        let handler = handler.try_borrow().ok()?;
        handler.current_event().cloned()
    }

    /// Dispatch an event through the runtime's event manager.
    pub fn emit(&self, event: &Event) -> Result<DispatchReport> {
        self.shared.events.dispatch(event)
    }

    /// State of another action.
    pub fn action_state(&self, other: ActionId) -> Result<ActionState> {
        Ok(self.shared.action(other)?.state.get())
    }

    /// Trigger another action.
    pub fn trigger(&self, other: ActionId) -> Result<()> {
        self.shared.trigger_action(other)
    }

    /// Update another action.
    pub fn update(&self, other: ActionId, dt: f32) -> Result<()> {
        self.shared.update_action(other, dt)
    }

    /// Stop another action.
    pub fn stop(&self, other: ActionId) -> Result<()> {
        self.shared.stop_action(other)
    }

    /// Reset another action to `None`.
    pub fn reset(&self, other: ActionId) -> Result<()> {
        self.shared.reset_action(other)
    }
}

impl std::fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("ended", &self.ended)
            .finish()
    }
}
