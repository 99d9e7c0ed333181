//! State shared between the runtime handle and the event callbacks it
//! registers.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::actions::{ActionRegistry, ActionSlot};
use crate::core::{ActionId, Arena, HandlerId, TokenGenerator};
use crate::error::{Result, TriggerError};
use crate::events::{Event, EventManager};
use crate::handler::{EventHandler, HandlerState};

/// Handler and action tables.
///
/// Handlers and actions refer to each other by id only; the tables are the
/// single owners. Subscriber callbacks hold a `Weak<Shared>`, so dropping
/// the runtime releases everything even while subscriptions are still
/// registered with a shared [`EventManager`].
pub(crate) struct Shared {
    pub(crate) events: Rc<EventManager>,
    pub(crate) handlers: Arena<RefCell<EventHandler>>,
    pub(crate) actions: Arena<ActionSlot>,
    pub(crate) registry: RefCell<ActionRegistry>,
    pub(crate) tokens: RefCell<TokenGenerator>,
}

fn reentrant(id: HandlerId) -> TriggerError {
    TriggerError::Reentrant {
        target: id.to_string(),
    }
}

impl Shared {
    pub(crate) fn new(events: Rc<EventManager>, seed: u64) -> Self {
        Self {
            events,
            handlers: Arena::default(),
            actions: Arena::default(),
            registry: RefCell::new(ActionRegistry::with_builtins()),
            tokens: RefCell::new(TokenGenerator::new(seed)),
        }
    }

    pub(crate) fn handler(&self, id: HandlerId) -> Result<Rc<RefCell<EventHandler>>> {
        self.handlers.get(id.raw()).ok_or(TriggerError::UnknownHandler(id))
    }

    pub(crate) fn action(&self, id: ActionId) -> Result<Rc<ActionSlot>> {
        self.actions.get(id.raw()).ok_or(TriggerError::UnknownAction(id))
    }

    pub(crate) fn next_token(&self) -> String {
        self.tokens.borrow_mut().next_token()
    }

    /// Route an event to one handler and apply its firing policy.
    ///
    /// The handler borrow is released before the action runs, so the
    /// action may dispatch further events that reach this handler again.
    pub(crate) fn handle_event(&self, id: HandlerId, event: &Event) -> Result<()> {
        let handler = self.handler(id)?;
        let (action, slot) = {
            let mut h = handler.try_borrow_mut().map_err(|_| reentrant(id))?;
            if !h.matches(event) {
                return Ok(());
            }
            let Some(action) = h.action() else {
                trace!(handler = %id, "no action attached");
                return Ok(());
            };
            let slot = self.action(action)?;
            if !slot.meta.borrow().enabled {
                trace!(handler = %id, action = %action, "action disabled");
                return Ok(());
            }

            // A busy action is executing further up the call stack and
            // cannot start again; the budget is left untouched.
            if slot.behavior.try_borrow_mut().is_err() {
                trace!(handler = %id, action = %action, "action busy");
                return Err(TriggerError::Reentrant {
                    target: action.to_string(),
                });
            }

            h.set_current_event(event.clone());
            if !h.can_trigger(slot.state.get().is_running()) {
                trace!(
                    handler = %id,
                    count = h.trigger_count(),
                    state = ?h.state(),
                    "trigger rejected"
                );
                return Ok(());
            }

            h.accept();
            debug!(handler = %id, action = %action, count = h.trigger_count(), "trigger accepted");
            (action, slot)
        };

        if slot.state.get().has_ended() {
            self.reset_action(action)?;
        }
        match self.trigger_action(action) {
            Err(err @ TriggerError::InvalidState { .. }) => {
                warn!(handler = %id, error = %err, "trigger ignored");
                Ok(())
            }
            result => result,
        }
    }

    /// Advance one handler by a frame.
    pub(crate) fn tick_handler(&self, id: HandlerId, dt: f32) -> Result<()> {
        let handler = self.handler(id)?;
        let action = handler.try_borrow().map_err(|_| reentrant(id))?.action();
        let Some(action) = action else {
            return Ok(());
        };

        let state = self.action(action)?.state.get();
        if state.has_ended() {
            let mut h = handler.try_borrow_mut().map_err(|_| reentrant(id))?;
            let before = h.state();
            h.on_action_ended();
            if h.state() != before {
                debug!(handler = %id, from = ?before, to = ?h.state(), "handler transition");
            }
            Ok(())
        } else if state.is_running() {
            self.update_action(action, dt)
        } else {
            Ok(())
        }
    }

    /// Current state of a handler, for diagnostics.
    pub(crate) fn handler_state(&self, id: HandlerId) -> Result<HandlerState> {
        Ok(self.handler(id)?.try_borrow().map_err(|_| reentrant(id))?.state())
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        for index in self.handlers.indices() {
            let Some(handler) = self.handlers.get(index) else {
                continue;
            };
            let Ok(mut handler) = handler.try_borrow_mut() else {
                continue;
            };
            if let Some(handle) = handler.set_subscription(None) {
                self.events.unregister(handle);
            }
        }
    }
}
