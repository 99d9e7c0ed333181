//! Action storage and the lifecycle transitions the runtime drives.

use std::cell::{Cell, RefCell};

use smallvec::SmallVec;
use tracing::debug;

use crate::core::{ActionId, HandlerId};
use crate::error::{Result, TriggerError};
use crate::runtime::Shared;

use super::context::ActionContext;
use super::{ActionInfo, ActionState, Behavior};

/// Bookkeeping stored next to each behavior.
#[derive(Clone, Debug)]
pub(crate) struct ActionMeta {
    pub(crate) name: String,
    pub(crate) edition_name: Option<String>,
    pub(crate) kind: String,
    pub(crate) enabled: bool,
    pub(crate) parent: Option<HandlerId>,
    pub(crate) successors: SmallVec<[ActionId; 2]>,
    pub(crate) predecessors: SmallVec<[ActionId; 2]>,
}

/// One arena entry.
///
/// The state lives in a `Cell` so it can be read while the behavior is
/// borrowed by a running hook. A failed borrow of `behavior` means the
/// action is already executing further up the call stack.
pub(crate) struct ActionSlot {
    pub(crate) state: Cell<ActionState>,
    pub(crate) meta: RefCell<ActionMeta>,
    pub(crate) behavior: RefCell<Box<dyn Behavior>>,
}

impl ActionSlot {
    pub(crate) fn new(name: String, kind: String, enabled: bool, behavior: Box<dyn Behavior>) -> Self {
        Self {
            state: Cell::new(ActionState::None),
            meta: RefCell::new(ActionMeta {
                name,
                edition_name: None,
                kind,
                enabled,
                parent: None,
                successors: SmallVec::new(),
                predecessors: SmallVec::new(),
            }),
            behavior: RefCell::new(behavior),
        }
    }

    pub(crate) fn info(&self, id: ActionId) -> ActionInfo {
        let meta = self.meta.borrow();
        ActionInfo {
            id,
            name: meta.name.clone(),
            edition_name: meta.edition_name.clone(),
            kind: meta.kind.clone(),
            enabled: meta.enabled,
            state: self.state.get(),
            parent: meta.parent,
            successors: meta.successors.clone(),
            predecessors: meta.predecessors.clone(),
        }
    }
}

fn reentrant(id: ActionId) -> TriggerError {
    TriggerError::Reentrant {
        target: id.to_string(),
    }
}

/// Run `hook`, then `on_terminate` if the hook ended the action.
fn run_hook<F>(shared: &Shared, id: ActionId, slot: &ActionSlot, behavior: &mut dyn Behavior, hook: F) -> Result<()>
where
    F: FnOnce(&mut dyn Behavior, &mut ActionContext<'_>) -> Result<()>,
{
    let mut ctx = ActionContext::new(id, slot, shared);
    let result = hook(&mut *behavior, &mut ctx);

    if ctx.ended() {
        debug!(action = %id, "action terminated");
        let mut ctx = ActionContext::new(id, slot, shared);
        let terminated = behavior.on_terminate(&mut ctx);
        return result.and(terminated);
    }
    result
}

impl Shared {
    pub(crate) fn trigger_action(&self, id: ActionId) -> Result<()> {
        let slot = self.action(id)?;
        let state = slot.state.get();
        if state.has_ended() {
            return Err(TriggerError::invalid_state(id, state, "trigger"));
        }

        let mut behavior = slot.behavior.try_borrow_mut().map_err(|_| reentrant(id))?;
        slot.state.set(ActionState::Running);
        debug!(action = %id, restart = state.is_running(), "action triggered");

        run_hook(self, id, &slot, &mut **behavior, |behavior, ctx| behavior.on_trigger(ctx))
    }

    pub(crate) fn update_action(&self, id: ActionId, dt: f32) -> Result<()> {
        let slot = self.action(id)?;
        if slot.state.get().has_ended() {
            return Ok(());
        }

        let mut behavior = slot.behavior.try_borrow_mut().map_err(|_| reentrant(id))?;
        run_hook(self, id, &slot, &mut **behavior, |behavior, ctx| behavior.on_update(ctx, dt))
    }

    pub(crate) fn stop_action(&self, id: ActionId) -> Result<()> {
        let slot = self.action(id)?;
        if !slot.state.get().is_running() {
            return Ok(());
        }

        let mut behavior = slot.behavior.try_borrow_mut().map_err(|_| reentrant(id))?;
        debug!(action = %id, "action interrupted");
        run_hook(self, id, &slot, &mut **behavior, |behavior, ctx| behavior.on_interrupt(ctx))
    }

    pub(crate) fn reset_action(&self, id: ActionId) -> Result<()> {
        let slot = self.action(id)?;
        let mut behavior = slot.behavior.try_borrow_mut().map_err(|_| reentrant(id))?;
        slot.state.set(ActionState::None);
        behavior.on_reset();
        Ok(())
    }
}
