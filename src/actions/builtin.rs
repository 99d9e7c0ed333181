//! Built-in behaviors.
//!
//! These are ordinary [`Behavior`] implementations; the runtime treats them
//! exactly like game-supplied variants.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::conditions::Predicate;
use crate::core::ActionId;
use crate::error::{Result, TriggerError};
use crate::events::{Event, EventId};

use super::{ActionContext, Behavior};

fn load_params<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T> {
    serde_json::from_value(params).map_err(|err| TriggerError::Serialization(err.to_string()))
}

// =============================================================================
// Sequence
// =============================================================================

/// Runs its successors one after another and ends when the last one ends.
///
/// An ended child is reset before it is started, so the sequence can run
/// any number of times. Stopping the sequence stops the running child and
/// ends the sequence.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    index: usize,
}

impl Sequence {
    pub const KIND: &'static str = "Sequence";

    /// Position of the child currently running.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    fn current(&self, ctx: &ActionContext<'_>) -> Option<ActionId> {
        ctx.successors().get(self.index).copied()
    }

    /// Start children from `self.index` until one keeps running.
    fn advance(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        while let Some(child) = self.current(ctx) {
            if ctx.action_state(child)?.has_ended() {
                ctx.reset(child)?;
            }
            ctx.trigger(child)?;
            if !ctx.action_state(child)?.has_ended() {
                return Ok(());
            }
            self.index += 1;
        }
        trace!(action = %ctx.id(), "sequence complete");
        ctx.end();
        Ok(())
    }
}

impl Behavior for Sequence {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn on_trigger(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        self.index = 0;
        self.advance(ctx)
    }

    fn on_update(&mut self, ctx: &mut ActionContext<'_>, dt: f32) -> Result<()> {
        let Some(child) = self.current(ctx) else {
            ctx.end();
            return Ok(());
        };
        ctx.update(child, dt)?;
        if ctx.action_state(child)?.has_ended() {
            self.index += 1;
            self.advance(ctx)?;
        }
        Ok(())
    }

    fn on_interrupt(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        if let Some(child) = self.current(ctx) {
            ctx.stop(child)?;
        }
        ctx.end();
        Ok(())
    }

    fn on_reset(&mut self) {
        self.index = 0;
    }
}

// =============================================================================
// Wait
// =============================================================================

/// Ends once the accumulated `dt` reaches `duration`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Wait {
    pub duration: f32,
    #[serde(skip)]
    elapsed: f32,
}

impl Wait {
    pub const KIND: &'static str = "Wait";

    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }

    /// Time accumulated since the last trigger.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}

impl Behavior for Wait {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn on_trigger(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        self.elapsed = 0.0;
        if self.duration <= 0.0 {
            ctx.end();
        }
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ActionContext<'_>, dt: f32) -> Result<()> {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            ctx.end();
        }
        Ok(())
    }

    fn on_interrupt(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        ctx.end();
        Ok(())
    }

    fn on_reset(&mut self) {
        self.elapsed = 0.0;
    }

    fn save(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }

    fn load(&mut self, params: serde_json::Value) -> Result<()> {
        *self = load_params(params)?;
        Ok(())
    }
}

// =============================================================================
// EmitEvent
// =============================================================================

/// Dispatches `event` when triggered, then ends.
///
/// Failures of individual subscribers are isolated by the dispatch; only a
/// refused dispatch (invalid identifier) is returned from the hook.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitEvent {
    pub event: EventId,
}

impl EmitEvent {
    pub const KIND: &'static str = "EmitEvent";

    #[must_use]
    pub fn new(event: EventId) -> Self {
        Self { event }
    }
}

impl Behavior for EmitEvent {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn on_trigger(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        let result = ctx.emit(&Event::new(self.event.clone()));
        ctx.end();
        result.map(|_| ())
    }

    fn save(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }

    fn load(&mut self, params: serde_json::Value) -> Result<()> {
        *self = load_params(params)?;
        Ok(())
    }
}

// =============================================================================
// WaitUntil
// =============================================================================

/// Ends on the first update where its predicate holds.
///
/// Predicates hold live providers and cannot be exported; an imported
/// `WaitUntil` must be given one with [`set_predicate`](Self::set_predicate)
/// before it runs.
#[derive(Default)]
pub struct WaitUntil {
    predicate: Option<Box<dyn Predicate>>,
}

impl WaitUntil {
    pub const KIND: &'static str = "WaitUntil";

    pub fn new(predicate: impl Predicate + 'static) -> Self {
        Self {
            predicate: Some(Box::new(predicate)),
        }
    }

    pub fn set_predicate(&mut self, predicate: Box<dyn Predicate>) {
        self.predicate = Some(predicate);
    }

    #[must_use]
    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }
}

impl Behavior for WaitUntil {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn on_update(&mut self, ctx: &mut ActionContext<'_>, _dt: f32) -> Result<()> {
        let predicate = self.predicate.as_ref().ok_or_else(|| TriggerError::InvalidConfiguration {
            reason: format!("{} has no predicate", ctx.id()),
        })?;
        if predicate.evaluate()? {
            ctx.end();
        }
        Ok(())
    }

    fn on_interrupt(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        ctx.end();
        Ok(())
    }
}

impl std::fmt::Debug for WaitUntil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitUntil")
            .field("has_predicate", &self.has_predicate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::actions::ActionState;
    use crate::conditions::{tags, BoolCondition, Constant, Variable};
    use crate::events::EventManager;
    use crate::Runtime;

    fn runtime() -> Runtime {
        Runtime::with_events(Rc::new(EventManager::new()))
    }

    #[test]
    fn test_wait_ends_after_duration() {
        let rt = runtime();
        let wait = rt.insert_action(Wait::new(1.0));

        rt.trigger_action(wait).unwrap();
        rt.update_action(wait, 0.4).unwrap();
        rt.update_action(wait, 0.4).unwrap();
        assert_eq!(rt.action_state(wait).unwrap(), ActionState::Running);

        rt.update_action(wait, 0.4).unwrap();
        assert_eq!(rt.action_state(wait).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_wait_zero_duration_ends_on_trigger() {
        let rt = runtime();
        let wait = rt.insert_action(Wait::new(0.0));
        rt.trigger_action(wait).unwrap();
        assert_eq!(rt.action_state(wait).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_wait_params() {
        let wait = Wait::new(2.5);
        let mut loaded = Wait::default();
        loaded.load(wait.save().unwrap()).unwrap();
        assert_eq!(loaded.duration, 2.5);

        let err = loaded.load(serde_json::json!({"duration": "soon"})).unwrap_err();
        assert!(matches!(err, TriggerError::Serialization(_)));
    }

    #[test]
    fn test_sequence_runs_children_in_order() {
        let rt = runtime();
        let seq = rt.insert_action(Sequence::default());
        let first = rt.insert_action(Wait::new(1.0));
        let second = rt.insert_action(Wait::new(1.0));
        rt.link(seq, first).unwrap();
        rt.link(seq, second).unwrap();

        rt.trigger_action(seq).unwrap();
        assert_eq!(rt.action_state(first).unwrap(), ActionState::Running);
        assert_eq!(rt.action_state(second).unwrap(), ActionState::None);

        rt.update_action(seq, 1.0).unwrap();
        assert_eq!(rt.action_state(first).unwrap(), ActionState::Terminated);
        assert_eq!(rt.action_state(second).unwrap(), ActionState::Running);

        rt.update_action(seq, 1.0).unwrap();
        assert_eq!(rt.action_state(seq).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_sequence_skips_instant_children_and_reruns() {
        let rt = runtime();
        let seq = rt.insert_action(Sequence::default());
        let a = rt.insert_action(Wait::new(0.0));
        let b = rt.insert_action(Wait::new(0.0));
        rt.link(seq, a).unwrap();
        rt.link(seq, b).unwrap();

        rt.trigger_action(seq).unwrap();
        assert_eq!(rt.action_state(seq).unwrap(), ActionState::Terminated);

        rt.reset_action(seq).unwrap();
        rt.trigger_action(seq).unwrap();
        assert_eq!(rt.action_state(seq).unwrap(), ActionState::Terminated);
        assert_eq!(rt.action_state(b).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_sequence_stop_interrupts_child() {
        let rt = runtime();
        let seq = rt.insert_action(Sequence::default());
        let child = rt.insert_action(Wait::new(10.0));
        rt.link(seq, child).unwrap();

        rt.trigger_action(seq).unwrap();
        rt.stop_action(seq).unwrap();
        assert_eq!(rt.action_state(seq).unwrap(), ActionState::Terminated);
        assert_eq!(rt.action_state(child).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_emit_event_dispatches_and_ends() {
        let rt = runtime();
        let bell = EventId::new(3, "Bell");
        let heard = Rc::new(Cell::new(0));
        let counter = Rc::clone(&heard);
        rt.events()
            .register(&bell, move |_| {
                counter.set(counter.get() + 1);
                Ok(())
            })
            .unwrap();

        let emit = rt.insert_action(EmitEvent::new(bell));
        rt.trigger_action(emit).unwrap();
        assert_eq!(heard.get(), 1);
        assert_eq!(rt.action_state(emit).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_emit_invalid_event_still_ends() {
        let rt = runtime();
        let emit = rt.insert_action(EmitEvent::default());
        assert_eq!(rt.trigger_action(emit), Err(TriggerError::InvalidIdentifier));
        assert_eq!(rt.action_state(emit).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_wait_until_predicate() {
        let rt = runtime();
        let open = Variable::new(false);
        let condition = BoolCondition::new(Rc::new(open.clone()), Rc::new(Constant(true)), tags::EQUAL);
        let wait = rt.insert_action(WaitUntil::new(condition));

        rt.trigger_action(wait).unwrap();
        rt.update_action(wait, 0.1).unwrap();
        assert_eq!(rt.action_state(wait).unwrap(), ActionState::Running);

        open.set(true);
        rt.update_action(wait, 0.1).unwrap();
        assert_eq!(rt.action_state(wait).unwrap(), ActionState::Terminated);
    }

    #[test]
    fn test_wait_until_without_predicate() {
        let rt = runtime();
        let wait = rt.insert_action(WaitUntil::default());
        rt.trigger_action(wait).unwrap();
        let err = rt.update_action(wait, 0.1).unwrap_err();
        assert!(matches!(err, TriggerError::InvalidConfiguration { .. }));
    }
}
