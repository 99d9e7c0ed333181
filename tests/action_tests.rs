//! Action lifecycle, composition and export integration tests.

use std::cell::RefCell;
use std::rc::Rc;

use rust_triggers::actions::{
    ActionContext, ActionGraphRecord, ActionState, Behavior, EmitEvent, Sequence, Wait,
};
use rust_triggers::events::{Event, EventId, EventManager};
use rust_triggers::handler::{HandlerConfig, HandlerState};
use rust_triggers::{Result, Runtime, TriggerError};

const LEVER: EventId = EventId::new(7, "LeverPulled");
const BELL: EventId = EventId::new(9, "Bell");

type Journal = Rc<RefCell<Vec<&'static str>>>;

/// Records every hook. Ends after `lifetime` updates, or on interrupt when
/// `yields` is set.
struct Probe {
    journal: Journal,
    lifetime: u32,
    updates: u32,
    yields: bool,
}

impl Probe {
    fn new(journal: &Journal, lifetime: u32, yields: bool) -> Self {
        Self {
            journal: Rc::clone(journal),
            lifetime,
            updates: 0,
            yields,
        }
    }
}

impl Behavior for Probe {
    fn kind(&self) -> &str {
        "Probe"
    }

    fn on_trigger(&mut self, _ctx: &mut ActionContext<'_>) -> Result<()> {
        self.updates = 0;
        self.journal.borrow_mut().push("trigger");
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ActionContext<'_>, _dt: f32) -> Result<()> {
        self.updates += 1;
        self.journal.borrow_mut().push("update");
        if self.updates >= self.lifetime {
            ctx.end();
        }
        Ok(())
    }

    fn on_interrupt(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        self.journal.borrow_mut().push("interrupt");
        if self.yields {
            ctx.end();
        }
        Ok(())
    }

    fn on_terminate(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
        assert_eq!(ctx.state(), ActionState::Terminated);
        self.journal.borrow_mut().push("terminate");
        Ok(())
    }

    fn on_reset(&mut self) {
        self.journal.borrow_mut().push("reset");
    }
}

fn runtime() -> Runtime {
    Runtime::with_events(Rc::new(EventManager::new()))
}

#[test]
fn test_lifecycle_hook_order() {
    let rt = runtime();
    let journal = Journal::default();
    let action = rt.insert_action(Probe::new(&journal, 2, false));

    assert_eq!(rt.action_state(action).unwrap(), ActionState::None);
    rt.trigger_action(action).unwrap();
    rt.update_action(action, 0.1).unwrap();
    rt.update_action(action, 0.1).unwrap();
    // Terminated actions receive no more updates.
    rt.update_action(action, 0.1).unwrap();

    assert_eq!(*journal.borrow(), vec!["trigger", "update", "update", "terminate"]);
    let info = rt.action_info(action).unwrap();
    assert!(info.has_ended());
    assert!(info.has_started());
    assert!(!info.is_running());
}

/// Stopping does not terminate; the behavior decides.
#[test]
fn test_stop_is_not_termination() {
    let rt = runtime();
    let journal = Journal::default();
    let stubborn = rt.insert_action(Probe::new(&journal, 10, false));
    let polite = rt.insert_action(Probe::new(&journal, 10, true));

    // Stopping an idle action does nothing.
    rt.stop_action(stubborn).unwrap();
    assert!(journal.borrow().is_empty());

    rt.trigger_action(stubborn).unwrap();
    rt.stop_action(stubborn).unwrap();
    assert_eq!(rt.action_state(stubborn).unwrap(), ActionState::Running);

    rt.trigger_action(polite).unwrap();
    rt.stop_action(polite).unwrap();
    assert_eq!(rt.action_state(polite).unwrap(), ActionState::Terminated);

    assert_eq!(
        *journal.borrow(),
        vec!["trigger", "interrupt", "trigger", "interrupt", "terminate"]
    );
}

#[test]
fn test_trigger_after_termination_requires_reset() {
    let rt = runtime();
    let journal = Journal::default();
    let action = rt.insert_action(Probe::new(&journal, 1, false));

    rt.trigger_action(action).unwrap();
    rt.update_action(action, 0.1).unwrap();

    let err = rt.trigger_action(action).unwrap_err();
    assert!(matches!(err, TriggerError::InvalidState { .. }));

    rt.reset_action(action).unwrap();
    assert_eq!(rt.action_state(action).unwrap(), ActionState::None);
    rt.trigger_action(action).unwrap();
    assert_eq!(rt.action_state(action).unwrap(), ActionState::Running);
    assert_eq!(journal.borrow().last(), Some(&"trigger"));
}

/// A handler driving a sequence: the handler ticks the root, the root
/// drives its successors.
#[test]
fn test_handler_runs_sequence_graph() {
    let rt = runtime();
    let bells = Rc::new(RefCell::new(0));
    {
        let bells = Rc::clone(&bells);
        rt.events()
            .register(&BELL, move |_| {
                *bells.borrow_mut() += 1;
                Ok(())
            })
            .unwrap();
    }

    let handler = rt.create_handler(HandlerConfig::new(LEVER).fixed_count(1));
    rt.initialize(handler).unwrap();
    let root = rt.insert_action(Sequence::default());
    let wait = rt.insert_action(Wait::new(1.0));
    let ring = rt.insert_action(EmitEvent::new(BELL));
    rt.link(root, wait).unwrap();
    rt.link(root, ring).unwrap();
    rt.attach_action(handler, root).unwrap();

    rt.dispatch(&Event::new(LEVER)).unwrap();
    rt.tick(0.5);
    assert_eq!(*bells.borrow(), 0);

    rt.tick(0.5);
    assert_eq!(*bells.borrow(), 1);
    assert_eq!(rt.action_state(root).unwrap(), ActionState::Terminated);

    rt.tick(0.5);
    assert_eq!(rt.handler_state(handler).unwrap(), HandlerState::Terminated);
}

/// Hooks can read the event that started their handler.
#[test]
fn test_hook_sees_current_event() {
    struct Reader(Rc<RefCell<Option<u32>>>);

    impl Behavior for Reader {
        fn kind(&self) -> &str {
            "Reader"
        }

        fn on_trigger(&mut self, ctx: &mut ActionContext<'_>) -> Result<()> {
            let event = ctx.current_event();
            *self.0.borrow_mut() = event.and_then(|e| e.payload::<u32>().copied());
            ctx.end();
            Ok(())
        }
    }

    let rt = runtime();
    let seen = Rc::new(RefCell::new(None));
    let handler = rt.create_handler(HandlerConfig::new(LEVER));
    rt.initialize(handler).unwrap();
    let action = rt.insert_action(Reader(Rc::clone(&seen)));
    rt.attach_action(handler, action).unwrap();

    rt.dispatch(&Event::new(LEVER).with_payload(42u32)).unwrap();
    assert_eq!(*seen.borrow(), Some(42));
}

fn sample_graph(rt: &Runtime) -> (rust_triggers::ActionId, rust_triggers::ActionId) {
    let root = rt.insert_action(Sequence::default());
    let wait = rt.insert_action(Wait::new(2.5));
    let ring = rt.insert_action(EmitEvent::new(BELL));
    rt.link(root, wait).unwrap();
    rt.link(root, ring).unwrap();
    rt.link(wait, ring).unwrap();
    rt.set_edition_name(wait, Some("Pause".into())).unwrap();
    rt.set_action_enabled(ring, false).unwrap();
    (root, wait)
}

#[test]
fn test_graph_export_import_preserves_structure() {
    let source = runtime();
    let (root, wait) = sample_graph(&source);
    let record = source.export_graph(root).unwrap();
    assert_eq!(record.nodes.len(), 3);

    let bytes = record.to_bytes().unwrap();
    let decoded = ActionGraphRecord::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, record);

    let target = runtime();
    let ids = target.import_graph(&decoded).unwrap();
    assert_eq!(ids.len(), 3);

    for (original, imported) in [root, wait].into_iter().zip(&ids) {
        let before = source.action_info(original).unwrap();
        let after = target.action_info(*imported).unwrap();
        assert_eq!(after.name, before.name);
        assert_eq!(after.kind, before.kind);
        assert_eq!(after.edition_name, before.edition_name);
        assert_eq!(after.successors.len(), before.successors.len());
        assert_eq!(after.state, ActionState::None);
    }
    assert!(!target.action_info(ids[2]).unwrap().enabled);
    assert_eq!(target.action_info(ids[2]).unwrap().predecessors.len(), 2);

    let duration = target.with_behavior(ids[1], |wait: &mut Wait| wait.duration).unwrap();
    assert_eq!(duration, Some(2.5));
}

#[test]
fn test_cyclic_graph_exports_each_action_once() {
    let rt = runtime();
    let a = rt.insert_action(Sequence::default());
    let b = rt.insert_action(Sequence::default());
    rt.link(a, b).unwrap();
    rt.link(b, a).unwrap();

    let record = rt.export_graph(a).unwrap();
    assert_eq!(record.nodes.len(), 2);
    assert_eq!(record.nodes[1].successors.as_slice(), &[0]);
}

/// Re-attaching an imported action restores its back-reference.
#[test]
fn test_reattach_restores_parent() {
    let source = runtime();
    let handler = source.create_handler(HandlerConfig::new(LEVER));
    let action = source.add_action(handler, "Wait").unwrap();
    let record = source.export_action(action).unwrap();
    assert!(!record.enabled);

    let target = runtime();
    let owner = target.create_handler(HandlerConfig::new(LEVER));
    let imported = target.import_action(&record).unwrap();
    assert_eq!(target.action_info(imported).unwrap().parent, None);

    target.attach_action(owner, imported).unwrap();
    assert_eq!(target.action_info(imported).unwrap().parent, Some(owner));
    assert_eq!(target.handler_action(owner).unwrap(), Some(imported));
    assert_eq!(target.find_action(&record.name), Some(imported));
}

#[test]
fn test_import_unknown_kind() {
    let source = runtime();
    struct Custom;
    impl Behavior for Custom {
        fn kind(&self) -> &str {
            "Custom"
        }
    }
    let action = source.insert_action(Custom);
    let record = source.export_action(action).unwrap();

    let target = runtime();
    assert_eq!(
        target.import_action(&record),
        Err(TriggerError::UnknownActionKind("Custom".into()))
    );

    target.register_action_kind("Custom", || Box::new(Custom));
    assert!(target.import_action(&record).is_ok());
    assert!(target.action_kinds().contains(&"Custom".to_owned()));
}
