//! The runtime: owner of handlers and actions.
//!
//! [`Runtime`] holds the handler and action tables and wires handlers to an
//! [`EventManager`]. Everything is single-threaded and synchronous: a
//! dispatch returns after every subscribed handler has applied its policy
//! and every accepted action has run its `on_trigger` hook.
//!
//! ## Driving the runtime
//!
//! The host owns the frame loop and calls [`Runtime::tick`] once per frame.
//! Ticking a handler updates its running action, or, once the action has
//! ended, moves the handler to `Sleeping` (budget left) or `Terminated`.
//!
//! ## Example Usage
//!
//! ```
//! use std::rc::Rc;
//!
//! use rust_triggers::actions::{ActionState, Wait};
//! use rust_triggers::events::{Event, EventId, EventManager};
//! use rust_triggers::handler::{HandlerConfig, HandlerState};
//! use rust_triggers::Runtime;
//!
//! const LEVER: EventId = EventId::new(7, "LeverPulled");
//!
//! let runtime = Runtime::with_events(Rc::new(EventManager::new()));
//! let handler = runtime.create_handler(HandlerConfig::new(LEVER).fixed_count(1));
//! runtime.initialize(handler).unwrap();
//!
//! let action = runtime.insert_action(Wait::new(0.5));
//! runtime.attach_action(handler, action).unwrap();
//!
//! runtime.dispatch(&Event::new(LEVER)).unwrap();
//! assert_eq!(runtime.handler_state(handler).unwrap(), HandlerState::Running);
//!
//! runtime.tick(0.5);
//! assert_eq!(runtime.action_state(action).unwrap(), ActionState::Terminated);
//!
//! runtime.tick(0.5);
//! assert_eq!(runtime.handler_state(handler).unwrap(), HandlerState::Terminated);
//! ```

mod config;
mod shared;

pub use config::RuntimeConfig;

pub(crate) use shared::Shared;

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::actions::{
    ActionFactory, ActionGraphRecord, ActionInfo, ActionRecord, ActionSlot, ActionState, Behavior,
    GraphNode,
};
use crate::core::{ActionId, HandlerId};
use crate::error::{Result, TriggerError};
use crate::events::{DispatchReport, Event, EventManager, SubscriptionHandle};
use crate::handler::{EventHandler, HandlerConfig, HandlerState};

/// Outcome of one [`Runtime::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Number of handlers ticked.
    pub ticked: usize,
    /// Errors raised while ticking, per handler.
    pub failures: Vec<(HandlerId, TriggerError)>,
}

impl TickReport {
    /// True when every handler ticked without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owner of all handlers and actions of one execution context.
///
/// Dropping the runtime unregisters its handlers from the event manager.
pub struct Runtime {
    shared: Rc<Shared>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime on the thread's global event manager.
    #[must_use]
    pub fn new() -> Self {
        Self::with_events(EventManager::global())
    }

    /// Create a runtime on a specific event manager.
    #[must_use]
    pub fn with_events(events: Rc<EventManager>) -> Self {
        Self::seeded(events, 0)
    }

    /// Create a runtime whose identity tokens derive from `seed`.
    #[must_use]
    pub fn seeded(events: Rc<EventManager>, seed: u64) -> Self {
        Self {
            shared: Rc::new(Shared::new(events, seed)),
        }
    }

    /// Create a runtime on the global event manager from a configuration,
    /// declaring its events and initializing its handlers.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let runtime = Self::seeded(EventManager::global(), config.seed);
        runtime.load_config(config)?;
        Ok(runtime)
    }

    /// Declare the configured events and create and initialize the
    /// configured handlers. Returns the new handler ids in order.
    pub fn load_config(&self, config: &RuntimeConfig) -> Result<Vec<HandlerId>> {
        config.validate()?;
        for event in &config.events {
            self.shared.events.declare(event.clone())?;
        }
        config
            .handlers
            .iter()
            .map(|handler| {
                let id = self.create_handler(handler.clone());
                self.initialize(id).map(|()| id)
            })
            .collect()
    }

    /// The event manager this runtime's handlers subscribe to.
    #[must_use]
    pub fn events(&self) -> &Rc<EventManager> {
        &self.shared.events
    }

    /// Dispatch an event through the runtime's event manager.
    pub fn dispatch(&self, event: &Event) -> Result<DispatchReport> {
        self.shared.events.dispatch(event)
    }

    /// Register an action kind for [`add_action`](Self::add_action) and
    /// import.
    pub fn register_action_kind(&self, kind: impl Into<String>, factory: ActionFactory) {
        self.shared.registry.borrow_mut().register(kind, factory);
    }

    /// Registered action kinds, sorted.
    #[must_use]
    pub fn action_kinds(&self) -> Vec<String> {
        self.shared
            .registry
            .borrow()
            .kinds()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    // === Handlers ===

    /// Create a handler. It receives no events until [`initialize`](Self::initialize)d.
    pub fn create_handler(&self, config: HandlerConfig) -> HandlerId {
        let id = HandlerId::new(self.shared.handlers.insert(EventHandler::new(config).into()));
        debug!(handler = %id, "handler created");
        id
    }

    /// Subscribe a handler to its bound event.
    ///
    /// Fails with `InvalidConfiguration` if the handler is not bound to a
    /// valid identifier. Initializing twice is a no-op.
    pub fn initialize(&self, id: HandlerId) -> Result<()> {
        let handler = self.shared.handler(id)?;
        let mut h = handler.try_borrow_mut().map_err(|_| reentrant(id))?;
        if h.subscription().is_some() {
            return Ok(());
        }
        h.config().validate()?;

        let handle = self.subscribe(id, h.config())?;
        h.set_subscription(Some(handle));
        Ok(())
    }

    fn subscribe(&self, id: HandlerId, config: &HandlerConfig) -> Result<SubscriptionHandle> {
        let weak = Rc::downgrade(&self.shared);
        self.shared.events.register(&config.event, move |event| match weak.upgrade() {
            Some(shared) => shared.handle_event(id, event),
            None => Ok(()),
        })
    }

    /// Whether the handler is subscribed to its event.
    pub fn is_initialized(&self, id: HandlerId) -> Result<bool> {
        self.borrow_handler(id, |h| h.subscription().is_some())
    }

    /// Unsubscribe and remove a handler. Its action is detached, not
    /// destroyed.
    pub fn destroy_handler(&self, id: HandlerId) -> Result<()> {
        let handler = self.shared.handler(id)?;
        let (subscription, action) = {
            let mut h = handler.try_borrow_mut().map_err(|_| reentrant(id))?;
            (h.set_subscription(None), h.set_action(None))
        };
        if let Some(handle) = subscription {
            self.shared.events.unregister(handle);
        }
        if let Some(action) = action {
            if let Ok(slot) = self.shared.action(action) {
                slot.meta.borrow_mut().parent = None;
            }
        }
        self.shared.handlers.remove(id.raw());
        debug!(handler = %id, "handler destroyed");
        Ok(())
    }

    /// Replace a handler's policy. A subscribed handler bound to a new
    /// event is moved to that event's subscriber list.
    pub fn configure_handler(&self, id: HandlerId, config: HandlerConfig) -> Result<()> {
        let handler = self.shared.handler(id)?;
        let mut h = handler.try_borrow_mut().map_err(|_| reentrant(id))?;
        let rebind = h.subscription().is_some() && *h.event() != config.event;
        if rebind {
            config.validate()?;
            let handle = self.subscribe(id, &config)?;
            if let Some(old) = h.set_subscription(Some(handle)) {
                self.shared.events.unregister(old);
            }
        }
        h.set_config(config);
        Ok(())
    }

    /// Snapshot of a handler.
    pub fn handler(&self, id: HandlerId) -> Result<EventHandler> {
        self.borrow_handler(id, EventHandler::clone)
    }

    pub fn handler_state(&self, id: HandlerId) -> Result<HandlerState> {
        self.shared.handler_state(id)
    }

    pub fn trigger_count(&self, id: HandlerId) -> Result<u32> {
        self.borrow_handler(id, EventHandler::trigger_count)
    }

    /// Action attached to a handler.
    pub fn handler_action(&self, id: HandlerId) -> Result<Option<ActionId>> {
        self.borrow_handler(id, EventHandler::action)
    }

    /// Event held by a handler while its action runs.
    pub fn current_event(&self, id: HandlerId) -> Result<Option<Event>> {
        self.borrow_handler(id, |h| h.current_event().cloned())
    }

    /// Ids of live handlers, in creation order.
    #[must_use]
    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.shared.handlers.indices().into_iter().map(HandlerId::new).collect()
    }

    /// Deliver an event straight to one handler, bypassing the event
    /// manager. Events for other identifiers are ignored.
    pub fn on_event(&self, id: HandlerId, event: &Event) -> Result<()> {
        self.shared.handle_event(id, event)
    }

    /// Deliver a synthetic event carrying the handler's bound identifier.
    pub fn debug_trigger(&self, id: HandlerId) -> Result<()> {
        let event = self.borrow_handler(id, |h| h.event().clone())?;
        if !event.is_valid() {
            return Err(TriggerError::InvalidIdentifier);
        }
        debug!(handler = %id, event = %event, "debug trigger");
        self.shared.handle_event(id, &Event::new(event))
    }

    /// Tick every handler once. Failures are logged and collected; one
    /// failing handler does not prevent the others from ticking.
    pub fn tick(&self, dt: f32) -> TickReport {
        let mut report = TickReport::default();
        for id in self.handler_ids() {
            report.ticked += 1;
            if let Err(err) = self.shared.tick_handler(id, dt) {
                warn!(handler = %id, error = %err, "tick failed");
                report.failures.push((id, err));
            }
        }
        report
    }

    /// Tick a single handler.
    pub fn tick_handler(&self, id: HandlerId, dt: f32) -> Result<()> {
        self.shared.tick_handler(id, dt)
    }

    fn borrow_handler<R>(&self, id: HandlerId, f: impl FnOnce(&EventHandler) -> R) -> Result<R> {
        let handler = self.shared.handler(id)?;
        let h = handler.try_borrow().map_err(|_| reentrant(id))?;
        Ok(f(&h))
    }

    // === Actions ===

    /// Create an action of a registered kind and attach it to `handler`.
    ///
    /// The action gets a fresh identity token and starts disabled; the
    /// handler ignores events until it is enabled with
    /// [`set_action_enabled`](Self::set_action_enabled).
    pub fn add_action(&self, handler: HandlerId, kind: &str) -> Result<ActionId> {
        self.shared.handler(handler)?;
        let behavior = self
            .shared
            .registry
            .borrow()
            .create(kind)
            .ok_or_else(|| TriggerError::UnknownActionKind(kind.to_owned()))?;

        let slot = ActionSlot::new(self.shared.next_token(), kind.to_owned(), false, behavior);
        let id = ActionId::new(self.shared.actions.insert(slot));
        debug!(action = %id, kind, "action created");
        self.attach_action(handler, id)?;
        Ok(id)
    }

    /// Store a behavior as a new, enabled, unattached action.
    pub fn insert_action<B: Behavior>(&self, behavior: B) -> ActionId {
        self.insert_boxed(Box::new(behavior))
    }

    /// Store a boxed behavior as a new, enabled, unattached action.
    pub fn insert_boxed(&self, behavior: Box<dyn Behavior>) -> ActionId {
        let kind = behavior.kind().to_owned();
        let slot = ActionSlot::new(self.shared.next_token(), kind, true, behavior);
        ActionId::new(self.shared.actions.insert(slot))
    }

    /// Remove an action: detach it from its handler and drop its links.
    pub fn remove_action(&self, id: ActionId) -> Result<()> {
        let slot = self.shared.action(id)?;
        let (parent, successors, predecessors) = {
            let meta = slot.meta.borrow();
            (meta.parent, meta.successors.clone(), meta.predecessors.clone())
        };
        if let Some(parent) = parent {
            self.detach_action(parent)?;
        }
        for next in successors {
            self.unlink(id, next)?;
        }
        for prev in predecessors {
            self.unlink(prev, id)?;
        }
        self.shared.actions.remove(id.raw());
        debug!(action = %id, "action removed");
        Ok(())
    }

    /// Attach `action` to `handler`, returning the previously attached one.
    ///
    /// Ownership is exclusive: the action is first detached from any other
    /// handler. The previous action keeps running if it was; stop it first
    /// if that is not wanted.
    pub fn attach_action(&self, handler: HandlerId, action: ActionId) -> Result<Option<ActionId>> {
        let target = self.shared.handler(handler)?;
        let slot = self.shared.action(action)?;

        let owner = slot.meta.borrow().parent;
        if let Some(owner) = owner.filter(|&owner| owner != handler) {
            self.detach_action(owner)?;
        }

        let previous = target
            .try_borrow_mut()
            .map_err(|_| reentrant(handler))?
            .set_action(Some(action));
        if let Some(previous) = previous.filter(|&previous| previous != action) {
            if let Ok(prev) = self.shared.action(previous) {
                prev.meta.borrow_mut().parent = None;
            }
        }
        slot.meta.borrow_mut().parent = Some(handler);

        debug!(handler = %handler, action = %action, "action attached");
        Ok(previous.filter(|&previous| previous != action))
    }

    /// Clear a handler's action reference. The action is neither stopped
    /// nor destroyed.
    pub fn detach_action(&self, handler: HandlerId) -> Result<Option<ActionId>> {
        let target = self.shared.handler(handler)?;
        let previous = target
            .try_borrow_mut()
            .map_err(|_| reentrant(handler))?
            .set_action(None);
        if let Some(previous) = previous {
            if let Ok(slot) = self.shared.action(previous) {
                slot.meta.borrow_mut().parent = None;
            }
            debug!(handler = %handler, action = %previous, "action detached");
        }
        Ok(previous)
    }

    pub fn set_action_enabled(&self, id: ActionId, enabled: bool) -> Result<()> {
        self.shared.action(id)?.meta.borrow_mut().enabled = enabled;
        Ok(())
    }

    /// Set the display label tooling shows for an action.
    pub fn set_edition_name(&self, id: ActionId, name: Option<String>) -> Result<()> {
        self.shared.action(id)?.meta.borrow_mut().edition_name = name;
        Ok(())
    }

    pub fn action_state(&self, id: ActionId) -> Result<ActionState> {
        Ok(self.shared.action(id)?.state.get())
    }

    /// Snapshot of an action's metadata and state.
    pub fn action_info(&self, id: ActionId) -> Result<ActionInfo> {
        Ok(self.shared.action(id)?.info(id))
    }

    /// Ids of live actions, in creation order.
    #[must_use]
    pub fn action_ids(&self) -> Vec<ActionId> {
        self.shared.actions.indices().into_iter().map(ActionId::new).collect()
    }

    /// Look up an action by identity token.
    #[must_use]
    pub fn find_action(&self, name: &str) -> Option<ActionId> {
        self.action_ids().into_iter().find(|&id| {
            self.shared.action(id).is_ok_and(|slot| {
                let meta = slot.meta.borrow();
                meta.name == name
            })
        })
    }

    /// Start (or restart) an action. Fails with `InvalidState` if it has
    /// terminated and was not reset.
    pub fn trigger_action(&self, id: ActionId) -> Result<()> {
        self.shared.trigger_action(id)
    }

    /// Run one update of an action. No-op once terminated.
    pub fn update_action(&self, id: ActionId, dt: f32) -> Result<()> {
        self.shared.update_action(id, dt)
    }

    /// Interrupt a running action. No-op unless running.
    pub fn stop_action(&self, id: ActionId) -> Result<()> {
        self.shared.stop_action(id)
    }

    /// Return an action to `None` so it can run again.
    pub fn reset_action(&self, id: ActionId) -> Result<()> {
        self.shared.reset_action(id)
    }

    /// Add `to` as a successor of `from`. Linking twice is a no-op.
    pub fn link(&self, from: ActionId, to: ActionId) -> Result<()> {
        let source = self.shared.action(from)?;
        let target = self.shared.action(to)?;
        {
            let mut meta = source.meta.borrow_mut();
            if meta.successors.contains(&to) {
                return Ok(());
            }
            meta.successors.push(to);
        }
        target.meta.borrow_mut().predecessors.push(from);
        Ok(())
    }

    /// Remove the link from `from` to `to`. Returns `false` if absent.
    pub fn unlink(&self, from: ActionId, to: ActionId) -> Result<bool> {
        let source = self.shared.action(from)?;
        let removed = {
            let mut meta = source.meta.borrow_mut();
            let before = meta.successors.len();
            meta.successors.retain(|next| *next != to);
            meta.successors.len() != before
        };
        if let Ok(target) = self.shared.action(to) {
            target.meta.borrow_mut().predecessors.retain(|prev| *prev != from);
        }
        Ok(removed)
    }

    /// Run `f` on an action's behavior if it is a `B`.
    ///
    /// Returns `Ok(None)` when the behavior is of another type.
    pub fn with_behavior<B: Behavior, R>(&self, id: ActionId, f: impl FnOnce(&mut B) -> R) -> Result<Option<R>> {
        let slot = self.shared.action(id)?;
        let mut guard = slot.behavior.try_borrow_mut().map_err(|_| TriggerError::Reentrant {
            target: id.to_string(),
        })?;
        let behavior: &mut dyn Behavior = &mut **guard;
        Ok(behavior.as_any_mut().downcast_mut::<B>().map(f))
    }

    // === Export / import ===

    /// Export one action.
    pub fn export_action(&self, id: ActionId) -> Result<ActionRecord> {
        let slot = self.shared.action(id)?;
        let params = {
            let behavior = slot.behavior.try_borrow().map_err(|_| TriggerError::Reentrant {
                target: id.to_string(),
            })?;
            behavior
                .save()
                .map(|value| serde_json::to_string(&value))
                .transpose()
                .map_err(|err| TriggerError::Serialization(err.to_string()))?
        };
        let meta = slot.meta.borrow();
        Ok(ActionRecord {
            name: meta.name.clone(),
            kind: meta.kind.clone(),
            edition_name: meta.edition_name.clone(),
            enabled: meta.enabled,
            params,
        })
    }

    /// Export the graph reachable from `root` through successor links.
    /// Node 0 is `root`; cycles are exported once per action.
    pub fn export_graph(&self, root: ActionId) -> Result<ActionGraphRecord> {
        let mut order = Vec::new();
        let mut index: FxHashMap<ActionId, u32> = FxHashMap::default();
        let mut queue = VecDeque::from([root]);
        index.insert(root, 0);

        while let Some(id) = queue.pop_front() {
            let successors = self.shared.action(id)?.meta.borrow().successors.clone();
            for next in &successors {
                if !index.contains_key(next) {
                    index.insert(*next, index.len() as u32);
                    queue.push_back(*next);
                }
            }
            order.push((id, successors));
        }

        let nodes = order
            .into_iter()
            .map(|(id, successors)| -> Result<GraphNode> {
                Ok(GraphNode {
                    action: self.export_action(id)?,
                    successors: successors.iter().map(|next| index[next]).collect::<SmallVec<_>>(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ActionGraphRecord { nodes })
    }

    /// Rebuild an action from a record. The action is unattached and in
    /// state `None`; its identity token is the exported one.
    pub fn import_action(&self, record: &ActionRecord) -> Result<ActionId> {
        let mut behavior = self
            .shared
            .registry
            .borrow()
            .create(&record.kind)
            .ok_or_else(|| TriggerError::UnknownActionKind(record.kind.clone()))?;
        if let Some(params) = record.params_value()? {
            behavior.load(params)?;
        }

        let slot = ActionSlot::new(record.name.clone(), record.kind.clone(), record.enabled, behavior);
        slot.meta.borrow_mut().edition_name = record.edition_name.clone();
        let id = ActionId::new(self.shared.actions.insert(slot));
        debug!(action = %id, kind = %record.kind, "action imported");
        Ok(id)
    }

    /// Rebuild a graph. Returns the new ids in node order; the first is
    /// the root.
    pub fn import_graph(&self, record: &ActionGraphRecord) -> Result<Vec<ActionId>> {
        record.validate()?;
        let ids = record
            .nodes
            .iter()
            .map(|node| self.import_action(&node.action))
            .collect::<Result<Vec<_>>>()?;
        for (node, &from) in record.nodes.iter().zip(&ids) {
            for &to in &node.successors {
                self.link(from, ids[to as usize])?;
            }
        }
        Ok(ids)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("handlers", &self.shared.handlers.len())
            .field("actions", &self.shared.actions.len())
            .field("events", &self.shared.events)
            .finish()
    }
}

fn reentrant(id: HandlerId) -> TriggerError {
    TriggerError::Reentrant {
        target: id.to_string(),
    }
}
