//! Event registry and synchronous dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{Result, TriggerError};

use super::event::Event;
use super::id::EventId;

/// A subscriber callback.
///
/// Callbacks may register, unregister and dispatch re-entrantly. An error
/// returned by one callback is reported and does not stop delivery to the
/// others.
pub type Callback = Rc<dyn Fn(&Event) -> Result<()>>;

/// Handle returned by [`EventManager::register`], used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    event: u32,
    serial: u64,
}

impl SubscriptionHandle {
    /// Raw id of the event this subscription listens to.
    #[must_use]
    pub const fn event(self) -> u32 {
        self.event
    }
}

#[derive(Clone)]
struct Subscription {
    serial: u64,
    active: Rc<Cell<bool>>,
    callback: Callback,
}

/// Outcome of one [`EventManager::dispatch`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    /// Number of callbacks invoked.
    pub delivered: usize,
    /// Errors returned by callbacks, in delivery order.
    pub failures: Vec<TriggerError>,
}

impl DispatchReport {
    /// True when every invoked callback succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry of event subscribers.
///
/// Subscribers are kept per raw event id in registration order. Each
/// registration is a distinct subscription: registering the same callback
/// twice delivers twice. Dispatch iterates an O(1) snapshot of the
/// subscriber list, so callbacks may mutate the registry while it runs:
///
/// - a subscription removed during dispatch is not invoked afterwards,
///   including by the dispatch in progress;
/// - a subscription added during dispatch first receives the next event.
///
/// The manager also keeps the catalog of declared event identifiers that
/// tooling offers when binding a handler.
#[derive(Default)]
pub struct EventManager {
    subscribers: RefCell<FxHashMap<u32, im::Vector<Subscription>>>,
    catalog: RefCell<Vec<EventId>>,
    next_serial: Cell<u64>,
}

thread_local! {
    static GLOBAL: Rc<EventManager> = Rc::new(EventManager::new());
}

impl EventManager {
    /// Create an empty, standalone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared manager of the current execution context.
    ///
    /// The runtime is single-threaded, so "process-wide" means one
    /// instance per thread.
    #[must_use]
    pub fn global() -> Rc<EventManager> {
        GLOBAL.with(Rc::clone)
    }

    /// Subscribe `callback` to events with the identifier `id`.
    pub fn register<F>(&self, id: &EventId, callback: F) -> Result<SubscriptionHandle>
    where
        F: Fn(&Event) -> Result<()> + 'static,
    {
        self.register_rc(id, Rc::new(callback))
    }

    /// Subscribe an already shared callback.
    pub fn register_rc(&self, id: &EventId, callback: Callback) -> Result<SubscriptionHandle> {
        if !id.is_valid() {
            return Err(TriggerError::InvalidIdentifier);
        }

        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);

        self.subscribers
            .borrow_mut()
            .entry(id.raw())
            .or_default()
            .push_back(Subscription {
                serial,
                active: Rc::new(Cell::new(true)),
                callback,
            });

        debug!(event = %id, serial, "registered subscriber");
        Ok(SubscriptionHandle {
            event: id.raw(),
            serial,
        })
    }

    /// Remove a subscription. Returns `false` if it was already removed.
    pub fn unregister(&self, handle: SubscriptionHandle) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let Some(list) = subscribers.get_mut(&handle.event) else {
            return false;
        };
        let Some(index) = list.iter().position(|s| s.serial == handle.serial) else {
            return false;
        };

        let removed = list.remove(index);
        removed.active.set(false);
        if list.is_empty() {
            subscribers.remove(&handle.event);
        }

        debug!(event = handle.event, serial = handle.serial, "unregistered subscriber");
        true
    }

    /// Deliver `event` to every subscriber of its identifier, in
    /// registration order, before returning.
    pub fn dispatch(&self, event: &Event) -> Result<DispatchReport> {
        if !event.id().is_valid() {
            return Err(TriggerError::InvalidIdentifier);
        }

        // Snapshot, then release the borrow so callbacks can mutate the registry.
        let snapshot = self
            .subscribers
            .borrow()
            .get(&event.id().raw())
            .cloned()
            .unwrap_or_default();

        let mut report = DispatchReport::default();
        for subscription in &snapshot {
            if !subscription.active.get() {
                continue;
            }
            report.delivered += 1;
            if let Err(err) = (subscription.callback)(event) {
                warn!(event = %event.id(), serial = subscription.serial, error = %err, "subscriber failed");
                report.failures.push(err);
            }
        }

        debug!(event = %event.id(), delivered = report.delivered, failed = report.failures.len(), "dispatched");
        Ok(report)
    }

    /// Number of live subscriptions for `id`.
    #[must_use]
    pub fn subscriber_count(&self, id: &EventId) -> usize {
        self.subscribers
            .borrow()
            .get(&id.raw())
            .map_or(0, im::Vector::len)
    }

    /// Whether `handle` is still registered.
    #[must_use]
    pub fn is_registered(&self, handle: SubscriptionHandle) -> bool {
        self.subscribers
            .borrow()
            .get(&handle.event)
            .is_some_and(|list| list.iter().any(|s| s.serial == handle.serial))
    }

    // === Catalog ===

    /// Declare a known event identifier. Re-declaring an id updates its name.
    pub fn declare(&self, id: EventId) -> Result<()> {
        if !id.is_valid() {
            return Err(TriggerError::InvalidIdentifier);
        }
        let mut catalog = self.catalog.borrow_mut();
        let existing = catalog.iter().position(|known| *known == id);
        match existing {
            Some(index) => catalog[index] = id,
            None => catalog.push(id),
        }
        Ok(())
    }

    /// Declared identifiers, in declaration order.
    #[must_use]
    pub fn event_ids(&self) -> Vec<EventId> {
        self.catalog.borrow().clone()
    }

    /// Display names of the declared identifiers, in declaration order.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.catalog
            .borrow()
            .iter()
            .map(|id| id.name().to_owned())
            .collect()
    }

    /// Position of a raw id in the catalog.
    #[must_use]
    pub fn index_of(&self, raw: u32) -> Option<usize> {
        self.catalog.borrow().iter().position(|id| id.raw() == raw)
    }

    /// Look up a declared identifier by raw id.
    #[must_use]
    pub fn lookup(&self, raw: u32) -> Option<EventId> {
        self.catalog.borrow().iter().find(|id| id.raw() == raw).cloned()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.borrow();
        f.debug_struct("EventManager")
            .field("events", &subscribers.len())
            .field(
                "subscriptions",
                &subscribers.values().map(im::Vector::len).sum::<usize>(),
            )
            .field("catalog", &self.catalog.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: EventId = EventId::new(1, "Ping");
    const PONG: EventId = EventId::new(2, "Pong");

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = Rc::clone(&log);
            move |tag: &'static str| -> Callback {
                let log = Rc::clone(&log);
                Rc::new(move |_: &Event| {
                    log.borrow_mut().push(tag);
                    Ok::<(), TriggerError>(())
                })
            }
        };
        (log, make)
    }

    #[test]
    fn test_register_invalid_identifier() {
        let manager = EventManager::new();
        let result = manager.register(&EventId::INVALID, |_| Ok(()));
        assert_eq!(result.unwrap_err(), TriggerError::InvalidIdentifier);
    }

    #[test]
    fn test_dispatch_invalid_identifier() {
        let manager = EventManager::new();
        let result = manager.dispatch(&Event::new(EventId::INVALID));
        assert_eq!(result.unwrap_err(), TriggerError::InvalidIdentifier);
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let manager = EventManager::new();
        let (log, make) = recorder();

        manager.register_rc(&PING, make("a")).unwrap();
        manager.register_rc(&PING, make("b")).unwrap();
        manager.register_rc(&PONG, make("x")).unwrap();
        manager.register_rc(&PING, make("c")).unwrap();

        let report = manager.dispatch(&Event::new(PING)).unwrap();
        assert_eq!(report.delivered, 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_registration_is_cumulative() {
        let manager = EventManager::new();
        let (log, make) = recorder();
        let callback = make("dup");

        let h1 = manager.register_rc(&PING, Rc::clone(&callback)).unwrap();
        let h2 = manager.register_rc(&PING, callback).unwrap();
        assert_ne!(h1, h2);

        manager.dispatch(&Event::new(PING)).unwrap();
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let manager = EventManager::new();
        let handle = manager.register(&PING, |_| Ok(())).unwrap();

        assert!(manager.is_registered(handle));
        assert!(manager.unregister(handle));
        assert!(!manager.unregister(handle));
        assert_eq!(manager.subscriber_count(&PING), 0);

        let report = manager.dispatch(&Event::new(PING)).unwrap();
        assert_eq!(report.delivered, 0);
    }

    #[test]
    fn test_failure_isolated() {
        let manager = EventManager::new();
        let (log, make) = recorder();

        manager.register_rc(&PING, make("before")).unwrap();
        manager
            .register(&PING, |_| Err(TriggerError::InvalidIdentifier))
            .unwrap();
        manager.register_rc(&PING, make("after")).unwrap();

        let report = manager.dispatch(&Event::new(PING)).unwrap();
        assert_eq!(report.delivered, 3);
        assert_eq!(report.failures, vec![TriggerError::InvalidIdentifier]);
        assert!(!report.is_clean());
        assert_eq!(*log.borrow(), vec!["before", "after"]);
    }

    #[test]
    fn test_catalog() {
        let manager = EventManager::new();
        manager.declare(EventId::new(5, "Opened")).unwrap();
        manager.declare(EventId::new(9, "Closed")).unwrap();
        manager.declare(EventId::named(5, "DoorOpened")).unwrap();

        assert_eq!(manager.event_names(), vec!["DoorOpened", "Closed"]);
        assert_eq!(manager.index_of(9), Some(1));
        assert_eq!(manager.index_of(3), None);
        assert_eq!(manager.lookup(5).unwrap().name(), "DoorOpened");
        assert_eq!(
            manager.declare(EventId::INVALID),
            Err(TriggerError::InvalidIdentifier)
        );
    }

    #[test]
    fn test_global_is_shared_per_thread() {
        let a = EventManager::global();
        let b = EventManager::global();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
