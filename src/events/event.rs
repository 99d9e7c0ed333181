//! Event values.

use std::any::Any;
use std::rc::Rc;

use super::id::EventId;

/// One occurrence of an event, submitted to [`EventManager::dispatch`].
///
/// The payload is opaque to the runtime. It sits behind an `Rc` so a
/// handler can keep the event as its "current" event without copying the
/// payload.
///
/// [`EventManager::dispatch`]: super::EventManager::dispatch
#[derive(Clone)]
pub struct Event {
    id: EventId,
    payload: Option<Rc<dyn Any>>,
}

impl Event {
    /// Create an event without payload.
    pub fn new(id: EventId) -> Self {
        Self { id, payload: None }
    }

    /// Attach a payload (builder pattern).
    #[must_use]
    pub fn with_payload<T: Any>(mut self, payload: T) -> Self {
        self.payload = Some(Rc::new(payload));
        self
    }

    /// The identifier this event is dispatched under.
    #[must_use]
    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Borrow the payload if it has type `T`.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }

    /// Whether a payload is attached.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("payload", &self.payload.as_ref().map(|_| ".."))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_payload_downcast() {
        let event = Event::new(EventId::new(1, "Hit")).with_payload(EntityId(40));

        assert!(event.has_payload());
        assert_eq!(event.payload::<EntityId>(), Some(&EntityId(40)));
        assert_eq!(event.payload::<u32>(), None);
    }

    #[test]
    fn test_clone_shares_payload() {
        let event = Event::new(EventId::new(1, "Hit")).with_payload(vec![1, 2, 3]);
        let copy = event.clone();
        assert_eq!(copy.payload::<Vec<i32>>(), Some(&vec![1, 2, 3]));
        assert_eq!(copy.id(), event.id());
    }
}
