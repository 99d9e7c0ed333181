//! Event identifiers, event values and the subscriber registry.
//!
//! ## Key Components
//!
//! - [`EventId`]: numeric identifier plus a display name for tooling
//! - [`Event`]: one occurrence, carrying an identifier and an opaque payload
//! - [`EventManager`]: maps identifiers to subscriber callbacks and
//!   delivers events synchronously
//!
//! ## Example Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use rust_triggers::events::{Event, EventId, EventManager};
//!
//! const ALARM: EventId = EventId::new(3, "Alarm");
//!
//! let manager = EventManager::new();
//! let seen = Rc::new(Cell::new(0));
//!
//! let counter = Rc::clone(&seen);
//! let handle = manager
//!     .register(&ALARM, move |_| {
//!         counter.set(counter.get() + 1);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! manager.dispatch(&Event::new(ALARM)).unwrap();
//! manager.unregister(handle);
//! manager.dispatch(&Event::new(ALARM)).unwrap();
//!
//! assert_eq!(seen.get(), 1);
//! ```

mod event;
mod id;
mod manager;

pub use event::Event;
pub use id::EventId;
pub use manager::{Callback, DispatchReport, EventManager, SubscriptionHandle};
