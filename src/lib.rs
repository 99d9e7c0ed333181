//! # rust-triggers
//!
//! A reactive behavior-trigger runtime for game objects.
//!
//! Named events are dispatched through an [`EventManager`] to per-object
//! [`EventHandler`]s. Each handler gates its attached action according to a
//! firing policy (trigger budget, lock until completion), and actions may
//! consult [`Condition`]s built from pluggable value providers and
//! comparers.
//!
//! ## Design Principles
//!
//! 1. **Synchronous and single-threaded**: a dispatch returns after every
//!    subscriber has run. There is no queue and no suspension point.
//!
//! 2. **Host-driven**: the host calls [`Runtime::tick`] once per frame; the
//!    runtime never calls into the engine.
//!
//! 3. **Ids, not references**: handlers, actions and action links refer to
//!    each other by id through tables owned by the [`Runtime`].
//!
//! ## Modules
//!
//! - `core`: ids, object table, identity tokens
//! - `events`: event identifiers, values, registry and dispatch
//! - `handler`: firing-policy state machine and its configuration
//! - `actions`: behavior lifecycle, built-in behaviors, export records
//! - `conditions`: providers, comparers and predicates
//! - `runtime`: the owner tying it together

pub mod actions;
pub mod conditions;
pub mod core;
pub mod error;
pub mod events;
pub mod handler;
pub mod runtime;

// Re-export commonly used types
pub use crate::core::{ActionId, EntityId, HandlerId, TokenGenerator, TokenGeneratorState};

pub use crate::error::{ErrorSeverity, Result, TriggerError};

pub use crate::events::{DispatchReport, Event, EventId, EventManager, SubscriptionHandle};

pub use crate::handler::{EventHandler, HandlerConfig, HandlerState};

pub use crate::actions::{
    ActionContext, ActionGraphRecord, ActionInfo, ActionRecord, ActionRegistry, ActionState,
    Behavior, EmitEvent, Sequence, Wait, WaitUntil,
};

pub use crate::conditions::{
    BoolCondition, ComparerRegistry, Condition, Constant, FloatCondition, FnProvider,
    IntCondition, ObjectCondition, ObjectRef, Predicate, TypeSelector, ValueProvider, Variable,
};

pub use crate::runtime::{Runtime, RuntimeConfig, TickReport};
