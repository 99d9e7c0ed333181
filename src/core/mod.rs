//! Core types: ids, the object table and identity tokens.
//!
//! Handlers and actions refer to each other through the ids defined here,
//! never through direct references. The tables that own them live in the
//! [`Runtime`](crate::Runtime).

pub(crate) mod arena;
pub mod ids;
pub mod token;

pub(crate) use arena::Arena;
pub use ids::{ActionId, EntityId, HandlerId};
pub use token::{TokenGenerator, TokenGeneratorState};
