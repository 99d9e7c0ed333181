//! Handler firing-policy configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriggerError};
use crate::events::EventId;

/// What a handler listens to and how often it may fire.
///
/// ```
/// use rust_triggers::events::EventId;
/// use rust_triggers::handler::HandlerConfig;
///
/// let config = HandlerConfig::new(EventId::new(7, "LeverPulled"))
///     .fixed_count(2)
///     .lock_until_completion();
///
/// assert!(config.uses_fixed_count);
/// assert_eq!(config.max_trigger_count, 2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Event the handler is bound to.
    pub event: EventId,

    /// Limit the handler to `max_trigger_count` accepted triggers.
    #[serde(default)]
    pub uses_fixed_count: bool,

    /// Budget of accepted triggers. Only read when `uses_fixed_count`.
    #[serde(default)]
    pub max_trigger_count: u32,

    /// Ignore events while the attached action is running.
    #[serde(default)]
    pub uses_lock_until_completion: bool,
}

impl HandlerConfig {
    /// Unlimited, unlocked policy bound to `event`.
    pub fn new(event: EventId) -> Self {
        Self {
            event,
            ..Self::default()
        }
    }

    /// Limit the number of accepted triggers (builder pattern).
    #[must_use]
    pub fn fixed_count(mut self, max_trigger_count: u32) -> Self {
        self.uses_fixed_count = true;
        self.max_trigger_count = max_trigger_count;
        self
    }

    /// Reject triggers while the action runs (builder pattern).
    #[must_use]
    pub fn lock_until_completion(mut self) -> Self {
        self.uses_lock_until_completion = true;
        self
    }

    /// Check that the handler can be initialized with this configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.event.is_valid() {
            return Err(TriggerError::InvalidConfiguration {
                reason: "handler is not bound to a valid event".to_owned(),
            });
        }
        Ok(())
    }
}
