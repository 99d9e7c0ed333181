//! Runtime configuration loaded from JSON.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriggerError};
use crate::events::EventId;
use crate::handler::HandlerConfig;

/// Startup configuration of a [`Runtime`](super::Runtime).
///
/// ```
/// use rust_triggers::runtime::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{
///     "seed": 42,
///     "events": [{ "id": 7, "name": "LeverPulled" }],
///     "handlers": [
///         { "event": { "id": 7, "name": "LeverPulled" },
///           "uses_fixed_count": true, "max_trigger_count": 2 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(config.seed, 42);
/// assert_eq!(config.handlers[0].max_trigger_count, 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seed for identity tokens.
    pub seed: u64,
    /// Event catalog, in declaration order.
    pub events: Vec<EventId>,
    /// Handlers to create and initialize at startup.
    pub handlers: Vec<HandlerConfig>,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the token seed (builder pattern).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Declare an event (builder pattern).
    #[must_use]
    pub fn with_event(mut self, event: EventId) -> Self {
        self.events.push(event);
        self
    }

    /// Add a handler (builder pattern).
    #[must_use]
    pub fn with_handler(mut self, handler: HandlerConfig) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Check the catalog and every handler configuration.
    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for event in &self.events {
            if !event.is_valid() {
                return Err(TriggerError::InvalidIdentifier);
            }
            if !seen.insert(event.raw()) {
                return Err(TriggerError::Config(format!("event id {} declared twice", event.raw())));
            }
        }
        for handler in &self.handlers {
            handler.validate()?;
        }
        Ok(())
    }
}
