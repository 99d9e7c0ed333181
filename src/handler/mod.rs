//! Event handlers: the firing-policy layer between events and actions.
//!
//! A handler is bound to one [`EventId`](crate::events::EventId) and owns at
//! most one action. When a matching event arrives it decides, from its
//! policy flags, whether the action may start:
//!
//! - **Fixed count**: at most `max_trigger_count` accepted triggers, ever.
//! - **Lock until completion**: events arriving while the action runs are
//!   ignored.
//!
//! ## States
//!
//! ```text
//! None ──accept──▶ Running ──action ended──▶ Sleeping ──accept──▶ Running
//!                     │
//!                     └──action ended, budget spent──▶ Terminated
//! ```
//!
//! This module holds the policy state machine. Event routing and ticking,
//! which need the action table, live on [`Runtime`](crate::Runtime).

mod config;

pub use config::HandlerConfig;

use serde::{Deserialize, Serialize};

use crate::core::ActionId;
use crate::events::{Event, EventId, SubscriptionHandle};

/// Lifecycle state of a handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerState {
    /// Never triggered.
    #[default]
    None,
    /// The attached action is executing.
    Running,
    /// The action has ended and the handler can fire again.
    Sleeping,
    /// The trigger budget is spent; the handler is permanently inert.
    Terminated,
}

/// Per-object trigger policy and its state.
#[derive(Clone, Debug)]
pub struct EventHandler {
    config: HandlerConfig,
    action: Option<ActionId>,
    trigger_count: u32,
    state: HandlerState,
    current_event: Option<Event>,
    subscription: Option<SubscriptionHandle>,
}

impl EventHandler {
    /// Create an uninitialized handler.
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            config,
            action: None,
            trigger_count: 0,
            state: HandlerState::None,
            current_event: None,
            subscription: None,
        }
    }

    /// Policy configuration.
    #[must_use]
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Bound event identifier.
    #[must_use]
    pub fn event(&self) -> &EventId {
        &self.config.event
    }

    /// Attached action, if any.
    #[must_use]
    pub fn action(&self) -> Option<ActionId> {
        self.action
    }

    /// Number of accepted triggers so far.
    #[must_use]
    pub fn trigger_count(&self) -> u32 {
        self.trigger_count
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// Event that started (or last tried to start) the running action.
    #[must_use]
    pub fn current_event(&self) -> Option<&Event> {
        self.current_event.as_ref()
    }

    /// Subscription held while initialized.
    #[must_use]
    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.subscription
    }

    /// Whether `event` is addressed to this handler.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        *event.id() == self.config.event
    }

    /// Whether the fixed-count budget is spent.
    #[must_use]
    pub fn has_reached_max_trigger_count(&self) -> bool {
        self.config.uses_fixed_count && self.trigger_count >= self.config.max_trigger_count
    }

    /// Evaluate the firing policy for a matching event.
    #[must_use]
    pub fn can_trigger(&self, action_running: bool) -> bool {
        if self.has_reached_max_trigger_count() {
            return false;
        }
        !(self.config.uses_lock_until_completion && action_running)
    }

    /// Record an accepted trigger.
    pub(crate) fn accept(&mut self) {
        self.trigger_count += 1;
        self.state = HandlerState::Running;
    }

    /// Observe that the attached action has ended.
    pub(crate) fn on_action_ended(&mut self) {
        self.current_event = None;
        self.state = if self.has_reached_max_trigger_count() {
            HandlerState::Terminated
        } else {
            HandlerState::Sleeping
        };
    }

    pub(crate) fn set_current_event(&mut self, event: Event) {
        self.current_event = Some(event);
    }

    pub(crate) fn set_action(&mut self, action: Option<ActionId>) -> Option<ActionId> {
        std::mem::replace(&mut self.action, action)
    }

    pub(crate) fn set_subscription(&mut self, subscription: Option<SubscriptionHandle>) -> Option<SubscriptionHandle> {
        std::mem::replace(&mut self.subscription, subscription)
    }

    pub(crate) fn set_config(&mut self, config: HandlerConfig) {
        self.config = config;
    }
}
