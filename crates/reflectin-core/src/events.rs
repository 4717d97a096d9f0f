use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reminder::TimerHandle;

/// Every reminder state change produces an Event.
/// Hosts read them to render reminders and to log the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReminderEvent {
    /// A new timer is running for `handle`.
    ReminderArmed {
        handle: TimerHandle,
        delay_secs: u64,
        at: DateTime<Utc>,
    },
    /// The live timer was cancelled before it elapsed.
    ReminderDisarmed {
        handle: TimerHandle,
        at: DateTime<Utc>,
    },
    /// The timer elapsed undisturbed and the reminder was dispatched.
    ReminderFired {
        handle: TimerHandle,
        title: String,
        body: String,
        at: DateTime<Utc>,
    },
    /// An elapsed signal arrived for a handle that is no longer live.
    StaleFireDiscarded {
        handle: TimerHandle,
        at: DateTime<Utc>,
    },
    /// Exchange completed while reminders are disabled; nothing armed.
    ReminderSuppressed {
        at: DateTime<Utc>,
    },
    SessionEnded {
        at: DateTime<Utc>,
    },
}

impl ReminderEvent {
    /// Body text of a fired reminder, if this is one.
    pub fn fired_body(&self) -> Option<&str> {
        match self {
            ReminderEvent::ReminderFired { body, .. } => Some(body),
            _ => None,
        }
    }
}
