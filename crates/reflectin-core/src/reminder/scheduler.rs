//! Inactivity reminder state machine.
//!
//! The scheduler owns the single reminder timer slot of one chat session.
//! It does not sleep or spawn anything itself: the caller arms a platform
//! timer for the returned handle and reports back with
//! [`InactivityScheduler::on_timer_elapsed`] when it wakes.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Armed -> Fired -> Idle
//!           |
//!           +-> Idle (user activity)
//! ```
//!
//! `Fired` only lasts while the reminder is handed to the gateway. The
//! delivered notification stays pending until the next activity or
//! exchange cancels it.
//!
//! Every arm issues a fresh [`TimerHandle`]. Cancelling invalidates it, so a
//! wake-up that loses the race against a cancel is recognised as stale and
//! dropped instead of reaching the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::events::ReminderEvent;
use crate::gateway::{NotificationGateway, NotificationId};
use crate::storage::ReminderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderState {
    Idle,
    Armed,
    /// Reminder being dispatched to the gateway.
    Fired,
}

/// Generation-tagged identity of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn generation(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// The live reminder timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderTimer {
    pub handle: TimerHandle,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ReminderTimer {
    /// Wall-clock time the reminder is due; `None` if it overflows the calendar.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        let duration = chrono::Duration::from_std(self.duration).ok()?;
        self.started_at.checked_add_signed(duration)
    }
}

/// Text shown when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderContent {
    pub title: String,
    pub body: String,
}

impl From<&ReminderConfig> for ReminderContent {
    fn from(config: &ReminderConfig) -> Self {
        Self {
            title: config.title.clone(),
            body: config.body.clone(),
        }
    }
}

/// Single-slot, debounced inactivity reminder for one chat session.
pub struct InactivityScheduler {
    gateway: Arc<dyn NotificationGateway>,
    content: ReminderContent,
    enabled: bool,
    state: ReminderState,
    timer: Option<ReminderTimer>,
    /// Notifications handed to the gateway and not yet cancelled.
    pending: Vec<NotificationId>,
    last_generation: u64,
}

impl std::fmt::Debug for InactivityScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InactivityScheduler")
            .field("gateway", &self.gateway.name())
            .field("enabled", &self.enabled)
            .field("state", &self.state)
            .field("timer", &self.timer)
            .field("pending", &self.pending)
            .finish()
    }
}

impl InactivityScheduler {
    /// Create a scheduler in the `Idle` state.
    pub fn new(gateway: Arc<dyn NotificationGateway>, content: ReminderContent) -> Self {
        Self {
            gateway,
            content,
            enabled: true,
            state: ReminderState::Idle,
            timer: None,
            pending: Vec::new(),
            last_generation: 0,
        }
    }

    pub fn from_config(gateway: Arc<dyn NotificationGateway>, config: &ReminderConfig) -> Self {
        let mut scheduler = Self::new(gateway, ReminderContent::from(config));
        scheduler.enabled = config.enabled;
        scheduler
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ReminderState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn armed_timer(&self) -> Option<&ReminderTimer> {
        self.timer.as_ref()
    }

    pub fn armed_handle(&self) -> Option<TimerHandle> {
        self.timer.as_ref().map(|t| t.handle)
    }

    pub fn pending_notifications(&self) -> &[NotificationId] {
        &self.pending
    }

    pub fn content(&self) -> &ReminderContent {
        &self.content
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// A bot reply arrived: restart the wait window with `delay`.
    ///
    /// Any live timer and pending notifications from the previous cycle are
    /// cancelled first, so repeated exchanges never stack reminders.
    pub fn on_exchange_completed(&mut self, delay: Duration) -> ReminderEvent {
        self.clear_cycle();

        if !self.enabled {
            self.state = ReminderState::Idle;
            debug!("reminders disabled; exchange completed without arming");
            return ReminderEvent::ReminderSuppressed { at: Utc::now() };
        }

        self.last_generation += 1;
        let handle = TimerHandle(self.last_generation);
        let started_at = Utc::now();
        self.timer = Some(ReminderTimer {
            handle,
            started_at,
            duration: delay,
        });
        self.state = ReminderState::Armed;
        debug!(%handle, delay_secs = delay.as_secs(), "reminder armed");

        ReminderEvent::ReminderArmed {
            handle,
            delay_secs: delay.as_secs(),
            at: started_at,
        }
    }

    /// The user sent a message: drop whatever reminder was pending.
    ///
    /// Returns `None` when there was nothing to disarm. A reminder that
    /// already fired is withdrawn silently.
    pub fn on_user_activity(&mut self) -> Option<ReminderEvent> {
        match self.state {
            ReminderState::Armed => {
                let handle = self.armed_handle();
                self.clear_cycle();
                self.state = ReminderState::Idle;
                let handle = handle?;
                debug!(%handle, "reminder disarmed by user activity");
                Some(ReminderEvent::ReminderDisarmed {
                    handle,
                    at: Utc::now(),
                })
            }
            ReminderState::Idle | ReminderState::Fired => {
                self.clear_cycle();
                self.state = ReminderState::Idle;
                None
            }
        }
    }

    /// A platform timer armed for `handle` woke up.
    ///
    /// Dispatches the reminder only if `handle` is still the live one.
    /// Anything else lost a race against a cancel and is discarded.
    pub fn on_timer_elapsed(&mut self, handle: TimerHandle) -> ReminderEvent {
        let live = self.state == ReminderState::Armed && self.armed_handle() == Some(handle);
        if !live {
            debug!(%handle, "discarding stale timer wake-up");
            return ReminderEvent::StaleFireDiscarded {
                handle,
                at: Utc::now(),
            };
        }

        self.timer = None;
        self.state = ReminderState::Fired;

        // The wait already happened here, so the platform shows it immediately.
        match self
            .gateway
            .schedule(0, &self.content.title, &self.content.body)
        {
            Ok(Some(id)) => self.pending.push(id),
            Ok(None) => {}
            Err(e) => warn!(gateway = self.gateway.name(), error = %e, "failed to dispatch reminder"),
        }
        info!(%handle, "reminder fired");
        self.state = ReminderState::Idle;

        ReminderEvent::ReminderFired {
            handle,
            title: self.content.title.clone(),
            body: self.content.body.clone(),
            at: Utc::now(),
        }
    }

    /// The chat session is closing: release the timer slot for good.
    pub fn on_session_end(&mut self) -> ReminderEvent {
        self.timer = None;
        self.pending.clear();
        self.state = ReminderState::Idle;
        self.cancel_all_notifications();
        debug!("reminder session ended");
        ReminderEvent::SessionEnded { at: Utc::now() }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn clear_cycle(&mut self) {
        if self.timer.is_none() && self.pending.is_empty() {
            return;
        }
        self.timer = None;
        self.pending.clear();
        self.cancel_all_notifications();
    }

    fn cancel_all_notifications(&self) {
        if let Err(e) = self.gateway.cancel_all() {
            warn!(gateway = self.gateway.name(), error = %e, "failed to cancel pending notifications");
        }
    }
}
