//! Async driver for [`InactivityScheduler`].
//!
//! One tokio task owns the scheduler. Every transition, including timer
//! wake-ups, arrives as a message on a single channel, so the scheduler is
//! only ever mutated from that task. Callers hold a [`ReminderHandle`] whose
//! methods enqueue and return immediately.
//!
//! Events are delivered via a `tokio::sync::mpsc` channel so the host can
//! render fired reminders.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

use super::scheduler::{InactivityScheduler, TimerHandle};
use crate::events::ReminderEvent;

#[derive(Debug)]
enum Command {
    ExchangeCompleted(Duration),
    UserActivity,
    Elapsed(TimerHandle),
    EndSession,
}

/// Spawns the task that drives one session's scheduler.
pub struct ReminderService;

impl ReminderService {
    /// Start the driver task. Must be called inside a tokio runtime.
    ///
    /// Returns the control handle and the receiving end of the event stream.
    pub fn spawn(
        scheduler: InactivityScheduler,
    ) -> (ReminderHandle, mpsc::UnboundedReceiver<ReminderEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(
            Self::run(scheduler, command_tx.clone(), command_rx, event_tx)
                .instrument(info_span!("reminder_service")),
        );

        let handle = ReminderHandle {
            command_tx,
            join_handle: Some(task),
        };
        (handle, event_rx)
    }

    async fn run(
        mut scheduler: InactivityScheduler,
        command_tx: mpsc::UnboundedSender<Command>,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
        event_tx: mpsc::UnboundedSender<ReminderEvent>,
    ) -> InactivityScheduler {
        let mut sleeper: Option<(TimerHandle, JoinHandle<()>)> = None;

        while let Some(command) = command_rx.recv().await {
            let finished = matches!(command, Command::EndSession);
            let event = match command {
                Command::ExchangeCompleted(delay) => Some(scheduler.on_exchange_completed(delay)),
                Command::UserActivity => scheduler.on_user_activity(),
                Command::Elapsed(handle) => Some(scheduler.on_timer_elapsed(handle)),
                Command::EndSession => Some(scheduler.on_session_end()),
            };

            Self::sync_sleeper(&scheduler, &mut sleeper, &command_tx);

            if let Some(event) = event {
                // Host may have stopped listening; the session still runs.
                let _ = event_tx.send(event);
            }
            if finished {
                break;
            }
        }

        if let Some((_, task)) = sleeper.take() {
            task.abort();
        }
        scheduler
    }

    /// Keep exactly one sleep task alive, and only for the armed handle.
    fn sync_sleeper(
        scheduler: &InactivityScheduler,
        sleeper: &mut Option<(TimerHandle, JoinHandle<()>)>,
        command_tx: &mpsc::UnboundedSender<Command>,
    ) {
        let armed = scheduler.armed_timer().map(|t| (t.handle, t.duration));
        let current = sleeper.as_ref().map(|(handle, _)| *handle);
        if current.is_some() && current == armed.map(|(handle, _)| handle) {
            return;
        }

        if let Some((handle, task)) = sleeper.take() {
            // Best effort: a wake-up already queued is rejected by its handle.
            task.abort();
            debug!(%handle, "sleep task aborted");
        }

        if let Some((handle, duration)) = armed {
            let tx = command_tx.clone();
            let task = tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                let _ = tx.send(Command::Elapsed(handle));
            });
            *sleeper = Some((handle, task));
        }
    }
}

/// Control handle for a running [`ReminderService`].
///
/// Dropping the handle ends the session.
pub struct ReminderHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    join_handle: Option<JoinHandle<InactivityScheduler>>,
}

impl ReminderHandle {
    /// A bot reply arrived; re-arm with `delay`.
    pub fn exchange_completed(&self, delay: Duration) {
        self.send(Command::ExchangeCompleted(delay));
    }

    /// The user is active again; disarm any pending reminder.
    ///
    /// Ordered before every later call on this handle.
    pub fn user_activity(&self) {
        self.send(Command::UserActivity);
    }

    /// Whether the driver task is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// End the session and wait for the driver to stop.
    ///
    /// Returns the final scheduler, or `None` if the driver task panicked.
    pub async fn end_session(mut self) -> Option<InactivityScheduler> {
        self.send(Command::EndSession);
        let task = self.join_handle.take()?;
        task.await.ok()
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.command_tx.send(command) {
            debug!(command = ?e.0, "reminder service already stopped");
        }
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        if self.join_handle.is_some() {
            let _ = self.command_tx.send(Command::EndSession);
        }
    }
}
