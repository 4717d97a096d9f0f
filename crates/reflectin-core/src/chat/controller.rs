//! Chat session orchestration.
//!
//! Ties one conversation to its reminder service:
//!
//! ```text
//! send_message -> user_activity -> POST /chat -> compute_delay -> exchange_completed
//! ```
//!
//! The reminder is disarmed before the request goes out, so a slow or failed
//! request never races a stale timer. A failed request never re-arms.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::client::{ChatBackend, ChatReply};
use super::transcript::{Sender, Transcript};
use crate::error::CoreError;
use crate::events::ReminderEvent;
use crate::gateway::{NotificationGateway, PermissionStatus};
use crate::reminder::{DelayPolicy, InactivityScheduler, ReminderHandle, ReminderService};
use crate::storage::ReminderConfig;

pub struct ChatSessionController<B: ChatBackend> {
    backend: B,
    policy: DelayPolicy,
    reminders: ReminderHandle,
    transcript: Transcript,
}

impl<B: ChatBackend> ChatSessionController<B> {
    pub fn new(backend: B, policy: DelayPolicy, reminders: ReminderHandle) -> Self {
        Self {
            backend,
            policy,
            reminders,
            transcript: Transcript::new(),
        }
    }

    /// Open a session: ask for notification permission and start the
    /// reminder service. Must be called inside a tokio runtime.
    ///
    /// Denied permission is logged; the session still runs and reminders
    /// degrade to whatever the gateway can do.
    pub fn start(
        backend: B,
        gateway: Arc<dyn NotificationGateway>,
        config: &ReminderConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ReminderEvent>) {
        match gateway.request_permission() {
            PermissionStatus::Granted => {}
            status => warn!(
                gateway = gateway.name(),
                ?status,
                "notification permission not granted; reminders may not be shown"
            ),
        }

        let scheduler = InactivityScheduler::from_config(gateway, config);
        let (reminders, events) = ReminderService::spawn(scheduler);
        let controller = Self::new(backend, DelayPolicy::from_config(config), reminders);
        (controller, events)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn policy(&self) -> &DelayPolicy {
        &self.policy
    }

    /// Send one user message.
    ///
    /// Blank input is ignored and returns `Ok(None)` without touching the
    /// reminder or the backend.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Transport` if the backend could not be reached or
    /// answered with something unusable. No reminder is armed in that case.
    pub async fn send_message(&mut self, text: &str) -> Result<Option<ChatReply>, CoreError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        self.reminders.user_activity();
        self.transcript.push(Sender::User, text);

        let reply = match self.backend.send(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat request failed; no reminder armed");
                return Err(e.into());
            }
        };

        self.transcript.push(Sender::Bot, reply.bot_reply.clone());
        let decision = self.policy.decide(reply.sentiment_score());
        debug!(
            tier = ?decision.tier,
            delay_secs = decision.delay.as_secs(),
            "exchange completed"
        );
        self.reminders.exchange_completed(decision.delay);

        Ok(Some(reply))
    }

    /// Append a fired reminder to the conversation as a bot line.
    ///
    /// Returns whether `event` was a fired reminder.
    pub fn deliver_reminder(&mut self, event: &ReminderEvent) -> bool {
        match event.fired_body() {
            Some(body) => {
                self.transcript.push(Sender::Bot, body);
                true
            }
            None => false,
        }
    }

    /// End the session, cancelling any pending reminder.
    ///
    /// Returns the transcript and the final scheduler state.
    pub async fn end_session(self) -> (Transcript, Option<InactivityScheduler>) {
        let scheduler = self.reminders.end_session().await;
        (self.transcript, scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CapabilityError, TransportError};
    use crate::gateway::{NotificationId, UnsupportedGateway};
    use crate::reminder::ReminderState;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<ChatReply, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl ChatBackend for ScriptedBackend {
        async fn send(&self, user_message: &str) -> Result<ChatReply, TransportError> {
            self.sent.lock().unwrap().push(user_message.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Decode("no scripted reply".into())))
        }

        async fn checkup(&self) -> Result<String, TransportError> {
            Ok("checking in".into())
        }
    }

    fn reply(json: &str) -> Result<ChatReply, TransportError> {
        Ok(serde_json::from_str(json).unwrap())
    }

    struct DeniedGateway;

    impl NotificationGateway for DeniedGateway {
        fn name(&self) -> &str {
            "denied"
        }

        fn request_permission(&self) -> PermissionStatus {
            PermissionStatus::Denied
        }

        fn schedule(&self, _: u64, _: &str, _: &str) -> Result<Option<NotificationId>, CapabilityError> {
            Err(CapabilityError::PermissionDenied)
        }

        fn cancel_all(&self) -> Result<(), CapabilityError> {
            Err(CapabilityError::PermissionDenied)
        }
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<ReminderEvent>) -> Vec<ReminderEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_is_ignored() {
        let backend = ScriptedBackend::new(vec![]);
        let (mut controller, _events) =
            ChatSessionController::start(backend, Arc::new(UnsupportedGateway), &ReminderConfig::default());

        assert!(controller.send_message("   ").await.unwrap().is_none());
        assert!(controller.transcript().is_empty());
        assert!(controller.backend().sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_builds_policy_from_reminder_config() {
        let config = ReminderConfig {
            base_delay_secs: 20,
            ..ReminderConfig::default()
        };
        let (controller, _events) =
            ChatSessionController::start(ScriptedBackend::new(vec![]), Arc::new(UnsupportedGateway), &config);

        assert_eq!(controller.policy(), &DelayPolicy::from_config(&config));
        assert_eq!(controller.policy().compute_delay(None).as_secs(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_arms_sentiment_scaled_reminder() {
        let backend = ScriptedBackend::new(vec![reply(
            r#"{"bot_reply": "That sounds hard.", "sentiment": {"sentiment_score": 3}}"#,
        )]);
        let (mut controller, mut events) =
            ChatSessionController::start(backend, Arc::new(UnsupportedGateway), &ReminderConfig::default());

        let reply = controller.send_message("rough day").await.unwrap().unwrap();
        assert_eq!(reply.bot_reply, "That sounds hard.");
        assert_eq!(controller.transcript().len(), 2);

        let event = events.recv().await.unwrap();
        assert!(matches!(event, ReminderEvent::ReminderArmed { delay_secs: 30, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_never_arms() {
        let backend = ScriptedBackend::new(vec![Err(TransportError::Status {
            status: 502,
            body: "bad gateway".into(),
        })]);
        let (mut controller, mut events) =
            ChatSessionController::start(backend, Arc::new(UnsupportedGateway), &ReminderConfig::default());

        let err = controller.send_message("hello?").await.unwrap_err();
        assert!(matches!(err, CoreError::Transport(TransportError::Status { status: 502, .. })));
        // The user's line stays in the transcript, no bot line follows.
        assert_eq!(controller.transcript().len(), 1);

        let (_, scheduler) = controller.end_session().await;
        assert_eq!(scheduler.unwrap().state(), ReminderState::Idle);
        let events = drain(&mut events);
        assert!(events
            .iter()
            .all(|e| !matches!(e, ReminderEvent::ReminderArmed { .. })));
        assert!(matches!(events.last(), Some(ReminderEvent::SessionEnded { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn fired_reminder_lands_in_transcript_even_when_gateway_denied() {
        let backend = ScriptedBackend::new(vec![reply(r#"{"bot_reply": "Tell me more."}"#)]);
        let (mut controller, mut events) =
            ChatSessionController::start(backend, Arc::new(DeniedGateway), &ReminderConfig::default());

        controller.send_message("I'm okay").await.unwrap();

        let start = tokio::time::Instant::now();
        let fired = loop {
            let event = events.recv().await.unwrap();
            if matches!(event, ReminderEvent::ReminderFired { .. }) {
                break event;
            }
        };
        assert_eq!(start.elapsed().as_secs(), 15);

        assert!(controller.deliver_reminder(&fired));
        let last = controller.transcript().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, "ReflectIn would love to know: How are you feeling now?");
        assert!(!controller.deliver_reminder(&ReminderEvent::SessionEnded {
            at: chrono::Utc::now()
        }));
    }
}
