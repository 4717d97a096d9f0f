//! End-to-end chat session scenarios against a scripted backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reflectin_core::storage::ReminderConfig;
use reflectin_core::{
    CapabilityError, ChatBackend, ChatReply, ChatSessionController, NotificationGateway,
    NotificationId, ReminderEvent, TransportError,
};
use tokio::time::{sleep, Instant};

struct ScriptedBackend {
    replies: Mutex<VecDeque<ChatReply>>,
}

impl ScriptedBackend {
    fn with_scores(scores: &[Option<f64>]) -> Self {
        let replies = scores
            .iter()
            .map(|score| {
                let json = match score {
                    Some(s) => format!(r#"{{"bot_reply": "ok", "sentiment": {{"sentiment_score": {s}}}}}"#),
                    None => r#"{"bot_reply": "ok"}"#.to_string(),
                };
                serde_json::from_str(&json).unwrap()
            })
            .collect();
        Self {
            replies: Mutex::new(replies),
        }
    }
}

impl ChatBackend for ScriptedBackend {
    async fn send(&self, _user_message: &str) -> Result<ChatReply, TransportError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Decode("script exhausted".into()))
    }

    async fn checkup(&self) -> Result<String, TransportError> {
        Err(TransportError::Status {
            status: 404,
            body: "Checkup message not found".into(),
        })
    }
}

#[derive(Default)]
struct ClockedGateway {
    fired_at: Mutex<Vec<Instant>>,
    cancels: Mutex<usize>,
}

impl NotificationGateway for ClockedGateway {
    fn name(&self) -> &str {
        "clocked"
    }

    fn schedule(&self, _: u64, _: &str, _: &str) -> Result<Option<NotificationId>, CapabilityError> {
        self.fired_at.lock().unwrap().push(Instant::now());
        Ok(Some(NotificationId("n".into())))
    }

    fn cancel_all(&self) -> Result<(), CapabilityError> {
        *self.cancels.lock().unwrap() += 1;
        Ok(())
    }
}

fn armed_delays(events: &mut tokio::sync::mpsc::UnboundedReceiver<ReminderEvent>) -> Vec<u64> {
    let mut delays = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ReminderEvent::ReminderArmed { delay_secs, .. } = event {
            delays.push(delay_secs);
        }
    }
    delays
}

async fn fire_delay_for(score: Option<f64>) -> Duration {
    let gateway = Arc::new(ClockedGateway::default());
    let (mut controller, _events) = ChatSessionController::start(
        ScriptedBackend::with_scores(&[score]),
        gateway.clone(),
        &ReminderConfig::default(),
    );

    let start = Instant::now();
    controller.send_message("hello").await.unwrap();
    sleep(Duration::from_secs(600)).await;

    let fires = gateway.fired_at.lock().unwrap().clone();
    assert_eq!(fires.len(), 1);
    fires[0] - start
}

#[tokio::test(start_paused = true)]
async fn sentiment_scenarios_fire_after_expected_delay() {
    assert_eq!(fire_delay_for(Some(3.0)).await, Duration::from_secs(30));
    assert_eq!(fire_delay_for(Some(8.0)).await, Duration::from_secs(75));
    assert_eq!(fire_delay_for(Some(5.5)).await, Duration::from_secs(15));
    assert_eq!(fire_delay_for(None).await, Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn resuming_before_deadline_drops_previous_reminder() {
    let gateway = Arc::new(ClockedGateway::default());
    let (mut controller, mut events) = ChatSessionController::start(
        ScriptedBackend::with_scores(&[Some(8.0), Some(5.0)]),
        gateway.clone(),
        &ReminderConfig::default(),
    );
    let start = Instant::now();

    // Message A: positive reply arms the long 75s window.
    controller.send_message("great news today").await.unwrap();
    sleep(Duration::from_secs(40)).await;
    assert_eq!(*gateway.cancels.lock().unwrap(), 0);

    // Message B at 40s: A's timer is cancelled before B's request goes out.
    controller.send_message("anyway").await.unwrap();
    assert!(gateway.fired_at.lock().unwrap().is_empty());

    sleep(Duration::from_secs(600)).await;
    let fires = gateway.fired_at.lock().unwrap().clone();
    assert_eq!(fires.len(), 1, "only B's reminder fires");
    assert_eq!(fires[0] - start, Duration::from_secs(55));

    assert_eq!(armed_delays(&mut events), vec![75, 15]);

    let (transcript, scheduler) = controller.end_session().await;
    assert_eq!(transcript.len(), 4);
    assert!(scheduler.unwrap().armed_handle().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_turn_cancels_old_reminder_and_arms_nothing() {
    let gateway = Arc::new(ClockedGateway::default());
    let (mut controller, mut events) = ChatSessionController::start(
        ScriptedBackend::with_scores(&[Some(2.0)]),
        gateway.clone(),
        &ReminderConfig::default(),
    );

    controller.send_message("not great").await.unwrap();
    sleep(Duration::from_secs(10)).await;

    // Script is exhausted, so this turn fails.
    assert!(controller.send_message("still there?").await.is_err());
    sleep(Duration::from_secs(600)).await;

    assert!(gateway.fired_at.lock().unwrap().is_empty());
    assert_eq!(armed_delays(&mut events), vec![30]);
    controller.end_session().await;
}
