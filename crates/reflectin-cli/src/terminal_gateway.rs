//! Notification gateway that prints reminders to the terminal.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reflectin_core::{CapabilityError, NotificationGateway, NotificationId};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Default)]
pub struct TerminalGateway {
    next_id: AtomicU64,
    pending: Mutex<HashMap<NotificationId, JoinHandle<()>>>,
}

impl TerminalGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn show(title: &str, body: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\n[{title}] {body}");
        let _ = out.flush();
    }
}

impl NotificationGateway for TerminalGateway {
    fn name(&self) -> &str {
        "terminal"
    }

    fn schedule(
        &self,
        delay_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<Option<NotificationId>, CapabilityError> {
        let id = NotificationId(format!(
            "terminal-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        ));

        if delay_secs == 0 {
            Self::show(title, body);
            return Ok(Some(id));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CapabilityError::Platform(e.to_string()))?;
        let (title, body) = (title.to_string(), body.to_string());
        let task = runtime.spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            Self::show(&title, &body);
        });

        let mut pending = self
            .pending
            .lock()
            .map_err(|e| CapabilityError::Platform(e.to_string()))?;
        pending.retain(|_, task| !task.is_finished());
        debug!(%id, delay_secs, "terminal notification scheduled");
        pending.insert(id.clone(), task);
        Ok(Some(id))
    }

    fn cancel_all(&self) -> Result<(), CapabilityError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| CapabilityError::Platform(e.to_string()))?;
        for (id, task) in pending.drain() {
            task.abort();
            debug!(%id, "terminal notification cancelled");
        }
        Ok(())
    }
}
