use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One line of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// In-memory conversation history for one chat session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> &Message {
        self.messages.push(Message {
            id: Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            at: Utc::now(),
        });
        // Just pushed, so never empty.
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
