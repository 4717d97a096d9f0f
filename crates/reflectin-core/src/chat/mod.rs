mod client;
mod controller;
mod transcript;

pub use client::{ChatBackend, ChatReply, ChatRequest, HttpChatBackend, Sentiment};
pub use controller::ChatSessionController;
pub use transcript::{Message, Sender, Transcript};
