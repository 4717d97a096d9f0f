//! # ReflectIn Core Library
//!
//! This library provides the core logic behind the ReflectIn journaling chat:
//! deciding whether and when to nudge a user who went quiet after talking to
//! the conversational backend.
//!
//! ## Architecture
//!
//! - **Reminder Policy**: pure mapping from a reply's sentiment score to a
//!   quiet period before the reminder
//! - **Reminder Scheduler**: single-slot, debounced state machine with
//!   generation-tagged timer handles
//! - **Reminder Service**: tokio task that serializes every transition
//! - **Chat Session**: backend client, transcript and the controller that
//!   drives the reminder from each exchange
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`InactivityScheduler`]: Core reminder state machine
//! - [`DelayPolicy`]: Sentiment-to-delay mapping
//! - [`ChatSessionController`]: Per-session orchestration
//! - [`NotificationGateway`]: Trait for local notification backends
//! - [`Config`]: Application configuration management

pub mod chat;
pub mod error;
pub mod events;
pub mod gateway;
pub mod reminder;
pub mod storage;

pub use chat::{ChatBackend, ChatReply, ChatSessionController, HttpChatBackend, Transcript};
pub use error::{CapabilityError, ConfigError, CoreError, TransportError};
pub use events::ReminderEvent;
pub use gateway::{NotificationGateway, NotificationId, PermissionStatus, UnsupportedGateway};
pub use reminder::{
    DelayPolicy, DelayTier, InactivityScheduler, ReminderHandle, ReminderService, ReminderState,
    SentimentScore, TimerHandle,
};
pub use storage::Config;
