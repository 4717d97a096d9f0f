mod policy;
mod scheduler;
mod service;

pub use policy::{DelayDecision, DelayPolicy, DelayTier, SentimentScore};
pub use scheduler::{
    InactivityScheduler, ReminderContent, ReminderState, ReminderTimer, TimerHandle,
};
pub use service::{ReminderHandle, ReminderService};
