pub mod chat;
pub mod checkup;
pub mod config;
pub mod delay;
