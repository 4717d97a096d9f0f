//! Core error types for reflectin-core.
//!
//! The hierarchy mirrors how each failure is handled: transport failures are
//! surfaced to the caller as a failed send, capability failures are recovered
//! inside the reminder scheduler, configuration failures abort the command.
//! [`CoreError`] wraps the two kinds a host has to report.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for reflectin-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chat backend errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home or data directory could not be resolved
    #[error("Configuration directory unavailable: {0}")]
    DataDir(String),
}

/// Backend unreachable or returned something unusable.
///
/// A turn that ends in a transport error never arms a reminder.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, timeout or protocol failure
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("Malformed backend response: {0}")]
    Decode(String),

    /// Base URL could not be joined with an endpoint path
    #[error("Invalid backend URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Notification permission denied or platform unsupported.
///
/// Never surfaced to the user; the scheduler logs it and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Notification permission denied")]
    PermissionDenied,

    #[error("Local notifications are not supported on this platform")]
    Unsupported,

    #[error("Notification platform error: {0}")]
    Platform(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
