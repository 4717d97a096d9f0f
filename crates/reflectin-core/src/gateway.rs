//! Local notification capability.
//!
//! The reminder scheduler never talks to a platform notification API
//! directly; it goes through [`NotificationGateway`]. Hosts supply an
//! implementation (a terminal printer, a desktop notifier, a mobile bridge).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CapabilityError;

/// Platform identifier of one scheduled notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of asking the platform for notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Platform has no local notifications at all.
    Unavailable,
}

/// Every notification backend implements this trait.
///
/// Calls are synchronous and must not block for long; platform work that
/// takes time should be handed off internally.
pub trait NotificationGateway: Send + Sync {
    /// Short identifier used in logs (e.g. "terminal", "unsupported").
    fn name(&self) -> &str;

    /// Ask the user for permission to show notifications.
    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted // default: nothing to ask
    }

    /// Show a notification after `delay_secs`; 0 means as soon as possible.
    ///
    /// `Ok(None)` means the platform accepted the call but scheduled nothing.
    fn schedule(
        &self,
        delay_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<Option<NotificationId>, CapabilityError>;

    /// Cancel every pending notification for the app. Idempotent.
    fn cancel_all(&self) -> Result<(), CapabilityError>;
}

/// Gateway for platforms without local notification support.
///
/// Every call is a logged no-op; nothing is ever surfaced to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedGateway;

impl NotificationGateway for UnsupportedGateway {
    fn name(&self) -> &str {
        "unsupported"
    }

    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Unavailable
    }

    fn schedule(
        &self,
        _delay_secs: u64,
        _title: &str,
        _body: &str,
    ) -> Result<Option<NotificationId>, CapabilityError> {
        warn!("local notifications are not supported on this platform");
        Ok(None)
    }

    fn cancel_all(&self) -> Result<(), CapabilityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_gateway_never_errors() {
        let gateway = UnsupportedGateway;
        assert_eq!(gateway.request_permission(), PermissionStatus::Unavailable);
        assert_eq!(gateway.schedule(0, "t", "b").unwrap(), None);
        assert!(gateway.cancel_all().is_ok());
        assert!(gateway.cancel_all().is_ok());
    }
}
