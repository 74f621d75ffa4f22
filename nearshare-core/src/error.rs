//! Error handling for the NearShare simulator
//!
//! Simulated discovery and transfers cannot fail by construction, so the
//! error surface is small. Errors come from three places:
//!
//! - **Caller mistakes**: unknown session ids, empty payloads, cancelling a
//!   session that already finished.
//! - **Best-effort platform calls**: clipboard writes. These are logged and
//!   dropped by the caller, see [`crate::clipboard`].
//! - **External service clients**: hardware, firmware and health lookups.
//!   These are captured into a displayable message and can be retried, see
//!   [`crate::service::Fetcher`].
//!
//! ## Error Matching
//!
//! ```rust
//! use nearshare_core::{Result, SimError};
//!
//! fn describe(result: Result<()>) -> String {
//!     match result {
//!         Ok(()) => "ok".to_string(),
//!         Err(SimError::SessionNotFound(id)) => format!("no session {}", id),
//!         Err(e) => e.user_message(),
//!     }
//! }
//!
//! assert_eq!(describe(Ok(())), "ok");
//! assert_eq!(
//!     describe(Err(SimError::SessionNotFound("abc".to_string()))),
//!     "no session abc"
//! );
//! ```

use thiserror::Error;

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors that can occur while driving the simulators
///
/// # Automatic Conversions
///
/// - `std::io::Error` → `SimError::Io`
/// - `serde_json::Error` → `SimError::Json`
///
/// # Examples
///
/// ```rust
/// use nearshare_core::SimError;
///
/// let error = SimError::DeviceNotFound("phone-1".to_string());
/// assert_eq!(error.to_string(), "Device not found: phone-1");
///
/// let error = SimError::EmptyPayload;
/// assert_eq!(error.to_string(), "Nothing selected to share");
/// ```
#[derive(Error, Debug)]
pub enum SimError {
    /// I/O error (reading files to share, configuration, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Device not found in the registry or the visible list
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Transfer session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Operation attempted in a state that does not allow it
    ///
    /// Cancelling a transfer that already completed ends up here.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A transfer was requested with nothing selected
    #[error("Nothing selected to share")]
    EmptyPayload,

    /// Clipboard write was rejected by the platform
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// External service client failed
    #[error("Service error: {0}")]
    Service(String),

    /// External service returned a payload of the wrong shape
    #[error("Invalid service response: {0}")]
    InvalidResponse(String),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SimError {
    /// Check if this error is transient and the operation may be retried
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nearshare_core::SimError;
    ///
    /// assert!(SimError::Service("timeout".to_string()).is_recoverable());
    /// assert!(!SimError::EmptyPayload.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SimError::Service(_) | SimError::Clipboard(_) | SimError::Io(_)
        )
    }

    /// Get a user-friendly message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            SimError::DeviceNotFound(id) => {
                format!("Device '{}' not found. Try scanning again.", id)
            }
            SimError::SessionNotFound(id) => {
                format!("Transfer '{}' no longer exists.", id)
            }
            SimError::InvalidState(msg) => format!("Invalid state: {}.", msg),
            SimError::EmptyPayload => {
                "Select at least one file or text snippet to share.".to_string()
            }
            SimError::Clipboard(msg) => format!("Could not copy to clipboard: {}.", msg),
            SimError::Service(msg) => {
                format!("Could not load data: {}. Press retry to try again.", msg)
            }
            SimError::InvalidResponse(msg) => {
                format!("Unexpected data from service: {}.", msg)
            }
            SimError::Configuration(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            SimError::Io(e) => format!("I/O error: {}.", e),
            SimError::Json(e) => format!("Data format error: {}.", e),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        SimError::InvalidState(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SimError::DeviceNotFound("tv-1".to_string());
        assert_eq!(error.to_string(), "Device not found: tv-1");

        let error = SimError::SessionNotFound("abc".to_string());
        assert_eq!(error.to_string(), "Session not found: abc");

        let error = SimError::invalid_state("already completed");
        assert_eq!(error.to_string(), "Invalid state: already completed");
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io::{Error, ErrorKind};

        let io_error = Error::new(ErrorKind::NotFound, "file not found");
        let error: SimError = io_error.into();

        assert!(matches!(error, SimError::Io(_)));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>(r#"{"broken"#).unwrap_err();
        let error: SimError = json_error.into();

        assert!(matches!(error, SimError::Json(_)));
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        assert!(SimError::Service("offline".to_string())
            .user_message()
            .contains("retry"));
        assert!(SimError::EmptyPayload.user_message().contains("Select"));
    }
}
