//! Error types for sadhana-core.
//!
//! `ApiError` and `TransitionError` live next to the code that raises them
//! and are re-exported here.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::api::ApiError;
pub use crate::session::TransitionError;

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

    /// Key does not name a configuration value
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Phase;

    #[test]
    fn cooldown_error_reports_remaining_time() {
        let err = TransitionError::Cooldown { remaining_ms: 120 };
        assert_eq!(
            err.to_string(),
            "transition rejected: cooldown active for another 120ms"
        );
    }

    #[test]
    fn config_error_names_the_key() {
        let err = ConfigError::InvalidValue {
            key: "api.timeout_secs".into(),
            message: "not a number".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'api.timeout_secs': not a number"
        );
        let err = ConfigError::UnknownKey("api.nope".into());
        assert!(err.to_string().contains("api.nope"));
    }

    #[test]
    fn not_allowed_mentions_phase() {
        let err = TransitionError::NotAllowed {
            phase: Phase::Summary,
            event: crate::session::PhaseEvent::RetentionTap,
        };
        assert!(err.to_string().contains("SUMMARY"));
    }
}
