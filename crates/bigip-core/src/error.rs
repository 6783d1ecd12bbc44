// ── Core error types ──
//
// Domain errors from bigip-core. Consumers never see raw HTTP status codes
// or JSON failures; the `From<bigip_api::Error>` impl folds transport-layer
// errors into the kinds the retry policy understands.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Credential exchange failed, or the appliance rejected the token.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// The command content is malformed. Never retried.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// An appliance call failed.
    #[error("Appliance call failed: {message}")]
    Remote {
        message: String,
        status: Option<u16>,
    },

    /// A post-mutation listing did not show the expected state.
    #[error("Reconciliation failed: {message}")]
    Reconciliation { message: String },

    /// The driver configuration is unusable.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn reconciliation(message: impl Into<String>) -> Self {
        Self::Reconciliation {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a fresh session and a full re-run may fix this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. } | Self::Remote { .. } | Self::Reconciliation { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<bigip_api::Error> for CoreError {
    fn from(err: bigip_api::Error) -> Self {
        let timed_out = err.is_timeout();
        match err {
            bigip_api::Error::Authentication { message } => CoreError::Auth { message },
            bigip_api::Error::NotLoggedIn => CoreError::Auth {
                message: "no active session".into(),
            },
            bigip_api::Error::Api { status, message } => CoreError::Remote {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            bigip_api::Error::Transport(ref e) => CoreError::Remote {
                message: if timed_out {
                    format!("request timed out: {e}")
                } else {
                    e.to_string()
                },
                status: e.status().map(|s| s.as_u16()),
            },
            other => CoreError::Remote {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

/// A failed IP-association attempt, with the results of the addresses
/// that completed before the failure.
#[derive(Debug)]
pub struct PartialFailure {
    pub completed: Vec<String>,
    pub error: CoreError,
}

impl From<CoreError> for PartialFailure {
    fn from(error: CoreError) -> Self {
        Self {
            completed: Vec::new(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_never_retried() {
        assert!(!CoreError::validation("bad algorithm").is_retryable());
        assert!(!CoreError::config("missing host").is_retryable());
    }

    #[test]
    fn remote_and_reconciliation_are_retried() {
        assert!(CoreError::reconciliation("vlan-5 still present").is_retryable());
        let remote: CoreError = bigip_api::Error::Api {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(remote.is_retryable());
        assert!(matches!(remote, CoreError::Remote { status: Some(500), .. }));
    }

    #[test]
    fn expired_token_maps_to_auth() {
        let err: CoreError = bigip_api::Error::Authentication {
            message: "token expired".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Auth { .. }));
        assert!(err.is_retryable());
    }
}
