//! CLI error types with miette diagnostics.
//!
//! Maps config and core errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use bigip_config::ConfigError;
use bigip_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not log in to the appliance at {host}")]
    #[diagnostic(
        code(bigip::login_failed),
        help(
            "Check the address and credentials of the profile.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    LoginFailed { host: String, reason: String },

    #[error("Appliance call failed: {message}")]
    #[diagnostic(code(bigip::remote))]
    Remote { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(bigip::no_credentials),
        help(
            "Set BIGIP_PASSWORD, name a variable with password_env, or store it in\n\
             the system keyring under service 'bigip', account '{profile}/password'."
        )
    )]
    NoCredentials { profile: String },

    // ── Command outcome ──────────────────────────────────────────────

    #[error("Command '{command}' failed")]
    #[diagnostic(code(bigip::command_failed), help("{details}"))]
    CommandFailed { command: String, details: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bigip::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bigip::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No appliance configured")]
    #[diagnostic(
        code(bigip::no_config),
        help(
            "Add a [profiles.<name>] section to {path}\n\
             or pass --host with BIGIP_USERNAME / BIGIP_PASSWORD set."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(bigip::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(bigip::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::LoginFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Remote { .. } => exit_code::CONNECTION,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => CliError::LoginFailed {
                host: "(appliance)".into(),
                reason: message,
            },
            CoreError::Remote { message, .. } | CoreError::Reconciliation { message } => {
                CliError::Remote { message }
            }
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "profile".into(),
                reason: message,
            },
        }
    }
}
