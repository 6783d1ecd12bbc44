//! Configuration for the bigip CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `bigip_core::DriverConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bigip_core::{DriverConfig, TlsVerification};

/// Keyring service name.
const KEYRING_SERVICE: &str = "bigip";

/// Environment prefix for config overrides and credentials.
pub const ENV_PREFIX: &str = "BIGIP_";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "BIGIP_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named appliance profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Copy of this config with plaintext passwords masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for profile in copy.profiles.values_mut() {
            if profile.password.is_some() {
                profile.password = Some("********".into());
            }
        }
        copy
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Retry budget for profiles that do not set `num_retries`.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_retries() -> u32 {
    1
}

/// A named appliance profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Management address (e.g., "10.1.1.2" or "https://bigip.lab:8443").
    pub host: String,

    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    #[serde(default)]
    pub zone_id: String,

    #[serde(default)]
    pub guid: String,

    #[serde(default)]
    pub public_interface: String,

    #[serde(default)]
    pub private_interface: String,

    /// Override the default retry budget.
    pub num_retries: Option<u32>,

    /// Qualify guest addresses with route domains.
    #[serde(default)]
    pub inline: bool,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `BIGIP_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "bigip", "bigip").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bigip");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, merged over defaults and under `BIGIP_*`
/// environment overrides (`BIGIP_DEFAULTS__TIMEOUT=60`). A missing file
/// yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a profile's password.
///
/// Order: `password_env` → `BIGIP_PASSWORD` → keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var("BIGIP_PASSWORD") {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("BIGIP_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Build a `DriverConfig` from a profile. No CLI flag overrides.
pub fn profile_to_driver_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DriverConfig, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let username = resolve_username(profile, profile_name)?;
    let password = resolve_password(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::DangerAcceptInvalid // appliances ship self-signed
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(DriverConfig {
        name: profile_name.to_owned(),
        zone_id: profile.zone_id.clone(),
        host: profile.host.clone(),
        username,
        password,
        public_interface: profile.public_interface.clone(),
        private_interface: profile.private_interface.clone(),
        num_retries: profile.num_retries.unwrap_or(defaults.retries),
        guid: profile.guid.clone(),
        inline: profile.inline,
        tls,
        timeout,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn profile() -> Profile {
        Profile {
            host: "10.1.1.2".into(),
            username: Some("admin".into()),
            password: Some("plain".into()),
            zone_id: "1".into(),
            guid: "guid-1".into(),
            public_interface: "1.1".into(),
            private_interface: "1.2".into(),
            ..Profile::default()
        }
    }

    #[test]
    fn password_env_wins_over_plaintext() {
        // Any variable the test process is guaranteed to inherit.
        let mut p = profile();
        p.password_env = Some("PATH".into());
        let expected = std::env::var("PATH").unwrap();
        assert_eq!(resolve_password(&p, "lab").unwrap().expose_secret(), expected);
    }

    #[test]
    fn profile_fields_flow_into_driver_config() {
        let mut p = profile();
        p.num_retries = Some(3);
        p.inline = true;
        p.ca_cert = Some("/etc/ssl/bigip.pem".into());
        p.insecure = Some(false);
        let cfg = profile_to_driver_config(&p, "lab", &Defaults::default()).unwrap();

        assert_eq!(cfg.name, "lab");
        assert_eq!(cfg.host, "10.1.1.2");
        assert_eq!(cfg.num_retries, 3);
        assert!(cfg.inline);
        assert_eq!(cfg.tls, TlsVerification::CustomCa("/etc/ssl/bigip.pem".into()));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn defaults_fill_unset_profile_values() {
        let defaults = Defaults {
            retries: 4,
            timeout: 5,
            ..Defaults::default()
        };
        let cfg = profile_to_driver_config(&profile(), "lab", &defaults).unwrap();
        assert_eq!(cfg.num_retries, 4);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn empty_host_is_rejected() {
        let p = Profile {
            host: String::new(),
            ..profile()
        };
        let err = profile_to_driver_config(&p, "lab", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "host"));
    }

    #[test]
    fn redacted_masks_plaintext_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), profile());
        let shown = cfg.redacted().to_toml().unwrap();
        assert!(!shown.contains("plain"));
        assert!(shown.contains("********"));
    }
}
