// ── Runtime driver configuration ──
//
// Describes *which* appliance to drive and how. Carries credentials and
// connection tuning, but never touches disk. The CLI builds a
// `DriverConfig` from its profile and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Appliances ship with self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one driver instance bound to one appliance.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Display name of the driver instance.
    pub name: String,
    /// Zone the appliance serves.
    pub zone_id: String,
    /// Management address: a hostname, an IP, or a full `https://` URL.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    /// Appliance interface facing the public network.
    pub public_interface: String,
    /// Appliance interface carrying tagged guest VLANs.
    pub private_interface: String,
    /// How many times a failed command is re-run after re-authenticating.
    pub num_retries: u32,
    /// Unique id announced at startup.
    pub guid: String,
    /// Inline mode: every guest address is qualified with its VLAN's
    /// route domain.
    pub inline: bool,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            zone_id: String::new(),
            host: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
            public_interface: String::new(),
            private_interface: String::new(),
            num_retries: 1,
            guid: String::new(),
            inline: false,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DriverConfig {
    /// Reject configurations that are missing a required parameter.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("name", self.name.as_str()),
            ("zone id", self.zone_id.as_str()),
            ("appliance address", self.host.as_str()),
            ("username", self.username.as_str()),
            ("password", self.password.expose_secret()),
            ("public interface", self.public_interface.as_str()),
            ("private interface", self.private_interface.as_str()),
            ("guid", self.guid.as_str()),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::config(format!(
                    "unable to find the {label} for the load balancer"
                )));
            }
        }
        self.base_url().map(|_| ())
    }

    /// Management base URL. Bare hosts are reached over HTTPS.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        let raw = if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("https://{}", self.host)
        };
        Url::parse(&raw)
            .map_err(|e| CoreError::config(format!("invalid appliance address {raw}: {e}")))
    }
}
