// ── Command and answer types ──
//
// Every request the provisioning layer can send, and the answer it gets
// back. Payloads derive serde so the CLI can read them from JSON files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result string recorded for an address whose association failed.
pub const FAILED_RESULT: &str = "Failed";

/// A request to the driver.
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    /// Readiness probe.
    Ready,
    /// Maintenance notification.
    Maintain,
    /// Bind or unbind guest VLANs and their self addresses.
    IpAssoc(IpAssocCommand),
    /// Converge virtual servers and pools to a rule set.
    LoadBalancerConfig(LoadBalancerConfigCommand),
    /// Per-address traffic counters.
    ExternalNetworkResourceUsage,
    /// Anything this driver does not handle.
    Other { name: String },
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Self::Other { name } => name,
            other => other.into(),
        }
    }
}

// ── IP association ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAssocCommand {
    pub addresses: Vec<IpAddressChange>,
}

/// One guest-network change. `vlan_gateway` becomes the appliance's self
/// address inside the VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressChange {
    pub public_ip: String,
    pub vlan_id: String,
    pub vlan_gateway: String,
    pub vlan_netmask: String,
    /// `true` to associate, `false` to release.
    pub add: bool,
}

// ── Load-balancer configuration ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerConfigCommand {
    /// Tag of the guest VLAN the rules' addresses live in.
    pub guest_vlan_tag: u32,
    #[serde(default)]
    pub rules: Vec<LoadBalancerRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerRule {
    /// `tcp` or `udp`; absent means `tcp`.
    #[serde(default)]
    pub protocol: Option<String>,
    /// `roundrobin` or `leastconn`.
    pub algorithm: String,
    pub src_ip: String,
    pub src_port: u16,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub destinations: Vec<Destination>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub dest_ip: String,
    pub dest_port: u16,
    #[serde(default)]
    pub revoked: bool,
}

// ── Answers ──────────────────────────────────────────────────────────

/// Byte counters for one logical address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteCounts {
    pub bytes_out: i64,
    pub bytes_in: i64,
}

/// The driver's reply to a [`Command`]. Every command gets one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Answer {
    Ready,
    Maintain,
    /// One entry per address, in command order.
    IpAssoc { results: Vec<String> },
    Status {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    Usage {
        ip_bytes: BTreeMap<String, ByteCounts>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Unsupported { command: String },
}

impl Answer {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Ready | Self::Maintain => true,
            Self::IpAssoc { results } => results.iter().all(|r| r != FAILED_RESULT),
            Self::Status { success, .. } => *success,
            Self::Usage { error, .. } => error.is_none(),
            Self::Unsupported { .. } => false,
        }
    }
}
