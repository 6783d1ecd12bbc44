// Control API wire types
//
// Collections come back wrapped in `{ "items": [...] }`. Only the fields the
// driver reads are modelled; everything else is ignored on decode. Fields
// use `#[serde(default)]` because the appliance omits empty properties.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Envelope ─────────────────────────────────────────────────────────

/// Standard collection envelope.
///
/// ```json
/// { "kind": "tm:net:vlan:vlancollectionstate", "items": [...] }
/// ```
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: TokenBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenBody {
    pub token: String,
}

// ── Network ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vlan {
    pub name: String,
    #[serde(default)]
    pub tag: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfIp {
    pub name: String,
    /// `ip[%rd]/prefix`
    pub address: String,
    #[serde(default)]
    pub vlan: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDomain {
    pub name: String,
    pub id: u32,
    #[serde(default)]
    pub vlans: Vec<String>,
}

// ── Local traffic ────────────────────────────────────────────────────

/// Pool load-balancing mode as the appliance spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LbMode {
    RoundRobin,
    LeastConnectionsMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpProtocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub name: String,
    #[serde(default)]
    pub load_balancing_mode: Option<LbMode>,
}

/// Pool member as listed by `ltm/pool/~Common~{pool}/members`.
///
/// `name` is `address:port`; `address` repeats the address alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolMemberItem {
    pub name: String,
    pub address: String,
}

impl PoolMemberItem {
    /// Split the member name into address and port.
    pub fn to_member(&self) -> Option<MemberAddress> {
        let (_, port) = self.name.rsplit_once(':')?;
        Some(MemberAddress {
            address: self.address.clone(),
            port: port.parse().ok()?,
        })
    }
}

/// An `address:port` pair identifying a pool member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberAddress {
    pub address: String,
    pub port: u16,
}

impl MemberAddress {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for MemberAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServer {
    pub name: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub ip_protocol: Option<IpProtocol>,
}

/// Everything needed to create a virtual server in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualServerDefinition {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub protocol: IpProtocol,
    /// Destination mask; host routes use `255.255.255.255`.
    pub mask: String,
    pub default_pool: String,
    /// Protocol profile attached in all contexts.
    pub profile: String,
    /// Enable SNAT automap on the server.
    pub snat_automap: bool,
}

// ── System ───────────────────────────────────────────────────────────

/// Which configuration layer a save call persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    BaseLevel,
    HighLevel,
}

impl SaveMode {
    pub fn as_option(self) -> &'static str {
        match self {
            Self::BaseLevel => "base",
            Self::HighLevel => "high-level",
        }
    }
}

// ── Statistics ───────────────────────────────────────────────────────

/// Response of `ltm/virtual/statistics`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatisticsSnapshot {
    #[serde(default)]
    pub statistics: Vec<VirtualServerStatistics>,
}

/// Counters for one virtual server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServerStatistics {
    pub virtual_server: StatisticsTarget,
    #[serde(default)]
    pub statistics: Vec<Statistic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsTarget {
    pub name: String,
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistic {
    #[serde(rename = "type")]
    pub kind: StatisticKind,
    pub value: SplitCounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatisticKind {
    StatisticClientSideBytesIn,
    StatisticClientSideBytesOut,
    StatisticClientSidePacketsIn,
    StatisticClientSidePacketsOut,
    StatisticClientSideCurrentConnections,
    #[serde(other)]
    Other,
}

/// A 64-bit counter transported as two signed 32-bit halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounter {
    pub high: i32,
    pub low: i32,
}
