// bigip-api: Async Rust client for the BIG-IP appliance control API

pub mod auth;
pub mod client;
pub mod error;
pub mod ltm;
pub mod models;
pub mod network;
pub mod system;
pub mod transport;

pub use client::ApplianceClient;
pub use error::Error;
pub use models::{
    IpProtocol, LbMode, MemberAddress, SaveMode, SplitCounter, Statistic, StatisticKind,
    VirtualServerDefinition, VirtualServerStatistics,
};
pub use transport::{TlsMode, TransportConfig};
