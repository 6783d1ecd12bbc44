//! Reconciliation and command-execution engine between `bigip-api` and the
//! provisioning layer that drives a load-balancer appliance.
//!
//! - **[`Driver`]**: Per-appliance facade. [`execute()`](Driver::execute)
//!   routes a [`Command`] to its handler, serializes mutating commands,
//!   and re-runs a failed command from scratch after re-authenticating,
//!   up to the configured retry budget.
//!
//! - **[`SessionManager`]**: Login lifecycle. Every failure leads to a
//!   fresh [`acquire()`](SessionManager::acquire); sessions are never
//!   reused across failures.
//!
//! - **[`Appliance`]**: Capability traits for each appliance subsystem
//!   (VLAN, self IP, route domain, pool, node, virtual server, config
//!   sync, statistics). Implemented for `bigip_api::ApplianceClient`.
//!
//! - **[`reconcile`]**: Desired-vs-actual convergence. Every mutation is
//!   list → skip if converged → mutate → re-list and verify.
//!
//! - **[`naming`]** / **[`usage`]**: Deterministic object names and
//!   64-bit counter reconstruction for traffic accounting.

pub mod appliance;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod naming;
pub mod reconcile;
pub mod session;
pub mod usage;

// ── Primary re-exports ──────────────────────────────────────────────
pub use appliance::{
    Appliance, ConfigSyncApi, NodeApi, PoolApi, RouteDomainApi, SelfIpApi, StatisticsApi,
    VirtualServerApi, VlanApi,
};
pub use command::{
    Answer, ByteCounts, Command, Destination, IpAddressChange, IpAssocCommand,
    LoadBalancerConfigCommand, LoadBalancerRule,
};
pub use config::{DriverConfig, TlsVerification};
pub use driver::{Driver, HostType, StartupInfo, StatusPing};
pub use error::CoreError;
pub use session::{Connector, HttpConnector, SessionManager};
