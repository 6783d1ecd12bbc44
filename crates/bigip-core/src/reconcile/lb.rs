// Load-balancer convergence: pools, members, nodes and virtual servers.
//
// A rule is keyed by its virtual server name. An active rule with at
// least one live destination gets a pool whose members are exactly the
// live destinations, fronted by a virtual server of the same name; any
// other rule has both removed.

use std::collections::BTreeSet;

use bigip_api::{IpProtocol, LbMode, MemberAddress, VirtualServerDefinition};
use tracing::{debug, info};

use crate::appliance::Appliance;
use crate::command::{LoadBalancerConfigCommand, LoadBalancerRule};
use crate::error::CoreError;
use crate::naming::{member_key, tag_with_partition, virtual_server_name};

use super::{Reconciler, verify};

/// Virtual servers answer on exactly one address.
const HOST_MASK: &str = "255.255.255.255";

// ── Protocol and algorithm tables ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LbProtocol {
    Tcp,
    Udp,
}

impl LbProtocol {
    pub fn ip_protocol(self) -> IpProtocol {
        match self {
            Self::Tcp => IpProtocol::Tcp,
            Self::Udp => IpProtocol::Udp,
        }
    }

    /// Profile attached to virtual servers of this protocol.
    pub fn profile(self) -> &'static str {
        match self {
            Self::Tcp => "http",
            Self::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum LbAlgorithm {
    #[strum(serialize = "roundrobin")]
    RoundRobin,
    #[strum(serialize = "leastconn")]
    LeastConn,
}

/// Device settings for one algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmParams {
    pub mode: LbMode,
    pub persistence_profile: Option<&'static str>,
}

impl LbAlgorithm {
    pub fn params(self) -> AlgorithmParams {
        match self {
            Self::RoundRobin => AlgorithmParams {
                mode: LbMode::RoundRobin,
                persistence_profile: None,
            },
            Self::LeastConn => AlgorithmParams {
                mode: LbMode::LeastConnectionsMember,
                persistence_profile: None,
            },
        }
    }

    /// Mode a new pool is created with. A persistence profile pins the
    /// pool to round-robin.
    pub fn pool_mode(self) -> LbMode {
        let params = self.params();
        if params.persistence_profile.is_some() {
            LbMode::RoundRobin
        } else {
            params.mode
        }
    }
}

/// A validated rule, with every address already qualified for the
/// driver's mode.
#[derive(Debug)]
struct RulePlan {
    name: String,
    protocol: LbProtocol,
    algorithm: LbAlgorithm,
    address: String,
    port: u16,
    members: Vec<MemberAddress>,
    active: bool,
}

impl<A: Appliance + ?Sized> Reconciler<'_, A> {
    /// Converge every rule, then save once.
    ///
    /// All rules are validated before the first one touches the appliance.
    pub async fn apply_load_balancers(
        &self,
        cmd: &LoadBalancerConfigCommand,
    ) -> Result<(), CoreError> {
        let plans = cmd
            .rules
            .iter()
            .map(|rule| self.plan_rule(rule, cmd.guest_vlan_tag))
            .collect::<Result<Vec<_>, _>>()?;

        for plan in &plans {
            if plan.active {
                self.converge_rule(plan).await?;
            } else {
                debug!(virtual_server = %plan.name, "rule inactive; removing");
                self.delete_virtual_server_and_default_pool(&plan.name)
                    .await?;
            }
        }

        self.save_configuration().await?;
        info!(rules = plans.len(), "load balancer configuration applied");
        Ok(())
    }

    fn plan_rule(&self, rule: &LoadBalancerRule, vlan_tag: u32) -> Result<RulePlan, CoreError> {
        let protocol_name = rule.protocol.as_deref().unwrap_or("tcp");
        let protocol: LbProtocol = protocol_name.parse().map_err(|_| {
            CoreError::validation(format!("unsupported protocol {protocol_name:?}"))
        })?;
        let algorithm: LbAlgorithm = rule.algorithm.parse().map_err(|_| {
            CoreError::validation(format!(
                "unsupported load balancing algorithm {:?}",
                rule.algorithm
            ))
        })?;

        let qualify = |ip: &str| {
            if self.inline {
                tag_with_partition(ip, vlan_tag)
            } else {
                ip.to_owned()
            }
        };

        let members: Vec<MemberAddress> = rule
            .destinations
            .iter()
            .filter(|d| !d.revoked)
            .map(|d| MemberAddress::new(qualify(&d.dest_ip), d.dest_port))
            .collect();
        let address = qualify(&rule.src_ip);

        Ok(RulePlan {
            name: virtual_server_name(&protocol.to_string(), &address, rule.src_port),
            protocol,
            algorithm,
            active: !rule.revoked && !members.is_empty(),
            address,
            port: rule.src_port,
            members,
        })
    }

    async fn converge_rule(&self, plan: &RulePlan) -> Result<(), CoreError> {
        self.ensure_pool(&plan.name, plan.algorithm).await?;

        for member in &plan.members {
            self.add_pool_member(&plan.name, member).await?;
        }

        let active: BTreeSet<String> = plan
            .members
            .iter()
            .map(|m| member_key(&m.address, m.port))
            .collect();
        for member in self.appliance.list_members(&plan.name).await? {
            if !active.contains(&member_key(&member.address, member.port)) {
                self.delete_pool_member(&plan.name, &member).await?;
            }
        }

        self.ensure_virtual_server(plan).await
    }

    // ── Pools ────────────────────────────────────────────────────────

    async fn ensure_pool(&self, name: &str, algorithm: LbAlgorithm) -> Result<(), CoreError> {
        if self.pool_exists(name).await? {
            return Ok(());
        }
        let mode = algorithm.pool_mode();
        debug!(pool = name, ?mode, "creating pool");
        self.appliance.create_pool(name, mode).await?;
        verify(self.pool_exists(name).await?, || {
            format!("failed to create pool {name}")
        })
    }

    /// Delete `name` once it has no members left.
    async fn delete_pool(&self, name: &str) -> Result<(), CoreError> {
        if !self.pool_exists(name).await? {
            return Ok(());
        }
        if !self.appliance.list_members(name).await?.is_empty() {
            debug!(pool = name, "pool still has members; keeping it");
            return Ok(());
        }
        debug!(pool = name, "deleting pool");
        self.appliance.delete_pool(name).await?;
        verify(!self.pool_exists(name).await?, || {
            format!("failed to delete pool {name}")
        })
    }

    // ── Members and nodes ────────────────────────────────────────────

    async fn add_pool_member(&self, pool: &str, member: &MemberAddress) -> Result<(), CoreError> {
        if !self.pool_exists(pool).await? || self.member_exists(pool, member).await? {
            return Ok(());
        }
        debug!(pool, member = %member, "adding pool member");
        self.appliance.add_member(pool, member).await?;
        verify(self.member_exists(pool, member).await?, || {
            format!("failed to add member {member} to pool {pool}")
        })
    }

    /// Remove `member` from `pool`, then its node when no pool on the
    /// appliance still references the node's address.
    async fn delete_pool_member(
        &self,
        pool: &str,
        member: &MemberAddress,
    ) -> Result<(), CoreError> {
        let pools = self.appliance.list_pools().await?;
        if !pools.iter().any(|p| p == pool) || !self.member_exists(pool, member).await? {
            return Ok(());
        }

        debug!(pool, member = %member, "removing pool member");
        self.appliance.remove_member(pool, member).await?;
        verify(!self.member_exists(pool, member).await?, || {
            format!("failed to remove member {member} from pool {pool}")
        })?;

        let address = member.address.as_str();
        if !self.node_exists(address).await? || self.node_in_use(&pools, address).await? {
            return Ok(());
        }
        debug!(node = address, "deleting unreferenced node");
        self.appliance.delete_node(address).await?;
        verify(!self.node_exists(address).await?, || {
            format!("failed to delete node {address}")
        })
    }

    async fn node_in_use(&self, pools: &[String], address: &str) -> Result<bool, CoreError> {
        for pool in pools {
            let members = self.appliance.list_members(pool).await?;
            if members.iter().any(|m| m.address == address) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── Virtual servers ──────────────────────────────────────────────

    async fn ensure_virtual_server(&self, plan: &RulePlan) -> Result<(), CoreError> {
        if self.virtual_server_exists(&plan.name).await? {
            return Ok(());
        }
        let def = VirtualServerDefinition {
            name: plan.name.clone(),
            address: plan.address.clone(),
            port: plan.port,
            protocol: plan.protocol.ip_protocol(),
            mask: HOST_MASK.into(),
            default_pool: plan.name.clone(),
            profile: plan.protocol.profile().into(),
            snat_automap: true,
        };
        debug!(virtual_server = %def.name, "creating virtual server");
        self.appliance.create_virtual_server(&def).await?;
        verify(self.virtual_server_exists(&plan.name).await?, || {
            format!("failed to create virtual server {}", plan.name)
        })
    }

    /// Remove a virtual server together with its same-named pool, the
    /// pool's members, and any nodes they leave unreferenced.
    pub async fn delete_virtual_server_and_default_pool(
        &self,
        name: &str,
    ) -> Result<(), CoreError> {
        if self.pool_exists(name).await? {
            for member in self.appliance.list_members(name).await? {
                self.delete_pool_member(name, &member).await?;
            }
        }

        if self.virtual_server_exists(name).await? {
            debug!(virtual_server = name, "deleting virtual server");
            self.appliance.delete_virtual_server(name).await?;
            verify(!self.virtual_server_exists(name).await?, || {
                format!("failed to delete virtual server {name}")
            })?;
        }

        self.delete_pool(name).await
    }

    // ── Existence checks ─────────────────────────────────────────────

    async fn pool_exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.appliance.list_pools().await?.iter().any(|p| p == name))
    }

    async fn member_exists(&self, pool: &str, member: &MemberAddress) -> Result<bool, CoreError> {
        Ok(self.appliance.list_members(pool).await?.contains(member))
    }

    async fn node_exists(&self, address: &str) -> Result<bool, CoreError> {
        Ok(self
            .appliance
            .list_nodes()
            .await?
            .iter()
            .any(|n| n == address))
    }

    async fn virtual_server_exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self
            .appliance
            .list_virtual_servers()
            .await?
            .iter()
            .any(|v| v == name))
    }
}
