#![allow(dead_code, clippy::unwrap_used)]
// In-memory appliance for driving the reconciler and the driver in tests.
//
// Enforces the appliance's referential rules (a VLAN with a self IP cannot
// be deleted, a pool behind a virtual server cannot be deleted, members
// need an existing pool) and records every call so tests can assert on
// idempotence. Failures can be injected per operation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use bigip_api::{
    Error as ApiError, LbMode, MemberAddress, SaveMode, VirtualServerDefinition,
    VirtualServerStatistics,
};
use bigip_core::{
    ConfigSyncApi, Connector, CoreError, NodeApi, PoolApi, RouteDomainApi, SelfIpApi,
    StatisticsApi, VirtualServerApi, VlanApi,
};

// ── State ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakeVlan {
    pub tag: u32,
    pub interface: String,
}

#[derive(Debug, Clone)]
pub struct FakeSelfIp {
    pub prefix_len: u8,
    pub vlan: String,
}

#[derive(Debug, Clone)]
pub struct FakePool {
    pub mode: LbMode,
    pub members: Vec<MemberAddress>,
}

#[derive(Debug, Default)]
pub struct State {
    pub vlans: BTreeMap<String, FakeVlan>,
    pub self_ips: BTreeMap<String, FakeSelfIp>,
    pub route_domains: BTreeMap<u32, Vec<String>>,
    pub pools: BTreeMap<String, FakePool>,
    pub nodes: BTreeSet<String>,
    pub virtual_servers: BTreeMap<String, VirtualServerDefinition>,
    pub saves: Vec<SaveMode>,
    pub statistics: Vec<VirtualServerStatistics>,
}

/// Parks calls of one operation until the test releases them.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    calls: Mutex<BTreeMap<&'static str, usize>>,
    failures: Mutex<BTreeMap<&'static str, usize>>,
    swallowed: Mutex<BTreeSet<&'static str>>,
    gates: Mutex<BTreeMap<&'static str, Arc<Gate>>>,
}

/// Shared handle; clones see the same appliance.
#[derive(Clone, Default)]
pub struct FakeAppliance {
    inner: Arc<Inner>,
}

impl FakeAppliance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.state.lock().unwrap()
    }

    /// Number of times `op` was called.
    pub fn calls(&self, op: &str) -> usize {
        self.inner.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Sum of calls whose name starts with `create_`, `delete_`, `add_` or
    /// `remove_`.
    pub fn mutations(&self) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| {
                ["create_", "delete_", "add_", "remove_"]
                    .iter()
                    .any(|p| op.starts_with(p))
            })
            .map(|(_, n)| n)
            .sum()
    }

    pub fn reset_calls(&self) {
        self.inner.calls.lock().unwrap().clear();
    }

    /// Make the next `times` calls of `op` fail with HTTP 500.
    pub fn fail(&self, op: &'static str, times: usize) {
        self.inner.failures.lock().unwrap().insert(op, times);
    }

    /// Make `op` report success without changing anything.
    pub fn swallow(&self, op: &'static str) {
        self.inner.swallowed.lock().unwrap().insert(op);
    }

    /// Hold every call of `op` at the gate until `release` is notified.
    pub fn hold(&self, op: &'static str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.inner.gates.lock().unwrap().insert(op, Arc::clone(&gate));
        gate
    }

    async fn pass_gate(&self, op: &'static str) {
        let gate = self.inner.gates.lock().unwrap().get(op).cloned();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }

    /// Seed a member (and its node) without counting a call.
    pub fn seed_member(&self, pool: &str, member: MemberAddress) {
        let mut state = self.state();
        state.nodes.insert(member.address.clone());
        state
            .pools
            .entry(pool.to_owned())
            .or_insert_with(|| FakePool {
                mode: LbMode::RoundRobin,
                members: Vec::new(),
            })
            .members
            .push(member);
    }

    fn enter(&self, op: &'static str) -> Result<bool, ApiError> {
        *self.inner.calls.lock().unwrap().entry(op).or_default() += 1;
        let mut failures = self.inner.failures.lock().unwrap();
        if let Some(left) = failures.get_mut(op) {
            if *left > 0 {
                *left -= 1;
                return Err(api_error(500, &format!("injected failure in {op}")));
            }
        }
        Ok(!self.inner.swallowed.lock().unwrap().contains(op))
    }
}

fn api_error(status: u16, message: &str) -> ApiError {
    ApiError::Api {
        status,
        message: message.to_owned(),
    }
}

// ── Capability impls ─────────────────────────────────────────────────

#[async_trait]
impl VlanApi for FakeAppliance {
    async fn list_vlans(&self) -> Result<Vec<String>, ApiError> {
        self.enter("list_vlans")?;
        Ok(self.state().vlans.keys().cloned().collect())
    }

    async fn create_vlan(&self, name: &str, tag: u32, interface: &str) -> Result<(), ApiError> {
        if !self.enter("create_vlan")? {
            return Ok(());
        }
        let mut state = self.state();
        if state.vlans.contains_key(name) {
            return Err(api_error(409, &format!("vlan {name} already exists")));
        }
        state.vlans.insert(
            name.to_owned(),
            FakeVlan {
                tag,
                interface: interface.to_owned(),
            },
        );
        Ok(())
    }

    async fn delete_vlan(&self, name: &str) -> Result<(), ApiError> {
        if !self.enter("delete_vlan")? {
            return Ok(());
        }
        let mut state = self.state();
        if state.self_ips.values().any(|s| s.vlan == name) {
            return Err(api_error(400, &format!("{name} is referenced by a self IP")));
        }
        if state.route_domains.values().any(|v| v.iter().any(|n| n == name)) {
            return Err(api_error(400, &format!("{name} is in a route domain")));
        }
        state
            .vlans
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| api_error(404, "vlan not found"))
    }
}

#[async_trait]
impl SelfIpApi for FakeAppliance {
    async fn list_self_ips(&self) -> Result<Vec<String>, ApiError> {
        self.enter("list_self_ips")?;
        Ok(self.state().self_ips.keys().cloned().collect())
    }

    async fn create_self_ip(
        &self,
        address: &str,
        prefix_len: u8,
        vlan: &str,
    ) -> Result<(), ApiError> {
        if !self.enter("create_self_ip")? {
            return Ok(());
        }
        let mut state = self.state();
        if !state.vlans.contains_key(vlan) {
            return Err(api_error(400, &format!("vlan {vlan} does not exist")));
        }
        state.self_ips.insert(
            address.to_owned(),
            FakeSelfIp {
                prefix_len,
                vlan: vlan.to_owned(),
            },
        );
        Ok(())
    }

    async fn delete_self_ip(&self, address: &str) -> Result<(), ApiError> {
        if !self.enter("delete_self_ip")? {
            return Ok(());
        }
        self.state()
            .self_ips
            .remove(address)
            .map(|_| ())
            .ok_or_else(|| api_error(404, "self ip not found"))
    }
}

#[async_trait]
impl RouteDomainApi for FakeAppliance {
    async fn list_route_domains(&self) -> Result<Vec<u32>, ApiError> {
        self.enter("list_route_domains")?;
        Ok(self.state().route_domains.keys().copied().collect())
    }

    async fn create_route_domain(&self, id: u32, vlans: &[String]) -> Result<(), ApiError> {
        if !self.enter("create_route_domain")? {
            return Ok(());
        }
        self.state().route_domains.insert(id, vlans.to_vec());
        Ok(())
    }

    async fn delete_route_domain(&self, id: u32) -> Result<(), ApiError> {
        if !self.enter("delete_route_domain")? {
            return Ok(());
        }
        self.state()
            .route_domains
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| api_error(404, "route domain not found"))
    }
}

#[async_trait]
impl PoolApi for FakeAppliance {
    async fn list_pools(&self) -> Result<Vec<String>, ApiError> {
        self.enter("list_pools")?;
        Ok(self.state().pools.keys().cloned().collect())
    }

    async fn create_pool(&self, name: &str, mode: LbMode) -> Result<(), ApiError> {
        self.pass_gate("create_pool").await;
        if !self.enter("create_pool")? {
            return Ok(());
        }
        self.state().pools.insert(
            name.to_owned(),
            FakePool {
                mode,
                members: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_pool(&self, name: &str) -> Result<(), ApiError> {
        if !self.enter("delete_pool")? {
            return Ok(());
        }
        let mut state = self.state();
        if state
            .virtual_servers
            .values()
            .any(|v| v.default_pool == name)
        {
            return Err(api_error(400, &format!("pool {name} is in use")));
        }
        state
            .pools
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| api_error(404, "pool not found"))
    }

    async fn list_members(&self, pool: &str) -> Result<Vec<MemberAddress>, ApiError> {
        self.enter("list_members")?;
        self.state()
            .pools
            .get(pool)
            .map(|p| p.members.clone())
            .ok_or_else(|| api_error(404, &format!("pool {pool} not found")))
    }

    async fn add_member(&self, pool: &str, member: &MemberAddress) -> Result<(), ApiError> {
        if !self.enter("add_member")? {
            return Ok(());
        }
        let mut state = self.state();
        let Some(entry) = state.pools.get_mut(pool) else {
            return Err(api_error(404, &format!("pool {pool} not found")));
        };
        entry.members.push(member.clone());
        state.nodes.insert(member.address.clone());
        Ok(())
    }

    async fn remove_member(&self, pool: &str, member: &MemberAddress) -> Result<(), ApiError> {
        if !self.enter("remove_member")? {
            return Ok(());
        }
        let mut state = self.state();
        let Some(entry) = state.pools.get_mut(pool) else {
            return Err(api_error(404, &format!("pool {pool} not found")));
        };
        entry.members.retain(|m| m != member);
        Ok(())
    }
}

#[async_trait]
impl NodeApi for FakeAppliance {
    async fn list_nodes(&self) -> Result<Vec<String>, ApiError> {
        self.enter("list_nodes")?;
        Ok(self.state().nodes.iter().cloned().collect())
    }

    async fn delete_node(&self, address: &str) -> Result<(), ApiError> {
        if !self.enter("delete_node")? {
            return Ok(());
        }
        let mut state = self.state();
        if state
            .pools
            .values()
            .any(|p| p.members.iter().any(|m| m.address == address))
        {
            return Err(api_error(400, &format!("node {address} is referenced")));
        }
        state.nodes.remove(address);
        Ok(())
    }
}

#[async_trait]
impl VirtualServerApi for FakeAppliance {
    async fn list_virtual_servers(&self) -> Result<Vec<String>, ApiError> {
        self.enter("list_virtual_servers")?;
        Ok(self.state().virtual_servers.keys().cloned().collect())
    }

    async fn create_virtual_server(&self, def: &VirtualServerDefinition) -> Result<(), ApiError> {
        if !self.enter("create_virtual_server")? {
            return Ok(());
        }
        let mut state = self.state();
        if !state.pools.contains_key(&def.default_pool) {
            return Err(api_error(400, "default pool does not exist"));
        }
        state.virtual_servers.insert(def.name.clone(), def.clone());
        Ok(())
    }

    async fn delete_virtual_server(&self, name: &str) -> Result<(), ApiError> {
        if !self.enter("delete_virtual_server")? {
            return Ok(());
        }
        self.state()
            .virtual_servers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| api_error(404, "virtual server not found"))
    }
}

#[async_trait]
impl ConfigSyncApi for FakeAppliance {
    async fn save_configuration(&self, mode: SaveMode) -> Result<(), ApiError> {
        self.enter("save_configuration")?;
        self.state().saves.push(mode);
        Ok(())
    }
}

#[async_trait]
impl StatisticsApi for FakeAppliance {
    async fn virtual_server_statistics(&self) -> Result<Vec<VirtualServerStatistics>, ApiError> {
        self.enter("virtual_server_statistics")?;
        Ok(self.state().statistics.clone())
    }
}

// ── Connector ────────────────────────────────────────────────────────

/// Hands out the same fake appliance on every login, counting logins.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub appliance: FakeAppliance,
    connects: Arc<AtomicUsize>,
    failing_connects: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(appliance: FakeAppliance) -> Self {
        Self {
            appliance,
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Reject the next `times` logins.
    pub fn fail_connects(&self, times: usize) {
        self.failing_connects.store(times, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeAppliance;

    async fn connect(&self) -> Result<FakeAppliance, CoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_connects.store(failing - 1, Ordering::SeqCst);
            return Err(CoreError::Auth {
                message: "invalid credentials".into(),
            });
        }
        Ok(self.appliance.clone())
    }
}
