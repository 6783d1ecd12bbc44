// ── Appliance capabilities ──
//
// One trait per appliance subsystem. The reconciler only talks to these,
// so any backend that can list, create and delete the objects can be
// driven. `Appliance` is the union a session must provide.
//
// Listings return names (or ids) only: the reconciler re-derives
// existence from a fresh listing before and after each mutation.

use async_trait::async_trait;

use bigip_api::{
    ApplianceClient, Error as ApiError, LbMode, MemberAddress, SaveMode,
    VirtualServerDefinition, VirtualServerStatistics,
};

#[async_trait]
pub trait VlanApi: Send + Sync {
    async fn list_vlans(&self) -> Result<Vec<String>, ApiError>;
    async fn create_vlan(&self, name: &str, tag: u32, interface: &str) -> Result<(), ApiError>;
    async fn delete_vlan(&self, name: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait SelfIpApi: Send + Sync {
    /// Addresses (`ip[%rd]`) of every self IP.
    async fn list_self_ips(&self) -> Result<Vec<String>, ApiError>;
    async fn create_self_ip(&self, address: &str, prefix_len: u8, vlan: &str)
    -> Result<(), ApiError>;
    async fn delete_self_ip(&self, address: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait RouteDomainApi: Send + Sync {
    async fn list_route_domains(&self) -> Result<Vec<u32>, ApiError>;
    async fn create_route_domain(&self, id: u32, vlans: &[String]) -> Result<(), ApiError>;
    async fn delete_route_domain(&self, id: u32) -> Result<(), ApiError>;
}

#[async_trait]
pub trait PoolApi: Send + Sync {
    async fn list_pools(&self) -> Result<Vec<String>, ApiError>;
    async fn create_pool(&self, name: &str, mode: LbMode) -> Result<(), ApiError>;
    async fn delete_pool(&self, name: &str) -> Result<(), ApiError>;
    async fn list_members(&self, pool: &str) -> Result<Vec<MemberAddress>, ApiError>;
    async fn add_member(&self, pool: &str, member: &MemberAddress) -> Result<(), ApiError>;
    async fn remove_member(&self, pool: &str, member: &MemberAddress) -> Result<(), ApiError>;
}

#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Addresses of every node.
    async fn list_nodes(&self) -> Result<Vec<String>, ApiError>;
    async fn delete_node(&self, address: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait VirtualServerApi: Send + Sync {
    async fn list_virtual_servers(&self) -> Result<Vec<String>, ApiError>;
    async fn create_virtual_server(&self, def: &VirtualServerDefinition) -> Result<(), ApiError>;
    async fn delete_virtual_server(&self, name: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait ConfigSyncApi: Send + Sync {
    async fn save_configuration(&self, mode: SaveMode) -> Result<(), ApiError>;
}

#[async_trait]
pub trait StatisticsApi: Send + Sync {
    async fn virtual_server_statistics(&self) -> Result<Vec<VirtualServerStatistics>, ApiError>;
}

/// Everything the driver needs from one authenticated session.
pub trait Appliance:
    VlanApi
    + SelfIpApi
    + RouteDomainApi
    + PoolApi
    + NodeApi
    + VirtualServerApi
    + ConfigSyncApi
    + StatisticsApi
{
}

impl<T> Appliance for T where
    T: VlanApi
        + SelfIpApi
        + RouteDomainApi
        + PoolApi
        + NodeApi
        + VirtualServerApi
        + ConfigSyncApi
        + StatisticsApi
{
}

// ── HTTP client implementation ───────────────────────────────────────

#[async_trait]
impl VlanApi for ApplianceClient {
    async fn list_vlans(&self) -> Result<Vec<String>, ApiError> {
        let vlans = ApplianceClient::list_vlans(self).await?;
        Ok(vlans.into_iter().map(|v| v.name).collect())
    }

    async fn create_vlan(&self, name: &str, tag: u32, interface: &str) -> Result<(), ApiError> {
        ApplianceClient::create_vlan(self, name, tag, interface).await
    }

    async fn delete_vlan(&self, name: &str) -> Result<(), ApiError> {
        ApplianceClient::delete_vlan(self, name).await
    }
}

#[async_trait]
impl SelfIpApi for ApplianceClient {
    async fn list_self_ips(&self) -> Result<Vec<String>, ApiError> {
        let self_ips = ApplianceClient::list_self_ips(self).await?;
        Ok(self_ips
            .into_iter()
            .map(|s| match s.address.split_once('/') {
                Some((address, _)) => address.to_owned(),
                None => s.address,
            })
            .collect())
    }

    async fn create_self_ip(
        &self,
        address: &str,
        prefix_len: u8,
        vlan: &str,
    ) -> Result<(), ApiError> {
        ApplianceClient::create_self_ip(self, address, prefix_len, vlan).await
    }

    async fn delete_self_ip(&self, address: &str) -> Result<(), ApiError> {
        ApplianceClient::delete_self_ip(self, address).await
    }
}

#[async_trait]
impl RouteDomainApi for ApplianceClient {
    async fn list_route_domains(&self) -> Result<Vec<u32>, ApiError> {
        let domains = ApplianceClient::list_route_domains(self).await?;
        Ok(domains.into_iter().map(|d| d.id).collect())
    }

    async fn create_route_domain(&self, id: u32, vlans: &[String]) -> Result<(), ApiError> {
        ApplianceClient::create_route_domain(self, id, vlans).await
    }

    async fn delete_route_domain(&self, id: u32) -> Result<(), ApiError> {
        ApplianceClient::delete_route_domain(self, id).await
    }
}

#[async_trait]
impl PoolApi for ApplianceClient {
    async fn list_pools(&self) -> Result<Vec<String>, ApiError> {
        let pools = ApplianceClient::list_pools(self).await?;
        Ok(pools.into_iter().map(|p| p.name).collect())
    }

    async fn create_pool(&self, name: &str, mode: LbMode) -> Result<(), ApiError> {
        ApplianceClient::create_pool(self, name, mode).await
    }

    async fn delete_pool(&self, name: &str) -> Result<(), ApiError> {
        ApplianceClient::delete_pool(self, name).await
    }

    async fn list_members(&self, pool: &str) -> Result<Vec<MemberAddress>, ApiError> {
        self.list_pool_members(pool).await
    }

    async fn add_member(&self, pool: &str, member: &MemberAddress) -> Result<(), ApiError> {
        self.add_pool_member(pool, member).await
    }

    async fn remove_member(&self, pool: &str, member: &MemberAddress) -> Result<(), ApiError> {
        self.remove_pool_member(pool, member).await
    }
}

#[async_trait]
impl NodeApi for ApplianceClient {
    async fn list_nodes(&self) -> Result<Vec<String>, ApiError> {
        let nodes = ApplianceClient::list_nodes(self).await?;
        Ok(nodes
            .into_iter()
            .map(|n| n.address.unwrap_or(n.name))
            .collect())
    }

    async fn delete_node(&self, address: &str) -> Result<(), ApiError> {
        ApplianceClient::delete_node(self, address).await
    }
}

#[async_trait]
impl VirtualServerApi for ApplianceClient {
    async fn list_virtual_servers(&self) -> Result<Vec<String>, ApiError> {
        let servers = ApplianceClient::list_virtual_servers(self).await?;
        Ok(servers.into_iter().map(|v| v.name).collect())
    }

    async fn create_virtual_server(&self, def: &VirtualServerDefinition) -> Result<(), ApiError> {
        ApplianceClient::create_virtual_server(self, def).await
    }

    async fn delete_virtual_server(&self, name: &str) -> Result<(), ApiError> {
        ApplianceClient::delete_virtual_server(self, name).await
    }
}

#[async_trait]
impl ConfigSyncApi for ApplianceClient {
    async fn save_configuration(&self, mode: SaveMode) -> Result<(), ApiError> {
        ApplianceClient::save_configuration(self, mode).await
    }
}

#[async_trait]
impl StatisticsApi for ApplianceClient {
    async fn virtual_server_statistics(&self) -> Result<Vec<VirtualServerStatistics>, ApiError> {
        ApplianceClient::virtual_server_statistics(self).await
    }
}
