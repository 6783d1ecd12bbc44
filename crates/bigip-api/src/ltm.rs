// Local traffic endpoints: pools, members, nodes, virtual servers, stats
//
// `/mgmt/tm/ltm/{pool,node,virtual}`. A pool's members are a
// sub-collection of the pool; nodes are created implicitly by the
// appliance when a member is added and must be removed explicitly.

use serde_json::json;
use tracing::debug;

use crate::client::{ApplianceClient, object_id};
use crate::error::Error;
use crate::models::{
    LbMode, MemberAddress, Node, Pool, PoolMemberItem, StatisticsSnapshot, VirtualServer,
    VirtualServerDefinition, VirtualServerStatistics,
};

impl ApplianceClient {
    // ── Pools ────────────────────────────────────────────────────────

    /// `GET /mgmt/tm/ltm/pool`
    pub async fn list_pools(&self) -> Result<Vec<Pool>, Error> {
        let url = self.collection_url("ltm", "pool")?;
        self.list(url).await
    }

    /// Create an empty pool.
    pub async fn create_pool(&self, name: &str, mode: LbMode) -> Result<(), Error> {
        let url = self.collection_url("ltm", "pool")?;
        debug!(name, ?mode, "creating pool");
        self.post(
            url,
            &json!({
                "name": name,
                "loadBalancingMode": mode,
                "members": [],
            }),
        )
        .await
    }

    /// `DELETE /mgmt/tm/ltm/pool/~Common~{name}`
    pub async fn delete_pool(&self, name: &str) -> Result<(), Error> {
        let url = self.object_url("ltm", "pool", name)?;
        debug!(name, "deleting pool");
        self.delete(url).await
    }

    // ── Pool members ─────────────────────────────────────────────────

    fn members_url(&self, pool: &str) -> Result<url::Url, Error> {
        let pool_id = object_id(pool);
        self.mgmt_url(&["tm", "ltm", "pool", &pool_id, "members"])
    }

    /// List a pool's members. Entries whose name carries no numeric port
    /// (wildcard members) are skipped.
    pub async fn list_pool_members(&self, pool: &str) -> Result<Vec<MemberAddress>, Error> {
        let url = self.members_url(pool)?;
        let items: Vec<PoolMemberItem> = self.list(url).await?;
        Ok(items.iter().filter_map(PoolMemberItem::to_member).collect())
    }

    /// Add `member` to `pool`.
    pub async fn add_pool_member(&self, pool: &str, member: &MemberAddress) -> Result<(), Error> {
        let url = self.members_url(pool)?;
        debug!(pool, %member, "adding pool member");
        self.post(
            url,
            &json!({
                "name": member.to_string(),
                "address": member.address,
            }),
        )
        .await
    }

    /// Remove `member` from `pool`. The node record stays behind.
    pub async fn remove_pool_member(
        &self,
        pool: &str,
        member: &MemberAddress,
    ) -> Result<(), Error> {
        let pool_id = object_id(pool);
        let member_id = object_id(&member.to_string());
        let url = self.mgmt_url(&["tm", "ltm", "pool", &pool_id, "members", &member_id])?;
        debug!(pool, %member, "removing pool member");
        self.delete(url).await
    }

    // ── Nodes ────────────────────────────────────────────────────────

    /// `GET /mgmt/tm/ltm/node`
    pub async fn list_nodes(&self) -> Result<Vec<Node>, Error> {
        let url = self.collection_url("ltm", "node")?;
        self.list(url).await
    }

    /// `DELETE /mgmt/tm/ltm/node/~Common~{address}`
    pub async fn delete_node(&self, address: &str) -> Result<(), Error> {
        let url = self.object_url("ltm", "node", address)?;
        debug!(address, "deleting node");
        self.delete(url).await
    }

    // ── Virtual servers ──────────────────────────────────────────────

    /// `GET /mgmt/tm/ltm/virtual`
    pub async fn list_virtual_servers(&self) -> Result<Vec<VirtualServer>, Error> {
        let url = self.collection_url("ltm", "virtual")?;
        self.list(url).await
    }

    /// Create a virtual server bound to its default pool.
    pub async fn create_virtual_server(&self, def: &VirtualServerDefinition) -> Result<(), Error> {
        let url = self.collection_url("ltm", "virtual")?;
        debug!(name = %def.name, address = %def.address, port = def.port, "creating virtual server");

        let mut body = json!({
            "name": def.name,
            "destination": format!("{}:{}", def.address, def.port),
            "mask": def.mask,
            "ipProtocol": def.protocol,
            "pool": def.default_pool,
            "profiles": [{ "name": def.profile, "context": "all" }],
        });
        if def.snat_automap {
            body["sourceAddressTranslation"] = json!({ "type": "automap" });
        }
        self.post(url, &body).await
    }

    /// `DELETE /mgmt/tm/ltm/virtual/~Common~{name}`
    pub async fn delete_virtual_server(&self, name: &str) -> Result<(), Error> {
        let url = self.object_url("ltm", "virtual", name)?;
        debug!(name, "deleting virtual server");
        self.delete(url).await
    }

    // ── Statistics ───────────────────────────────────────────────────

    /// Snapshot of every virtual server's counters.
    ///
    /// `GET /mgmt/tm/ltm/virtual/statistics`
    pub async fn virtual_server_statistics(&self) -> Result<Vec<VirtualServerStatistics>, Error> {
        let url = self.mgmt_url(&["tm", "ltm", "virtual", "statistics"])?;
        let snapshot: StatisticsSnapshot = self.get(url).await?;
        Ok(snapshot.statistics)
    }
}
