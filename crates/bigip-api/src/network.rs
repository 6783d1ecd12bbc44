// Network endpoints: VLANs, self IPs, route domains
//
// `/mgmt/tm/net/{vlan,self,route-domain}`. Objects the driver creates are
// named deterministically by the caller; listings return those names.

use serde_json::json;
use tracing::debug;

use crate::client::ApplianceClient;
use crate::error::Error;
use crate::models::{RouteDomain, SelfIp, Vlan};

impl ApplianceClient {
    // ── VLANs ────────────────────────────────────────────────────────

    /// `GET /mgmt/tm/net/vlan`
    pub async fn list_vlans(&self) -> Result<Vec<Vlan>, Error> {
        let url = self.collection_url("net", "vlan")?;
        self.list(url).await
    }

    /// Create a VLAN with a single tagged member interface.
    ///
    /// `POST /mgmt/tm/net/vlan`
    pub async fn create_vlan(&self, name: &str, tag: u32, interface: &str) -> Result<(), Error> {
        let url = self.collection_url("net", "vlan")?;
        debug!(name, tag, interface, "creating vlan");
        self.post(
            url,
            &json!({
                "name": name,
                "tag": tag,
                "interfaces": [{ "name": interface, "tagged": true }],
            }),
        )
        .await
    }

    /// `DELETE /mgmt/tm/net/vlan/~Common~{name}`
    pub async fn delete_vlan(&self, name: &str) -> Result<(), Error> {
        let url = self.object_url("net", "vlan", name)?;
        debug!(name, "deleting vlan");
        self.delete(url).await
    }

    // ── Self IPs ─────────────────────────────────────────────────────

    /// `GET /mgmt/tm/net/self`
    pub async fn list_self_ips(&self) -> Result<Vec<SelfIp>, Error> {
        let url = self.collection_url("net", "self")?;
        self.list(url).await
    }

    /// Create a self IP named after its address.
    ///
    /// `address` is `ip[%rd]`, `prefix_len` the netmask length.
    pub async fn create_self_ip(
        &self,
        address: &str,
        prefix_len: u8,
        vlan: &str,
    ) -> Result<(), Error> {
        let url = self.collection_url("net", "self")?;
        debug!(address, prefix_len, vlan, "creating self ip");
        self.post(
            url,
            &json!({
                "name": address,
                "address": format!("{address}/{prefix_len}"),
                "vlan": vlan,
                "floating": "disabled",
                "unit": 0,
            }),
        )
        .await
    }

    /// `DELETE /mgmt/tm/net/self/~Common~{address}`
    pub async fn delete_self_ip(&self, address: &str) -> Result<(), Error> {
        let url = self.object_url("net", "self", address)?;
        debug!(address, "deleting self ip");
        self.delete(url).await
    }

    // ── Route domains ────────────────────────────────────────────────

    /// `GET /mgmt/tm/net/route-domain`
    pub async fn list_route_domains(&self) -> Result<Vec<RouteDomain>, Error> {
        let url = self.collection_url("net", "route-domain")?;
        self.list(url).await
    }

    /// Create route domain `id` containing `vlans`.
    pub async fn create_route_domain(&self, id: u32, vlans: &[String]) -> Result<(), Error> {
        let url = self.collection_url("net", "route-domain")?;
        debug!(id, ?vlans, "creating route domain");
        self.post(
            url,
            &json!({
                "name": id.to_string(),
                "id": id,
                "vlans": vlans,
            }),
        )
        .await
    }

    /// `DELETE /mgmt/tm/net/route-domain/~Common~{id}`
    pub async fn delete_route_domain(&self, id: u32) -> Result<(), Error> {
        let url = self.object_url("net", "route-domain", &id.to_string())?;
        debug!(id, "deleting route domain");
        self.delete(url).await
    }
}
