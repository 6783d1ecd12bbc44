// Guest VLAN binding: VLAN, route domain (inline mode) and self address.
//
// Creation order is VLAN → route domain → self IP; deletion runs the
// reverse, after removing every virtual server that still balances into
// the VLAN.

use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::appliance::Appliance;
use crate::command::{IpAddressChange, IpAssocCommand};
use crate::error::{CoreError, PartialFailure};
use crate::naming::{same_subnet, strip_partition, tag_with_partition, vlan_name};

use super::{Reconciler, verify};

impl<A: Appliance + ?Sized> Reconciler<'_, A> {
    /// Apply every address change in order, saving after each one.
    ///
    /// On failure the error carries the results of the addresses that
    /// completed first.
    pub async fn ip_assoc(&self, cmd: &IpAssocCommand) -> Result<Vec<String>, PartialFailure> {
        let mut results = Vec::with_capacity(cmd.addresses.len());
        for change in &cmd.addresses {
            if let Err(error) = self.apply_address_change(change).await {
                return Err(PartialFailure {
                    completed: results,
                    error,
                });
            }
            results.push(format!("{} - success", change.public_ip));
        }
        Ok(results)
    }

    async fn apply_address_change(&self, change: &IpAddressChange) -> Result<(), CoreError> {
        let tag: u32 = change.vlan_id.trim().parse().map_err(|_| {
            CoreError::validation(format!(
                "invalid vlan id {:?} for {}",
                change.vlan_id, change.public_ip
            ))
        })?;
        prefix_len(&change.vlan_netmask)?;
        let self_ip = if self.inline {
            tag_with_partition(&change.vlan_gateway, tag)
        } else {
            change.vlan_gateway.clone()
        };

        self.delete_guest_vlan(tag, &self_ip, &change.vlan_netmask)
            .await?;
        if change.add {
            self.add_guest_vlan(tag, &self_ip, &change.vlan_netmask)
                .await?;
        }
        self.save_configuration().await?;
        info!(
            public_ip = %change.public_ip,
            vlan_tag = tag,
            add = change.add,
            "address association applied"
        );
        Ok(())
    }

    /// Create the VLAN, its route domain (inline mode) and the self IP,
    /// skipping whatever already exists.
    pub async fn add_guest_vlan(
        &self,
        tag: u32,
        self_ip: &str,
        netmask: &str,
    ) -> Result<(), CoreError> {
        let prefix_len = prefix_len(netmask)?;
        let vlan = vlan_name(tag);

        if !self.vlan_exists(&vlan).await? {
            debug!(vlan_tag = tag, vlan = %vlan, "creating vlan");
            self.appliance
                .create_vlan(&vlan, tag, self.private_interface)
                .await?;
            verify(self.vlan_exists(&vlan).await?, || {
                format!("failed to create vlan {vlan}")
            })?;
        }

        if self.inline && !self.route_domain_exists(tag).await? {
            debug!(vlan_tag = tag, "creating route domain");
            self.appliance
                .create_route_domain(tag, std::slice::from_ref(&vlan))
                .await?;
            verify(self.route_domain_exists(tag).await?, || {
                format!("failed to create route domain {tag}")
            })?;
        }

        if !self.self_ip_exists(self_ip).await? {
            debug!(vlan_tag = tag, self_ip, "creating self ip");
            self.appliance
                .create_self_ip(self_ip, prefix_len, &vlan)
                .await?;
            verify(self.self_ip_exists(self_ip).await?, || {
                format!("failed to create self ip {self_ip}")
            })?;
        }
        Ok(())
    }

    /// Tear down a guest VLAN binding. Missing pieces are skipped.
    pub async fn delete_guest_vlan(
        &self,
        tag: u32,
        self_ip: &str,
        netmask: &str,
    ) -> Result<(), CoreError> {
        prefix_len(netmask)?;
        self.delete_virtual_servers_in_guest_vlan(self_ip, netmask)
            .await?;

        if self.self_ip_exists(self_ip).await? {
            debug!(vlan_tag = tag, self_ip, "deleting self ip");
            self.appliance.delete_self_ip(self_ip).await?;
            verify(!self.self_ip_exists(self_ip).await?, || {
                format!("failed to delete self ip {self_ip}")
            })?;
        }

        if self.inline && self.route_domain_exists(tag).await? {
            debug!(vlan_tag = tag, "deleting route domain");
            self.appliance.delete_route_domain(tag).await?;
            verify(!self.route_domain_exists(tag).await?, || {
                format!("failed to delete route domain {tag}")
            })?;
        }

        let vlan = vlan_name(tag);
        if self.vlan_exists(&vlan).await? {
            debug!(vlan_tag = tag, vlan = %vlan, "deleting vlan");
            self.appliance.delete_vlan(&vlan).await?;
            verify(!self.vlan_exists(&vlan).await?, || {
                format!("failed to delete vlan {vlan}")
            })?;
        }
        Ok(())
    }

    /// Delete every virtual server whose pool has a member inside the
    /// self IP's subnet.
    async fn delete_virtual_servers_in_guest_vlan(
        &self,
        self_ip: &str,
        netmask: &str,
    ) -> Result<(), CoreError> {
        let self_ip = strip_partition(self_ip);
        let pools = self.appliance.list_pools().await?;

        let mut doomed = Vec::new();
        for server in self.appliance.list_virtual_servers().await? {
            if !pools.contains(&server) {
                continue;
            }
            let members = self.appliance.list_members(&server).await?;
            if members
                .iter()
                .any(|m| same_subnet(self_ip, &m.address, netmask))
            {
                doomed.push(server);
            }
        }

        for server in doomed {
            debug!(virtual_server = %server, "deleting virtual server inside guest vlan");
            self.delete_virtual_server_and_default_pool(&server).await?;
        }
        Ok(())
    }

    // ── Existence checks ─────────────────────────────────────────────

    async fn vlan_exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.appliance.list_vlans().await?.iter().any(|v| v == name))
    }

    async fn route_domain_exists(&self, id: u32) -> Result<bool, CoreError> {
        Ok(self.appliance.list_route_domains().await?.contains(&id))
    }

    async fn self_ip_exists(&self, address: &str) -> Result<bool, CoreError> {
        Ok(self
            .appliance
            .list_self_ips()
            .await?
            .iter()
            .any(|s| s == address))
    }
}

/// Prefix length of a dotted-quad netmask.
fn prefix_len(netmask: &str) -> Result<u8, CoreError> {
    let mask: Ipv4Addr = netmask
        .trim()
        .parse()
        .map_err(|_| CoreError::validation(format!("invalid netmask {netmask:?}")))?;
    ipnet::ipv4_mask_to_prefix(mask)
        .map_err(|_| CoreError::validation(format!("non-contiguous netmask {netmask}")))
}
