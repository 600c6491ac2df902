//! Storage systems: disk arrays such as HP 3PAR StoreServ

use anyhow::Result;
use serde_json::Value;

use super::requests::AddStorageSystem;
use super::Storage;
use crate::appliance::client::Outcome;
use crate::appliance::http::RequestOptions;
use crate::resource::{with_force, ListQuery};
use crate::WaitMode;

impl Storage<'_> {
    /// All managed storage systems
    ///
    /// Filter and sort on `name`, `model`, `serialNumber`, `firmware`,
    /// `status`, `managedDomain` and `state`.
    pub async fn get_storage_systems(&self, query: &ListQuery) -> Result<Vec<Value>> {
        self.list("storage-systems", &[], query).await
    }

    /// Add a storage system for management
    ///
    /// The new system is left in the `Connected` state; a follow-up update is
    /// needed to finish managing it.
    pub async fn add_storage_system(
        &self,
        host: &str,
        user: &str,
        password: &str,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let request = AddStorageSystem {
            ip_hostname: host.to_string(),
            username: user.to_string(),
            password: password.to_string(),
        };
        tracing::info!("Adding storage system {}", host);
        let path = self.url("storage-systems", &[])?;
        self.create(&path, &request, &RequestOptions::new(), wait)
            .await
    }

    pub async fn get_storage_systems_host_types(&self) -> Result<Value> {
        self.get("host-types", &[]).await
    }

    /// Pools belonging to one storage system
    pub async fn get_storage_pools_in_storage_system(
        &self,
        system_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<Value>> {
        self.list("system-pools", &[system_id], query)
            .await
    }

    pub async fn get_storage_system_by_id(&self, system_id: &str) -> Result<Value> {
        self.get("storage-systems", &[system_id]).await
    }

    /// Update credentials or attributes, or request a refresh by setting
    /// `refreshState` to `RefreshPending`
    pub async fn update_storage_system(
        &self,
        system: &Value,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        self.update(system, force, wait).await
    }

    pub async fn remove_storage_system(
        &self,
        system_id: &str,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let path = with_force(&self.url("storage-systems", &[system_id])?, force);
        tracing::info!("Removing storage system {}", system_id);
        self.remove(&path, &RequestOptions::new(), wait).await
    }

    /// Managed target ports of one storage system
    pub async fn get_storage_system_managed_ports(
        &self,
        system_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<Value>> {
        self.list("managed-ports", &[system_id], query)
            .await
    }

    pub async fn get_storage_system_managed_port_by_id(
        &self,
        system_id: &str,
        port_id: &str,
    ) -> Result<Value> {
        self.get("managed-ports", &[system_id, port_id])
            .await
    }
}
