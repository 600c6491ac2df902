//! Storage pools imported from managed storage systems

use anyhow::Result;
use serde_json::Value;

use super::requests::AddStoragePool;
use super::Storage;
use crate::appliance::client::Outcome;
use crate::appliance::http::RequestOptions;
use crate::resource::{with_force, ListQuery};
use crate::WaitMode;

impl Storage<'_> {
    /// Filter and sort on `name`, `domain`, `deviceType`, `deviceSpeed`,
    /// `supportedRAIDLevel`, `status` and `state`
    pub async fn get_storage_pools(&self, query: &ListQuery) -> Result<Vec<Value>> {
        self.list("storage-pools", &[], query).await
    }

    /// Import the pool `name` of the storage system at `system_uri`
    pub async fn add_storage_pool(
        &self,
        name: &str,
        system_uri: &str,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let request = AddStoragePool {
            storage_system_uri: system_uri.to_string(),
            pool_name: name.to_string(),
        };
        let path = self.url("storage-pools", &[])?;
        self.create(&path, &request, &RequestOptions::new(), wait)
            .await
    }

    pub async fn get_storage_pool_by_id(&self, pool_id: &str) -> Result<Value> {
        self.get("storage-pools", &[pool_id]).await
    }

    pub async fn remove_storage_pool(
        &self,
        pool_id: &str,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let path = with_force(&self.url("storage-pools", &[pool_id])?, force);
        self.remove(&path, &RequestOptions::new(), wait).await
    }
}
