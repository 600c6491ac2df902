//! Storage facade
//!
//! One method per storage endpoint: storage systems, storage pools, volume
//! attachments, volume templates, volumes and snapshots. Mutating methods
//! take a [`WaitMode`]; in [`WaitMode::Blocking`] they hand the submitted
//! task to the poller and return the resource it created or modified.
//!
//! # Example
//!
//! ```ignore
//! use oneview::storage::Storage;
//! use oneview::WaitMode;
//!
//! let storage = Storage::new(&client);
//! let outcome = storage
//!     .add_storage_pool("FST_CPG1", "/rest/storage-systems/TXQ1000307", WaitMode::Blocking)
//!     .await?;
//! ```

mod attachments;
mod pools;
pub mod requests;
mod systems;
mod templates;
mod volumes;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::appliance::client::{Follow, OneViewClient, Outcome};
use crate::appliance::http::RequestOptions;
use crate::resource::{fetch_list, resource_url, with_force, ListQuery};
use crate::WaitMode;

pub use requests::{
    AddStoragePool, AddStorageSystem, AddStorageVolume, AlertFixType, ProvisionType,
    RepairRequest, SnapshotRequest, StorageVolumeTemplateRequest,
};

/// Storage endpoints of one appliance
#[derive(Clone, Copy)]
pub struct Storage<'a> {
    client: &'a OneViewClient,
}

impl<'a> Storage<'a> {
    pub fn new(client: &'a OneViewClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &'a OneViewClient {
        self.client
    }

    /// `/rest/<resource>/<segments...>`; nested resources take the parent id first
    fn url(&self, key: &str, segments: &[&str]) -> Result<String> {
        resource_url(key, segments)
    }

    /// Members of a collection, across pages unless `query` sizes one page
    async fn list(&self, key: &str, segments: &[&str], query: &ListQuery) -> Result<Vec<Value>> {
        let path = self.url(key, segments)?;
        fetch_list(self.client, &path, query).await
    }

    async fn get(&self, key: &str, segments: &[&str]) -> Result<Value> {
        let path = self.url(key, segments)?;
        self.client.get(&path).await
    }

    async fn create<B: Serialize>(
        &self,
        path: &str,
        request: &B,
        options: &RequestOptions,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let submitted = self.client.post(path, request, options).await?;
        self.client.complete(submitted, wait, Follow::Resource).await
    }

    /// PUT `resource` back to its own `uri`
    async fn update(&self, resource: &Value, force: bool, wait: WaitMode) -> Result<Outcome> {
        let uri = resource_uri(resource)?;
        let submitted = self
            .client
            .put(&with_force(uri, force), resource, &RequestOptions::new())
            .await?;
        self.client.complete(submitted, wait, Follow::Resource).await
    }

    async fn remove(&self, path: &str, options: &RequestOptions, wait: WaitMode) -> Result<Outcome> {
        let submitted = self.client.delete(path, options).await?;
        self.client.complete(submitted, wait, Follow::Nothing).await
    }
}

/// The `uri` every persisted resource carries
pub fn resource_uri(resource: &Value) -> Result<&str> {
    resource
        .get("uri")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .context("Resource has no uri")
}

/// Headers the volume template endpoints are called with
fn template_options() -> RequestOptions {
    RequestOptions::new()
        .header("Accept-Language", "en")
        .header("Accept-Encoding", "deflate")
}
