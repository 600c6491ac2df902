//! Networking facade
//!
//! Only Fibre Channel networks are covered.

mod fc;

use anyhow::Result;
use serde_json::Value;

use crate::appliance::client::{Follow, OneViewClient, Outcome};
use crate::appliance::http::RequestOptions;
use crate::resource::{fetch_list, resource_url, with_force, ListQuery};
use crate::storage::resource_uri;
use crate::WaitMode;

pub use fc::{
    FabricType, FcNetworkRequest, DEFAULT_LINK_STABILITY_SECS, DEFAULT_MAXIMUM_BANDWIDTH_GBPS,
    DEFAULT_TYPICAL_BANDWIDTH_GBPS, FC_NETWORK_TYPE,
};

/// Network endpoints of one appliance
#[derive(Clone, Copy)]
pub struct Networking<'a> {
    client: &'a OneViewClient,
}

impl<'a> Networking<'a> {
    pub fn new(client: &'a OneViewClient) -> Self {
        Self { client }
    }

    fn url(&self, segments: &[&str]) -> Result<String> {
        resource_url("fc-networks", segments)
    }

    /// FC networks, across pages unless `query` sizes one page
    pub async fn get_fc_networks(&self, query: &ListQuery) -> Result<Vec<Value>> {
        fetch_list(self.client, &self.url(&[])?, query).await
    }

    pub async fn get_fc_network_by_id(&self, network_id: &str) -> Result<Value> {
        self.client.get(&self.url(&[network_id])?).await
    }

    /// Validate and create an FC network
    pub async fn create_fc_network(
        &self,
        request: &FcNetworkRequest,
        wait: WaitMode,
    ) -> Result<Outcome> {
        request.validate()?;
        tracing::info!("Creating FC network {} ({})", request.name, request.fabric_type);
        let submitted = self
            .client
            .post(&self.url(&[])?, request, &RequestOptions::new())
            .await?;
        self.client.complete(submitted, wait, Follow::Resource).await
    }

    /// PUT `network` back to its own `uri`
    pub async fn update_fc_network(&self, network: &Value, wait: WaitMode) -> Result<Outcome> {
        let uri = resource_uri(network)?;
        let submitted = self
            .client
            .put(uri, network, &RequestOptions::new())
            .await?;
        self.client.complete(submitted, wait, Follow::Resource).await
    }

    pub async fn delete_fc_network(
        &self,
        network_id: &str,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let path = with_force(&self.url(&[network_id])?, force);
        tracing::info!("Deleting FC network {}", network_id);
        let submitted = self.client.delete(&path, &RequestOptions::new()).await?;
        self.client.complete(submitted, wait, Follow::Nothing).await
    }
}
