//! Storage volume templates

use anyhow::Result;
use serde_json::Value;

use super::requests::StorageVolumeTemplateRequest;
use super::{template_options, Storage};
use crate::appliance::client::Outcome;
use crate::resource::{with_force, with_query, ListQuery};
use crate::WaitMode;

impl Storage<'_> {
    pub async fn get_storage_volume_templates(&self, query: &ListQuery) -> Result<Vec<Value>> {
        self.list("vol-templates", &[], query).await
    }

    pub async fn add_storage_volume_template(
        &self,
        request: &StorageVolumeTemplateRequest,
        wait: WaitMode,
    ) -> Result<Outcome> {
        tracing::info!("Creating volume template {}", request.name);
        let path = self.url("vol-templates", &[])?;
        self.create(&path, request, &template_options(), wait).await
    }

    /// Templates reachable over the networks named in the query, e.g.
    /// `availableNetworks IN [/rest/fc-networks/1,/rest/fc-networks/2]`
    pub async fn get_connectable_storage_volume_templates(
        &self,
        query: &ListQuery,
    ) -> Result<Value> {
        let path = with_query(&self.url("connectable-vol", &[])?, query);
        self.client.get(&path).await
    }

    pub async fn get_storage_volume_template_by_id(&self, template_id: &str) -> Result<Value> {
        self.get("vol-templates", &[template_id]).await
    }

    pub async fn update_storage_volume_template(
        &self,
        template: &Value,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        self.update(template, force, wait).await
    }

    pub async fn remove_storage_volume_template(
        &self,
        template_id: &str,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let path = with_force(&self.url("vol-templates", &[template_id])?, force);
        self.remove(&path, &template_options(), wait).await
    }
}
