//! Volume attachments: volumes presented to server profiles

use anyhow::Result;
use serde_json::Value;

use super::requests::{AlertFixType, RepairRequest};
use super::Storage;
use crate::appliance::client::{Follow, Outcome};
use crate::appliance::http::RequestOptions;
use crate::resource::ListQuery;
use crate::WaitMode;

impl Storage<'_> {
    pub async fn get_attachments_volumes(&self, query: &ListQuery) -> Result<Vec<Value>> {
        self.list("attachments", &[], query).await
    }

    /// Attachments of the volume at `volume_uri`
    pub async fn get_attachments_volumes_by_volume_uri(
        &self,
        volume_uri: &str,
    ) -> Result<Vec<Value>> {
        let query = ListQuery::new().filter(&format!("storageVolumeUri='{}'", volume_uri));
        self.get_attachments_volumes(&query).await
    }

    /// Extra unmanaged storage volumes still presented to server profiles
    ///
    /// Narrow down with a `resourceUri='/rest/server-profiles/...'` filter.
    pub async fn get_attachments_volumes_repair(
        &self,
        fix_type: AlertFixType,
        query: &ListQuery,
    ) -> Result<Vec<Value>> {
        let query = query.clone().param("alertFixType", fix_type.as_str());
        self.list("attachments-repair", &[], &query).await
    }

    /// Remove extra presentations from the server profile at `server_uri`
    pub async fn remove_attachments_volumes_repair_from_server(
        &self,
        server_uri: &str,
        fix_type: AlertFixType,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let request = RepairRequest {
            fix_type,
            resource_uri: server_uri.to_string(),
        };
        let path = self.url("attachments-repair", &[])?;
        let submitted = self
            .client
            .post(&path, &request, &RequestOptions::new())
            .await?;
        self.client.complete(submitted, wait, Follow::Nothing).await
    }

    pub async fn get_attachments_volumes_paths(&self, attachment_id: &str) -> Result<Value> {
        self.get("attachment-paths", &[attachment_id]).await
    }

    pub async fn get_attachments_volumes_paths_by_id(
        &self,
        attachment_id: &str,
        path_id: &str,
    ) -> Result<Value> {
        self.get("attachment-paths", &[attachment_id, path_id])
            .await
    }

    pub async fn get_attachments_volumes_by_id(&self, attachment_id: &str) -> Result<Value> {
        self.get("attachments", &[attachment_id]).await
    }
}
