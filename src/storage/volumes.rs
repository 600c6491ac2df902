//! Storage volumes and their snapshots

use anyhow::Result;
use serde_json::Value;

use super::requests::{AddStorageVolume, AlertFixType, RepairRequest, SnapshotRequest};
use super::Storage;
use crate::appliance::client::{Follow, Outcome};
use crate::appliance::http::RequestOptions;
use crate::resource::{with_force, ListQuery};
use crate::WaitMode;

/// Header asking the appliance to forget a volume without deleting it on the array
const EXPORT_ONLY_HEADER: &str = "exportOnly";

impl Storage<'_> {
    /// Filter on `name`, `provisionType`, `state` and `status`
    pub async fn get_storage_volumes(&self, query: &ListQuery) -> Result<Vec<Value>> {
        self.list("storage-volumes", &[], query).await
    }

    pub async fn add_storage_volume(
        &self,
        request: &AddStorageVolume,
        wait: WaitMode,
    ) -> Result<Outcome> {
        tracing::info!(
            "Creating volume {}",
            request.name.as_deref().unwrap_or("(from source)")
        );
        let path = self.url("storage-volumes", &[])?;
        self.create(&path, request, &RequestOptions::new(), wait)
            .await
    }

    /// Volumes that are shareable, or private and not yet attached
    pub async fn get_attachable_volumes(&self, query: &ListQuery) -> Result<Vec<Value>> {
        self.list("attachable-volumes", &[], query).await
    }

    /// Extra managed storage volume paths
    pub async fn get_volumes_repair(
        &self,
        fix_type: AlertFixType,
        query: &ListQuery,
    ) -> Result<Vec<Value>> {
        let query = query.clone().param("alertFixType", fix_type.as_str());
        self.list("volumes-repair", &[], &query).await
    }

    /// Remove extra presentations of the volume at `volume_uri`
    pub async fn remove_volumes_repair_from_server(
        &self,
        volume_uri: &str,
        fix_type: AlertFixType,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let request = RepairRequest {
            fix_type,
            resource_uri: volume_uri.to_string(),
        };
        let path = self.url("volumes-repair", &[])?;
        let submitted = self
            .client
            .post(&path, &request, &RequestOptions::new())
            .await?;
        self.client.complete(submitted, wait, Follow::Nothing).await
    }

    pub async fn get_storage_volume_by_id(&self, volume_id: &str) -> Result<Value> {
        self.get("storage-volumes", &[volume_id]).await
    }

    pub async fn update_storage_volume(
        &self,
        volume: &Value,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        self.update(volume, force, wait).await
    }

    /// Delete a volume from the appliance and the storage system, or only
    /// from the appliance when `export_only` is set
    pub async fn remove_storage_volume(
        &self,
        volume_id: &str,
        export_only: bool,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let path = with_force(&self.url("storage-volumes", &[volume_id])?, force);
        let options = if export_only {
            RequestOptions::new().header(EXPORT_ONLY_HEADER, "true")
        } else {
            RequestOptions::new()
        };
        self.remove(&path, &options, wait).await
    }

    pub async fn add_snapshot_for_volume(
        &self,
        volume_id: &str,
        request: &SnapshotRequest,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let path = self.url("snapshots", &[volume_id])?;
        self.create(&path, request, &RequestOptions::new(), wait)
            .await
    }

    pub async fn get_snapshot_of_volume(&self, volume_id: &str, snapshot_id: &str) -> Result<Value> {
        self.get("snapshots", &[volume_id, snapshot_id])
            .await
    }

    pub async fn remove_snapshot_from_volume(
        &self,
        volume_id: &str,
        snapshot_id: &str,
        force: bool,
        wait: WaitMode,
    ) -> Result<Outcome> {
        let path = with_force(
            &self.url("snapshots", &[volume_id, snapshot_id])?,
            force,
        );
        self.remove(&path, &RequestOptions::new(), wait).await
    }

    pub async fn get_snapshots_from_volume(
        &self,
        volume_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<Value>> {
        self.list("snapshots", &[volume_id], query)
            .await
    }
}
