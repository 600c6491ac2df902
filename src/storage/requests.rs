//! Request bodies for the storage endpoints

use anyhow::{Context, Result};
use serde::Serialize;

/// Bytes in one GiB; capacities are requested in GiB and sent in bytes
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Name the appliance expands into `<volume name>_<timestamp>`
pub const DEFAULT_SNAPSHOT_NAME: &str = "{volumeName}_{timestamp}";

pub const TEMPLATE_TYPE: &str = "StorageVolumeTemplateV3";
pub const VOLUME_TYPE: &str = "AddStorageVolumeV3";
pub const SNAPSHOT_TYPE: &str = "Snapshot";

/// Convert a GiB capacity to the byte count the appliance expects
pub fn gib_to_bytes(gib: u64) -> Result<u64> {
    gib.checked_mul(GIB)
        .with_context(|| format!("Capacity of {} GiB does not fit in a byte count", gib))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProvisionType {
    Thin,
    Full,
}

impl std::str::FromStr for ProvisionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thin" => Ok(Self::Thin),
            "full" => Ok(Self::Full),
            other => Err(anyhow::anyhow!("Unknown provisioning type: {}", other)),
        }
    }
}

/// Which extra presentations a repair call looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertFixType {
    /// Volumes still presented to a server profile that no longer uses them
    ExtraUnmanagedStorageVolumes,
    /// Paths still presented for a managed volume
    ExtraManagedStorageVolumePaths,
}

impl AlertFixType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtraUnmanagedStorageVolumes => "ExtraUnmanagedStorageVolumes",
            Self::ExtraManagedStorageVolumePaths => "ExtraManagedStorageVolumePaths",
        }
    }
}

/// Body of `POST /rest/storage-systems`
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct AddStorageSystem {
    pub ip_hostname: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AddStorageSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddStorageSystem")
            .field("ip_hostname", &self.ip_hostname)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Body of `POST /rest/storage-pools`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddStoragePool {
    pub storage_system_uri: String,
    pub pool_name: String,
}

/// Body of the two `repair` endpoints
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepairRequest {
    #[serde(rename = "type")]
    pub fix_type: AlertFixType,
    pub resource_uri: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateProvisioning {
    pub shareable: bool,
    pub provision_type: ProvisionType,
    /// Bytes
    pub capacity: u64,
    pub storage_pool_uri: String,
}

/// Body of `POST /rest/storage-volume-templates`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageVolumeTemplateRequest {
    pub name: String,
    pub description: String,
    pub provisioning: TemplateProvisioning,
    pub storage_system_uri: Option<String>,
    pub snapshot_pool_uri: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl StorageVolumeTemplateRequest {
    pub fn new(
        name: &str,
        capacity_gib: u64,
        storage_pool_uri: &str,
        shareable: bool,
        provision_type: ProvisionType,
    ) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            description: String::new(),
            provisioning: TemplateProvisioning {
                shareable,
                provision_type,
                capacity: gib_to_bytes(capacity_gib)?,
                storage_pool_uri: storage_pool_uri.to_string(),
            },
            storage_system_uri: None,
            snapshot_pool_uri: None,
            kind: TEMPLATE_TYPE,
        })
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn storage_system(mut self, uri: &str) -> Self {
        self.storage_system_uri = Some(uri.to_string());
        self
    }

    pub fn snapshot_pool(mut self, uri: &str) -> Self {
        self.snapshot_pool_uri = Some(uri.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProvisioning {
    pub shareable: Option<bool>,
    pub provision_type: Option<ProvisionType>,
    /// Bytes
    pub requested_capacity: u64,
    pub storage_pool_uri: Option<String>,
}

/// Body of `POST /rest/storage-volumes`
///
/// A volume is created from a pool, from a template, from a snapshot, or
/// imported from the storage system by name or WWN. Fields that do not apply
/// are left out of the body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddStorageVolume {
    pub name: Option<String>,
    pub description: String,
    pub is_permanent: bool,
    pub provisioning_parameters: VolumeProvisioning,
    pub snapshot_pool_uri: Option<String>,
    pub storage_system_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_system_volume_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wwn: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Default for AddStorageVolume {
    fn default() -> Self {
        Self {
            name: None,
            description: String::new(),
            is_permanent: true,
            provisioning_parameters: VolumeProvisioning {
                shareable: None,
                provision_type: None,
                requested_capacity: 0,
                storage_pool_uri: None,
            },
            snapshot_pool_uri: None,
            storage_system_uri: None,
            snapshot_uri: None,
            storage_system_volume_name: None,
            template_uri: None,
            wwn: None,
            kind: VOLUME_TYPE,
        }
    }
}

impl AddStorageVolume {
    /// New volume carved out of `storage_pool_uri`
    pub fn new(
        name: &str,
        capacity_gib: u64,
        storage_pool_uri: &str,
        shareable: bool,
        provision_type: ProvisionType,
    ) -> Result<Self> {
        Ok(Self {
            name: Some(name.to_string()),
            provisioning_parameters: VolumeProvisioning {
                shareable: Some(shareable),
                provision_type: Some(provision_type),
                requested_capacity: gib_to_bytes(capacity_gib)?,
                storage_pool_uri: Some(storage_pool_uri.to_string()),
            },
            ..Default::default()
        })
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Keep the volume when the profile using it is deleted
    pub fn permanent(mut self, is_permanent: bool) -> Self {
        self.is_permanent = is_permanent;
        self
    }

    pub fn storage_system(mut self, uri: &str) -> Self {
        self.storage_system_uri = Some(uri.to_string());
        self
    }

    pub fn snapshot_pool(mut self, uri: &str) -> Self {
        self.snapshot_pool_uri = Some(uri.to_string());
        self
    }

    pub fn from_snapshot(mut self, uri: &str) -> Self {
        self.snapshot_uri = Some(uri.to_string());
        self
    }

    pub fn from_template(mut self, uri: &str) -> Self {
        self.template_uri = Some(uri.to_string());
        self
    }

    /// Import an existing volume by its name on the storage system
    pub fn existing_volume(mut self, name: &str) -> Self {
        self.storage_system_volume_name = Some(name.to_string());
        self
    }

    pub fn wwn(mut self, wwn: &str) -> Self {
        self.wwn = Some(wwn.to_string());
        self
    }
}

/// Body of `POST /rest/storage-volumes/{id}/snapshots`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SnapshotRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub description: String,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_NAME, "")
    }
}

impl SnapshotRequest {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            kind: SNAPSHOT_TYPE,
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gib_to_bytes() {
        assert_eq!(gib_to_bytes(20).unwrap(), 21474836480);
        assert_eq!(gib_to_bytes(0).unwrap(), 0);
    }

    #[test]
    fn test_capacity_overflow_is_an_error() {
        assert!(gib_to_bytes(u64::MAX / 1024).is_err());
        assert!(gib_to_bytes(u64::MAX / GIB + 1).is_err());
        assert_eq!(gib_to_bytes(u64::MAX / GIB).unwrap(), (u64::MAX / GIB) * GIB);

        let err = AddStorageVolume::new(
            "huge",
            u64::MAX / 1024,
            "/rest/storage-pools/1",
            false,
            ProvisionType::Thin,
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not fit"));
        assert!(StorageVolumeTemplateRequest::new(
            "huge",
            u64::MAX,
            "/rest/storage-pools/1",
            true,
            ProvisionType::Thin
        )
        .is_err());
    }

    #[test]
    fn test_storage_system_body_keeps_snake_case() {
        let body = serde_json::to_value(AddStorageSystem {
            ip_hostname: "10.0.0.1".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"ip_hostname": "10.0.0.1", "username": "admin", "password": "secret"})
        );
    }

    #[test]
    fn test_storage_system_debug_hides_password() {
        let request = AddStorageSystem {
            ip_hostname: "h".to_string(),
            username: "u".to_string(),
            password: "topsecret".to_string(),
        };
        assert!(!format!("{:?}", request).contains("topsecret"));
    }

    #[test]
    fn test_pool_and_repair_bodies() {
        let pool = AddStoragePool {
            storage_system_uri: "/rest/storage-systems/111111".to_string(),
            pool_name: "MyStoragePool".to_string(),
        };
        assert_eq!(
            serde_json::to_value(pool).unwrap(),
            json!({"storageSystemUri": "/rest/storage-systems/111111", "poolName": "MyStoragePool"})
        );

        let repair = RepairRequest {
            fix_type: AlertFixType::ExtraUnmanagedStorageVolumes,
            resource_uri: "/rest/server-profiles/123-45-67-89-124".to_string(),
        };
        assert_eq!(
            serde_json::to_value(repair).unwrap(),
            json!({
                "type": "ExtraUnmanagedStorageVolumes",
                "resourceUri": "/rest/server-profiles/123-45-67-89-124"
            })
        );
    }

    #[test]
    fn test_template_body() {
        let request =
            StorageVolumeTemplateRequest::new("tmpl", 20, "/rest/storage-pools/1", true, ProvisionType::Thin)
                .unwrap()
                .description("gold")
                .storage_system("/rest/storage-systems/2");
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({
                "name": "tmpl",
                "description": "gold",
                "provisioning": {
                    "shareable": true,
                    "provisionType": "Thin",
                    "capacity": 21474836480u64,
                    "storagePoolUri": "/rest/storage-pools/1"
                },
                "storageSystemUri": "/rest/storage-systems/2",
                "snapshotPoolUri": null,
                "type": "StorageVolumeTemplateV3"
            })
        );
    }

    #[test]
    fn test_volume_body_omits_unused_sources() {
        let request =
            AddStorageVolume::new("vol1", 1, "/rest/storage-pools/1", false, ProvisionType::Full)
                .unwrap();
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "vol1",
                "description": "",
                "isPermanent": true,
                "provisioningParameters": {
                    "shareable": false,
                    "provisionType": "Full",
                    "requestedCapacity": 1073741824u64,
                    "storagePoolUri": "/rest/storage-pools/1"
                },
                "snapshotPoolUri": null,
                "storageSystemUri": null,
                "type": "AddStorageVolumeV3"
            })
        );
    }

    #[test]
    fn test_volume_from_template() {
        let request = AddStorageVolume::default()
            .from_template("/rest/storage-volume-templates/9")
            .wwn("DC:12");
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(body["templateUri"], "/rest/storage-volume-templates/9");
        assert_eq!(body["wwn"], "DC:12");
        assert!(body.get("snapshotUri").is_none());
        assert!(body["name"].is_null());
    }

    #[test]
    fn test_default_snapshot_name() {
        assert_eq!(
            serde_json::to_value(SnapshotRequest::default()).unwrap(),
            json!({"type": "Snapshot", "name": "{volumeName}_{timestamp}", "description": ""})
        );
    }

    #[test]
    fn test_provision_type_parse() {
        assert_eq!("thin".parse::<ProvisionType>().unwrap(), ProvisionType::Thin);
        assert_eq!("Full".parse::<ProvisionType>().unwrap(), ProvisionType::Full);
        assert!("thick".parse::<ProvisionType>().is_err());
    }
}
