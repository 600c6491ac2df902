//! Resource Registry - the appliance's addressing table
//!
//! Maps logical resource names (`storage-systems`, `fc-networks`, ...) to
//! their REST path templates. Loaded from embedded JSON, together with the
//! columns the CLI uses to print collections.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::query::make_url;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/appliance.json"),
    include_str!("../resources/storage.json"),
    include_str!("../resources/networking.json"),
];

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Path template; `{id}` stands for the parent resource id
    pub path: String,
    pub id_field: String,
    pub name_field: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl ResourceDef {
    /// Path with `{id}` replaced by `id`
    pub fn path_for(&self, id: &str) -> String {
        self.path.replace("{id}", id)
    }

    pub fn is_template(&self) -> bool {
        self.path.contains("{id}")
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Path template of a resource, e.g. `storage-pools` -> `/rest/storage-pools`
pub fn resource_path(key: &str) -> Result<&'static str> {
    let def = get_resource(key).ok_or_else(|| anyhow::anyhow!("Unknown resource: {}", key))?;
    if def.is_template() {
        anyhow::bail!("Resource {} is nested and needs a parent id", key);
    }
    Ok(def.path.as_str())
}

/// Path of `key` with `segments` appended
///
/// A nested resource takes its parent id from the first segment:
/// `resource_url("snapshots", &["abc", "s1"])` is
/// `/rest/storage-volumes/abc/snapshots/s1`.
pub fn resource_url(key: &str, segments: &[&str]) -> Result<String> {
    let def = get_resource(key).ok_or_else(|| anyhow::anyhow!("Unknown resource: {}", key))?;
    if !def.is_template() {
        return Ok(make_url(&def.path, segments));
    }
    let (parent, rest) = segments
        .split_first()
        .filter(|(parent, _)| !parent.trim_matches('/').is_empty())
        .with_context(|| format!("Resource {} needs a parent id", key))?;
    let base = def.path_for(&urlencoding::encode(parent.trim_matches('/')));
    Ok(make_url(&base, rest))
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
