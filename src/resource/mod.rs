//! Resource addressing and collections
//!
//! Appliance endpoints are described by data rather than code. Resource
//! definitions are loaded from JSON files at compile time.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`query`] - Builds paths and query strings for collection and mutating calls
//! - [`collection`] - Reads paged collection responses
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `appliance.json` - login sessions, EULA, version
//! - `storage.json` - storage systems, pools, volumes, attachments, templates, tasks
//! - `networking.json` - FC networks

pub mod collection;
pub mod query;
mod registry;

pub use collection::{
    extract_json_value, fetch_all_members, fetch_list, fetch_members, Collection,
};
pub use query::{id_from_uri, make_url, with_force, with_query, ListQuery};
pub use registry::*;
