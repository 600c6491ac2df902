//! HP OneView client
//!
//! Wraps the OneView REST management API for storage systems, storage pools,
//! volumes, volume attachments, volume templates, snapshots and FC networks.
//!
//! # Module Structure
//!
//! - [`appliance`] - session handshake and HTTP transport
//! - [`activity`] - asynchronous task model and the task poller
//! - [`resource`] - resource addressing table, list queries and collections
//! - [`storage`] - storage facade
//! - [`networking`] - FC network facade
//! - [`config`] - persisted client configuration
//! - [`output`] - table and JSON rendering for the command line
//!
//! # Example
//!
//! ```ignore
//! use oneview::appliance::client::OneViewClient;
//! use oneview::storage::Storage;
//!
//! async fn example(client: &OneViewClient) -> anyhow::Result<()> {
//!     let pools = Storage::new(client).get_storage_pools(&Default::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod appliance;
pub mod config;
pub mod networking;
pub mod output;
pub mod resource;
pub mod storage;

/// Facades take one of these to decide whether a mutating call waits for its task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Poll the submitted task until it reaches a terminal state
    #[default]
    Blocking,
    /// Return the submitted task immediately
    Background,
}
