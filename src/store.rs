//! Client side of the hierarchical JSON datastore.
//!
//! Paths are `/`-separated keys. A `None` document is the datastore's
//! "no data" answer and is distinct from a failed request.

mod filter;
mod memory;
mod rest;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use filter::QueryFilter;
pub use memory::{MemoryStore, Operation, Push};
pub use rest::{RestConfig, RestStore};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The datastore answered with an error status, e.g. rejected auth.
    #[error("datastore replied {status}: {reason}")]
    Remote { status: u16, reason: String },

    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait RemoteStore: Sync {
    /// Read the children of `path` selected by `filter`.
    async fn query(&self, path: &str, filter: &QueryFilter) -> Result<Option<Value>, StoreError>;

    /// Append `document` under a new generated key at `path`, returning the key.
    async fn push(&self, path: &str, document: &Value) -> Result<String, StoreError>;

    /// Read the document at `path`.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;
}
