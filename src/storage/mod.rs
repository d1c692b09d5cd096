//! Object Storage
//!
//! The gateway talks to its bucket only through [`ObjectStore`]: put, list
//! and delete by key. Backends:
//! - [`S3Store`] for any S3-compatible bucket (R2, MinIO, AWS)
//! - [`MemoryStore`] for local development and tests

mod memory;
mod s3_bucket;

pub use memory::MemoryStore;
pub use s3_bucket::S3Store;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

/// Errors reported by a storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("{operation} {key} rejected with HTTP {status}")]
    Rejected {
        operation: &'static str,
        key: String,
        status: u16,
    },
}

/// Custom metadata stored alongside an object
pub type Metadata = HashMap<String, String>;

/// A single object returned by a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub uploaded: DateTime<Utc>,
}

/// Parameters of a list call
#[derive(Debug, Clone, Copy)]
pub struct ListQuery<'a> {
    /// Only keys starting with this prefix
    pub prefix: Option<&'a str>,
    /// Group keys sharing the prefix up to the next delimiter
    pub delimiter: Option<&'a str>,
    /// Maximum keys plus common prefixes to return
    pub limit: usize,
}

/// Result of a list call
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Objects directly matching the query
    pub objects: Vec<ObjectInfo>,
    /// Grouped prefixes, each ending with the delimiter
    pub common_prefixes: Vec<String>,
}

/// Object storage capability used by the gateway
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Write an object, replacing any existing object under the same key
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<(), StorageError>;

    /// List objects, optionally grouped by a delimiter
    async fn list(&self, query: ListQuery<'_>) -> Result<Listing, StorageError>;

    /// Delete an object. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<(), StorageError> {
        (**self).put(key, data, content_type, metadata).await
    }

    async fn list(&self, query: ListQuery<'_>) -> Result<Listing, StorageError> {
        (**self).list(query).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key).await
    }
}

/// Build the store selected by the configuration
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::S3 => Ok(Arc::new(S3Store::new(config)?)),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; uploads are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
