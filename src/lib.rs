//! WolfMedia - Media Storage Gateway
//!
//! An HTTP gateway in front of a single S3-compatible bucket that enforces
//! upload constraints, namespaces objects into categories and folders, and
//! rebuilds a folder hierarchy from the flat key space at list time.
//!
//! # Architecture
//!
//! Requests pass a shared-secret gate, are routed by method and path, and
//! each operation is a single bucket round trip. The gateway keeps no state
//! of its own: folders exist only as key prefixes, and an empty folder is
//! held open by a zero-length `.folder` marker object.
//!
//! # Features
//!
//! - Upload with size, media type, category and folder validation
//! - Flat and folder-scoped listings derived from delimited bucket listings
//! - Explicit empty folders via marker objects
//! - Idempotent deletes
//! - S3-compatible (R2, MinIO, AWS) and in-memory storage backends

pub mod config;
pub mod error;
pub mod media;
pub mod storage;
pub mod api;

pub use config::WolfMediaConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::WolfMediaConfig;
    pub use crate::error::{Error, Result};
    pub use crate::media::{Category, FileSummary, ListScope, MediaListing};
    pub use crate::storage::{MemoryStore, ObjectStore, S3Store};
    pub use crate::api::HttpServer;
}
