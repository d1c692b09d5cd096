//! S3-compatible object store
//!
//! Talks to R2, MinIO or AWS through `rust-s3`. Custom metadata travels as
//! `x-amz-meta-*` headers with percent-encoded values so non-ASCII filenames
//! survive the trip.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::{ListQuery, Listing, Metadata, ObjectInfo, ObjectStore, StorageError};
use crate::config::StorageConfig;

/// [`ObjectStore`] backed by an S3-compatible bucket
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    /// Connect to the bucket described by the configuration
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config.region.parse().map_err(|e| {
                StorageError::Config(format!("invalid region {}: {}", config.region, e))
            })?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid credentials: {}", e)))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Config(format!("invalid bucket {}: {}", config.bucket, e)))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        tracing::info!("Using S3 bucket '{}' in region {}", config.bucket, config.region);

        Ok(Self { bucket })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<(), StorageError> {
        let mut bucket = self.bucket.clone();
        for (name, value) in metadata {
            bucket.add_header(&meta_header(name), &urlencoding::encode(value));
        }

        let response = bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(backend)?;
        check_status("PUT", key, response.status_code())?;

        debug!("S3 PUT {} ({} bytes)", key, data.len());
        Ok(())
    }

    async fn list(&self, query: ListQuery<'_>) -> Result<Listing, StorageError> {
        let prefix = query.prefix.unwrap_or("").to_string();
        let (page, status) = self
            .bucket
            .list_page(
                prefix.clone(),
                query.delimiter.map(str::to_string),
                None,
                None,
                Some(query.limit),
            )
            .await
            .map_err(backend)?;
        check_status("LIST", &prefix, status)?;

        let objects = page
            .contents
            .into_iter()
            .map(|object| ObjectInfo {
                uploaded: parse_last_modified(&object.last_modified),
                key: object.key,
                size: object.size,
            })
            .collect();
        let common_prefixes = page
            .common_prefixes
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.prefix)
            .collect();

        Ok(Listing { objects, common_prefixes })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self.bucket.delete_object(key).await.map_err(backend)?;
        match response.status_code() {
            // Missing keys are not an error
            404 => Ok(()),
            status => check_status("DELETE", key, status),
        }
    }
}

fn backend(e: s3::error::S3Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn check_status(operation: &'static str, key: &str, status: u16) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::Rejected {
            operation,
            key: key.to_string(),
            status,
        })
    }
}

/// Header name for a custom metadata entry
fn meta_header(name: &str) -> String {
    format!("x-amz-meta-{}", name.to_ascii_lowercase())
}

fn parse_last_modified(value: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!("Unparsable LastModified {:?}: {}", value, e);
            DateTime::<Utc>::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meta_header() {
        assert_eq!(meta_header("originalName"), "x-amz-meta-originalname");
        assert_eq!(meta_header("category"), "x-amz-meta-category");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("PUT", "a", 200).is_ok());
        assert!(check_status("DELETE", "a", 204).is_ok());
        assert!(matches!(
            check_status("PUT", "a", 403),
            Err(StorageError::Rejected { status: 403, .. })
        ));
    }

    #[test]
    fn test_parse_last_modified() {
        let parsed = parse_last_modified("2024-03-01T12:30:00.000Z");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());
        assert_eq!(parse_last_modified("garbage"), DateTime::<Utc>::default());
    }

    #[test]
    fn test_new_with_custom_endpoint() {
        let config = StorageConfig {
            bucket: "media".into(),
            endpoint: Some("http://127.0.0.1:9000".into()),
            access_key: Some("minio".into()),
            secret_key: Some("minio123".into()),
            ..StorageConfig::default()
        };
        assert!(S3Store::new(&config).is_ok());
    }
}
