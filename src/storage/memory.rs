//! In-memory object store
//!
//! Keeps objects in an ordered map and answers list calls with the same
//! prefix/delimiter grouping an S3 bucket applies.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ListQuery, Listing, Metadata, ObjectInfo, ObjectStore, StorageError};

/// A stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub metadata: Metadata,
    pub uploaded: DateTime<Utc>,
}

/// In-memory [`ObjectStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored object by key
    pub async fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Check if the store holds no objects
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<(), StorageError> {
        let object = StoredObject {
            data,
            content_type: content_type.to_string(),
            metadata: metadata.clone(),
            uploaded: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn list(&self, query: ListQuery<'_>) -> Result<Listing, StorageError> {
        let prefix = query.prefix.unwrap_or("");
        let delimiter = query.delimiter.filter(|d| !d.is_empty());

        let objects = self.objects.read().await;
        let mut listing = Listing::default();
        let mut common_prefixes: BTreeSet<String> = BTreeSet::new();

        for (key, object) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }

            // Handle delimiter (directory grouping)
            if let Some(delimiter) = delimiter {
                let after_prefix = &key[prefix.len()..];
                if let Some(pos) = after_prefix.find(delimiter) {
                    let common = format!("{}{}", prefix, &after_prefix[..pos + delimiter.len()]);
                    if !common_prefixes.contains(&common) {
                        if listing.objects.len() + common_prefixes.len() >= query.limit {
                            break;
                        }
                        common_prefixes.insert(common);
                    }
                    continue;
                }
            }

            if listing.objects.len() + common_prefixes.len() >= query.limit {
                break;
            }
            listing.objects.push(ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
                uploaded: object.uploaded,
            });
        }

        listing.common_prefixes = common_prefixes.into_iter().collect();
        Ok(listing)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with(keys: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for key in keys {
            store
                .put(key, Bytes::from_static(b"data"), "image/png", &Metadata::new())
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        let mut metadata = Metadata::new();
        metadata.insert("category".into(), "team".into());

        store
            .put("team/1-a.png", Bytes::from_static(b"png"), "image/png", &metadata)
            .await
            .unwrap();

        let object = store.get("team/1-a.png").await.unwrap();
        assert_eq!(object.content_type, "image/png");
        assert_eq!(object.metadata.get("category").map(String::as_str), Some("team"));
        assert_eq!(&object.data[..], b"png");
    }

    #[tokio::test]
    async fn test_list_without_delimiter() {
        let store = store_with(&["events/1-a.jpg", "events/promo/2-b.jpg", "team/3-c.jpg"]).await;

        let listing = store
            .list(ListQuery { prefix: None, delimiter: None, limit: 1000 })
            .await
            .unwrap();
        assert_eq!(listing.objects.len(), 3);
        assert!(listing.common_prefixes.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_delimiter_groups_subfolders() {
        let store = store_with(&[
            "events/1-a.jpg",
            "events/promo/.folder",
            "events/promo/2-b.jpg",
            "events/gala/3-c.jpg",
            "team/4-d.jpg",
        ])
        .await;

        let listing = store
            .list(ListQuery { prefix: Some("events/"), delimiter: Some("/"), limit: 1000 })
            .await
            .unwrap();

        let keys: Vec<_> = listing.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["events/1-a.jpg"]);
        assert_eq!(listing.common_prefixes, vec!["events/gala/", "events/promo/"]);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let store = store_with(&["general/1", "general/2", "general/3"]).await;

        let listing = store
            .list(ListQuery { prefix: Some("general/"), delimiter: None, limit: 2 })
            .await
            .unwrap();
        assert_eq!(listing.objects.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = store_with(&["general/1-a.gif"]).await;

        store.delete("general/1-a.gif").await.unwrap();
        store.delete("general/1-a.gif").await.unwrap();
        assert!(store.is_empty().await);
    }
}
