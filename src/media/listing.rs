//! Folder hierarchy reconstruction
//!
//! Folders are never stored. A folder exists while at least one key carries
//! its prefix, so the hierarchy is recomputed from every listing:
//! - flat mode lists the whole bucket and reports no folders
//! - scoped mode lists one level under `category/` or `category/folder/`
//!   with a `/` delimiter and turns the grouped prefixes into folder names

use std::collections::BTreeSet;

use serde::Serialize;

use super::{is_valid_folder, Category, FOLDER_MARKER};
use crate::storage::{Listing, ObjectInfo};

/// Delimiter separating key segments
pub const DELIMITER: &str = "/";

/// What part of the bucket a list request covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Whole bucket, no grouping
    Flat,
    /// One level under a prefix ending in `/`
    Scoped { prefix: String },
}

impl ListScope {
    /// Resolve the scope from raw query values.
    ///
    /// An unknown category falls back to flat mode; an invalid folder is
    /// ignored and the category root is listed instead.
    pub fn resolve(category: Option<&str>, folder: Option<&str>) -> Self {
        let category = match category.and_then(|c| c.parse::<Category>().ok()) {
            Some(category) => category,
            None => return ListScope::Flat,
        };

        let prefix = match folder.filter(|f| is_valid_folder(f)) {
            Some(folder) => format!("{}/{}/", category, folder),
            None => format!("{}/", category),
        };
        ListScope::Scoped { prefix }
    }

    pub fn prefix(&self) -> Option<&str> {
        match self {
            ListScope::Flat => None,
            ListScope::Scoped { prefix } => Some(prefix.as_str()),
        }
    }

    pub fn delimiter(&self) -> Option<&'static str> {
        match self {
            ListScope::Flat => None,
            ListScope::Scoped { .. } => Some(DELIMITER),
        }
    }
}

/// One file in a listing response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub key: String,
    pub url: String,
    pub filename: String,
    pub category: String,
    pub size: u64,
    pub uploaded: String,
}

impl FileSummary {
    /// Summarize an object. Filename and category come from the key itself.
    pub fn from_object(object: &ObjectInfo, public_url: &str) -> Self {
        let filename = object.key.rsplit('/').next().unwrap_or(&object.key);
        let category = object
            .key
            .split('/')
            .next()
            .filter(|c| !c.is_empty())
            .unwrap_or(Category::General.as_str());

        Self {
            key: object.key.clone(),
            url: format!("{}/{}", public_url, object.key),
            filename: filename.to_string(),
            category: category.to_string(),
            size: object.size,
            uploaded: object
                .uploaded
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// Listing response body
#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaListing {
    pub files: Vec<FileSummary>,
    pub folders: Vec<String>,
}

impl MediaListing {
    /// Shape a bucket listing for the given scope
    pub fn build(scope: &ListScope, listing: Listing, public_url: &str) -> Self {
        let files = listing
            .objects
            .iter()
            .filter(|o| !is_folder_marker(&o.key))
            .map(|o| FileSummary::from_object(o, public_url))
            .collect();

        let folders = match scope {
            ListScope::Flat => Vec::new(),
            ListScope::Scoped { prefix } => derive_folders(prefix, &listing.common_prefixes)
                .into_iter()
                .collect(),
        };

        Self { files, folders }
    }
}

/// Check if a key is an empty-folder marker
pub fn is_folder_marker(key: &str) -> bool {
    key.rsplit('/').next() == Some(FOLDER_MARKER)
}

/// Turn delimited common prefixes into folder names one level below `prefix`
pub fn derive_folders(prefix: &str, common_prefixes: &[String]) -> BTreeSet<String> {
    common_prefixes
        .iter()
        .filter_map(|p| p.strip_prefix(prefix))
        .map(|p| p.strip_suffix(DELIMITER).unwrap_or(p))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn object(key: &str, size: u64) -> ObjectInfo {
        ObjectInfo {
            key: key.to_string(),
            size,
            uploaded: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_resolve_scope() {
        assert_eq!(ListScope::resolve(None, None), ListScope::Flat);
        assert_eq!(ListScope::resolve(Some("blog"), Some("promo")), ListScope::Flat);
        assert_eq!(
            ListScope::resolve(Some("events"), None),
            ListScope::Scoped { prefix: "events/".into() }
        );
        assert_eq!(
            ListScope::resolve(Some("events"), Some("promo")),
            ListScope::Scoped { prefix: "events/promo/".into() }
        );
        assert_eq!(
            ListScope::resolve(Some("events"), Some("../team")),
            ListScope::Scoped { prefix: "events/".into() }
        );
        assert_eq!(ListScope::Flat.delimiter(), None);
    }

    #[test]
    fn test_derive_folders() {
        let prefixes = vec![
            "events/promo/".to_string(),
            "events/gala/".to_string(),
            "team/other/".to_string(),
        ];
        let folders = derive_folders("events/", &prefixes);
        assert_eq!(folders.into_iter().collect::<Vec<_>>(), vec!["gala", "promo"]);
    }

    #[test]
    fn test_is_folder_marker() {
        assert!(is_folder_marker("events/promo/.folder"));
        assert!(!is_folder_marker("events/promo/1-a.folder"));
        assert!(!is_folder_marker("events/promo/1-.folder.jpg"));
    }

    #[test]
    fn test_file_summary_derives_from_key() {
        let summary = FileSummary::from_object(
            &object("events/promo/1700000000000-a.jpg", 42),
            "https://cdn.example.com",
        );
        assert_eq!(summary.filename, "1700000000000-a.jpg");
        assert_eq!(summary.category, "events");
        assert_eq!(summary.url, "https://cdn.example.com/events/promo/1700000000000-a.jpg");
        assert_eq!(summary.uploaded, "2024-05-01T09:00:00.000Z");
        assert_eq!(summary.size, 42);
    }

    #[test]
    fn test_flat_listing_has_no_folders() {
        let listing = Listing {
            objects: vec![object("events/1-a.jpg", 1), object("events/promo/.folder", 0)],
            common_prefixes: vec!["events/promo/".into()],
        };
        let result = MediaListing::build(&ListScope::Flat, listing, "https://cdn");
        assert_eq!(result.files.len(), 1);
        assert!(result.folders.is_empty());
    }

    #[test]
    fn test_scoped_listing_excludes_markers() {
        let scope = ListScope::resolve(Some("events"), Some("promo"));
        let listing = Listing {
            objects: vec![object("events/promo/.folder", 0), object("events/promo/2-b.mp4", 9)],
            common_prefixes: vec![],
        };
        let result = MediaListing::build(&scope, listing, "https://cdn");
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].key, "events/promo/2-b.mp4");
    }
}
