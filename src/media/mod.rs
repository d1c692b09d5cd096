//! Media Policy
//!
//! Upload constraints and the category namespace. The allow-lists are fixed
//! at compile time; nothing mutates them at runtime.

pub mod key;
pub mod listing;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use key::{folder_marker_key, object_key, sanitize_filename, timestamp_millis};
pub use listing::{derive_folders, is_folder_marker, FileSummary, ListScope, MediaListing};

/// Maximum accepted upload size in bytes (100 MiB)
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Content types accepted by the upload operation
pub const ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/avif",
    "video/mp4",
    "video/quicktime",
    "video/webm",
];

/// Maximum keys returned by one list call
pub const LIST_LIMIT: usize = 1000;

/// Last path segment of an empty-folder marker object
pub const FOLDER_MARKER: &str = ".folder";

/// Top-level namespace of every object key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Events,
    Team,
    General,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 3] = [Category::Events, Category::Team, Category::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Events => "events",
            Category::Team => "team",
            Category::General => "general",
        }
    }

    /// Parse an optional form value; absent or empty means `general`
    pub fn from_form(value: Option<&str>) -> Result<Self> {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => v.parse(),
            None => Ok(Category::default()),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::General
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
                Error::Validation(format!(
                    "Invalid category. Must be one of: {}",
                    names.join(", ")
                ))
            })
    }
}

/// Check if a folder name uses only letters, digits, hyphen and underscore
pub fn is_valid_folder(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate a folder name
pub fn check_folder(name: &str) -> Result<()> {
    if is_valid_folder(name) {
        Ok(())
    } else {
        Err(Error::Validation(
            "Invalid folder name. Use only letters, numbers, hyphens, and underscores".into(),
        ))
    }
}

/// Error reported for an upload above [`MAX_FILE_SIZE`]
pub fn file_too_large() -> Error {
    Error::Validation(format!(
        "File too large. Maximum size is {}MB",
        MAX_FILE_SIZE / (1024 * 1024)
    ))
}

/// Validate an upload size
pub fn check_size(size: u64) -> Result<()> {
    if size > MAX_FILE_SIZE {
        return Err(file_too_large());
    }
    Ok(())
}

/// Validate an upload content type
pub fn check_content_type(content_type: &str) -> Result<()> {
    if !ALLOWED_TYPES.contains(&content_type) {
        return Err(Error::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_TYPES.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("events".parse::<Category>().unwrap(), Category::Events);
        assert_eq!("team".parse::<Category>().unwrap(), Category::Team);
        assert!("Events".parse::<Category>().is_err());
        assert!("blog".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_from_form_defaults_to_general() {
        assert_eq!(Category::from_form(None).unwrap(), Category::General);
        assert_eq!(Category::from_form(Some("")).unwrap(), Category::General);
        assert_eq!(Category::from_form(Some("team")).unwrap(), Category::Team);
    }

    #[test]
    fn test_invalid_category_message() {
        let err = "blog".parse::<Category>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid category. Must be one of: events, team, general"
        );
    }

    #[test]
    fn test_folder_names() {
        assert!(is_valid_folder("promo"));
        assert!(is_valid_folder("Summer_2024-final"));
        assert!(!is_valid_folder(""));
        assert!(!is_valid_folder("a/b"));
        assert!(!is_valid_folder("../etc"));
        assert!(!is_valid_folder("with space"));
        assert!(!is_valid_folder("café"));
    }

    #[test]
    fn test_size_boundary() {
        assert!(check_size(0).is_ok());
        assert!(check_size(MAX_FILE_SIZE).is_ok());
        assert_eq!(
            check_size(MAX_FILE_SIZE + 1).unwrap_err().to_string(),
            "File too large. Maximum size is 100MB"
        );
    }

    #[test]
    fn test_content_types() {
        assert!(check_content_type("image/webp").is_ok());
        assert!(check_content_type("video/quicktime").is_ok());
        assert!(check_content_type("application/pdf").is_err());
        assert!(check_content_type("").is_err());
    }
}
