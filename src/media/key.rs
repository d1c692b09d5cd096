//! Object key construction

use super::{Category, FOLDER_MARKER};

/// Normalize an uploaded filename for use in an object key.
///
/// Lower-cases, maps everything outside `[a-z0-9._-]` to `-`, collapses runs
/// of `-` and trims them from both ends.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}

/// Current Unix time in milliseconds
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Compose `category/[folder/]timestamp-filename`
pub fn object_key(category: Category, folder: Option<&str>, timestamp: i64, filename: &str) -> String {
    match folder {
        Some(folder) => format!("{}/{}/{}-{}", category, folder, timestamp, filename),
        None => format!("{}/{}-{}", category, timestamp, filename),
    }
}

/// Key of the marker that makes an empty folder visible
pub fn folder_marker_key(category: Category, folder: &str) -> String {
    format!("{}/{}/{}", category, folder, FOLDER_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_clean(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
            && !s.starts_with('-')
            && !s.ends_with('-')
            && !s.contains("--")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Photo.JPG"), "my-photo.jpg");
        assert_eq!(sanitize_filename("  __team  shot!!.png"), "__team-shot-.png");
        assert_eq!(sanitize_filename("---a---b---"), "a-b");
        assert_eq!(sanitize_filename("Café Nuit.webp"), "caf-nuit.webp");
        assert_eq!(sanitize_filename("!!!"), "");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "My Photo.JPG",
            "  leading and trailing  ",
            "ÄÖÜ ß émoji 🎉.mov",
            "already-clean_name.mp4",
            "a--b__c..d",
            "",
            "-",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input {:?}", input);
            assert!(is_clean(&once), "output {:?}", once);
        }
    }

    #[test]
    fn test_object_key_layout() {
        let key = object_key(Category::Events, None, 1_700_000_000_000, "a.jpg");
        assert_eq!(key, "events/1700000000000-a.jpg");

        let key = object_key(Category::Events, Some("promo"), 1_700_000_000_000, "a.jpg");
        assert!(key.starts_with("events/promo/"));
        assert_eq!(key, "events/promo/1700000000000-a.jpg");
    }

    #[test]
    fn test_keys_order_by_upload_time() {
        let earlier = object_key(Category::Team, None, 1_700_000_000_000, "zebra.png");
        let later = object_key(Category::Team, None, 1_700_000_000_001, "apple.png");
        assert!(earlier < later);
    }

    #[test]
    fn test_folder_marker_key() {
        assert_eq!(folder_marker_key(Category::Events, "promo"), "events/promo/.folder");
    }
}
