//! File names for generated images.
//!
//! Names embed a local `YYYYmmddHHMMSS` timestamp; the extension follows the
//! MIME type the model returned.

/// Current local time as `YYYYmmddHHMMSS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Lowercase, spaces to underscores, then drop anything outside
/// `[a-z0-9_-]`. An empty result becomes `character`.
///
/// ```
/// use fabula_story::sanitize_name;
///
/// assert_eq!(sanitize_name("Captain Ada Lovelace"), "captain_ada_lovelace");
/// assert_eq!(sanitize_name("Zoë"), "zo");
/// assert_eq!(sanitize_name("../.."), "character");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-'))
        .collect();

    if sanitized.is_empty() {
        "character".to_string()
    } else {
        sanitized
    }
}

/// `char_{sanitized name}_{timestamp}.{ext}`
pub fn character_filename(name: &str, timestamp: &str, extension: &str) -> String {
    format!("char_{}_{}.{}", sanitize_name(name), timestamp, extension)
}

/// `bg_{index + 1}_{timestamp}.{ext}`
pub fn background_filename(index: usize, timestamp: &str, extension: &str) -> String {
    format!("bg_{}_{}.{}", index + 1, timestamp, extension)
}

/// `scene_{index + 1}_{timestamp}.{ext}`
pub fn scene_filename(index: usize, timestamp: &str, extension: &str) -> String {
    format!("scene_{}_{}.{}", index + 1, timestamp, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shape() {
        let ts = timestamp();
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_filenames_are_one_based() {
        assert_eq!(
            background_filename(0, "20250101120000", "png"),
            "bg_1_20250101120000.png"
        );
        assert_eq!(
            scene_filename(8, "20250101120000", "jpg"),
            "scene_9_20250101120000.jpg"
        );
    }

    #[test]
    fn test_character_filename_is_sanitized() {
        assert_eq!(
            character_filename("Old Man/Willow", "20250101120000", "png"),
            "char_old_manwillow_20250101120000.png"
        );
    }
}
