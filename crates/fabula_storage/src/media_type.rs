//! MIME type and file name helpers.

use fabula_error::{StorageError, StorageErrorKind};

const MIME_TABLE: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// MIME type for a file name or bare extension; `application/octet-stream`
/// when unknown.
///
/// ```
/// use fabula_storage::mime_for_extension;
///
/// assert_eq!(mime_for_extension("scene_1_20250101120000.png"), "image/png");
/// assert_eq!(mime_for_extension("JPEG"), "image/jpeg");
/// assert_eq!(mime_for_extension("notes.txt"), "application/octet-stream");
/// ```
pub fn mime_for_extension(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map_or(name, |(_, ext)| ext)
        .to_ascii_lowercase();
    let extension = if extension == "jpeg" { "jpg" } else { &extension };

    MIME_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or("application/octet-stream", |(_, mime)| *mime)
}

/// File extension for an image MIME type, `png` when unknown.
///
/// ```
/// use fabula_storage::extension_for_mime;
///
/// assert_eq!(extension_for_mime("image/jpeg"), "jpg");
/// assert_eq!(extension_for_mime("image/x-unknown"), "png");
/// ```
pub fn extension_for_mime(mime: &str) -> &'static str {
    let mime = mime.trim().to_ascii_lowercase();
    MIME_TABLE
        .iter()
        .find(|(_, known)| *known == mime)
        .map_or("png", |(ext, _)| *ext)
}

/// Accept only a single path component of `[A-Za-z0-9._-]` that doesn't
/// start with a dot.
///
/// ```
/// use fabula_storage::validate_filename;
///
/// assert!(validate_filename("char_kael_20250101120000.png").is_ok());
/// assert!(validate_filename("../etc/passwd").is_err());
/// assert!(validate_filename(".hidden").is_err());
/// ```
pub fn validate_filename(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::new(StorageErrorKind::InvalidPath(
            name.to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions_round_trip() {
        for (ext, mime) in MIME_TABLE {
            assert_eq!(mime_for_extension(ext), *mime);
            assert_eq!(extension_for_mime(mime), *ext);
        }
    }

    #[test]
    fn test_rejects_separators_and_spaces() {
        for name in ["a/b.png", "a\\b.png", "a b.png", "", "..", "ü.png"] {
            assert!(validate_filename(name).is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn test_accepts_generated_names() {
        for name in [
            "char_unknown_character_20250101120000.png",
            "bg_3_20250101120000.jpg",
            "scene_9_20250101120000.webp",
        ] {
            assert!(validate_filename(name).is_ok());
        }
    }
}
