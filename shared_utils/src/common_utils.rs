//! Common Utilities Module
//!
//! Path and extension helpers shared by discovery and conversion.

use std::path::Path;

/// Normalize a user-supplied extension: no leading dot, lowercase.
///
/// # Examples
/// ```
/// use shared_utils::common_utils::normalize_extension;
///
/// assert_eq!(normalize_extension(".HEIC"), "heic");
/// assert_eq!(normalize_extension("jpg"), "jpg");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Case-insensitive extension check against a single extension.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use shared_utils::common_utils::has_extension_ci;
///
/// assert!(has_extension_ci(Path::new("IMG_0001.HEIC"), "heic"));
/// assert!(!has_extension_ci(Path::new("IMG_0001.heic.jpg"), "heic"));
/// ```
pub fn has_extension_ci(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension_ci() {
        assert!(has_extension_ci(Path::new("a.heic"), "heic"));
        assert!(has_extension_ci(Path::new("a.HeIc"), "heic"));
        assert!(!has_extension_ci(Path::new("heic"), "heic"));
        assert!(!has_extension_ci(Path::new("a.heif"), "heic"));
        assert!(!has_extension_ci(Path::new(".heic"), "heic"));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(" .WebP "), "webp");
        assert_eq!(normalize_extension("heic"), "heic");
    }
}
