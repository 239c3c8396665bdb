//! Path and reference helpers shared by the registry, scheduler and prober.

use std::path::Path;

/// Image extensions and the MIME type each one maps to.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
];

/// Video extensions and the MIME type each one maps to.
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
];

fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path has an image file extension.
///
/// ```
/// use std::path::Path;
/// use localfiles_common::paths::is_image_file;
///
/// assert!(is_image_file(Path::new("sign.PNG")));
/// assert!(!is_image_file(Path::new("notes.txt")));
/// ```
pub fn is_image_file(path: &Path) -> bool {
    lower_extension(path)
        .map(|ext| IMAGE_TYPES.iter().any(|(e, _)| *e == ext))
        .unwrap_or(false)
}

/// Guess a MIME type from the file extension alone.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = lower_extension(path)?;
    IMAGE_TYPES
        .iter()
        .chain(VIDEO_TYPES)
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Build the `file://` reference handed to the renderer for a local file.
pub fn file_reference(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// True when `entry` looks like a remote URL the renderer can fetch itself.
pub fn is_remote_url(entry: &str) -> bool {
    let lower = entry.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// True when `name` is a single path component usable as an asset file name.
pub fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
