//! Fallback prober that classifies non-image media by extension.

use std::path::Path;

use localfiles_common::paths::{is_image_file, mime_from_extension};
use localfiles_common::Error;

use crate::prober::Prober;
use crate::types::ProbeInfo;

/// Names the MIME type of known video files without opening them.
///
/// Image extensions are deliberately not claimed: an image the decoder could
/// not read stays "unknown" rather than getting a type it failed to prove.
pub struct ExtensionProber;

impl ExtensionProber {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExtensionProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for ExtensionProber {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn supports(&self, path: &Path) -> bool {
        !is_image_file(path) && mime_from_extension(path).is_some()
    }

    fn probe(&self, path: &Path) -> localfiles_common::Result<ProbeInfo> {
        let mime = mime_from_extension(path)
            .ok_or_else(|| Error::probe(format!("unknown extension: {}", path.display())))?;
        Ok(ProbeInfo {
            mime_type: mime.to_string(),
            width: 0,
            height: 0,
        })
    }
}
