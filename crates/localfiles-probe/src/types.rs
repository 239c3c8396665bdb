//! Probe result types.

use serde::{Deserialize, Serialize};

/// MIME type recorded when nothing better is known.
pub const UNKNOWN_MIME_TYPE: &str = "unknown/unknown";

/// What a prober could learn about a file.
///
/// Width and height are zero for anything that is not a decodable image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeInfo {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl ProbeInfo {
    /// Metadata for a file nobody could classify.
    pub fn unknown() -> Self {
        Self {
            mime_type: UNKNOWN_MIME_TYPE.to_string(),
            width: 0,
            height: 0,
        }
    }

    /// True when the probe produced pixel dimensions.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for ProbeInfo {
    fn default() -> Self {
        Self::unknown()
    }
}
