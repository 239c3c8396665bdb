//! Image prober backed by the `image` crate.
//!
//! Only the header is read: the format is sniffed from magic bytes and the
//! dimensions come from the decoder without decoding pixel data.

use std::path::Path;

use image::ImageReader;
use localfiles_common::Error;

use crate::prober::Prober;
use crate::types::ProbeInfo;

/// A [`Prober`] for raster images.
///
/// Extensions are not trusted; every file is sniffed, so a PNG saved as
/// `.dat` is still recognized.
pub struct ImageProber;

impl ImageProber {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageProber {
    fn default() -> Self {
        Self::new()
    }
}

impl Prober for ImageProber {
    fn name(&self) -> &'static str {
        "image"
    }

    fn supports(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn probe(&self, path: &Path) -> localfiles_common::Result<ProbeInfo> {
        let reader = ImageReader::open(path)
            .map_err(|e| Error::probe(format!("{}: {}", path.display(), e)))?
            .with_guessed_format()
            .map_err(|e| Error::probe(format!("{}: {}", path.display(), e)))?;

        let format = reader.format().ok_or_else(|| {
            Error::probe(format!("unrecognized image format: {}", path.display()))
        })?;

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| Error::probe(format!("{}: {}", path.display(), e)))?;

        Ok(ProbeInfo {
            mime_type: format.to_mime_type().to_string(),
            width,
            height,
        })
    }
}
