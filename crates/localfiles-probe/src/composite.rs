//! A composite prober that delegates to multiple [`Prober`] implementations.

use std::path::Path;

use crate::extension_prober::ExtensionProber;
use crate::image_prober::ImageProber;
use crate::prober::Prober;
use crate::types::ProbeInfo;

/// Tries each registered [`Prober`] in order and returns the first successful result.
pub struct CompositeProber {
    probers: Vec<Box<dyn Prober>>,
}

impl CompositeProber {
    /// Create a new `CompositeProber` from an ordered list of probers.
    ///
    /// The first prober whose [`Prober::supports`] returns `true` and whose
    /// [`Prober::probe`] succeeds wins.
    pub fn new(probers: Vec<Box<dyn Prober>>) -> Self {
        Self { probers }
    }

    /// The default chain: header-sniffing image prober, then extension lookup.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ImageProber::new()),
            Box::new(ExtensionProber::new()),
        ])
    }
}

impl Default for CompositeProber {
    fn default() -> Self {
        Self::standard()
    }
}

impl Prober for CompositeProber {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn supports(&self, path: &Path) -> bool {
        self.probers.iter().any(|p| p.supports(path))
    }

    fn probe(&self, path: &Path) -> localfiles_common::Result<ProbeInfo> {
        let mut last_err = None;

        for prober in &self.probers {
            if !prober.supports(path) {
                continue;
            }

            match prober.probe(path) {
                Ok(info) => return Ok(info),
                Err(e) => {
                    tracing::debug!(
                        prober = prober.name(),
                        error = %e,
                        "prober failed, trying next"
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            localfiles_common::Error::probe(format!(
                "no prober supports file: {}",
                path.display()
            ))
        }))
    }
}
