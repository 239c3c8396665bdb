//! The [`Prober`] trait defining the interface for metadata probing.

use std::path::Path;

use crate::types::ProbeInfo;

/// A prober capable of extracting dimensions and a MIME type from a file.
///
/// Implementations must be safe to share across threads (`Send + Sync`).
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe the file at the given path.
    ///
    /// Errors are ordinary values here; callers that index files treat any
    /// error as "metadata unknown" and carry on.
    fn probe(&self, path: &Path) -> localfiles_common::Result<ProbeInfo>;

    /// Check whether this prober should be tried for the given path.
    ///
    /// A return value of `true` does not guarantee that [`Prober::probe`]
    /// will succeed.
    fn supports(&self, path: &Path) -> bool;
}
