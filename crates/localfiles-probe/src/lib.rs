//! # localfiles-probe
//!
//! Best-effort metadata probing for files in the content root.
//!
//! A probe yields a MIME type and, for raster images, pixel dimensions. The
//! registry treats every probe error as "unknown" metadata, so probers are
//! free to fail on anything they do not understand.
//!
//! ## Quick start
//!
//! ```no_run
//! use localfiles_probe::{CompositeProber, Prober};
//! use std::path::Path;
//!
//! let prober = CompositeProber::standard();
//! let info = prober.probe(Path::new("sign.png")).unwrap_or_default();
//! println!("{} {}x{}", info.mime_type, info.width, info.height);
//! ```

pub mod composite;
pub mod extension_prober;
pub mod image_prober;
pub mod prober;
pub mod types;

pub use composite::CompositeProber;
pub use extension_prober::ExtensionProber;
pub use image_prober::ImageProber;
pub use prober::Prober;
pub use types::{ProbeInfo, UNKNOWN_MIME_TYPE};
