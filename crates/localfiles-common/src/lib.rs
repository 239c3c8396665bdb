//! Localfiles-Common: shared identifiers, errors and path helpers.
//!
//! - **Typed IDs**: [`AssetKey`], [`TargetId`] and the [`AssetRef`] lookup handle
//! - **Error Handling**: the [`Error`] taxonomy and [`Result`] alias
//! - **Path Utilities**: extension based MIME guessing and reference helpers
//!
//! # Examples
//!
//! ```
//! use localfiles_common::{AssetRef, Error, Result};
//!
//! let by_name = AssetRef::parse("a.png");
//! assert!(matches!(by_name, AssetRef::Name(_)));
//!
//! fn lookup() -> Result<()> {
//!     Err(Error::not_found("a.png"))
//! }
//! assert!(lookup().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;

pub use error::{Error, Result};
pub use ids::*;
