//! localfiles - local asset registry and display target rotation
//!
//! This library crate exposes the registry, scheduler and renderer used by
//! the `localfiles` binary, mainly for integration testing.

pub mod config;
pub mod registry;
pub mod renderer;
pub mod scheduler;
pub mod state;
