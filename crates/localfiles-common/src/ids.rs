//! Typed identifiers for assets and targets.
//!
//! Asset keys and target ids are both plain integers on disk; the newtypes
//! keep them from being mixed up in code.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of an indexed asset.
///
/// Keys are allocated at random from `1..=AssetKey::MAX`; zero is never a
/// valid key. Deserializing goes through the same range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AssetKey(u32);

impl AssetKey {
    /// Largest allocatable key (eight decimal digits).
    pub const MAX: u32 = 99_999_999;

    /// Wrap a raw key, rejecting zero and values past [`AssetKey::MAX`].
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        (1..=Self::MAX).contains(&raw).then_some(Self(raw))
    }

    /// The raw integer value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for AssetKey {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| {
            Error::invalid_input(format!(
                "asset key {} is outside 1..={}",
                raw,
                Self::MAX
            ))
        })
    }
}

impl From<AssetKey> for u32 {
    fn from(key: AssetKey) -> Self {
        key.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a display target (for example a sign's network id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(u64);

impl TargetId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TargetId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to an asset either by key or by file name.
///
/// Registry operations that accept an `AssetRef` behave identically for both
/// forms once the reference is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    Key(AssetKey),
    Name(String),
}

impl AssetRef {
    /// Parse operator input: a valid key number becomes [`AssetRef::Key`],
    /// anything else is treated as a file name.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        match input.parse::<u32>().ok().and_then(AssetKey::new) {
            Some(key) => Self::Key(key),
            None => Self::Name(input.to_string()),
        }
    }
}

impl From<AssetKey> for AssetRef {
    fn from(key: AssetKey) -> Self {
        Self::Key(key)
    }
}

impl From<&str> for AssetRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for AssetRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "key {}", key),
            Self::Name(name) => write!(f, "'{}'", name),
        }
    }
}
