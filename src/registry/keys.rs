//! Random key allocation with bounded re-rolls.

use localfiles_common::{AssetKey, Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Attempts before giving up on finding a free key.
pub const MAX_KEY_ATTEMPTS: usize = 64;

/// Draws asset keys uniformly from `1..=upper`, re-rolling on collision.
#[derive(Debug)]
pub struct KeyAllocator {
    rng: StdRng,
    upper: u32,
    max_attempts: usize,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic allocator for tests and benches.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            upper: AssetKey::MAX,
            max_attempts: MAX_KEY_ATTEMPTS,
        }
    }

    /// Shrink the key space. Clamped to `1..=AssetKey::MAX`.
    pub fn with_upper_bound(mut self, upper: u32) -> Self {
        self.upper = upper.clamp(1, AssetKey::MAX);
        self
    }

    /// Pick a key for which `taken` returns `false`.
    pub fn allocate(&mut self, taken: impl Fn(AssetKey) -> bool) -> Result<AssetKey> {
        for _ in 0..self.max_attempts {
            let raw = self.rng.gen_range(1..=self.upper);
            let Some(key) = AssetKey::new(raw) else {
                continue;
            };
            if !taken(key) {
                return Ok(key);
            }
            tracing::trace!(%key, "key collision, re-rolling");
        }
        Err(Error::KeySpaceExhausted(self.max_attempts))
    }
}

impl Default for KeyAllocator {
    fn default() -> Self {
        Self::new()
    }
}
