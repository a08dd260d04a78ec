//! Fingerprinting of camera identity strings

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::types::Fingerprint;

const INITIAL_STATE: u32 = 0x1F35_1F35;

/// Maps vendor identity strings to compact 32-bit routing keys.
///
/// The substitution table is drawn from the OS random source when the hasher
/// is created, so fingerprints only hold for the lifetime of one server
/// process. Clients must rediscover them with `list` after every restart.
#[derive(Clone)]
pub struct IdentityHasher {
    table: [u8; 256],
}

impl IdentityHasher {
    /// Create a hasher with a freshly randomized table.
    pub fn new() -> Self {
        let mut table = [0u8; 256];
        rand::thread_rng().fill_bytes(&mut table);
        Self { table }
    }

    /// Create a hasher with a reproducible table.
    pub fn with_seed(seed: u64) -> Self {
        let mut table = [0u8; 256];
        StdRng::seed_from_u64(seed).fill_bytes(&mut table);
        Self { table }
    }

    pub fn hash(&self, id: &str) -> u32 {
        let mut h = INITIAL_STATE;
        for &byte in id.as_bytes() {
            let index = (byte ^ (h as u8)) as usize;
            h = h.rotate_left(11).wrapping_add(self.table[index] as u32);
        }
        h ^= h >> 16;
        h ^ (h >> 8)
    }

    pub fn fingerprint(&self, id: &str) -> Fingerprint {
        Fingerprint(self.hash(id))
    }
}

impl Default for IdentityHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdentityHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityHasher").finish_non_exhaustive()
    }
}
