//! Named, seeded random streams
//!
//! Each stream is derived from the master seed and the stream name only, so
//! player actions drawing from one stream never shift the values another
//! system sees.

use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    seed: u64,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            streams: HashMap::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let seed = self.seed;
        let entry = self
            .streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(derive_seed(seed, name)));
        SystemRng { inner: entry }
    }
}

fn derive_seed(seed: u64, name: &str) -> u64 {
    // FNV-1a over the name, then mixed with the master seed
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    let mut mixed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    mixed ^= hash;
    mixed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407)
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for SystemRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_same_values() {
        let mut a = RngManager::new(42);
        let mut b = RngManager::new(42);
        let x: u64 = a.stream("auto_build").gen();
        let y: u64 = b.stream("auto_build").gen();
        assert_eq!(x, y);
    }

    #[test]
    fn streams_do_not_depend_on_creation_order() {
        let mut a = RngManager::new(42);
        let _: u64 = a.stream("player").gen();
        let x: u64 = a.stream("advisory").gen();

        let mut b = RngManager::new(42);
        let y: u64 = b.stream("advisory").gen();
        assert_eq!(x, y);
    }

    #[test]
    fn streams_differ_by_name() {
        let mut rng = RngManager::new(42);
        let x: u64 = rng.stream("advisory").gen();
        let y: u64 = rng.stream("auto_build").gen();
        assert_ne!(x, y);
    }
}
