pub mod mocks;

use rand::{RngCore, SeedableRng};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const MIB: u64 = 1024 * 1024;

/// Deterministic pseudo-random payload.
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// Write `data` to a file inside `dir` and return its path.
pub fn write_fixture(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(data).unwrap();
    path
}
