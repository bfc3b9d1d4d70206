//! Checksum utilities for Ferry
//!
//! A closed set of digest algorithms used for whole-object integrity and
//! per-part integrity tags. Digest strings use the base64 form object
//! stores expect in checksum headers; hex helpers exist for the places an
//! ETag-style hex digest is the natural fit.

use base64::{engine::general_purpose::STANDARD, Engine};
use digest::Digest;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The supported checksum algorithms.
///
/// CRC32 is the default: it is cheap, universally supported by
/// S3-compatible stores, and valid for whole-object checksums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Crc32,
    Md5,
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    /// All supported algorithms, for help text and validation messages.
    pub fn all() -> &'static [ChecksumAlgorithm] {
        &[
            ChecksumAlgorithm::Crc32,
            ChecksumAlgorithm::Md5,
            ChecksumAlgorithm::Sha1,
            ChecksumAlgorithm::Sha256,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Crc32 => "crc32",
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unsupported checksum algorithm: {0} (expected crc32, md5, sha1, or sha256)")]
pub struct UnknownAlgorithm(String);

impl FromStr for ChecksumAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crc32" => Ok(ChecksumAlgorithm::Crc32),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha1" => Ok(ChecksumAlgorithm::Sha1),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Incremental digest over the bytes seen so far.
///
/// Owned by exactly one coordinator; it is fed in strict byte order so the
/// emitted value is deterministic regardless of network completion order.
pub struct Checksum {
    state: State,
}

enum State {
    Crc32(crc32fast::Hasher),
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Checksum {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        let state = match algorithm {
            ChecksumAlgorithm::Crc32 => State::Crc32(crc32fast::Hasher::new()),
            ChecksumAlgorithm::Md5 => State::Md5(Md5::new()),
            ChecksumAlgorithm::Sha1 => State::Sha1(Sha1::new()),
            ChecksumAlgorithm::Sha256 => State::Sha256(Sha256::new()),
        };
        Self { state }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        match self.state {
            State::Crc32(_) => ChecksumAlgorithm::Crc32,
            State::Md5(_) => ChecksumAlgorithm::Md5,
            State::Sha1(_) => ChecksumAlgorithm::Sha1,
            State::Sha256(_) => ChecksumAlgorithm::Sha256,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            State::Crc32(h) => h.update(data),
            State::Md5(h) => h.update(data),
            State::Sha1(h) => h.update(data),
            State::Sha256(h) => h.update(data),
        }
    }

    /// Consume the accumulator and emit the base64 digest string.
    pub fn finalize(self) -> String {
        match self.state {
            State::Crc32(h) => STANDARD.encode(h.finalize().to_be_bytes()),
            State::Md5(h) => STANDARD.encode(h.finalize()),
            State::Sha1(h) => STANDARD.encode(h.finalize()),
            State::Sha256(h) => STANDARD.encode(h.finalize()),
        }
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checksum")
            .field("algorithm", &self.algorithm())
            .finish()
    }
}

/// One-shot base64 digest of `data`.
pub fn checksum_base64(algorithm: ChecksumAlgorithm, data: &[u8]) -> String {
    let mut checksum = Checksum::new(algorithm);
    checksum.update(data);
    checksum.finalize()
}

/// Hex-encoded MD5, the ETag convention for single-shot object puts.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_roundtrip() {
        for algo in ChecksumAlgorithm::all() {
            let parsed: ChecksumAlgorithm = algo.as_str().parse().unwrap();
            assert_eq!(parsed, *algo);
        }
        assert_eq!(
            "SHA256".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha256
        );
        assert!("crc64".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_default_is_crc32() {
        assert_eq!(ChecksumAlgorithm::default(), ChecksumAlgorithm::Crc32);
    }

    #[test]
    fn test_known_vectors() {
        // CRC32("hello world") = 0x0d4a1185.
        assert_eq!(
            checksum_base64(ChecksumAlgorithm::Crc32, b"hello world"),
            STANDARD.encode(0x0d4a1185u32.to_be_bytes())
        );
        assert_eq!(
            md5_hex(b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            checksum_base64(ChecksumAlgorithm::Sha256, b""),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_incremental_equals_one_shot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        for algo in ChecksumAlgorithm::all() {
            let mut incremental = Checksum::new(*algo);
            for chunk in data.chunks(7) {
                incremental.update(chunk);
            }
            assert_eq!(
                incremental.finalize(),
                checksum_base64(*algo, data),
                "algorithm {algo} diverged"
            );
        }
    }

    #[test]
    fn test_distinct_inputs_distinct_digests() {
        assert_ne!(
            checksum_base64(ChecksumAlgorithm::Sha1, b"hello"),
            checksum_base64(ChecksumAlgorithm::Sha1, b"world")
        );
    }
}
