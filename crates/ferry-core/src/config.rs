//! Transfer configuration

use crate::error::{Error, Result};
use crate::{DEFAULT_CONCURRENCY, DEFAULT_PART_SIZE, MAX_PART_SIZE, MIN_PART_SIZE};
use ferry_checksum::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};

/// Tunables for one transfer job, shared by upload and download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Size of every part except the last, in bytes.
    #[serde(default = "default_part_size")]
    pub part_size: u64,

    /// Number of concurrent part transfers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Transfer rate cap in bytes per second. `None` means unlimited.
    #[serde(default)]
    pub rate_limit: Option<u64>,

    /// Whole-object checksum algorithm.
    #[serde(default)]
    pub checksum: ChecksumAlgorithm,

    /// Whether a failed upload aborts its remote multipart session.
    #[serde(default = "default_true")]
    pub abort_on_failure: bool,
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_true() -> bool {
    true
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            rate_limit: None,
            checksum: ChecksumAlgorithm::default(),
            abort_on_failure: true,
        }
    }
}

impl TransferConfig {
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_rate_limit(mut self, bytes_per_sec: Option<u64>) -> Self {
        self.rate_limit = bytes_per_sec;
        self
    }

    pub fn with_checksum(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.checksum = algorithm;
        self
    }

    /// Check the configuration against provider limits.
    ///
    /// Fails fast, before any remote call is made.
    pub fn validate(&self) -> Result<()> {
        if self.part_size < MIN_PART_SIZE || self.part_size > MAX_PART_SIZE {
            return Err(Error::InvalidPartSize(self.part_size));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConcurrency);
        }
        Ok(())
    }
}
