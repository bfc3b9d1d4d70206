//! Ferry Transfer Engine
//!
//! Moves large objects between the local filesystem and S3-compatible
//! object storage using parallel multipart uploads and parallel ranged
//! downloads. Remote operations go through the [`ObjectClient`] trait;
//! coordinators own all job state and workers only move bytes.

pub mod client;
pub mod download;
pub mod limiter;
pub mod pool;
pub mod progress;
pub mod upload;

pub use client::{
    ChecksumHint, Locator, ObjectClient, ObjectInfo, ObjectStat, UploadId, UploadParams,
};
pub use download::{DownloadOutcome, Downloader, Verification};
pub use limiter::RateLimiter;
pub use pool::WorkerPool;
pub use progress::{NoProgress, Progress};
pub use upload::{UploadOutcome, Uploader};
