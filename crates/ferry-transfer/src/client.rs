//! Remote object client abstraction
//!
//! The engine never talks to a concrete store directly. Implementations
//! live with their SDKs (the CLI ships an AWS SDK one); tests use an
//! in-memory mock.

use async_trait::async_trait;
use bytes::Bytes;
use ferry_checksum::ChecksumAlgorithm;
use ferry_core::{ByteRange, CompletedPart, Result};
use std::fmt;

/// Bucket/key pair identifying one remote object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub bucket: String,
    pub key: String,
}

impl Locator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Opaque identifier of an in-progress multipart upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadId(pub String);

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata probe result: the object size plus any stored whole-object
/// checksum the store is willing to reveal.
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub size: u64,
    pub checksum: Option<ChecksumHint>,
}

/// A whole-object digest together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumHint {
    pub algorithm: ChecksumAlgorithm,
    pub value: String,
}

/// Parameters for creating a multipart upload session.
#[derive(Debug, Clone)]
pub struct UploadParams {
    /// Algorithm for part tags and the whole-object checksum.
    pub checksum: ChecksumAlgorithm,
    /// MIME type to record on the finished object.
    pub content_type: Option<String>,
}

/// Descriptor of a finalized remote object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub locator: Locator,
    pub etag: Option<String>,
}

/// Remote operations the transfer engine depends on.
///
/// Implementations are expected to honor cooperative cancellation through
/// future drop (the engine races every call against its job token) and to
/// keep any retry policy internal; coordinators treat the first error as
/// fatal to the job.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Probe an object's size and stored checksum without reading it.
    async fn head_object(&self, locator: &Locator) -> Result<ObjectStat>;

    /// Create a multipart upload session.
    async fn create_multipart(&self, locator: &Locator, params: &UploadParams)
        -> Result<UploadId>;

    /// Upload one part. `checksum` is the integrity tag for this part's
    /// bytes, computed with the session's algorithm.
    async fn upload_part(
        &self,
        locator: &Locator,
        upload_id: &UploadId,
        part_number: u32,
        data: Bytes,
        checksum: &ChecksumHint,
    ) -> Result<CompletedPart>;

    /// Finalize a session from its completed parts. `parts` arrives sorted
    /// ascending by part number.
    async fn complete_multipart(
        &self,
        locator: &Locator,
        upload_id: &UploadId,
        parts: Vec<CompletedPart>,
        checksum: Option<&ChecksumHint>,
    ) -> Result<ObjectInfo>;

    /// Discard an unfinished session and any parts it holds.
    async fn abort_multipart(&self, locator: &Locator, upload_id: &UploadId) -> Result<()>;

    /// Read one inclusive byte range of an object.
    async fn get_range(&self, locator: &Locator, range: ByteRange) -> Result<Bytes>;
}
