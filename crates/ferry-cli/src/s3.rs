//! AWS SDK implementation of the engine's `ObjectClient`.

use async_trait::async_trait;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    ChecksumAlgorithm as S3ChecksumAlgorithm, ChecksumMode, CompletedMultipartUpload,
    CompletedPart as S3CompletedPart,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use ferry_checksum::ChecksumAlgorithm;
use ferry_core::{ByteRange, CompletedPart, Error, Result};
use ferry_transfer::{
    ChecksumHint, Locator, ObjectClient, ObjectInfo, ObjectStat, UploadId, UploadParams,
};

use crate::config::Config;

/// `ObjectClient` backed by an S3-compatible endpoint.
pub struct S3ObjectClient {
    client: Client,
}

impl S3ObjectClient {
    /// Build a client from CLI configuration.
    pub async fn create(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let endpoint = config.endpoint.as_ref().unwrap();
        let access_key = config.access_key.as_ref().unwrap();
        let secret_key = config.secret_key.as_ref().unwrap();

        let credentials = Credentials::new(access_key, secret_key, None, None, "ferry-cli");

        let s3_config = S3ConfigBuilder::new()
            .behavior_version_latest()
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .force_path_style(config.path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// MD5 rides in ETags rather than checksum headers; for the other
/// algorithms the store validates what we attach.
fn s3_algorithm(algorithm: ChecksumAlgorithm) -> Option<S3ChecksumAlgorithm> {
    match algorithm {
        ChecksumAlgorithm::Crc32 => Some(S3ChecksumAlgorithm::Crc32),
        ChecksumAlgorithm::Sha1 => Some(S3ChecksumAlgorithm::Sha1),
        ChecksumAlgorithm::Sha256 => Some(S3ChecksumAlgorithm::Sha256),
        ChecksumAlgorithm::Md5 => None,
    }
}

fn remote_err(op: &str, err: impl std::fmt::Display) -> Error {
    Error::Remote(format!("{op}: {err}"))
}

/// Pick a usable whole-object checksum off a HEAD response. Composite
/// digests (the `...-N` multipart form) are not comparable to a digest of
/// the object bytes, so they are ignored.
fn head_checksum_hint(
    crc32: Option<&str>,
    sha1: Option<&str>,
    sha256: Option<&str>,
) -> Option<ChecksumHint> {
    let usable = |v: &&str| !v.contains('-');
    if let Some(value) = crc32.filter(usable) {
        return Some(ChecksumHint {
            algorithm: ChecksumAlgorithm::Crc32,
            value: value.to_string(),
        });
    }
    if let Some(value) = sha1.filter(usable) {
        return Some(ChecksumHint {
            algorithm: ChecksumAlgorithm::Sha1,
            value: value.to_string(),
        });
    }
    if let Some(value) = sha256.filter(usable) {
        return Some(ChecksumHint {
            algorithm: ChecksumAlgorithm::Sha256,
            value: value.to_string(),
        });
    }
    None
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
    async fn head_object(&self, locator: &Locator) -> Result<ObjectStat> {
        let resp = self
            .client
            .head_object()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .checksum_mode(ChecksumMode::Enabled)
            .send()
            .await
            .map_err(|e| remote_err("head object", e))?;

        let size = resp
            .content_length()
            .ok_or_else(|| Error::Remote("head object: missing content length".to_string()))?;
        if size < 0 {
            return Err(Error::Remote(format!(
                "head object: negative content length {size}"
            )));
        }

        Ok(ObjectStat {
            size: size as u64,
            checksum: head_checksum_hint(
                resp.checksum_crc32(),
                resp.checksum_sha1(),
                resp.checksum_sha256(),
            ),
        })
    }

    async fn create_multipart(
        &self,
        locator: &Locator,
        params: &UploadParams,
    ) -> Result<UploadId> {
        let mut req = self
            .client
            .create_multipart_upload()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .set_content_type(params.content_type.clone());
        if let Some(algorithm) = s3_algorithm(params.checksum) {
            req = req.checksum_algorithm(algorithm);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| remote_err("create multipart upload", e))?;

        resp.upload_id()
            .map(|id| UploadId(id.to_string()))
            .ok_or_else(|| Error::Remote("create multipart upload: missing upload id".to_string()))
    }

    async fn upload_part(
        &self,
        locator: &Locator,
        upload_id: &UploadId,
        part_number: u32,
        data: Bytes,
        checksum: &ChecksumHint,
    ) -> Result<CompletedPart> {
        let mut req = self
            .client
            .upload_part()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .upload_id(&upload_id.0)
            .part_number(part_number as i32)
            .body(ByteStream::from(data));
        // Attach the part's integrity tag so the store rejects corrupted
        // bytes at the part boundary.
        req = match checksum.algorithm {
            ChecksumAlgorithm::Crc32 => req.checksum_crc32(&checksum.value),
            ChecksumAlgorithm::Sha1 => req.checksum_sha1(&checksum.value),
            ChecksumAlgorithm::Sha256 => req.checksum_sha256(&checksum.value),
            ChecksumAlgorithm::Md5 => req,
        };

        let resp = req
            .send()
            .await
            .map_err(|e| remote_err(&format!("upload part {part_number}"), e))?;

        Ok(CompletedPart {
            number: part_number,
            etag: resp.e_tag().unwrap_or_default().to_string(),
        })
    }

    async fn complete_multipart(
        &self,
        locator: &Locator,
        upload_id: &UploadId,
        parts: Vec<CompletedPart>,
        _checksum: Option<&ChecksumHint>,
    ) -> Result<ObjectInfo> {
        // Parts were individually verified on upload; the whole-object
        // digest stays in the transfer outcome because the composite
        // checksum the store derives here is a different value.
        let completed: Vec<S3CompletedPart> = parts
            .iter()
            .map(|p| {
                S3CompletedPart::builder()
                    .part_number(p.number as i32)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();

        let resp = self
            .client
            .complete_multipart_upload()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .upload_id(&upload_id.0)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| remote_err("complete multipart upload", e))?;

        Ok(ObjectInfo {
            locator: locator.clone(),
            etag: resp.e_tag().map(|s| s.to_string()),
        })
    }

    async fn abort_multipart(&self, locator: &Locator, upload_id: &UploadId) -> Result<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .upload_id(&upload_id.0)
            .send()
            .await
            .map_err(|e| remote_err("abort multipart upload", e))?;
        Ok(())
    }

    async fn get_range(&self, locator: &Locator, range: ByteRange) -> Result<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .range(range.to_string())
            .send()
            .await
            .map_err(|e| remote_err(&format!("ranged get {range}"), e))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| remote_err("read ranged body", e))?
            .into_bytes();

        if data.len() as u64 != range.len() {
            return Err(Error::Remote(format!(
                "ranged get {range}: expected {} bytes, got {}",
                range.len(),
                data.len()
            )));
        }
        Ok(data)
    }
}
