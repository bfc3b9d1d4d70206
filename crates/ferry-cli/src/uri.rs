//! S3 URI parsing for the Ferry CLI

use anyhow::{Context, Result};
use ferry_transfer::Locator;

/// Parse an `s3://bucket/key` URI into a transfer locator.
///
/// Both bucket and key are required; Ferry transfers whole objects, so a
/// bucket-only or prefix URI is an error here.
pub fn parse_object_uri(uri: &str) -> Result<Locator> {
    let path = uri
        .strip_prefix("s3://")
        .with_context(|| format!("Invalid S3 URI: {}. Must start with s3://", uri))?;

    let (bucket, key) = match path.find('/') {
        Some(idx) => {
            let (b, k) = path.split_at(idx);
            (b, k.trim_start_matches('/'))
        }
        None => (path, ""),
    };

    if bucket.is_empty() {
        anyhow::bail!("Invalid S3 URI: bucket name cannot be empty");
    }
    if key.is_empty() || key.ends_with('/') {
        anyhow::bail!("Invalid S3 URI: an object key is required (got '{uri}')");
    }

    Ok(Locator::new(bucket, key))
}

/// Check if a path is an S3 URI.
pub fn is_s3_uri(path: &str) -> bool {
    path.starts_with("s3://")
}
