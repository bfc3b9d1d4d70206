//! up command - multipart upload of a local file

use super::{CommandContext, TransferFlags};
use crate::progress::{format_bytes, TransferBar};
use crate::s3::S3ObjectClient;
use crate::uri::parse_object_uri;
use anyhow::{Context, Result};
use colored::Colorize;
use ferry_transfer::Uploader;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    ctx: &CommandContext,
    source: &str,
    destination: &str,
    flags: &TransferFlags,
    cancel: &CancellationToken,
) -> Result<()> {
    let locator = parse_object_uri(destination)?;
    let source_path = Path::new(source);
    let size = tokio::fs::metadata(source_path)
        .await
        .with_context(|| format!("Cannot read source file: {}", source))?
        .len();

    ctx.debug(&format!(
        "Uploading {} ({}) to {}",
        source,
        format_bytes(size),
        locator
    ));

    let client = Arc::new(S3ObjectClient::create(&ctx.config).await?);
    let mut uploader = Uploader::new(client, flags.resolve(&ctx.config));

    let bar = if !flags.no_progress && !ctx.quiet {
        let name = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let bar = Arc::new(TransferBar::new(size, name));
        uploader = uploader.with_progress(bar.clone());
        Some(bar)
    } else {
        None
    };

    let outcome = uploader.upload(source_path, &locator, cancel).await?;

    if let Some(bar) = bar {
        bar.finish();
    }
    ctx.info(&format!(
        "{}: {} -> {} ({} in {} parts, {} {})",
        "upload".green(),
        source,
        locator,
        format_bytes(outcome.bytes_sent),
        outcome.parts,
        outcome.checksum.algorithm,
        outcome.checksum.value
    ));

    Ok(())
}
