//! down command - parallel ranged download to a local file

use super::{CommandContext, TransferFlags};
use crate::progress::{format_bytes, TransferBar};
use crate::s3::S3ObjectClient;
use crate::uri::parse_object_uri;
use anyhow::Result;
use colored::Colorize;
use ferry_transfer::{Downloader, ObjectClient, Verification};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn execute(
    ctx: &CommandContext,
    source: &str,
    destination: &str,
    flags: &TransferFlags,
    cancel: &CancellationToken,
) -> Result<()> {
    let locator = parse_object_uri(source)?;
    let dest_path = resolve_destination(Path::new(destination), &locator.key);

    let client = Arc::new(S3ObjectClient::create(&ctx.config).await?);
    let stat = client.head_object(&locator).await?;
    ctx.debug(&format!(
        "Downloading {} ({}) to {}",
        locator,
        format_bytes(stat.size),
        dest_path.display()
    ));

    let mut downloader = Downloader::new(client, flags.resolve(&ctx.config));

    let bar = if !flags.no_progress && !ctx.quiet {
        let name = dest_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let bar = Arc::new(TransferBar::new(stat.size, name));
        downloader = downloader.with_progress(bar.clone());
        Some(bar)
    } else {
        None
    };

    if let Some(parent) = dest_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(&dest_path).await?;
    let outcome = downloader
        .download_sized(&locator, stat.size, stat.checksum, &mut file, cancel)
        .await?;
    file.sync_all().await?;

    if let Some(bar) = bar {
        bar.finish();
    }
    ctx.info(&format!(
        "{}: {} -> {} ({})",
        "download".green(),
        locator,
        dest_path.display(),
        format_bytes(outcome.bytes_written)
    ));

    match outcome.verification {
        Verification::Verified => {
            ctx.debug(&format!("checksum verified ({})", outcome.checksum.algorithm));
        }
        Verification::Mismatch { expected, actual } => {
            ctx.error(&format!(
                "{}: stored checksum {} does not match downloaded bytes ({})",
                "warning".yellow(),
                expected,
                actual
            ));
        }
        Verification::NotVerified => {}
    }

    Ok(())
}

/// Downloads into a directory keep the object's file name.
fn resolve_destination(dest: &Path, key: &str) -> PathBuf {
    let treat_as_dir = dest.is_dir()
        || dest
            .to_str()
            .map(|s| s.ends_with('/'))
            .unwrap_or(false);
    if treat_as_dir {
        let filename = key.rsplit('/').next().unwrap_or(key);
        dest.join(filename)
    } else {
        dest.to_path_buf()
    }
}
