//! stat command - probe an object's size and stored checksum

use super::CommandContext;
use crate::progress::format_bytes;
use crate::s3::S3ObjectClient;
use crate::uri::parse_object_uri;
use anyhow::Result;
use ferry_transfer::ObjectClient;

pub async fn execute(ctx: &CommandContext, uri: &str) -> Result<()> {
    let locator = parse_object_uri(uri)?;
    let client = S3ObjectClient::create(&ctx.config).await?;
    let stat = client.head_object(&locator).await?;

    println!("{}", locator);
    println!("  size: {} ({} bytes)", format_bytes(stat.size), stat.size);
    match stat.checksum {
        Some(hint) => println!("  checksum: {} {}", hint.algorithm, hint.value),
        None => println!("  checksum: none"),
    }
    Ok(())
}
