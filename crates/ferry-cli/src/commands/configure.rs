//! configure command - write profile settings

use super::CommandContext;
use crate::config::Config;
use anyhow::Result;

pub struct ConfigureOptions {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub part_size: Option<u64>,
    pub concurrency: Option<usize>,
}

pub async fn execute(
    ctx: &CommandContext,
    profile: Option<&str>,
    opts: ConfigureOptions,
) -> Result<()> {
    let mut config = ctx.config.clone();

    if let Some(endpoint) = opts.endpoint {
        config.endpoint = Some(endpoint);
    }
    if let Some(access_key) = opts.access_key {
        config.access_key = Some(access_key);
    }
    if let Some(secret_key) = opts.secret_key {
        config.secret_key = Some(secret_key);
    }
    if let Some(region) = opts.region {
        config.region = region;
    }
    if let Some(part_size) = opts.part_size {
        config.part_size = part_size;
    }
    if let Some(concurrency) = opts.concurrency {
        config.concurrency = concurrency;
    }

    config.save(profile)?;
    ctx.info(&format!(
        "Saved profile '{}' to {}",
        profile.unwrap_or("default"),
        Config::config_path()?.display()
    ));
    Ok(())
}
