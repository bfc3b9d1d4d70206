//! CLI command implementations

pub mod configure;
pub mod down;
pub mod stat;
pub mod up;

use crate::config::Config;
use ferry_checksum::ChecksumAlgorithm;
use ferry_core::TransferConfig;

/// Context passed to all commands
pub struct CommandContext {
    pub config: Config,
    pub verbose: bool,
    pub quiet: bool,
}

impl CommandContext {
    /// Print info message if not quiet
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print verbose message if verbose mode
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            eprintln!("[DEBUG] {}", msg);
        }
    }

    /// Print error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg);
    }
}

/// Per-command transfer tuning flags, applied over profile defaults.
#[derive(Debug, Clone, Default)]
pub struct TransferFlags {
    pub part_size: Option<u64>,
    pub concurrency: Option<usize>,
    pub limit: Option<u64>,
    pub checksum: Option<ChecksumAlgorithm>,
    pub no_progress: bool,
}

impl TransferFlags {
    /// Resolve flags against the profile into an engine configuration.
    pub fn resolve(&self, config: &Config) -> TransferConfig {
        TransferConfig::default()
            .with_part_size(self.part_size.unwrap_or(config.part_size))
            .with_concurrency(self.concurrency.unwrap_or(config.concurrency))
            .with_rate_limit(self.limit.or(config.rate_limit))
            .with_checksum(self.checksum.unwrap_or_default())
    }
}
