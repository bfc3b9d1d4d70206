//! Ferry - parallel multipart transfers for S3-compatible object storage

mod commands;
mod config;
mod progress;
mod s3;
mod uri;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{CommandContext, TransferFlags};
use config::Config;
use ferry_checksum::ChecksumAlgorithm;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ferry")]
#[command(version = ferry_core::VERSION)]
#[command(about = "Move large objects to and from S3-compatible storage in parallel parts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration profile name
    #[arg(short, long, global = true, env = "FERRY_PROFILE")]
    profile: Option<String>,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, env = "FERRY_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,
}

#[derive(clap::Args, Clone, Default)]
struct TuningArgs {
    /// Part size in bytes
    #[arg(long)]
    part_size: Option<u64>,

    /// Concurrent part transfers
    #[arg(long)]
    concurrency: Option<usize>,

    /// Rate cap in bytes per second
    #[arg(long)]
    limit: Option<u64>,

    /// Checksum algorithm (crc32, md5, sha1, sha256)
    #[arg(long)]
    checksum: Option<String>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

impl TuningArgs {
    fn into_flags(self) -> Result<TransferFlags> {
        let checksum = self
            .checksum
            .as_deref()
            .map(|s| s.parse::<ChecksumAlgorithm>())
            .transpose()?;
        Ok(TransferFlags {
            part_size: self.part_size,
            concurrency: self.concurrency,
            limit: self.limit,
            checksum,
            no_progress: self.no_progress,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file as a multipart object
    Up {
        /// Local source file
        source: String,
        /// Destination object (s3://bucket/key)
        destination: String,
        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Download an object via parallel ranged reads
    Down {
        /// Source object (s3://bucket/key)
        source: String,
        /// Local destination file or directory
        destination: String,
        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Show an object's size and stored checksum
    Stat {
        /// Object to probe (s3://bucket/key)
        uri: String,
    },

    /// Save connection settings to the config file
    Configure {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        part_size: Option<u64>,
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    let config = Config::load(cli.profile.as_deref())?;
    let ctx = CommandContext {
        config,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    // One cancellable token per invocation; ctrl-c fires it and the
    // engine takes care of remote cleanup.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received, stopping transfer...");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Commands::Up {
            source,
            destination,
            tuning,
        } => {
            let flags = tuning.into_flags()?;
            commands::up::execute(&ctx, &source, &destination, &flags, &cancel).await
        }
        Commands::Down {
            source,
            destination,
            tuning,
        } => {
            let flags = tuning.into_flags()?;
            commands::down::execute(&ctx, &source, &destination, &flags, &cancel).await
        }
        Commands::Stat { uri } => commands::stat::execute(&ctx, &uri).await,
        Commands::Configure {
            endpoint,
            access_key,
            secret_key,
            region,
            part_size,
            concurrency,
        } => {
            commands::configure::execute(
                &ctx,
                cli.profile.as_deref(),
                commands::configure::ConfigureOptions {
                    endpoint,
                    access_key,
                    secret_key,
                    region,
                    part_size,
                    concurrency,
                },
            )
            .await
        }
    }
}
