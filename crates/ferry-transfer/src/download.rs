//! Ranged-GET download coordinator.
//!
//! Parts arrive in arbitrary network order; the coordinator holds early
//! arrivals in a reassembly buffer and commits to the sink strictly in
//! ascending byte order, so the sink can be any plain sequential writer.
//! The buffer is drained greedily on every arrival and holds at most
//! about one part per worker in steady state.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use ferry_checksum::Checksum;
use ferry_core::{plan_parts, Error, PartSpec, Result, TransferConfig};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ChecksumHint, Locator, ObjectClient};
use crate::limiter::RateLimiter;
use crate::pool::WorkerPool;
use crate::progress::{NoProgress, Progress};

/// How the downloaded bytes compared against the stored checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Computed digest matched the stored one.
    Verified,
    /// Digests differ. The bytes were already committed to the sink, so
    /// this is reported, not raised: the transfer succeeded but the
    /// content is not what the store claims.
    Mismatch { expected: String, actual: String },
    /// The store exposed no checksum to compare against.
    NotVerified,
}

/// Summary of a finished download.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub bytes_written: u64,
    pub parts: u32,
    pub checksum: ChecksumHint,
    pub verification: Verification,
}

type PartResult = (u32, Result<Bytes>);

/// Ranged-GET download coordinator.
pub struct Downloader {
    client: Arc<dyn ObjectClient>,
    config: TransferConfig,
    limiter: Arc<RateLimiter>,
    progress: Arc<dyn Progress>,
}

impl Downloader {
    pub fn new(client: Arc<dyn ObjectClient>, config: TransferConfig) -> Self {
        let limiter = Arc::new(RateLimiter::from_limit(config.rate_limit));
        Self {
            client,
            config,
            limiter,
            progress: Arc::new(NoProgress),
        }
    }

    /// Share a limiter across several jobs instead of the per-job default.
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Download the whole object at `locator` into `sink`, probing the
    /// store for its size and stored checksum first.
    pub async fn download<W>(
        &self,
        locator: &Locator,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.config.validate()?;
        let stat = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            stat = self.client.head_object(locator) => stat?,
        };
        self.download_sized(locator, stat.size, stat.checksum, sink, cancel)
            .await
    }

    /// Download when the caller already knows the object size, skipping
    /// the metadata probe.
    pub async fn download_sized<W>(
        &self,
        locator: &Locator,
        size: u64,
        expected: Option<ChecksumHint>,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.config.validate()?;
        let parts = plan_parts(size, self.config.part_size)?;
        let total_parts = parts.len();
        info!(%locator, parts = total_parts, size, "download started");

        // Digest with the stored hint's algorithm when there is one, so
        // the two values are comparable after the last commit.
        let algorithm = expected
            .as_ref()
            .map(|h| h.algorithm)
            .unwrap_or(self.config.checksum);
        let mut hasher = Checksum::new(algorithm);

        let pool_token = cancel.child_token();
        let client = Arc::clone(&self.client);
        let limiter = Arc::clone(&self.limiter);
        let task_locator = locator.clone();
        let (pool, task_tx, mut result_rx) = WorkerPool::spawn(
            self.config.concurrency,
            self.config.concurrency,
            &pool_token,
            move |spec: PartSpec| {
                let client = Arc::clone(&client);
                let limiter = Arc::clone(&limiter);
                let locator = task_locator.clone();
                async move {
                    limiter.acquire(spec.len).await;
                    let res = client.get_range(&locator, spec.range()).await;
                    (spec.number, res)
                }
            },
        );

        enum Step {
            Arrived(Option<PartResult>),
            Dispatched,
            Stopped,
        }

        let mut specs = parts.into_iter();
        let mut task_tx = Some(task_tx);
        let mut pending: Option<PartSpec> = None;
        let mut buffered: HashMap<u32, Bytes> = HashMap::new();
        let mut next_part: u32 = 1;
        let mut bytes_written = 0u64;
        let mut failure: Option<Error> = None;

        while (next_part as usize) <= total_parts && failure.is_none() {
            if pending.is_none() && task_tx.is_some() {
                match specs.next() {
                    Some(spec) => pending = Some(spec),
                    None => task_tx = None,
                }
            }

            let step = if let Some(tx) = &task_tx {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Step::Stopped,
                    recv = result_rx.recv() => Step::Arrived(recv),
                    permit = tx.reserve() => match permit {
                        Ok(permit) => {
                            if let Some(spec) = pending.take() {
                                permit.send(spec);
                            }
                            Step::Dispatched
                        }
                        Err(_) => Step::Arrived(None),
                    },
                }
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Step::Stopped,
                    recv = result_rx.recv() => Step::Arrived(recv),
                }
            };

            match step {
                Step::Dispatched => {}
                Step::Stopped => failure = Some(Error::Cancelled),
                Step::Arrived(Some((number, Ok(data)))) => {
                    debug!(part = number, len = data.len(), "part arrived");
                    buffered.insert(number, data);
                    // Greedy drain: commit every consecutive part that is
                    // now available, evicting as we go.
                    while let Some(data) = buffered.remove(&next_part) {
                        if let Err(e) = sink.write_all(&data).await {
                            failure = Some(e.into());
                            break;
                        }
                        hasher.update(&data);
                        bytes_written += data.len() as u64;
                        self.progress.on_bytes(data.len() as u64);
                        next_part += 1;
                    }
                }
                Step::Arrived(Some((number, Err(e)))) => {
                    warn!(part = number, error = %e, "ranged read failed");
                    failure = Some(e);
                }
                Step::Arrived(None) => {
                    failure = Some(Error::Remote("worker pool stopped unexpectedly".into()));
                }
            }
        }

        if failure.is_some() {
            pool_token.cancel();
        }
        drop(task_tx);
        drop(result_rx);
        pool.join().await;

        if let Some(err) = failure {
            return Err(err);
        }
        sink.flush().await?;

        let digest = hasher.finalize();
        let verification = match &expected {
            Some(hint) if hint.value == digest => Verification::Verified,
            Some(hint) => {
                warn!(
                    %locator,
                    expected = %hint.value,
                    actual = %digest,
                    "checksum mismatch on downloaded object"
                );
                Verification::Mismatch {
                    expected: hint.value.clone(),
                    actual: digest.clone(),
                }
            }
            None => Verification::NotVerified,
        };
        info!(%locator, bytes = bytes_written, "download complete");

        Ok(DownloadOutcome {
            bytes_written,
            parts: total_parts as u32,
            checksum: ChecksumHint {
                algorithm,
                value: digest,
            },
            verification,
        })
    }

    /// Download into a file, creating parent directories as needed.
    pub async fn download_to_path(
        &self,
        locator: &Locator,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;
        let outcome = self.download(locator, &mut file, cancel).await?;
        file.sync_all().await?;
        Ok(outcome)
    }
}
