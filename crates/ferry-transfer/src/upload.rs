//! Multipart upload coordinator.
//!
//! The coordinator reads the source file sequentially, exactly once, in
//! part-size chunks. Whole-object and per-part checksums are computed in
//! the coordinator, in strict ascending part order, before a part is
//! handed to the pool; digests are therefore deterministic no matter how
//! uploads complete. Workers only perform the remote `upload_part` call.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use ferry_checksum::{checksum_base64, Checksum};
use ferry_core::{plan_parts, AbortOutcome, CompletedPart, Error, Result, TransferConfig};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ChecksumHint, Locator, ObjectClient, ObjectInfo, UploadId, UploadParams};
use crate::limiter::RateLimiter;
use crate::pool::WorkerPool;
use crate::progress::{NoProgress, Progress};

/// Summary of a finished upload.
#[derive(Debug)]
pub struct UploadOutcome {
    pub info: ObjectInfo,
    pub parts: u32,
    pub bytes_sent: u64,
    pub checksum: ChecksumHint,
}

/// One unit of worker work: a part's bytes plus its integrity tag.
struct PartTask {
    number: u32,
    data: Bytes,
    checksum: ChecksumHint,
}

type PartResult = (u32, Result<CompletedPart>);

/// Multipart upload coordinator.
pub struct Uploader {
    client: Arc<dyn ObjectClient>,
    config: TransferConfig,
    limiter: Arc<RateLimiter>,
    progress: Arc<dyn Progress>,
}

impl Uploader {
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

    /// Upload the file at `path` to `locator` as an ordered sequence of
    /// parts.
    ///
    /// On any part failure or on cancellation the remote session is
    /// aborted (unless disabled in config); the abort call itself is not
    /// raced against `cancel`, so a user interrupt still cleans up. The
    /// returned [`Error::Aborted`] carries the session id, the abort
    /// outcome, and the original cause.
    pub async fn upload(
        &self,
        path: &Path,
        locator: &Locator,
        cancel: &CancellationToken,
    ) -> Result<UploadOutcome> {
        self.config.validate()?;

        let meta = tokio::fs::metadata(path).await?;
        if !meta.is_file() {
            return Err(Error::NotAFile(path.display().to_string()));
        }
        let size = meta.len();
        let parts = plan_parts(size, self.config.part_size)?;
        let total_parts = parts.len() as u32;
        let file = File::open(path).await?;

        let params = UploadParams {
            checksum: self.config.checksum,
            content_type: None,
        };
        let upload_id = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            id = self.client.create_multipart(locator, &params) => id?,
        };
        info!(%locator, %upload_id, parts = total_parts, size, "multipart upload started");

        match self.run_parts(file, locator, &upload_id, parts, cancel).await {
            Ok((completed, digest, bytes_sent)) => {
                let checksum = ChecksumHint {
                    algorithm: self.config.checksum,
                    value: digest,
                };
                let finalized = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    res = self.client.complete_multipart(
                        locator,
                        &upload_id,
                        completed,
                        Some(&checksum),
                    ) => res,
                };
                match finalized {
                    Ok(info) => {
                        info!(%locator, %upload_id, bytes = bytes_sent, "multipart upload complete");
                        Ok(UploadOutcome {
                            info,
                            parts: total_parts,
                            bytes_sent,
                            checksum,
                        })
                    }
                    Err(cause) => Err(self.abort(locator, &upload_id, cause).await),
                }
            }
            Err(cause) => Err(self.abort(locator, &upload_id, cause).await),
        }
    }

    /// Fan parts out to the pool and collect the completed set.
    ///
    /// Task dispatch and result draining are interleaved in one select
    /// loop so a full task queue can never deadlock against a full
    /// results queue.
    async fn run_parts(
        &self,
        mut file: File,
        locator: &Locator,
        upload_id: &UploadId,
        parts: Vec<ferry_core::PartSpec>,
        cancel: &CancellationToken,
    ) -> Result<(Vec<CompletedPart>, String, u64)> {
        let total_parts = parts.len();
        let part_lens: Vec<u64> = parts.iter().map(|p| p.len).collect();

        let pool_token = cancel.child_token();
        let client = Arc::clone(&self.client);
        let limiter = Arc::clone(&self.limiter);
        let task_locator = locator.clone();
        let task_upload_id = upload_id.clone();
        let (pool, task_tx, mut result_rx) = WorkerPool::spawn(
            self.config.concurrency,
            self.config.concurrency,
            &pool_token,
            move |task: PartTask| {
                let client = Arc::clone(&client);
                let limiter = Arc::clone(&limiter);
                let locator = task_locator.clone();
                let upload_id = task_upload_id.clone();
                async move {
                    limiter.acquire(task.data.len() as u64).await;
                    let res = client
                        .upload_part(&locator, &upload_id, task.number, task.data, &task.checksum)
                        .await;
                    (task.number, res)
                }
            },
        );

        let mut hasher = Checksum::new(self.config.checksum);
        let mut specs = parts.into_iter();
        let mut task_tx = Some(task_tx);
        let mut pending: Option<PartTask> = None;
        let mut completed: Vec<CompletedPart> = Vec::with_capacity(total_parts);
        let mut bytes_sent = 0u64;
        let mut failure: Option<Error> = None;

        while completed.len() < total_parts && failure.is_none() {
            // Buffer the next part; this is the only place file bytes are
            // read, so reads and checksum updates stay in part order.
            if pending.is_none() && task_tx.is_some() {
                match specs.next() {
                    Some(spec) => {
                        let mut buf = vec![0u8; spec.len as usize];
                        match file.read_exact(&mut buf).await {
                            Ok(_) => {
                                hasher.update(&buf);
                                let checksum = ChecksumHint {
                                    algorithm: self.config.checksum,
                                    value: checksum_base64(self.config.checksum, &buf),
                                };
                                debug!(part = spec.number, len = spec.len, "part read");
                                pending = Some(PartTask {
                                    number: spec.number,
                                    data: Bytes::from(buf),
                                    checksum,
                                });
                            }
                            Err(e) => {
                                failure = Some(e.into());
                                break;
                            }
                        }
                    }
                    // Everything dispatched: close the queue so workers
                    // drain and exit.
                    None => task_tx = None,
                }
            }

            let mut record = |recv: Option<PartResult>| match recv {
                Some((number, Ok(part))) => {
                    let len = part_lens[(number - 1) as usize];
                    bytes_sent += len;
                    self.progress.on_bytes(len);
                    completed.push(part);
                    None
                }
                Some((number, Err(e))) => {
                    warn!(part = number, error = %e, "part upload failed");
                    Some(e)
                }
                None => Some(Error::Remote("worker pool stopped unexpectedly".into())),
            };

            if let Some(tx) = &task_tx {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => failure = Some(Error::Cancelled),
                    recv = result_rx.recv() => failure = record(recv),
                    permit = tx.reserve() => match permit {
                        Ok(permit) => {
                            if let Some(task) = pending.take() {
                                permit.send(task);
                            }
                        }
                        Err(_) => {
                            failure =
                                Some(Error::Remote("worker pool stopped unexpectedly".into()));
                        }
                    },
                }
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => failure = Some(Error::Cancelled),
                    recv = result_rx.recv() => failure = record(recv),
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

        // The remote API does not sort; we do, and verify the set is
        // exactly 1..=N while at it.
        completed.sort_by_key(|p| p.number);
        for (i, part) in completed.iter().enumerate() {
            let expected = (i + 1) as u32;
            if part.number > expected {
                return Err(Error::MissingPart(expected));
            }
            if part.number < expected {
                return Err(Error::DuplicatePart(part.number));
            }
        }

        Ok((completed, hasher.finalize(), bytes_sent))
    }

    /// Best-effort session cleanup, detached from the job token.
    async fn abort(&self, locator: &Locator, upload_id: &UploadId, cause: Error) -> Error {
        let outcome = if !self.config.abort_on_failure {
            AbortOutcome::NotAttempted
        } else {
            match self.client.abort_multipart(locator, upload_id).await {
                Ok(()) => {
                    info!(%locator, %upload_id, "multipart upload aborted");
                    AbortOutcome::Aborted
                }
                Err(e) => {
                    warn!(%locator, %upload_id, error = %e, "abort of multipart upload failed");
                    AbortOutcome::Failed(e.to_string())
                }
            }
        };
        Error::Aborted {
            upload_id: upload_id.to_string(),
            outcome,
            source: Box::new(cause),
        }
    }
}
