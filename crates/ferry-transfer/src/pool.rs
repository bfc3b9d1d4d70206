//! Fixed-size worker pool over bounded channels.
//!
//! Workers pull tasks from a shared bounded queue, run the handler, and
//! push results to a bounded results queue. Two shutdown paths:
//!
//! - graceful: the task sender is dropped, workers drain the queue and
//!   exit on their own;
//! - cancelled: the token fires, workers abandon whatever they are doing
//!   (the in-flight handler future is dropped mid-poll).

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to the spawned workers. Holds no queue ends; the coordinator
/// owns the task sender and result receiver directly.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `concurrency` workers running `handler` over tasks from the
    /// returned sender. Results arrive on the returned receiver in
    /// completion order, which is arbitrary.
    pub fn spawn<T, R, F, Fut>(
        concurrency: usize,
        queue_depth: usize,
        cancel: &CancellationToken,
        handler: F,
    ) -> (Self, mpsc::Sender<T>, mpsc::Receiver<R>)
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let (task_tx, task_rx) = mpsc::channel::<T>(queue_depth.max(1));
        let (result_tx, result_rx) = mpsc::channel::<R>(queue_depth.max(1));
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut handles = Vec::with_capacity(concurrency);
        for _ in 0..concurrency {
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();
            let handler = handler.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    // Only one worker holds the receiver at a time; the
                    // lock is released before the task runs.
                    let task = {
                        let mut rx = task_rx.lock().await;
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return,
                            task = rx.recv() => task,
                        }
                    };
                    let Some(task) = task else {
                        return; // queue closed and drained
                    };
                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        result = handler(task) => result,
                    };
                    if result_tx.send(result).await.is_err() {
                        return; // coordinator is gone
                    }
                }
            }));
        }

        (Self { handles }, task_tx, result_rx)
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for handle in self.handles {
            // A worker that panicked already lost its task; the
            // coordinator notices through the closed results channel.
            let _ = handle.await;
        }
    }
}
