//! Progress bar utilities for transfers

use ferry_transfer::Progress;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for a transfer of known size.
pub fn create_transfer_progress(total_bytes: u64, name: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(name.to_string());
    pb
}

/// Adapter feeding engine progress events into an indicatif bar.
pub struct TransferBar {
    bar: ProgressBar,
}

impl TransferBar {
    pub fn new(total_bytes: u64, name: &str) -> Self {
        Self {
            bar: create_transfer_progress(total_bytes, name),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl Progress for TransferBar {
    fn on_bytes(&self, n: u64) {
        self.bar.inc(n);
    }
}

/// Format bytes as a human readable string.
pub fn format_bytes(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
