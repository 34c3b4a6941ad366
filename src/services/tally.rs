use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Process-wide count of completed transfers. An external collaborator the
/// coordinator notifies after each successful byte transfer; deliberately
/// not a cache invariant. Never torn down.
pub trait UploadTally: Send + Sync {
    /// Called once per successfully transferred file.
    fn record_upload(&self, file_key: &str);

    fn total(&self) -> u64;
}

/// In-memory tally backed by an atomic counter.
#[derive(Debug, Default)]
pub struct InMemoryTally {
    count: AtomicU64,
}

impl InMemoryTally {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UploadTally for InMemoryTally {
    fn record_upload(&self, file_key: &str) {
        let total = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(%file_key, total, "upload recorded");
    }

    fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Tally that records nothing.
pub struct NoopTally;

impl UploadTally for NoopTally {
    fn record_upload(&self, _file_key: &str) {}

    fn total(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_uploads() {
        let tally = InMemoryTally::new();
        assert_eq!(tally.total(), 0);
        tally.record_upload("uploads/a.csv");
        tally.record_upload("uploads/b.csv");
        assert_eq!(tally.total(), 2);
    }
}
