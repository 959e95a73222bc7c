//! Bridge counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of bridge activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Synthesis deltas received.
    pub deltas_received: u64,
    /// Playback chunks delivered to the playback sink.
    pub chunks_forwarded: u64,
    /// Playback chunks abandoned after failed forwards.
    pub chunks_dropped: u64,
    /// Playback chunks discarded by interruption.
    pub chunks_cleared: u64,
    /// Playback chunks discarded by the high-water mark.
    pub queue_overflows: u64,
    /// Samples clamped to the 16-bit range on either path.
    pub samples_clamped: u64,
    /// Capture blocks delivered to the upstream sink.
    pub capture_blocks_sent: u64,
}

/// Counters shared between the coordinator and its playback queue.
#[derive(Debug, Default)]
pub(crate) struct StatsState {
    pub deltas_received: AtomicU64,
    pub chunks_forwarded: AtomicU64,
    pub chunks_dropped: AtomicU64,
    pub chunks_cleared: AtomicU64,
    pub queue_overflows: AtomicU64,
    pub samples_clamped: AtomicU64,
    pub capture_blocks_sent: AtomicU64,
}

impl StatsState {
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            deltas_received: self.deltas_received.load(Ordering::Relaxed),
            chunks_forwarded: self.chunks_forwarded.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            chunks_cleared: self.chunks_cleared.load(Ordering::Relaxed),
            queue_overflows: self.queue_overflows.load(Ordering::Relaxed),
            samples_clamped: self.samples_clamped.load(Ordering::Relaxed),
            capture_blocks_sent: self.capture_blocks_sent.load(Ordering::Relaxed),
        }
    }
}
