//! Ordered playback queue with a single forwarder.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::chunk::position;
use crate::event::emit;
use crate::sink::PlaybackSink;
use crate::stats::StatsState;
use crate::{AudioChunk, BridgeConfig, BridgeEvent, EventCallback};

/// Whether a chunk is currently being forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    /// No forward in flight.
    Idle,
    /// One chunk is being handed to the sink.
    Forwarding,
}

/// Queue settings taken from [`BridgeConfig`].
#[derive(Debug, Clone)]
pub(crate) struct QueueConfig {
    pub max_pending: Option<usize>,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl From<&BridgeConfig> for QueueConfig {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            max_pending: config.max_pending_chunks,
            retry_attempts: config.sink_retry_attempts.max(1),
            retry_delay: config.sink_retry_delay,
        }
    }
}

struct QueueState {
    pending: VecDeque<AudioChunk>,
    forwarding: bool,
    closed: bool,
    next_sequence: u64,
    samples_enqueued: u64,
}

/// FIFO of resampled chunks awaiting delivery to the playback sink.
///
/// Any number of tasks may enqueue; exactly one of them at a time drains.
/// The pending list and the forwarding flag share one lock, so a chunk
/// pushed while another task is draining is always picked up by that
/// drainer. The lock is never held across a sink call.
pub struct PlaybackQueue {
    sink: Arc<dyn PlaybackSink>,
    state: Mutex<QueueState>,
    // Signalled whenever a drainer returns to Idle.
    idle: Notify,
    config: QueueConfig,
    event_callback: Option<EventCallback>,
    stats: Arc<StatsState>,
}

/// Clears the forwarding flag if a drain is abandoned mid-forward.
struct ForwardingGuard<'a> {
    state: &'a Mutex<QueueState>,
    idle: &'a Notify,
    armed: bool,
}

impl Drop for ForwardingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().forwarding = false;
            self.idle.notify_waiters();
        }
    }
}

impl PlaybackQueue {
    pub(crate) fn new(
        sink: Arc<dyn PlaybackSink>,
        config: QueueConfig,
        event_callback: Option<EventCallback>,
        stats: Arc<StatsState>,
    ) -> Self {
        Self {
            sink,
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                forwarding: false,
                closed: false,
                next_sequence: 0,
                samples_enqueued: 0,
            }),
            idle: Notify::new(),
            config,
            event_callback,
            stats,
        }
    }

    /// Appends a chunk, stamping its sequence number and stream position.
    ///
    /// Returns the assigned sequence number, or `None` once the queue has
    /// been closed. If a high-water mark is configured and exceeded, the
    /// oldest pending chunks are discarded.
    pub fn enqueue(&self, chunk: AudioChunk) -> Option<u64> {
        let (sequence, dropped) = {
            let mut state = self.state.lock();
            if state.closed {
                return None;
            }
            let sequence = state.next_sequence;
            let timestamp = position(state.samples_enqueued, chunk.sample_rate);
            state.next_sequence += 1;
            state.samples_enqueued += chunk.len() as u64;
            state.pending.push_back(chunk.at(sequence, timestamp));

            let mut dropped = 0;
            if let Some(max) = self.config.max_pending {
                while state.pending.len() > max {
                    state.pending.pop_front();
                    dropped += 1;
                }
            }
            (sequence, dropped)
        };

        if dropped > 0 {
            tracing::warn!(dropped, "playback queue over high-water mark, dropped oldest chunks");
            StatsState::add(&self.stats.queue_overflows, dropped);
            emit(
                self.event_callback.as_ref(),
                BridgeEvent::QueueOverflow {
                    dropped_chunks: dropped,
                },
            );
        }
        Some(sequence)
    }

    /// Forwards pending chunks in order until the queue is empty.
    ///
    /// Returns immediately with 0 if another task is already draining; that
    /// task will forward whatever this caller enqueued. Otherwise returns the
    /// number of chunks this call delivered.
    pub async fn drain(&self) -> usize {
        {
            let mut state = self.state.lock();
            if state.forwarding || state.pending.is_empty() {
                return 0;
            }
            state.forwarding = true;
        }
        let mut guard = ForwardingGuard {
            state: &self.state,
            idle: &self.idle,
            armed: true,
        };

        let mut delivered = 0;
        loop {
            let chunk = {
                let mut state = self.state.lock();
                if let Some(chunk) = state.pending.pop_front() {
                    chunk
                } else {
                    state.forwarding = false;
                    guard.armed = false;
                    break;
                }
            };

            if self.forward_with_retry(&chunk).await {
                delivered += 1;
            }
        }
        self.idle.notify_waiters();
        delivered
    }

    /// Stops accepting chunks. Pending chunks stay queued for [`flush`].
    ///
    /// [`flush`]: Self::flush
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Waits until the queue is empty and no forward is in flight.
    ///
    /// If another task is draining, waits for it to finish, then drains
    /// whatever it left behind. Returns the number of chunks this call
    /// delivered itself.
    pub async fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let mut idle = pin!(self.idle.notified());
            // Register before checking so a drainer finishing in between
            // still wakes us.
            idle.as_mut().enable();

            let busy = {
                let state = self.state.lock();
                if !state.forwarding && state.pending.is_empty() {
                    return delivered;
                }
                state.forwarding
            };

            if busy {
                idle.await;
            } else {
                delivered += self.drain().await;
            }
        }
    }

    /// Forwards one chunk, retrying with exponential backoff.
    ///
    /// Returns `false` if the chunk was dropped.
    async fn forward_with_retry(&self, chunk: &AudioChunk) -> bool {
        let mut attempts = 0;
        let mut delay = self.config.retry_delay;

        loop {
            match self.sink.forward(chunk).await {
                Ok(()) => {
                    tracing::debug!(
                        sink = self.sink.name(),
                        sequence = chunk.sequence,
                        samples = chunk.len(),
                        duration_ms = chunk.duration().as_secs_f64() * 1000.0,
                        "forwarded playback chunk"
                    );
                    StatsState::add(&self.stats.chunks_forwarded, 1);
                    return true;
                }
                Err(e) => {
                    attempts += 1;
                    tracing::warn!(
                        sink = self.sink.name(),
                        sequence = chunk.sequence,
                        attempt = attempts,
                        error = %e,
                        "playback forward failed"
                    );
                    emit(
                        self.event_callback.as_ref(),
                        BridgeEvent::SinkError {
                            sink_name: self.sink.name().to_string(),
                            error: e.to_string(),
                        },
                    );

                    if attempts >= self.config.retry_attempts {
                        StatsState::add(&self.stats.chunks_dropped, 1);
                        emit(
                            self.event_callback.as_ref(),
                            BridgeEvent::ChunkDropped {
                                sink_name: self.sink.name().to_string(),
                                sequence: chunk.sequence,
                            },
                        );
                        return false;
                    }

                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    /// Discards every pending chunk. A forward already in flight completes.
    ///
    /// Returns the number of chunks removed.
    pub fn clear(&self) -> usize {
        let cleared = {
            let mut state = self.state.lock();
            let cleared = state.pending.len();
            state.pending.clear();
            cleared
        };
        StatsState::add(&self.stats.chunks_cleared, cleared);
        cleared
    }

    /// Number of chunks waiting to be forwarded.
    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Returns `true` if no chunks are waiting.
    pub fn is_empty(&self) -> bool {
        self.state.lock().pending.is_empty()
    }

    /// Current forwarding phase.
    pub fn phase(&self) -> QueuePhase {
        if self.state.lock().forwarding {
            QueuePhase::Forwarding
        } else {
            QueuePhase::Idle
        }
    }
}
