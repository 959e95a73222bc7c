//! The stream coordinator: wires resampling, the playback queue and capture
//! encoding between the realtime model and the avatar renderer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::chunk::position;
use crate::event::{emit, Stage};
use crate::format::{mean_level, pcm16_from_le_bytes, CaptureEncoder, Resampler};
use crate::pipeline::{PlaybackQueue, QueuePhase};
use crate::sink::{PlaybackSink, UpstreamSink};
use crate::stats::StatsState;
use crate::{
    AudioChunk, BridgeConfig, BridgeError, BridgeEvent, BridgeStats, EventCallback,
    StreamCoordinatorBuilder,
};

/// Position of the next capture chunk in the upstream stream.
#[derive(Default)]
struct CaptureCursor {
    next_sequence: u64,
    samples_sent: u64,
}

/// Bridges synthesis audio to the playback sink and microphone audio to the
/// upstream sink.
///
/// The coordinator owns both sinks. It is `Send + Sync`; wrap it in an `Arc`
/// to drive the playback and capture paths from different tasks.
///
/// # Example
///
/// ```
/// use voice_bridge::{AudioChunk, ChannelSink, StreamCoordinator};
/// use tokio::sync::mpsc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), voice_bridge::BridgeError> {
/// let (avatar_tx, mut avatar_rx) = mpsc::channel::<AudioChunk>(32);
/// let (model_tx, _model_rx) = mpsc::channel::<AudioChunk>(32);
///
/// let bridge = StreamCoordinator::builder()
///     .playback_sink(ChannelSink::with_name("avatar", avatar_tx))
///     .upstream_sink(ChannelSink::with_name("model", model_tx))
///     .build()?;
/// bridge.start().await?;
///
/// bridge.on_synthesis_delta(&[1000, -1000, 500, -500, 250]).await?;
/// let chunk = avatar_rx.recv().await.unwrap();
/// assert_eq!(*chunk.samples, vec![300, -191, -42]);
/// # Ok(())
/// # }
/// ```
pub struct StreamCoordinator {
    config: BridgeConfig,
    resampler: Resampler,
    encoder: CaptureEncoder,
    queue: PlaybackQueue,
    playback: Arc<dyn PlaybackSink>,
    upstream: Arc<dyn UpstreamSink>,
    capture: Mutex<CaptureCursor>,
    event_callback: Option<EventCallback>,
    stats: Arc<StatsState>,
}

impl StreamCoordinator {
    /// Creates a builder for configuring the coordinator.
    pub fn builder() -> StreamCoordinatorBuilder {
        StreamCoordinatorBuilder::new()
    }

    pub(crate) fn new(
        config: BridgeConfig,
        resampler: Resampler,
        queue: PlaybackQueue,
        playback: Arc<dyn PlaybackSink>,
        upstream: Arc<dyn UpstreamSink>,
        event_callback: Option<EventCallback>,
        stats: Arc<StatsState>,
    ) -> Self {
        Self {
            config,
            resampler,
            encoder: CaptureEncoder::new(),
            queue,
            playback,
            upstream,
            capture: Mutex::new(CaptureCursor::default()),
            event_callback,
            stats,
        }
    }

    /// Starts both sinks.
    ///
    /// Returns an error if either sink fails to start.
    pub async fn start(&self) -> Result<(), BridgeError> {
        self.playback
            .on_start()
            .await
            .map_err(|e| BridgeError::SinkStartFailed {
                sink_name: self.playback.name().to_string(),
                reason: e.to_string(),
            })?;
        self.upstream
            .on_start()
            .await
            .map_err(|e| BridgeError::SinkStartFailed {
                sink_name: self.upstream.name().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            playback = self.playback.name(),
            upstream = self.upstream.name(),
            synthesis_hz = self.config.synthesis_sample_rate,
            playback_hz = self.config.playback_sample_rate,
            capture_hz = self.config.capture_sample_rate,
            "stream coordinator started"
        );
        Ok(())
    }

    /// Handles one synthesis delta: resamples it, queues it, and forwards
    /// pending chunks to the playback sink.
    ///
    /// Returns the number of chunks this call delivered. If another task is
    /// already forwarding, the chunk is left to that task and 0 is returned.
    /// Playback sink failures do not fail this call; they are reported as
    /// events and the chunk is dropped. After [`stop`](Self::stop) the delta
    /// is refused with [`BridgeError::Stopped`].
    pub async fn on_synthesis_delta(&self, delta: &[i16]) -> Result<usize, BridgeError> {
        StatsState::add(&self.stats.deltas_received, 1);

        let resampled = self.resampler.process(delta);
        self.report_clamped(Stage::Filter, resampled.clamped);

        if resampled.samples.is_empty() {
            tracing::trace!(input = delta.len(), "synthesis delta produced no playback samples");
            return Ok(0);
        }

        let chunk = AudioChunk::new(resampled.samples, self.config.playback_sample_rate);
        if self.queue.enqueue(chunk).is_none() {
            tracing::debug!(input = delta.len(), "synthesis delta after stop");
            return Err(BridgeError::Stopped);
        }
        Ok(self.queue.drain().await)
    }

    /// Handles a synthesis delta delivered as little-endian PCM16 bytes.
    pub async fn on_synthesis_bytes(&self, bytes: &[u8]) -> Result<usize, BridgeError> {
        let samples = pcm16_from_le_bytes(bytes)?;
        self.on_synthesis_delta(&samples).await
    }

    /// Encodes one microphone block and sends it upstream immediately.
    ///
    /// Capture audio is not queued. If the upstream sink rejects the block
    /// the error is returned as [`BridgeError::SinkUnavailable`].
    pub async fn on_capture_block(&self, block: &[f32]) -> Result<(), BridgeError> {
        if self.queue.is_closed() {
            return Err(BridgeError::Stopped);
        }

        let encoded = self.encoder.encode(block);
        self.report_clamped(Stage::Capture, encoded.clamped);

        if encoded.samples.is_empty() {
            return Ok(());
        }

        let sample_rate = self.config.capture_sample_rate;
        let samples = encoded.samples.len() as u64;
        let chunk = {
            let mut cursor = self.capture.lock();
            let chunk = AudioChunk::new(encoded.samples, sample_rate).at(
                cursor.next_sequence,
                position(cursor.samples_sent, sample_rate),
            );
            cursor.next_sequence += 1;
            cursor.samples_sent += samples;
            chunk
        };

        tracing::trace!(
            sequence = chunk.sequence,
            samples,
            level = mean_level(block),
            "capture block"
        );

        if let Err(e) = self.upstream.send(&chunk).await {
            tracing::warn!(sink = self.upstream.name(), error = %e, "upstream send failed");
            emit(
                self.event_callback.as_ref(),
                BridgeEvent::SinkError {
                    sink_name: self.upstream.name().to_string(),
                    error: e.to_string(),
                },
            );
            return Err(BridgeError::SinkUnavailable {
                sink_name: self.upstream.name().to_string(),
                reason: e.to_string(),
            });
        }

        StatsState::add(&self.stats.capture_blocks_sent, 1);
        Ok(())
    }

    /// Discards queued playback after the user interrupts the assistant, and
    /// asks the playback sink to drop what it has buffered.
    ///
    /// Returns the number of queued chunks discarded. A chunk already being
    /// forwarded is not recalled.
    pub async fn interrupt(&self) -> usize {
        let cleared = self.queue.clear();

        if let Err(e) = self.playback.clear().await {
            tracing::warn!(sink = self.playback.name(), error = %e, "playback clear failed");
            emit(
                self.event_callback.as_ref(),
                BridgeEvent::SinkError {
                    sink_name: self.playback.name().to_string(),
                    error: e.to_string(),
                },
            );
        }

        tracing::info!(cleared, "playback interrupted");
        emit(
            self.event_callback.as_ref(),
            BridgeEvent::PlaybackInterrupted {
                cleared_chunks: cleared,
            },
        );
        cleared
    }

    /// Forwards any pending playback, then stops both sinks.
    ///
    /// New audio is refused from the moment this is called. If another task
    /// is mid-forward, waits for it so that `on_stop` is the last call each
    /// sink sees. Shutdown errors are reported as events.
    pub async fn stop(&self) {
        self.queue.close();
        self.queue.flush().await;

        let results = [
            (self.playback.name(), self.playback.on_stop().await),
            (self.upstream.name(), self.upstream.on_stop().await),
        ];
        for (sink_name, result) in results {
            if let Err(e) = result {
                tracing::warn!(sink = sink_name, error = %e, "sink shutdown failed");
                emit(
                    self.event_callback.as_ref(),
                    BridgeEvent::SinkError {
                        sink_name: sink_name.to_string(),
                        error: format!("Error during shutdown: {e}"),
                    },
                );
            }
        }

        tracing::info!(stats = ?self.stats.snapshot(), "stream coordinator stopped");
    }

    /// Returns current bridge statistics.
    pub fn stats(&self) -> BridgeStats {
        self.stats.snapshot()
    }

    /// Number of playback chunks waiting to be forwarded.
    pub fn pending_chunks(&self) -> usize {
        self.queue.len()
    }

    /// Whether a playback forward is in flight.
    pub fn playback_phase(&self) -> QueuePhase {
        self.queue.phase()
    }

    /// The configuration the coordinator was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn report_clamped(&self, stage: Stage, count: usize) {
        if count == 0 {
            return;
        }
        tracing::warn!(?stage, count, "samples clamped to 16-bit range");
        StatsState::add(&self.stats.samples_clamped, count);
        emit(
            self.event_callback.as_ref(),
            BridgeEvent::SamplesClamped { stage, count },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelSink, SinkError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    struct RejectingSink;

    #[async_trait]
    impl UpstreamSink for RejectingSink {
        fn name(&self) -> &str {
            "offline"
        }

        async fn send(&self, _chunk: &AudioChunk) -> Result<(), SinkError> {
            Err(SinkError::NotReady)
        }
    }

    #[async_trait]
    impl PlaybackSink for RejectingSink {
        fn name(&self) -> &str {
            "offline"
        }

        async fn on_start(&self) -> Result<(), SinkError> {
            Err(SinkError::NotReady)
        }

        async fn forward(&self, _chunk: &AudioChunk) -> Result<(), SinkError> {
            Err(SinkError::NotReady)
        }
    }

    fn channel_bridge() -> (
        StreamCoordinator,
        mpsc::Receiver<AudioChunk>,
        mpsc::Receiver<AudioChunk>,
    ) {
        let (playback_tx, playback_rx) = mpsc::channel(64);
        let (upstream_tx, upstream_rx) = mpsc::channel(64);
        let bridge = StreamCoordinator::builder()
            .playback_sink(ChannelSink::with_name("avatar", playback_tx))
            .upstream_sink(ChannelSink::with_name("model", upstream_tx))
            .build()
            .unwrap();
        (bridge, playback_rx, upstream_rx)
    }

    #[tokio::test]
    async fn test_synthesis_delta_resampled_and_forwarded() {
        let (bridge, mut playback_rx, _upstream_rx) = channel_bridge();

        let delivered = bridge
            .on_synthesis_delta(&[1000, -1000, 500, -500, 250])
            .await
            .unwrap();

        assert_eq!(delivered, 1);
        let chunk = playback_rx.recv().await.unwrap();
        assert_eq!(*chunk.samples, vec![300, -191, -42]);
        assert_eq!(chunk.sample_rate, 16000);
        assert_eq!(bridge.stats().chunks_forwarded, 1);
        assert_eq!(bridge.playback_phase(), QueuePhase::Idle);
    }

    #[tokio::test]
    async fn test_synthesis_bytes_decoded() {
        let (bridge, mut playback_rx, _upstream_rx) = channel_bridge();
        let bytes: Vec<u8> = [1000i16, -1000, 500, -500, 250]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();

        bridge.on_synthesis_bytes(&bytes).await.unwrap();
        assert_eq!(*playback_rx.recv().await.unwrap().samples, vec![300, -191, -42]);

        let err = bridge.on_synthesis_bytes(&[0x00]).await.unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPcm { len: 1 }));
    }

    #[tokio::test]
    async fn test_empty_delta_forwards_nothing() {
        let (bridge, mut playback_rx, _upstream_rx) = channel_bridge();
        assert_eq!(bridge.on_synthesis_delta(&[]).await.unwrap(), 0);
        assert!(playback_rx.try_recv().is_err());
        assert_eq!(bridge.stats().deltas_received, 1);
    }

    #[tokio::test]
    async fn test_capture_block_encoded_and_sent() {
        let (bridge, _playback_rx, mut upstream_rx) = channel_bridge();

        bridge
            .on_capture_block(&[0.0, 1.0, -1.0, 1.5, -1.5])
            .await
            .unwrap();
        bridge.on_capture_block(&[0.5]).await.unwrap();

        let first = upstream_rx.recv().await.unwrap();
        assert_eq!(*first.samples, vec![0, 32767, -32768, 32767, -32768]);
        assert_eq!(first.sample_rate, 24000);
        assert_eq!(first.sequence, 0);

        let second = upstream_rx.recv().await.unwrap();
        assert_eq!(second.sequence, 1);
        assert_eq!(second.timestamp, position(5, 24000));

        let stats = bridge.stats();
        assert_eq!(stats.capture_blocks_sent, 2);
        assert_eq!(stats.samples_clamped, 2);
    }

    #[tokio::test]
    async fn test_capture_error_surfaces_as_sink_unavailable() {
        let (playback_tx, _playback_rx) = mpsc::channel(4);
        let errors = Arc::new(AtomicUsize::new(0));
        let errors_clone = errors.clone();
        let bridge = StreamCoordinator::builder()
            .playback_sink(ChannelSink::new(playback_tx))
            .upstream_sink(RejectingSink)
            .on_event(move |event| {
                if matches!(event, BridgeEvent::SinkError { .. }) {
                    errors_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        let err = bridge.on_capture_block(&[0.1; 16]).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::SinkUnavailable { ref sink_name, .. } if sink_name == "offline"
        ));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.stats().capture_blocks_sent, 0);
    }

    #[tokio::test]
    async fn test_playback_failure_drops_chunk_without_error() {
        let (upstream_tx, _upstream_rx) = mpsc::channel(4);
        let bridge = StreamCoordinator::builder()
            .playback_sink(RejectingSink)
            .upstream_sink(ChannelSink::new(upstream_tx))
            .build()
            .unwrap();

        let delivered = bridge.on_synthesis_delta(&[100; 48]).await.unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(bridge.stats().chunks_dropped, 1);
        assert_eq!(bridge.pending_chunks(), 0);
    }

    #[tokio::test]
    async fn test_start_reports_failing_sink() {
        let (upstream_tx, _upstream_rx) = mpsc::channel(4);
        let bridge = StreamCoordinator::builder()
            .playback_sink(RejectingSink)
            .upstream_sink(ChannelSink::new(upstream_tx))
            .build()
            .unwrap();

        let err = bridge.start().await.unwrap_err();
        assert!(matches!(err, BridgeError::SinkStartFailed { .. }));
    }

    #[tokio::test]
    async fn test_audio_refused_after_stop() {
        let (bridge, mut playback_rx, mut upstream_rx) = channel_bridge();
        bridge.on_synthesis_delta(&[100; 48]).await.unwrap();
        bridge.stop().await;

        assert!(matches!(
            bridge.on_synthesis_delta(&[100; 48]).await,
            Err(BridgeError::Stopped)
        ));
        assert!(matches!(
            bridge.on_capture_block(&[0.1; 8]).await,
            Err(BridgeError::Stopped)
        ));
        assert!(playback_rx.recv().await.is_some());
        assert!(playback_rx.try_recv().is_err());
        assert!(upstream_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_overshoot_is_counted() {
        let (bridge, mut playback_rx, _upstream_rx) = channel_bridge();
        let delta = [
            32767, 32767, -32768, 32767, 32767, -32768, 32767, 32767, 32767,
        ];

        bridge.on_synthesis_delta(&delta).await.unwrap();

        let chunk = playback_rx.recv().await.unwrap();
        assert_eq!(chunk.len(), 6);
        assert!(bridge.stats().samples_clamped >= 1);
    }
}
