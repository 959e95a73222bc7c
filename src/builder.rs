//! Builder pattern for `StreamCoordinator`.

use std::sync::Arc;

use crate::format::Resampler;
use crate::pipeline::{PlaybackQueue, QueueConfig};
use crate::sink::{PlaybackSink, UpstreamSink};
use crate::stats::StatsState;
use crate::{event_callback, BridgeConfig, BridgeError, BridgeEvent, EventCallback, StreamCoordinator};

/// Builder for configuring a [`StreamCoordinator`].
///
/// Use [`StreamCoordinator::builder()`] to create a new builder. Both sinks
/// are required.
///
/// # Example
///
/// ```
/// use voice_bridge::{BridgeConfig, ChannelSink, StreamCoordinator};
/// use tokio::sync::mpsc;
///
/// let (avatar_tx, _avatar_rx) = mpsc::channel(32);
/// let (model_tx, _model_rx) = mpsc::channel(32);
///
/// let bridge = StreamCoordinator::builder()
///     .playback_sink(ChannelSink::with_name("avatar", avatar_tx))
///     .upstream_sink(ChannelSink::with_name("model", model_tx))
///     .with_config(BridgeConfig {
///         max_pending_chunks: Some(64),
///         ..BridgeConfig::default()
///     })
///     .on_event(|event| eprintln!("bridge event: {event:?}"))
///     .build()
///     .unwrap();
/// # let _ = bridge;
/// ```
#[must_use]
pub struct StreamCoordinatorBuilder {
    playback: Option<Arc<dyn PlaybackSink>>,
    upstream: Option<Arc<dyn UpstreamSink>>,
    event_callback: Option<EventCallback>,
    config: BridgeConfig,
}

impl Default for StreamCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamCoordinatorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            playback: None,
            upstream: None,
            event_callback: None,
            config: BridgeConfig::default(),
        }
    }

    /// Set the sink that receives resampled synthesis audio.
    pub fn playback_sink<S: PlaybackSink + 'static>(mut self, sink: S) -> Self {
        self.playback = Some(Arc::new(sink));
        self
    }

    /// Set a shared playback sink, keeping a handle for the caller.
    pub fn playback_sink_arc(mut self, sink: Arc<dyn PlaybackSink>) -> Self {
        self.playback = Some(sink);
        self
    }

    /// Set the sink that receives encoded microphone audio.
    pub fn upstream_sink<S: UpstreamSink + 'static>(mut self, sink: S) -> Self {
        self.upstream = Some(Arc::new(sink));
        self
    }

    /// Set a shared upstream sink, keeping a handle for the caller.
    pub fn upstream_sink_arc(mut self, sink: Arc<dyn UpstreamSink>) -> Self {
        self.upstream = Some(sink);
        self
    }

    /// Set a callback to receive runtime events.
    ///
    /// Events include clamp counts, queue overflows, sink errors and
    /// interruptions.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(BridgeEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Set custom bridge configuration.
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the coordinator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid (see [`BridgeConfig::validate`])
    /// - The playback rate is above the synthesis rate
    /// - Either sink is missing
    pub fn build(self) -> Result<StreamCoordinator, BridgeError> {
        self.config.validate()?;
        let playback = self.playback.ok_or(BridgeError::NoPlaybackSink)?;
        let upstream = self.upstream.ok_or(BridgeError::NoUpstreamSink)?;

        let resampler = Resampler::with_filter(
            self.config.synthesis_sample_rate,
            self.config.playback_sample_rate,
            self.config.filter_taps,
            self.config.cutoff_ratio,
        )?;

        let stats = Arc::new(StatsState::default());
        let queue = PlaybackQueue::new(
            Arc::clone(&playback),
            QueueConfig::from(&self.config),
            self.event_callback.clone(),
            Arc::clone(&stats),
        );

        tracing::debug!(
            playback = playback.name(),
            upstream = upstream.name(),
            taps = self.config.filter_taps,
            identity = resampler.is_identity(),
            "stream coordinator built"
        );

        Ok(StreamCoordinator::new(
            self.config,
            resampler,
            queue,
            playback,
            upstream,
            self.event_callback,
            stats,
        ))
    }
}
