//! # voice-bridge
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Audio bridge between a realtime speech model and a lip-synced avatar.
//!
//! The model produces 24kHz PCM16 speech in small deltas; the avatar renderer
//! consumes 16kHz PCM16. Microphone audio travels the other way as float
//! blocks that the model expects as PCM16. `voice-bridge` does the sample
//! work in between and keeps playback strictly ordered.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voice_bridge::{AudioChunk, ChannelSink, FileSink, StreamCoordinator};
//! use tokio::sync::mpsc;
//!
//! let (avatar_tx, mut avatar_rx) = mpsc::channel::<AudioChunk>(32);
//!
//! let bridge = StreamCoordinator::builder()
//!     .playback_sink(ChannelSink::with_name("avatar", avatar_tx))
//!     .upstream_sink(FileSink::wav("microphone.wav"))
//!     .on_event(|e| tracing::warn!(?e, "bridge event"))
//!     .build()?;
//! bridge.start().await?;
//!
//! // From the model's audio-delta handler
//! bridge.on_synthesis_bytes(&delta_bytes).await?;
//!
//! // From the microphone callback
//! bridge.on_capture_block(&block).await?;
//!
//! // User started talking over the assistant
//! bridge.interrupt().await;
//!
//! bridge.stop().await;
//! ```
//!
//! ## Architecture
//!
//! - **Playback path**: delta → anti-aliasing FIR → downsample → FIFO queue
//!   → playback sink, one forward in flight at a time
//! - **Capture path**: float block → PCM16 → upstream sink, no queueing
//!
//! Samples that do not fit in 16 bits are clamped and reported through
//! [`BridgeEvent::SamplesClamped`].

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod builder;
mod chunk;
mod config;
mod coordinator;
mod error;
mod event;
pub mod format;
mod mock;
pub mod pipeline;
mod sink;
mod stats;

pub use builder::StreamCoordinatorBuilder;
pub use chunk::AudioChunk;
pub use config::{
    BridgeConfig, CAPTURE_BLOCK_SIZE, CAPTURE_SAMPLE_RATE, DEFAULT_CUTOFF_RATIO,
    DEFAULT_FILTER_TAPS, PLAYBACK_SAMPLE_RATE, SYNTHESIS_SAMPLE_RATE,
};
pub use coordinator::StreamCoordinator;
pub use error::{BridgeError, SinkError};
pub use event::{event_callback, BridgeEvent, EventCallback, Stage};
pub use mock::MockSource;
pub use pipeline::{PlaybackQueue, QueuePhase};
pub use sink::{ChannelSink, FileSink, PlaybackSink, UpstreamSink};
pub use stats::BridgeStats;
