//! Sink traits and implementations for audio destinations.
//!
//! The bridge talks to two destinations:
//!
//! - a [`PlaybackSink`] (the avatar renderer) that receives resampled
//!   synthesis audio through [`forward`](PlaybackSink::forward)
//! - an [`UpstreamSink`] (the realtime conversation session) that receives
//!   encoded microphone audio through [`send`](UpstreamSink::send)
//!
//! Both calls resolve once the sink has accepted the chunk, which is what
//! lets the playback queue keep at most one forward in flight. The crate
//! provides two built-in sinks that implement both traits:
//!
//! - [`ChannelSink`]: Sends chunks to a tokio mpsc channel
//! - [`FileSink`]: Writes chunks to a WAV file

mod channel;
mod file;

pub use channel::ChannelSink;
pub use file::FileSink;

use crate::{AudioChunk, SinkError};
use async_trait::async_trait;

/// Destination for resampled synthesis audio.
///
/// # Implementation Notes
///
/// - Methods take `&self` - use interior mutability if needed
/// - `forward` is never called concurrently by the bridge; the next chunk is
///   only forwarded after the previous call has resolved
/// - `on_start` is called by [`StreamCoordinator::start`] before audio flows
/// - `on_stop` is called by [`StreamCoordinator::stop`] after pending chunks
///   have been forwarded
///
/// [`StreamCoordinator::start`]: crate::StreamCoordinator::start
/// [`StreamCoordinator::stop`]: crate::StreamCoordinator::stop
///
/// # Example
///
/// ```
/// use voice_bridge::{AudioChunk, PlaybackSink, SinkError};
/// use async_trait::async_trait;
///
/// struct PrintSink;
///
/// #[async_trait]
/// impl PlaybackSink for PrintSink {
///     fn name(&self) -> &str {
///         "print"
///     }
///
///     async fn forward(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
///         println!("chunk {} with {} samples", chunk.sequence, chunk.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Called once before streaming begins.
    ///
    /// Default implementation does nothing.
    async fn on_start(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Hand one chunk of playback audio to the renderer.
    async fn forward(&self, chunk: &AudioChunk) -> Result<(), SinkError>;

    /// Discard audio the renderer has buffered but not yet played.
    ///
    /// Called when the user interrupts. Default implementation does nothing.
    async fn clear(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Called during graceful shutdown.
    ///
    /// Default implementation does nothing.
    async fn on_stop(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Destination for encoded microphone audio.
#[async_trait]
pub trait UpstreamSink: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Called once before streaming begins.
    ///
    /// Default implementation does nothing.
    async fn on_start(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Send one capture block upstream.
    ///
    /// Errors are returned to the caller of
    /// [`StreamCoordinator::on_capture_block`](crate::StreamCoordinator::on_capture_block)
    /// as [`BridgeError::SinkUnavailable`](crate::BridgeError::SinkUnavailable).
    async fn send(&self, chunk: &AudioChunk) -> Result<(), SinkError>;

    /// Called during graceful shutdown.
    ///
    /// Default implementation does nothing.
    async fn on_stop(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
