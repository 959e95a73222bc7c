//! Tokio mpsc channel sink implementation.

use crate::sink::{PlaybackSink, UpstreamSink};
use crate::{AudioChunk, SinkError};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A sink that sends audio chunks to a tokio mpsc channel.
///
/// Useful for handing audio to a task that owns the real connection (a
/// WebRTC track, a websocket writer). `forward`/`send` resolve once the
/// channel has accepted the chunk, so a bounded channel applies
/// backpressure to the playback queue.
///
/// # Example
///
/// ```
/// use voice_bridge::{AudioChunk, ChannelSink};
/// use tokio::sync::mpsc;
///
/// let (tx, mut rx) = mpsc::channel::<AudioChunk>(32);
/// let sink = ChannelSink::new(tx);
/// // while let Some(chunk) = rx.recv().await { ... }
/// ```
pub struct ChannelSink {
    name: String,
    sender: mpsc::Sender<AudioChunk>,
}

impl ChannelSink {
    /// Creates a new channel sink with the given sender.
    pub fn new(sender: mpsc::Sender<AudioChunk>) -> Self {
        Self {
            name: "channel".to_string(),
            sender,
        }
    }

    /// Creates a new channel sink with a custom name.
    pub fn with_name(name: impl Into<String>, sender: mpsc::Sender<AudioChunk>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    async fn push(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
        self.sender
            .send(chunk.clone())
            .await
            .map_err(|_| SinkError::ChannelClosed)
    }
}

#[async_trait]
impl PlaybackSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
        self.push(chunk).await
    }
}

#[async_trait]
impl UpstreamSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
        self.push(chunk).await
    }
}
