//! Error types for voice-bridge.
//!
//! Errors are split into two categories:
//! - **Caller errors** ([`BridgeError`]): returned synchronously to whoever
//!   invoked the coordinator or a format function
//! - **Sink errors** ([`SinkError`]): produced by sink implementations; on the
//!   playback path they are reported via [`EventCallback`](crate::EventCallback)
//!   and the chunk is dropped, on the capture path they surface as
//!   [`BridgeError::SinkUnavailable`]

use std::path::PathBuf;

/// Errors returned to the caller of a bridge operation.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A resample was requested with an output rate above the input rate.
    ///
    /// Upsampling is never performed.
    #[error("unsupported operation: cannot upsample {from_rate}Hz to {to_rate}Hz")]
    UnsupportedOperation {
        /// Input sample rate.
        from_rate: u32,
        /// Requested output sample rate.
        to_rate: u32,
    },

    /// A sample rate of zero was supplied where a conversion is required.
    #[error("invalid sample rate: {rate}Hz")]
    InvalidSampleRate {
        /// The rejected rate.
        rate: u32,
    },

    /// The low-pass filter parameters cannot produce a valid kernel.
    #[error("invalid filter: {reason}")]
    InvalidFilter {
        /// What was wrong with the parameters.
        reason: String,
    },

    /// A PCM16 byte buffer had an odd length.
    #[error("malformed pcm16 data: {len} bytes is not a whole number of samples")]
    MalformedPcm {
        /// Length of the rejected buffer in bytes.
        len: usize,
    },

    /// A sink refused a chunk that had to be delivered immediately.
    #[error("sink '{sink_name}' unavailable: {reason}")]
    SinkUnavailable {
        /// Name of the sink.
        sink_name: String,
        /// Why the sink rejected the chunk.
        reason: String,
    },

    /// A sink failed during initialization.
    #[error("sink '{sink_name}' failed to start: {reason}")]
    SinkStartFailed {
        /// Name of the sink that failed.
        sink_name: String,
        /// Why the sink failed to start.
        reason: String,
    },

    /// The builder was finished without a playback sink.
    #[error("no playback sink configured")]
    NoPlaybackSink,

    /// The builder was finished without an upstream sink.
    #[error("no upstream sink configured")]
    NoUpstreamSink,

    /// Audio arrived after [`StreamCoordinator::stop`](crate::StreamCoordinator::stop).
    #[error("stream coordinator is stopped")]
    Stopped,

    /// The bridge configuration is inconsistent.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

impl BridgeError {
    pub(crate) fn invalid_filter(reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur within a sink implementation.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A write operation failed.
    #[error("write failed: {reason}")]
    WriteFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// File I/O error.
    #[error("file error: {path}: {source}")]
    FileError {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The receiving channel was closed.
    #[error("channel closed")]
    ChannelClosed,

    /// The sink is not ready to accept audio (not connected, not started).
    #[error("sink not ready")]
    NotReady,

    /// Custom error for user-implemented sinks.
    #[error("{0}")]
    Custom(String),
}

impl SinkError {
    /// Creates a custom sink error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates a write failed error with the given reason.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }

    /// Creates a file error for the given path.
    pub fn file_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileError {
            path: path.into(),
            source,
        }
    }
}
