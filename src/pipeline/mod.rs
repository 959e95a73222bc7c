//! Playback pipeline components.
//!
//! ```text
//! synthesis delta → Resampler → PlaybackQueue → PlaybackSink::forward
//! ```
//!
//! The queue serializes delivery so that at most one chunk is handed to the
//! playback sink at a time, in the order chunks were enqueued.

mod queue;

pub use queue::{PlaybackQueue, QueuePhase};
pub(crate) use queue::QueueConfig;
