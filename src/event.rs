//! Runtime events for monitoring bridge health.
//!
//! Events are non-fatal notifications. The bridge keeps running after
//! they are emitted; they exist for logging and metrics, not error handling.

use std::sync::Arc;

/// Pipeline stage that produced clamped samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Anti-aliasing filter on the playback path.
    Filter,
    /// Float to PCM16 conversion on the capture path.
    Capture,
}

/// Runtime events emitted while audio flows through the bridge.
///
/// # Example
///
/// ```
/// use voice_bridge::BridgeEvent;
///
/// fn handle_event(event: BridgeEvent) {
///     match event {
///         BridgeEvent::SamplesClamped { stage, count } => {
///             eprintln!("{stage:?} clamped {count} samples");
///         }
///         BridgeEvent::QueueOverflow { dropped_chunks } => {
///             eprintln!("dropped {dropped_chunks} pending chunks");
///         }
///         BridgeEvent::SinkError { sink_name, error } => {
///             eprintln!("sink '{sink_name}' error: {error}");
///         }
///         BridgeEvent::ChunkDropped { sink_name, sequence } => {
///             eprintln!("sink '{sink_name}' lost chunk {sequence}");
///         }
///         BridgeEvent::PlaybackInterrupted { cleared_chunks } => {
///             eprintln!("interrupted, {cleared_chunks} chunks discarded");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// Computed samples fell outside the 16-bit range and were clamped.
    SamplesClamped {
        /// Stage where clamping happened.
        stage: Stage,
        /// Number of clamped samples in the buffer.
        count: usize,
    },

    /// The playback queue passed its high-water mark and dropped its oldest
    /// pending chunks.
    QueueOverflow {
        /// Number of chunks discarded.
        dropped_chunks: usize,
    },

    /// A sink call failed. Emitted once per failed attempt.
    SinkError {
        /// Name of the sink that errored.
        sink_name: String,
        /// Description of the error.
        error: String,
    },

    /// A playback chunk was abandoned after all forward attempts failed.
    ChunkDropped {
        /// Name of the playback sink.
        sink_name: String,
        /// Sequence number of the lost chunk.
        sequence: u64,
    },

    /// Pending playback was discarded because the user interrupted.
    PlaybackInterrupted {
        /// Number of chunks removed from the queue.
        cleared_chunks: usize,
    },
}

/// Callback type for receiving runtime events.
///
/// Register one via [`StreamCoordinatorBuilder::on_event()`].
///
/// [`StreamCoordinatorBuilder::on_event()`]: crate::StreamCoordinatorBuilder::on_event
pub type EventCallback = Arc<dyn Fn(BridgeEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use voice_bridge::{event_callback, BridgeEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(BridgeEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Sends an event to the callback if one is configured.
pub(crate) fn emit(callback: Option<&EventCallback>, event: BridgeEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}
