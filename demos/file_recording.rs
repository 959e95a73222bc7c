//! File recording example.
//!
//! Drives the bridge with synthetic audio: a 24kHz "assistant" tone is
//! resampled into `avatar.wav` (16kHz), and microphone blocks are recorded
//! unchanged into `microphone.wav` (24kHz).
//!
//! Run with: cargo run --example file_recording

use std::time::Duration;

use voice_bridge::{FileSink, MockSource, StreamCoordinator, CAPTURE_BLOCK_SIZE};

/// Synthesis deltas of 50ms at 24kHz.
const DELTA_SAMPLES: usize = 1200;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let bridge = StreamCoordinator::builder()
        .playback_sink(FileSink::wav("avatar.wav"))
        .upstream_sink(FileSink::wav("microphone.wav"))
        .on_event(|e| tracing::warn!(?e, "bridge event"))
        .build()?;
    bridge.start().await?;

    let mut voice = MockSource::synthesis();
    voice.generate_tone(220.0, 1000, 0.4);
    voice.generate_silence(200);
    voice.generate_tone(330.0, 800, 0.4);

    let mut mic = MockSource::capture();
    mic.generate_noise(2000, 0.1);

    println!("Streaming {:?} of synthesis audio...", voice.duration());

    for delta in voice.byte_deltas(DELTA_SAMPLES) {
        bridge.on_synthesis_bytes(&delta).await?;
    }
    for block in mic.capture_blocks(CAPTURE_BLOCK_SIZE) {
        bridge.on_capture_block(&block).await?;
        // Pace blocks roughly like a 24kHz input device
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    bridge.stop().await;

    let stats = bridge.stats();
    println!("\nDone!");
    println!("  Deltas received:     {}", stats.deltas_received);
    println!("  Chunks forwarded:    {}", stats.chunks_forwarded);
    println!("  Capture blocks sent: {}", stats.capture_blocks_sent);
    println!("  Samples clamped:     {}", stats.samples_clamped);

    Ok(())
}
