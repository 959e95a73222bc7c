//! WAV recording sink.

use crate::format::pcm16_to_le_bytes;
use crate::sink::{PlaybackSink, UpstreamSink};
use crate::{AudioChunk, SinkError};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

// Canonical 44-byte PCM WAV header layout.

/// Byte offset of the RIFF chunk size field.
const WAV_FILE_SIZE_OFFSET: u64 = 4;

/// Byte offset of the data chunk size field.
const WAV_DATA_SIZE_OFFSET: u64 = 40;

/// Size of the WAV header in bytes.
const WAV_HEADER_SIZE: u32 = 44;

/// Audio format code for uncompressed PCM.
const WAV_FORMAT_PCM: u16 = 1;

/// Bridge audio is always mono PCM16.
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u64 = 2;

/// A sink that records mono PCM16 audio to a WAV file.
///
/// Works as either end of the bridge: register it as the playback sink to
/// capture what the avatar was given, or as the upstream sink to keep a copy
/// of microphone audio. The file is created on the first chunk, which fixes
/// its sample rate, and the header is finalized on `on_stop()`. File I/O
/// runs on the blocking thread pool.
///
/// # Example
///
/// ```no_run
/// use voice_bridge::FileSink;
///
/// let sink = FileSink::wav("avatar-playback.wav");
/// ```
pub struct FileSink {
    name: String,
    path: Arc<PathBuf>,
    state: Arc<Mutex<FileState>>,
}

#[derive(Default)]
struct FileState {
    writer: Option<BufWriter<File>>,
    samples_written: u64,
    sample_rate: u32,
}

impl FileSink {
    /// Creates a new file sink that writes WAV format.
    pub fn wav(path: impl AsRef<Path>) -> Self {
        Self {
            name: format!("file:{}", path.as_ref().display()),
            path: Arc::new(path.as_ref().to_path_buf()),
            state: Arc::new(Mutex::new(FileState::default())),
        }
    }

    /// Number of samples recorded so far.
    pub async fn samples_written(&self) -> u64 {
        self.state.lock().await.samples_written
    }

    fn write_header(
        writer: &mut BufWriter<File>,
        sample_rate: u32,
        data_size: u32,
    ) -> std::io::Result<()> {
        let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
        let byte_rate = sample_rate * u32::from(block_align);

        writer.write_all(b"RIFF")?;
        writer.write_all(&(WAV_HEADER_SIZE - 8 + data_size).to_le_bytes())?;
        writer.write_all(b"WAVE")?;

        writer.write_all(b"fmt ")?;
        writer.write_all(&16u32.to_le_bytes())?;
        writer.write_all(&WAV_FORMAT_PCM.to_le_bytes())?;
        writer.write_all(&CHANNELS.to_le_bytes())?;
        writer.write_all(&sample_rate.to_le_bytes())?;
        writer.write_all(&byte_rate.to_le_bytes())?;
        writer.write_all(&block_align.to_le_bytes())?;
        writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

        writer.write_all(b"data")?;
        writer.write_all(&data_size.to_le_bytes())?;
        Ok(())
    }

    fn patch_sizes(writer: &mut BufWriter<File>, data_size: u32) -> std::io::Result<()> {
        writer.seek(SeekFrom::Start(WAV_FILE_SIZE_OFFSET))?;
        writer.write_all(&(WAV_HEADER_SIZE - 8 + data_size).to_le_bytes())?;
        writer.seek(SeekFrom::Start(WAV_DATA_SIZE_OFFSET))?;
        writer.write_all(&data_size.to_le_bytes())?;
        writer.seek(SeekFrom::End(0))?;
        Ok(())
    }

    fn append_blocking(
        state: &mut FileState,
        path: &Path,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<(), SinkError> {
        if state.writer.is_none() {
            let file = File::create(path).map_err(|e| SinkError::file_error(path, e))?;
            let mut writer = BufWriter::new(file);
            Self::write_header(&mut writer, sample_rate, 0)
                .map_err(|e| SinkError::file_error(path, e))?;
            state.writer = Some(writer);
            state.sample_rate = sample_rate;
        } else if state.sample_rate != sample_rate {
            return Err(SinkError::write_failed(format!(
                "sample rate changed from {}Hz to {sample_rate}Hz",
                state.sample_rate
            )));
        }

        if let Some(writer) = state.writer.as_mut() {
            writer
                .write_all(&pcm16_to_le_bytes(samples))
                .map_err(|e| SinkError::file_error(path, e))?;
            state.samples_written += samples.len() as u64;
        }
        Ok(())
    }

    fn finalize_blocking(state: &mut FileState, path: &Path) -> Result<(), SinkError> {
        let data_size = u32::try_from(state.samples_written * BYTES_PER_SAMPLE)
            .map_err(|_| SinkError::write_failed("recording exceeds 4 GiB WAV limit"))?;

        if let Some(mut writer) = state.writer.take() {
            Self::patch_sizes(&mut writer, data_size)
                .map_err(|e| SinkError::file_error(path, e))?;
            writer.flush().map_err(|e| SinkError::file_error(path, e))?;
        }
        Ok(())
    }

    async fn append(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
        tracing::trace!(
            sink = %self.name,
            samples = chunk.len(),
            sequence = chunk.sequence,
            "recording chunk"
        );

        let samples = Arc::clone(&chunk.samples);
        let sample_rate = chunk.sample_rate;
        let state = Arc::clone(&self.state);
        let path = Arc::clone(&self.path);

        tokio::task::spawn_blocking(move || {
            let mut state = state.blocking_lock();
            Self::append_blocking(&mut state, &path, &samples, sample_rate)
        })
        .await
        .map_err(|e| SinkError::custom(format!("write task panicked: {e}")))?
    }

    async fn finalize(&self) -> Result<(), SinkError> {
        let state = Arc::clone(&self.state);
        let path = Arc::clone(&self.path);

        tokio::task::spawn_blocking(move || {
            let mut state = state.blocking_lock();
            Self::finalize_blocking(&mut state, &path)
        })
        .await
        .map_err(|e| SinkError::custom(format!("finalize task panicked: {e}")))?
    }
}

#[async_trait]
impl PlaybackSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
        self.append(chunk).await
    }

    async fn on_stop(&self) -> Result<(), SinkError> {
        self.finalize().await
    }
}

#[async_trait]
impl UpstreamSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, chunk: &AudioChunk) -> Result<(), SinkError> {
        self.append(chunk).await
    }

    async fn on_stop(&self) -> Result<(), SinkError> {
        self.finalize().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    }

    #[tokio::test]
    async fn test_file_sink_creates_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("playback.wav");

        let sink = FileSink::wav(&path);
        sink.forward(&AudioChunk::new(vec![100, 200, 300, 400], 16000))
            .await
            .unwrap();
        PlaybackSink::on_stop(&sink).await.unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([data[22], data[23]]), 1);
        assert_eq!(read_u32(&data, 24), 16000);
        assert_eq!(read_u32(&data, 28), 32000);
    }

    #[tokio::test]
    async fn test_file_sink_writes_samples_little_endian() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.wav");

        let sink = FileSink::wav(&path);
        sink.send(&AudioChunk::new(vec![0x1234, 0x5678], 24000))
            .await
            .unwrap();
        UpstreamSink::on_stop(&sink).await.unwrap();

        let data = std::fs::read(&path).unwrap();
        let start = WAV_HEADER_SIZE as usize;
        assert_eq!(&data[start..start + 4], &[0x34, 0x12, 0x78, 0x56]);
        assert_eq!(read_u32(&data, 24), 24000);
    }

    #[tokio::test]
    async fn test_file_sink_multiple_chunks_correct_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("playback.wav");

        let sink = FileSink::wav(&path);
        for samples in [vec![100, 200], vec![300, 400], vec![500, 600]] {
            sink.forward(&AudioChunk::new(samples, 16000)).await.unwrap();
        }
        assert_eq!(sink.samples_written().await, 6);
        PlaybackSink::on_stop(&sink).await.unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(read_u32(&data, 40), 12);
        assert_eq!(read_u32(&data, 4), WAV_HEADER_SIZE - 8 + 12);
        assert_eq!(data.len(), WAV_HEADER_SIZE as usize + 12);
    }

    #[tokio::test]
    async fn test_file_sink_rejects_rate_change() {
        let dir = tempdir().unwrap();
        let sink = FileSink::wav(dir.path().join("mixed.wav"));

        sink.forward(&AudioChunk::new(vec![1], 16000)).await.unwrap();
        let result = sink.forward(&AudioChunk::new(vec![2], 24000)).await;

        assert!(matches!(result, Err(SinkError::WriteFailed { .. })));
    }

    #[tokio::test]
    async fn test_file_sink_invalid_path_error() {
        let sink = FileSink::wav("/nonexistent/directory/playback.wav");
        let result = sink.forward(&AudioChunk::new(vec![100, 200], 16000)).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_file_sink_stop_before_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");

        let sink = FileSink::wav(&path);
        PlaybackSink::on_stop(&sink).await.unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_file_sink_name() {
        let sink = FileSink::wav("/path/to/audio.wav");
        assert_eq!(PlaybackSink::name(&sink), "file:/path/to/audio.wav");
    }
}
