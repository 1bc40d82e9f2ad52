//! Raw PCM playback boundary.
//!
//! Synthesized speech arrives as 16-bit little-endian mono PCM at 24 kHz.

use crate::error::SpeechError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

pub const SAMPLE_RATE: u32 = 24_000;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Plays raw PCM; resolves once playback has finished.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, pcm: &[u8]) -> Result<(), SpeechError>;
}

/// Playback length of a PCM buffer.
pub fn pcm_duration(pcm: &[u8]) -> Duration {
    let bytes_per_second = SAMPLE_RATE as u64 * CHANNELS as u64 * (BITS_PER_SAMPLE as u64 / 8);
    Duration::from_micros(pcm.len() as u64 * 1_000_000 / bytes_per_second)
}

/// Wrap PCM in a canonical 44-byte RIFF/WAVE header.
pub fn wav_bytes(pcm: &[u8]) -> Vec<u8> {
    let block_align = CHANNELS * (BITS_PER_SAMPLE / 8);
    let byte_rate = SAMPLE_RATE * block_align as u32;
    let data_len = pcm.len() as u32;

    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// "Plays" audio by writing numbered WAV files into a directory.
pub struct WavFilePlayer {
    dir: PathBuf,
    counter: AtomicU64,
}

impl WavFilePlayer {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            counter: AtomicU64::new(0),
        }
    }

    /// Path the next clip will be written to.
    pub fn next_path(&self) -> PathBuf {
        let n = self.counter.load(Ordering::SeqCst) + 1;
        self.dir.join(format!("speech-{:03}.wav", n))
    }
}

#[async_trait]
impl AudioPlayer for WavFilePlayer {
    async fn play(&self, pcm: &[u8]) -> Result<(), SpeechError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.dir.join(format!("speech-{:03}.wav", n));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SpeechError::Playback(e.to_string()))?;
        tokio::fs::write(&path, wav_bytes(pcm))
            .await
            .map_err(|e| SpeechError::Playback(e.to_string()))?;

        info!(
            "Wrote {:.1}s of audio to {}",
            pcm_duration(pcm).as_secs_f32(),
            path.display()
        );
        Ok(())
    }
}
