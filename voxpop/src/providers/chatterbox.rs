//! Chatterbox neural backend.
//!
//! Drives the `chatterbox-tts` CLI one chunk at a time, then splices the
//! segment WAVs into a single mono 16-bit file. The first synthesis call
//! pays the model-load cost; readiness of the binary is probed once and
//! cached.

use std::path::Path;
use std::process::Stdio;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::errors::SynthesisError;
use crate::providers::audio::{read_segment, split_into_chunks, write_pcm_wav};
use crate::providers::{SpeechSynthesizer, SynthesisOutput};
use crate::types::{AudioFormat, ChatterboxParams, SpeedLevel};

/// Output sample rate of the Chatterbox model.
pub const SAMPLE_RATE: u32 = 24_000;

const BINARY_NAME: &str = "chatterbox-tts";

/// Chatterbox neural backend with optional voice cloning.
#[derive(Debug)]
pub struct ChatterboxProvider {
    params: ChatterboxParams,
    ready: OnceCell<bool>,
}

impl ChatterboxProvider {
    const PROVIDER_NAME: &'static str = "chatterbox";

    /// Create a new provider.
    pub fn new(params: ChatterboxParams) -> Self {
        Self {
            params,
            ready: OnceCell::new(),
        }
    }

    async fn probe(&self) -> bool {
        let Ok(binary) = which::which(BINARY_NAME) else {
            return false;
        };
        debug!(provider = Self::PROVIDER_NAME, binary = %binary.display(), "Found synthesis binary");
        true
    }

    async fn synthesize_chunk(
        &self,
        chunk: &str,
        work_dir: &Path,
        index: usize,
    ) -> Result<Vec<i16>, SynthesisError> {
        let input_path = work_dir.join(format!("chunk_{index}.txt"));
        let segment_path = work_dir.join(format!("chunk_{index}.wav"));
        tokio::fs::write(&input_path, chunk).await?;

        let mut cmd = tokio::process::Command::new(BINARY_NAME);
        cmd.arg(&input_path);
        cmd.arg(&segment_path);
        cmd.arg("--exaggeration")
            .arg(self.params.exaggeration.to_string());
        cmd.arg("--cfg-weight")
            .arg(self.params.cfg_weight.to_string());
        cmd.arg("--temperature")
            .arg(self.params.temperature.to_string());
        if let Some(reference) = &self.params.reference_audio {
            cmd.arg("--audio-prompt").arg(reference);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| SynthesisError::ProcessSpawnFailed {
                provider: Self::PROVIDER_NAME,
                source: e,
            })?;

        if !output.status.success() {
            return Err(SynthesisError::ProcessFailed {
                provider: Self::PROVIDER_NAME,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        read_segment(&segment_path, Self::PROVIDER_NAME, SAMPLE_RATE)
    }

    async fn synthesize_all(
        &self,
        text: &str,
        dest: &Path,
    ) -> Result<SynthesisOutput, SynthesisError> {
        let chunks = split_into_chunks(text);
        if chunks.is_empty() {
            return Err(SynthesisError::BadParameters {
                reason: "no speakable text after chunking".into(),
            });
        }

        let work_dir =
            tempfile::tempdir().map_err(|e| SynthesisError::TempFile { source: e })?;
        let mut samples: Vec<i16> = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            debug!(
                provider = Self::PROVIDER_NAME,
                chunk = index + 1,
                total = chunks.len(),
                chars = chunk.len(),
                "Synthesizing chunk"
            );
            let segment = self.synthesize_chunk(chunk, work_dir.path(), index).await?;
            samples.extend_from_slice(&segment);
        }

        write_pcm_wav(dest, &samples, SAMPLE_RATE)?;
        let bytes_written = tokio::fs::metadata(dest).await?.len();
        let duration_secs = samples.len() as f64 / f64::from(SAMPLE_RATE);

        info!(
            provider = Self::PROVIDER_NAME,
            chunks = chunks.len(),
            duration_secs,
            "Synthesis complete"
        );
        Ok(SynthesisOutput {
            format: AudioFormat::Wav,
            bytes_written,
            duration_secs: Some(duration_secs),
        })
    }
}

impl SpeechSynthesizer for ChatterboxProvider {
    async fn synthesize_to(
        &self,
        text: &str,
        _speed: SpeedLevel,
        dest: &Path,
    ) -> Result<SynthesisOutput, SynthesisError> {
        if !self.is_ready().await {
            return Err(SynthesisError::Unavailable {
                provider: Self::PROVIDER_NAME,
                reason: format!("`{BINARY_NAME}` not found on PATH"),
            });
        }

        match self.synthesize_all(text, dest).await {
            Ok(output) => Ok(output),
            Err(e) => {
                // Never leave a partial concatenation behind.
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }

    async fn is_ready(&self) -> bool {
        *self.ready.get_or_init(|| self.probe()).await
    }

    fn info(&self) -> &str {
        "Chatterbox - local neural synthesis with voice cloning"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = ChatterboxParams::default();
        assert_eq!(params.exaggeration, 0.5);
        assert_eq!(params.cfg_weight, 0.5);
        assert_eq!(params.temperature, 0.8);
        assert!(params.reference_audio.is_none());
    }

    #[tokio::test]
    async fn test_readiness_is_cached() {
        let provider = ChatterboxProvider::new(ChatterboxParams::default());
        let first = provider.is_ready().await;
        let second = provider.is_ready().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unavailable_when_binary_missing() {
        if which::which(BINARY_NAME).is_ok() {
            return; // Binary installed on this machine; nothing to assert.
        }
        let provider = ChatterboxProvider::new(ChatterboxParams::default());
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.wav");
        let err = provider
            .synthesize_to("hello", SpeedLevel::Normal, &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Unavailable { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_info() {
        let provider = ChatterboxProvider::new(ChatterboxParams::default());
        assert!(provider.info().contains("Chatterbox"));
    }
}
