//! Kokoro neural backend.
//!
//! Wraps the `kokoro-tts` CLI. Unlike Chatterbox the model honors a speed
//! multiplier natively, so the requested speed is passed through instead of
//! being baked into a words-per-minute rate. Model weights are located via
//! `KOKORO_MODEL` / `KOKORO_VOICES` or explicit paths.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::errors::SynthesisError;
use crate::providers::audio::{read_segment, split_into_chunks, write_pcm_wav};
use crate::providers::{SpeechSynthesizer, SynthesisOutput};
use crate::types::{AudioFormat, KokoroParams, SpeedLevel};

/// Output sample rate of the Kokoro model.
pub const SAMPLE_RATE: u32 = 24_000;

const BINARY_NAME: &str = "kokoro-tts";
const MODEL_ENV: &str = "KOKORO_MODEL";
const VOICES_ENV: &str = "KOKORO_VOICES";

/// Kokoro neural backend (82M parameters, 54 voices).
#[derive(Debug)]
pub struct KokoroProvider {
    params: KokoroParams,
    model_path: Option<PathBuf>,
    voices_path: Option<PathBuf>,
    ready: OnceCell<bool>,
}

impl KokoroProvider {
    const PROVIDER_NAME: &'static str = "kokoro";

    /// Create a provider that resolves model weights from the environment.
    pub fn new(params: KokoroParams) -> Self {
        Self {
            params,
            model_path: std::env::var_os(MODEL_ENV).map(PathBuf::from),
            voices_path: std::env::var_os(VOICES_ENV).map(PathBuf::from),
            ready: OnceCell::new(),
        }
    }

    /// Create a provider with explicit model and voices files.
    pub fn with_paths(
        params: KokoroParams,
        model_path: impl Into<PathBuf>,
        voices_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            params,
            model_path: Some(model_path.into()),
            voices_path: Some(voices_path.into()),
            ready: OnceCell::new(),
        }
    }

    async fn probe(&self) -> bool {
        let Ok(binary) = which::which(BINARY_NAME) else {
            return false;
        };
        // A quick voice listing confirms the binary can see its weights.
        let mut cmd = tokio::process::Command::new(&binary);
        cmd.arg("--help-voices");
        self.apply_model_env(&mut cmd);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        match cmd.status().await {
            Ok(status) => {
                debug!(
                    provider = Self::PROVIDER_NAME,
                    binary = %binary.display(),
                    ok = status.success(),
                    "Probed voice listing"
                );
                status.success()
            }
            Err(_) => false,
        }
    }

    fn apply_model_env(&self, cmd: &mut tokio::process::Command) {
        if let Some(model) = &self.model_path {
            cmd.env(MODEL_ENV, model);
        }
        if let Some(voices) = &self.voices_path {
            cmd.env(VOICES_ENV, voices);
        }
    }

    async fn synthesize_chunk(
        &self,
        chunk: &str,
        speed: SpeedLevel,
        work_dir: &Path,
        index: usize,
    ) -> Result<Vec<i16>, SynthesisError> {
        let input_path = work_dir.join(format!("chunk_{index}.txt"));
        let segment_path = work_dir.join(format!("chunk_{index}.wav"));
        tokio::fs::write(&input_path, chunk).await?;

        let mut cmd = tokio::process::Command::new(BINARY_NAME);
        cmd.arg(&input_path);
        cmd.arg(&segment_path);
        cmd.arg("--voice").arg(&self.params.voice);
        cmd.arg("--lang").arg(&self.params.language);
        cmd.arg("--format").arg("wav");
        if speed != SpeedLevel::Normal {
            cmd.arg("--speed").arg(speed.value().to_string());
        }
        self.apply_model_env(&mut cmd);
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
        speed: SpeedLevel,
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
            let segment = self
                .synthesize_chunk(chunk, speed, work_dir.path(), index)
                .await?;
            samples.extend_from_slice(&segment);
        }

        write_pcm_wav(dest, &samples, SAMPLE_RATE)?;
        let bytes_written = tokio::fs::metadata(dest).await?.len();
        let duration_secs = samples.len() as f64 / f64::from(SAMPLE_RATE);

        info!(
            provider = Self::PROVIDER_NAME,
            voice = %self.params.voice,
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

impl SpeechSynthesizer for KokoroProvider {
    async fn synthesize_to(
        &self,
        text: &str,
        speed: SpeedLevel,
        dest: &Path,
    ) -> Result<SynthesisOutput, SynthesisError> {
        if !self.is_ready().await {
            return Err(SynthesisError::Unavailable {
                provider: Self::PROVIDER_NAME,
                reason: format!(
                    "`{BINARY_NAME}` not found or model weights missing (set {MODEL_ENV} / {VOICES_ENV})"
                ),
            });
        }

        match self.synthesize_all(text, speed, dest).await {
            Ok(output) => Ok(output),
            Err(e) => {
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }

    async fn is_ready(&self) -> bool {
        *self.ready.get_or_init(|| self.probe()).await
    }

    fn info(&self) -> &str {
        "Kokoro - lightweight local neural synthesis, 54 voices across 8 languages"
    }
}

// ============================================================================
// Tests
// ============================================================================
