//! macOS `say` backend.
//!
//! Archival synthesis writes an intermediate AIFF via `say -o`, transcodes
//! it to 16-bit WAV with `afconvert`, and discards the intermediate. The
//! original tool ignored exit codes and failed silently; here every step is
//! checked and failures carry the captured stderr.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::SynthesisError;
use crate::providers::{SpeechSynthesizer, SynthesisOutput};
use crate::types::{AudioFormat, SayParams, SpeedLevel};

/// Base speaking rate in words per minute at 1.0x speed.
pub const BASE_RATE_WPM: f32 = 150.0;

/// macOS `say` backend.
///
/// ## Examples
///
/// ```ignore
/// use voxpop::providers::say::SayProvider;
/// use voxpop::providers::SpeechSynthesizer;
/// use voxpop::types::{SayParams, SpeedLevel};
///
/// let provider = SayProvider::new(SayParams::default());
/// provider
///     .synthesize_to("Hello!", SpeedLevel::Faster, "out.wav".as_ref())
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct SayProvider {
    params: SayParams,
}

/// A live utterance spawned by [`SayProvider::speak_live`].
///
/// Dropping the handle does not stop the speech; call [`LiveSpeech::stop`]
/// for best-effort termination or [`LiveSpeech::wait`] to let it finish.
#[derive(Debug)]
pub struct LiveSpeech {
    child: tokio::process::Child,
}

impl LiveSpeech {
    /// Best-effort termination of the running utterance.
    pub async fn stop(mut self) -> Result<(), SynthesisError> {
        // The process may already have exited; that is not an error.
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
        Ok(())
    }

    /// Wait for the utterance to finish naturally.
    pub async fn wait(mut self) -> Result<(), SynthesisError> {
        let status = self.child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(SynthesisError::ProcessFailed {
                provider: SayProvider::PROVIDER_NAME,
                stderr: format!("say exited with {}", status),
            })
        }
    }
}

impl SayProvider {
    /// Provider name constant for error messages.
    const PROVIDER_NAME: &'static str = "say";

    /// Create a new provider.
    pub fn new(params: SayParams) -> Self {
        Self { params }
    }

    /// Words-per-minute rate for the `-r` flag: `round(150 × speed)`.
    pub fn rate_for_speed(speed: SpeedLevel) -> u32 {
        (BASE_RATE_WPM * speed.value()).round() as u32
    }

    fn base_command(&self, speed: SpeedLevel) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new("say");
        cmd.arg("-r").arg(Self::rate_for_speed(speed).to_string());
        if let Some(voice) = &self.params.voice {
            cmd.arg("-v").arg(voice);
        }
        cmd
    }

    /// Speak the text through the system audio device without archiving.
    ///
    /// Returns a handle that can stop the utterance mid-flight.
    pub async fn speak_live(
        &self,
        text: &str,
        speed: SpeedLevel,
    ) -> Result<LiveSpeech, SynthesisError> {
        let mut cmd = self.base_command(speed);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| SynthesisError::ProcessSpawnFailed {
            provider: Self::PROVIDER_NAME,
            source: e,
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            // Dropping stdin sends EOF so `say` starts speaking.
        }

        Ok(LiveSpeech { child })
    }

    async fn run_checked(
        mut cmd: tokio::process::Command,
        provider: &'static str,
    ) -> Result<(), SynthesisError> {
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| SynthesisError::ProcessSpawnFailed {
                provider,
                source: e,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(SynthesisError::ProcessFailed {
                provider,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

impl SpeechSynthesizer for SayProvider {
    async fn synthesize_to(
        &self,
        text: &str,
        speed: SpeedLevel,
        dest: &Path,
    ) -> Result<SynthesisOutput, SynthesisError> {
        if which::which("say").is_err() {
            return Err(SynthesisError::Unavailable {
                provider: Self::PROVIDER_NAME,
                reason: "`say` not found (macOS only)".into(),
            });
        }

        let temp_dir =
            tempfile::tempdir().map_err(|e| SynthesisError::TempFile { source: e })?;
        let input_path = temp_dir.path().join("input.txt");
        let aiff_path = temp_dir.path().join("speech.aiff");

        tokio::fs::write(&input_path, text).await?;

        let mut cmd = self.base_command(speed);
        cmd.arg("-f").arg(&input_path);
        cmd.arg("-o").arg(&aiff_path);

        debug!(
            provider = Self::PROVIDER_NAME,
            rate = Self::rate_for_speed(speed),
            "Rendering speech to AIFF"
        );
        Self::run_checked(cmd, Self::PROVIDER_NAME).await?;

        // Transcode the AIFF intermediate to 16-bit little-endian WAV.
        let mut convert = tokio::process::Command::new("afconvert");
        convert.arg("-f").arg("WAVE");
        convert.arg("-d").arg("LEI16");
        convert.arg(&aiff_path);
        convert.arg(dest);

        if let Err(e) = Self::run_checked(convert, "afconvert").await {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(e);
        }
        // The AIFF intermediate goes away with the temp dir.

        let bytes_written = tokio::fs::metadata(dest).await?.len();
        Ok(SynthesisOutput {
            format: AudioFormat::Wav,
            bytes_written,
            duration_secs: None,
        })
    }

    async fn is_ready(&self) -> bool {
        cfg!(target_os = "macos") && which::which("say").is_ok()
    }

    fn info(&self) -> &str {
        "macOS say - built-in speech synthesis, archived via afconvert"
    }
}

// ============================================================================
// Tests
// ============================================================================
