//! Orchestration of synthesis requests.
//!
//! [`Studio`] owns the archive and fans requests out to the backend named
//! in the request's parameters. Dispatch is closed over the known backends;
//! there is no string-keyed lookup, so an unhandled backend is a compile
//! error, not a runtime surprise.
//!
//! Only one synthesis runs at a time. A second request while one is in
//! flight fails fast with [`SynthesisError::Busy`] instead of queueing,
//! since the neural backends monopolize the machine anyway.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex, Notify};
use tracing::{info, warn};

use crate::errors::{FailureKind, SynthesisError};
use crate::providers::{
    chatterbox::ChatterboxProvider, elevenlabs::ElevenLabsProvider, kokoro::KokoroProvider,
    say::SayProvider, SpeechSynthesizer, SynthesisOutput,
};
use crate::store::{AudioRecord, AudioStore};
use crate::title::suggest_title;
use crate::types::{ProviderParams, SynthesisRequest};

/// Lifecycle of a background generation, published over a watch channel.
#[derive(Debug, Clone)]
pub enum Progress {
    /// Queued, not yet started.
    Pending,
    /// The backend is producing audio.
    Synthesizing,
    /// Audio is written; the record is being added to the index.
    Archiving,
    /// Finished; the record is in the archive.
    Done(AudioRecord),
    /// Failed. No partial audio remains. The kind tells the caller whether
    /// to retry, prompt for credentials, or report a fatal error.
    Failed {
        /// Broad classification of the failure.
        kind: FailureKind,
        /// Human-readable description.
        message: String,
    },
    /// Cancelled before completion. No partial audio remains.
    Cancelled,
}

impl Progress {
    fn failed(error: &SynthesisError) -> Progress {
        Progress::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Handle to a generation running in a background task.
pub struct GenerationHandle {
    progress: watch::Receiver<Progress>,
    cancel: Arc<Notify>,
    task: tokio::task::JoinHandle<()>,
}

impl GenerationHandle {
    /// A receiver for progress updates.
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.clone()
    }

    /// Request cancellation. The running backend process is terminated and
    /// any partially written audio is removed.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    /// Wait for the generation to reach a terminal state.
    pub async fn wait(self) -> Progress {
        let _ = self.task.await;
        self.progress.borrow().clone()
    }
}

/// Synthesis orchestrator: one archive, one generation at a time.
#[derive(Debug)]
pub struct Studio {
    store: AudioStore,
    gate: Mutex<()>,
}

impl Studio {
    /// Create a studio over an existing store.
    pub fn new(store: AudioStore) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    /// The underlying archive.
    pub fn store(&self) -> &AudioStore {
        &self.store
    }

    /// Synthesize, archive, and return the new record.
    ///
    /// Fails fast with [`SynthesisError::Busy`] if another generation is
    /// already running on this studio.
    pub async fn generate(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioRecord, SynthesisError> {
        let _guard = self.gate.try_lock().map_err(|_| SynthesisError::Busy)?;
        self.generate_locked(request).await
    }

    /// Start a generation on a background task.
    ///
    /// The returned handle exposes progress updates and cancellation; the
    /// single-flight gate applies the same as for [`Studio::generate`].
    pub fn generate_background(
        self: &Arc<Self>,
        request: SynthesisRequest,
    ) -> GenerationHandle {
        let (tx, rx) = watch::channel(Progress::Pending);
        let cancel = Arc::new(Notify::new());
        let studio = Arc::clone(self);
        let cancelled = Arc::clone(&cancel);

        let task = tokio::spawn(async move {
            let Ok(_guard) = studio.gate.try_lock() else {
                let _ = tx.send(Progress::failed(&SynthesisError::Busy));
                return;
            };

            let prepared = match studio.prepare(&request) {
                Ok(prepared) => prepared,
                Err(e) => {
                    let _ = tx.send(Progress::failed(&e));
                    return;
                }
            };
            let dest = studio.store.audio_path(&prepared.filename);
            let _ = tx.send(Progress::Synthesizing);

            tokio::select! {
                result = synthesize_into(&request, &dest) => match result {
                    Ok(output) => {
                        let _ = tx.send(Progress::Archiving);
                        let record = prepared.into_record(&request, &output);
                        match studio.store.append(record.clone()) {
                            Ok(()) => {
                                let _ = tx.send(Progress::Done(record));
                            }
                            Err(e) => {
                                let _ = tokio::fs::remove_file(&dest).await;
                                let _ = tx.send(Progress::failed(&SynthesisError::from(e)));
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tokio::fs::remove_file(&dest).await;
                        let _ = tx.send(Progress::failed(&e));
                    }
                },
                _ = cancelled.notified() => {
                    // Dropping the synthesis future kills any child process.
                    let _ = tokio::fs::remove_file(&dest).await;
                    warn!(filename = %prepared.filename, "Generation cancelled");
                    let _ = tx.send(Progress::Cancelled);
                }
            }
        });

        GenerationHandle {
            progress: rx,
            cancel,
            task,
        }
    }

    async fn generate_locked(
        &self,
        request: &SynthesisRequest,
    ) -> Result<AudioRecord, SynthesisError> {
        let prepared = self.prepare(request)?;
        let dest = self.store.audio_path(&prepared.filename);

        let output = match synthesize_into(request, &dest).await {
            Ok(output) => output,
            Err(e) => {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(e);
            }
        };

        let record = prepared.into_record(request, &output);
        if let Err(e) = self.store.append(record.clone()) {
            let _ = tokio::fs::remove_file(&dest).await;
            return Err(e.into());
        }

        info!(
            filename = %record.filename,
            provider = %record.provider,
            bytes = output.bytes_written,
            "Generation archived"
        );
        Ok(record)
    }

    fn prepare(&self, request: &SynthesisRequest) -> Result<PreparedRecord, SynthesisError> {
        if request.text.trim().is_empty() {
            return Err(SynthesisError::BadParameters {
                reason: "text is empty".into(),
            });
        }
        let kind = request.params.kind();
        let created_at = Utc::now();
        let filename = self
            .store
            .reserve_filename(kind, kind.output_format(), created_at);
        Ok(PreparedRecord {
            filename,
            created_at,
        })
    }
}

struct PreparedRecord {
    filename: String,
    created_at: chrono::DateTime<Utc>,
}

impl PreparedRecord {
    fn into_record(self, request: &SynthesisRequest, _output: &SynthesisOutput) -> AudioRecord {
        let mut record = AudioRecord {
            filename: self.filename,
            text: request.text.clone(),
            title: suggest_title(&request.text),
            speed: request.speed.value(),
            provider: request.params.kind(),
            created_at: self.created_at,
            voice: None,
            language: None,
            model_id: None,
            exaggeration: None,
            cfg_weight: None,
            temperature: None,
            reference_audio: None,
        };
        match &request.params {
            ProviderParams::Say(p) => {
                record.voice = p.voice.clone();
            }
            ProviderParams::ElevenLabs(p) => {
                record.voice = Some(p.voice_id.clone());
                record.model_id = Some(p.model_id.clone());
            }
            ProviderParams::Chatterbox(p) => {
                record.exaggeration = Some(p.exaggeration);
                record.cfg_weight = Some(p.cfg_weight);
                record.temperature = Some(p.temperature);
                record.reference_audio = p.reference_audio.clone();
            }
            ProviderParams::Kokoro(p) => {
                record.voice = Some(p.voice.clone());
                record.language = Some(p.language.clone());
            }
        }
        record
    }
}

/// Run the backend named by the request's parameters.
async fn synthesize_into(
    request: &SynthesisRequest,
    dest: &Path,
) -> Result<SynthesisOutput, SynthesisError> {
    match &request.params {
        ProviderParams::Say(p) => {
            SayProvider::new(p.clone())
                .synthesize_to(&request.text, request.speed, dest)
                .await
        }
        ProviderParams::ElevenLabs(p) => {
            ElevenLabsProvider::new(p.clone())?
                .synthesize_to(&request.text, request.speed, dest)
                .await
        }
        ProviderParams::Chatterbox(p) => {
            ChatterboxProvider::new(p.clone())
                .synthesize_to(&request.text, request.speed, dest)
                .await
        }
        ProviderParams::Kokoro(p) => {
            KokoroProvider::new(p.clone())
                .synthesize_to(&request.text, request.speed, dest)
                .await
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProviderKind, SayParams, SpeedLevel};

    fn studio() -> (tempfile::TempDir, Studio) {
        let dir = tempfile::tempdir().unwrap();
        let store = AudioStore::new(dir.path()).unwrap();
        (dir, Studio::new(store))
    }

    fn say_request(text: &str) -> SynthesisRequest {
        SynthesisRequest::new(text, ProviderParams::Say(SayParams::default()))
    }

    // ========================================================================
    // Validation tests
    // ========================================================================

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let (_dir, studio) = studio();
        let err = studio.generate(&say_request("   ")).await.unwrap_err();
        assert!(matches!(err, SynthesisError::BadParameters { .. }));
        assert!(studio.store().list().is_empty());
    }

    // ========================================================================
    // Single-flight tests
    // ========================================================================

    #[tokio::test]
    async fn test_generate_is_busy_while_gate_is_held() {
        let (_dir, studio) = studio();
        let _guard = studio.gate.try_lock().unwrap();
        let err = studio.generate(&say_request("hello")).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Busy));
    }

    #[tokio::test]
    async fn test_background_generation_is_busy_while_gate_is_held() {
        let (_dir, studio) = studio();
        let studio = Arc::new(studio);
        let _guard = studio.gate.try_lock().unwrap();

        let handle = studio.generate_background(say_request("hello"));
        let outcome = handle.wait().await;
        assert!(
            matches!(&outcome, Progress::Failed { message, .. } if message.contains("in flight")),
            "expected busy failure, got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn test_background_empty_text_reports_failure() {
        let (_dir, studio) = studio();
        let studio = Arc::new(studio);
        let handle = studio.generate_background(say_request(""));
        let outcome = handle.wait().await;
        assert!(matches!(outcome, Progress::Failed { .. }));
        assert!(studio.store().list().is_empty());
    }

    // ========================================================================
    // Failure-kind propagation tests
    // ========================================================================

    #[tokio::test]
    async fn test_background_failure_carries_bad_parameters_kind() {
        let (_dir, studio) = studio();
        let studio = Arc::new(studio);
        let handle = studio.generate_background(say_request("   "));
        let outcome = handle.wait().await;
        assert!(
            matches!(
                outcome,
                Progress::Failed {
                    kind: FailureKind::BadParameters,
                    ..
                }
            ),
            "rejected request should classify as bad parameters, got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn test_background_busy_failure_is_distinguishable_from_crash() {
        let (_dir, studio) = studio();
        let studio = Arc::new(studio);
        let _guard = studio.gate.try_lock().unwrap();

        let handle = studio.generate_background(say_request("hello"));
        let Progress::Failed { kind, .. } = handle.wait().await else {
            panic!("expected a failure while the gate is held");
        };
        assert_eq!(kind, FailureKind::BadParameters);
        assert_ne!(kind, FailureKind::BackendCrash);
    }

    #[tokio::test]
    async fn test_background_missing_backend_classifies_as_unavailable() {
        if which::which("chatterbox-tts").is_ok() {
            return; // Binary installed on this machine; nothing to assert.
        }
        let (_dir, studio) = studio();
        let studio = Arc::new(studio);
        let handle = studio.generate_background(SynthesisRequest::new(
            "hello",
            ProviderParams::Chatterbox(crate::types::ChatterboxParams::default()),
        ));
        let Progress::Failed { kind, .. } = handle.wait().await else {
            panic!("expected a failure without the backend installed");
        };
        assert_eq!(kind, FailureKind::Unavailable);
    }

    // ========================================================================
    // Record construction tests
    // ========================================================================

    #[test]
    fn test_record_carries_chatterbox_settings() {
        let prepared = PreparedRecord {
            filename: "tts_chatterbox_20250615_090507.wav".to_string(),
            created_at: Utc::now(),
        };
        let request = SynthesisRequest::new(
            "Cloned voice test.",
            ProviderParams::Chatterbox(crate::types::ChatterboxParams {
                exaggeration: 0.9,
                ..Default::default()
            }),
        );
        let output = SynthesisOutput {
            format: crate::types::AudioFormat::Wav,
            bytes_written: 1024,
            duration_secs: Some(1.5),
        };

        let record = prepared.into_record(&request, &output);
        assert_eq!(record.provider, ProviderKind::Chatterbox);
        assert_eq!(record.exaggeration, Some(0.9));
        assert_eq!(record.cfg_weight, Some(0.5));
        assert_eq!(record.title, "Cloned voice test.");
        assert!(record.voice.is_none());
    }

    #[test]
    fn test_record_carries_elevenlabs_voice_and_model() {
        let prepared = PreparedRecord {
            filename: "tts_elevenlabs_20250615_090507.mp3".to_string(),
            created_at: Utc::now(),
        };
        let request = SynthesisRequest::new(
            "Cloud test.",
            ProviderParams::ElevenLabs(crate::types::ElevenLabsParams::default()),
        )
        .with_speed(SpeedLevel::Faster);
        let output = SynthesisOutput {
            format: crate::types::AudioFormat::Mp3,
            bytes_written: 2048,
            duration_secs: None,
        };

        let record = prepared.into_record(&request, &output);
        assert_eq!(record.provider, ProviderKind::ElevenLabs);
        assert_eq!(record.model_id.as_deref(), Some("eleven_multilingual_v2"));
        assert_eq!(record.speed, 1.25);
    }
}
