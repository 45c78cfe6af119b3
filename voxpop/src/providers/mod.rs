//! TTS backend adapters.
//!
//! Each adapter converts text plus backend-specific parameters into an audio
//! file on disk. All four implement [`SpeechSynthesizer`]; the dispatcher
//! selects one via the closed [`crate::types::ProviderParams`] enum.

pub(crate) mod audio;
pub mod chatterbox;
pub mod elevenlabs;
pub mod kokoro;
pub mod say;

use std::path::Path;

use crate::errors::SynthesisError;
use crate::types::{AudioFormat, ProviderKind, SpeedLevel};

/// Metadata about a completed synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutput {
    /// Container format of the file written to `dest`.
    pub format: AudioFormat,
    /// Size of the output file in bytes.
    pub bytes_written: u64,
    /// Audio duration in seconds, when the adapter can compute it.
    pub duration_secs: Option<f64>,
}

/// Adapter trait for TTS backends.
///
/// Uses native async functions in traits; implementations must be
/// `Send + Sync` so a generation can run on a background task.
///
/// `synthesize_to` writes the complete audio to `dest` and must never
/// leave a partial file behind on error.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` at the given speed and write the result to `dest`.
    fn synthesize_to(
        &self,
        text: &str,
        speed: SpeedLevel,
        dest: &Path,
    ) -> impl std::future::Future<Output = Result<SynthesisOutput, SynthesisError>> + Send;

    /// Whether this backend is installed/configured on this system.
    fn is_ready(&self) -> impl std::future::Future<Output = bool> + Send;

    /// One-line human description of the backend.
    fn info(&self) -> &str;
}

/// Probe whether a backend is ready, using its default parameters.
pub async fn kind_is_ready(kind: ProviderKind) -> bool {
    match kind {
        ProviderKind::Say => say::SayProvider::default().is_ready().await,
        ProviderKind::ElevenLabs => elevenlabs::ElevenLabsProvider::configured(),
        ProviderKind::Chatterbox => {
            chatterbox::ChatterboxProvider::new(Default::default())
                .is_ready()
                .await
        }
        ProviderKind::Kokoro => kokoro::KokoroProvider::new(Default::default()).is_ready().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
