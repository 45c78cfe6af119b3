//! ElevenLabs cloud backend.
//!
//! Talks directly to the text-to-speech endpoint and streams the returned
//! MP3 bytes to disk. A non-success HTTP status is reported as
//! [`SynthesisError::Api`] with the status code; it never panics and never
//! leaves a partial file behind.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::errors::SynthesisError;
use crate::providers::{SpeechSynthesizer, SynthesisOutput};
use crate::types::{AudioFormat, ElevenLabsParams, SpeedLevel};

/// "Rachel", the stock ElevenLabs voice.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Default multilingual model.
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Environment variables checked for the API key, in order.
const API_KEY_VARS: [&str; 2] = ["ELEVENLABS_API_KEY", "ELEVEN_LABS_API_KEY"];

/// ElevenLabs cloud backend.
///
/// Requires an API key in `ELEVENLABS_API_KEY` (or `ELEVEN_LABS_API_KEY`);
/// construction fails with [`SynthesisError::MissingApiKey`] when neither is
/// set so the problem surfaces before any text is sent.
#[derive(Debug, Clone)]
pub struct ElevenLabsProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    params: ElevenLabsParams,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Debug, Serialize)]
struct SynthesisBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

impl ElevenLabsProvider {
    const PROVIDER_NAME: &'static str = "elevenlabs";

    /// Create a provider, reading the API key from the environment.
    pub fn new(params: ElevenLabsParams) -> Result<Self, SynthesisError> {
        let api_key = Self::api_key_from_env().ok_or(SynthesisError::MissingApiKey {
            provider: Self::PROVIDER_NAME,
            env_var: API_KEY_VARS[0],
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            params,
        })
    }

    /// Create a provider pointed at an alternate host.
    ///
    /// Used by tests to exercise the HTTP path without real credentials.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        params: ElevenLabsParams,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            params,
        }
    }

    fn api_key_from_env() -> Option<String> {
        API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Whether an API key is present in the environment.
    pub fn configured() -> bool {
        Self::api_key_from_env().is_some()
    }

    async fn fetch_audio(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.base_url, self.params.voice_id
        );
        let body = SynthesisBody {
            text,
            model_id: &self.params.model_id,
            voice_settings: VoiceSettings {
                stability: self.params.stability,
                similarity_boost: self.params.similarity_boost,
                style: self.params.style,
                use_speaker_boost: self.params.use_speaker_boost,
            },
        };

        debug!(
            provider = Self::PROVIDER_NAME,
            voice_id = %self.params.voice_id,
            model_id = %self.params.model_id,
            chars = text.len(),
            "Requesting cloud synthesis"
        );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Network {
                provider: Self::PROVIDER_NAME,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Api {
                provider: Self::PROVIDER_NAME,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Network {
                provider: Self::PROVIDER_NAME,
                message: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

impl SpeechSynthesizer for ElevenLabsProvider {
    async fn synthesize_to(
        &self,
        text: &str,
        _speed: SpeedLevel,
        dest: &Path,
    ) -> Result<SynthesisOutput, SynthesisError> {
        // Speed is a voice-model concern upstream; the endpoint ignores it.
        let audio = self.fetch_audio(text).await?;
        if audio.is_empty() {
            return Err(SynthesisError::MalformedAudio {
                provider: Self::PROVIDER_NAME,
                reason: "API returned an empty audio body".into(),
            });
        }

        if let Err(e) = tokio::fs::write(dest, &audio).await {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(e.into());
        }

        Ok(SynthesisOutput {
            format: AudioFormat::Mp3,
            bytes_written: audio.len() as u64,
            duration_secs: None,
        })
    }

    async fn is_ready(&self) -> bool {
        true
    }

    fn info(&self) -> &str {
        "ElevenLabs - cloud neural voices (MP3 output)"
    }
}

// ============================================================================
// Tests
// ============================================================================
