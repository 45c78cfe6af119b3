//! Core types for the voxpop synthesis pipeline.
//!
//! This module defines:
//! - The closed provider enum and its per-backend parameter structs
//! - Speed and audio format types
//! - The `SynthesisRequest` passed to the dispatcher

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ============================================================================
// Speed Level
// ============================================================================

/// Playback speed for speech synthesis.
///
/// The named variants mirror the speed selector of the original form
/// (0.75x through 2.0x); `Explicit` accepts any multiplier and clamps it
/// to 0.25-4.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SpeedLevel {
    /// 0.75x, good for difficult text.
    Slower,
    /// 1.0x normal reading speed.
    #[default]
    Normal,
    /// 1.25x.
    Faster,
    /// 1.5x, for familiar content.
    MuchFaster,
    /// 2.0x, quick playback.
    VeryFast,
    /// Explicit multiplier (clamped to 0.25-4.0).
    Explicit(f32),
}

impl SpeedLevel {
    /// Get the numeric speed multiplier (1.0 = normal).
    pub fn value(&self) -> f32 {
        match self {
            SpeedLevel::Slower => 0.75,
            SpeedLevel::Normal => 1.0,
            SpeedLevel::Faster => 1.25,
            SpeedLevel::MuchFaster => 1.5,
            SpeedLevel::VeryFast => 2.0,
            SpeedLevel::Explicit(v) => v.clamp(0.25, 4.0),
        }
    }

    /// Parse a user-supplied speed string.
    ///
    /// Accepts the preset labels with or without a trailing `x`
    /// (`"0.75"`, `"1.5x"`) and arbitrary multipliers (`"1.1"`).
    ///
    /// ## Examples
    ///
    /// ```
    /// use voxpop::types::SpeedLevel;
    ///
    /// assert_eq!(SpeedLevel::parse("1.0x"), Some(SpeedLevel::Normal));
    /// assert_eq!(SpeedLevel::parse("2"), Some(SpeedLevel::VeryFast));
    /// assert_eq!(SpeedLevel::parse("fast"), None);
    /// ```
    pub fn parse(input: &str) -> Option<SpeedLevel> {
        let trimmed = input.trim().trim_end_matches(['x', 'X']);
        let value: f32 = trimmed.parse().ok()?;
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        Some(match value {
            v if v == 0.75 => SpeedLevel::Slower,
            v if v == 1.0 => SpeedLevel::Normal,
            v if v == 1.25 => SpeedLevel::Faster,
            v if v == 1.5 => SpeedLevel::MuchFaster,
            v if v == 2.0 => SpeedLevel::VeryFast,
            v => SpeedLevel::Explicit(v),
        })
    }
}

// ============================================================================
// Audio Format
// ============================================================================

/// Audio container format for archived output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AudioFormat {
    /// WAV (uncompressed, universally playable).
    #[default]
    Wav,
    /// MP3 (compressed, returned by the ElevenLabs API).
    Mp3,
}

impl AudioFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    /// Look up the format for a file extension.
    pub fn from_extension(ext: &str) -> Option<AudioFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            _ => None,
        }
    }
}

// ============================================================================
// Provider Kind
// ============================================================================

/// The set of supported TTS backends.
///
/// This enum is intentionally closed: dispatch over it is
/// exhaustiveness-checked, and an unknown backend name can only exist at
/// the parse boundary (`ProviderKind::parse` returning `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// macOS `say` command (local subprocess).
    Say,
    /// ElevenLabs cloud API.
    // Matches `as_str` and the archive filenames, not snake_case.
    #[serde(rename = "elevenlabs")]
    ElevenLabs,
    /// Chatterbox local neural TTS (subprocess).
    Chatterbox,
    /// Kokoro local neural TTS (subprocess).
    Kokoro,
}

impl ProviderKind {
    /// Every supported backend, in display order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Say,
        ProviderKind::ElevenLabs,
        ProviderKind::Chatterbox,
        ProviderKind::Kokoro,
    ];

    /// Short lowercase name, used in archive filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Say => "say",
            ProviderKind::ElevenLabs => "elevenlabs",
            ProviderKind::Chatterbox => "chatterbox",
            ProviderKind::Kokoro => "kokoro",
        }
    }

    /// Parse a backend name (with common aliases, case-insensitive).
    pub fn parse(name: &str) -> Option<ProviderKind> {
        match name.to_lowercase().as_str() {
            "say" | "macos" => Some(ProviderKind::Say),
            "elevenlabs" | "eleven" | "11labs" => Some(ProviderKind::ElevenLabs),
            "chatterbox" | "chatterbox-tts" => Some(ProviderKind::Chatterbox),
            "kokoro" | "kokoro-tts" | "kokorotts" => Some(ProviderKind::Kokoro),
            _ => None,
        }
    }

    /// The container format this backend archives audio in.
    pub fn output_format(&self) -> AudioFormat {
        match self {
            ProviderKind::ElevenLabs => AudioFormat::Mp3,
            ProviderKind::Say | ProviderKind::Chatterbox | ProviderKind::Kokoro => AudioFormat::Wav,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Per-Provider Parameters
// ============================================================================

/// Parameters for the macOS `say` backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SayParams {
    /// Voice name (e.g., "Samantha"). `None` uses the system default.
    pub voice: Option<String>,
}

impl SayParams {
    /// Set the voice name.
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

/// Parameters for the ElevenLabs cloud backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevenLabsParams {
    /// Voice ID to synthesize with.
    pub voice_id: String,
    /// Model ID (e.g., "eleven_multilingual_v2").
    pub model_id: String,
    /// Voice stability (0.0-1.0).
    pub stability: f32,
    /// Similarity boost (0.0-1.0).
    pub similarity_boost: f32,
    /// Style exaggeration (0.0-1.0).
    pub style: f32,
    /// Whether to enable speaker boost.
    pub use_speaker_boost: bool,
}

impl Default for ElevenLabsParams {
    fn default() -> Self {
        Self {
            voice_id: crate::providers::elevenlabs::DEFAULT_VOICE_ID.into(),
            model_id: crate::providers::elevenlabs::DEFAULT_MODEL_ID.into(),
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

impl ElevenLabsParams {
    /// Set the voice ID.
    #[must_use]
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    /// Set the model ID.
    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}

/// Parameters for the Chatterbox neural backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatterboxParams {
    /// Emotional exaggeration (0.0-1.0; 0.5 is neutral).
    pub exaggeration: f32,
    /// Classifier-free guidance weight (0.0-1.0).
    pub cfg_weight: f32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional reference audio to clone the voice from.
    pub reference_audio: Option<PathBuf>,
}

impl Default for ChatterboxParams {
    fn default() -> Self {
        Self {
            exaggeration: 0.5,
            cfg_weight: 0.5,
            temperature: 0.8,
            reference_audio: None,
        }
    }
}

impl ChatterboxParams {
    /// Set the reference audio path.
    #[must_use]
    pub fn with_reference_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_audio = Some(path.into());
        self
    }
}

/// Parameters for the Kokoro neural backend.
#[derive(Debug, Clone, PartialEq)]
pub struct KokoroParams {
    /// Voice ID; the 2-character prefix encodes language and gender
    /// (e.g., `af_heart` = American Female).
    pub voice: String,
    /// Language code passed to the engine.
    pub language: String,
}

impl Default for KokoroParams {
    fn default() -> Self {
        Self {
            voice: "af_heart".into(),
            language: "en-us".into(),
        }
    }
}

impl KokoroParams {
    /// Set the voice ID.
    #[must_use]
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set the language code.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

// ============================================================================
// Provider Params (closed tagged variant)
// ============================================================================

/// A backend together with its parameters.
///
/// This replaces string-typed provider dispatch: each variant carries its
/// own parameter struct, and every match over it is checked at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderParams {
    /// macOS `say`.
    Say(SayParams),
    /// ElevenLabs cloud API.
    ElevenLabs(ElevenLabsParams),
    /// Chatterbox local neural TTS.
    Chatterbox(ChatterboxParams),
    /// Kokoro local neural TTS.
    Kokoro(KokoroParams),
}

impl ProviderParams {
    /// Which backend these parameters belong to.
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderParams::Say(_) => ProviderKind::Say,
            ProviderParams::ElevenLabs(_) => ProviderKind::ElevenLabs,
            ProviderParams::Chatterbox(_) => ProviderKind::Chatterbox,
            ProviderParams::Kokoro(_) => ProviderKind::Kokoro,
        }
    }

    /// Default parameters for a given backend.
    pub fn default_for(kind: ProviderKind) -> ProviderParams {
        match kind {
            ProviderKind::Say => ProviderParams::Say(SayParams::default()),
            ProviderKind::ElevenLabs => ProviderParams::ElevenLabs(ElevenLabsParams::default()),
            ProviderKind::Chatterbox => ProviderParams::Chatterbox(ChatterboxParams::default()),
            ProviderKind::Kokoro => ProviderParams::Kokoro(KokoroParams::default()),
        }
    }
}

// ============================================================================
// Synthesis Request
// ============================================================================

/// One generation request: what to say, how fast, and with which backend.
///
/// ## Examples
///
/// ```
/// use voxpop::types::{ProviderParams, SayParams, SpeedLevel, SynthesisRequest};
///
/// let request = SynthesisRequest::new(
///     "Hello, world!",
///     ProviderParams::Say(SayParams::default()),
/// )
/// .with_speed(SpeedLevel::Faster);
///
/// assert_eq!(request.speed.value(), 1.25);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    /// The text to synthesize.
    pub text: String,
    /// Playback speed.
    pub speed: SpeedLevel,
    /// Backend and its parameters.
    pub params: ProviderParams,
}

impl SynthesisRequest {
    /// Create a request with normal speed.
    pub fn new(text: impl Into<String>, params: ProviderParams) -> Self {
        Self {
            text: text.into(),
            speed: SpeedLevel::Normal,
            params,
        }
    }

    /// Set the playback speed.
    #[must_use]
    pub fn with_speed(mut self, speed: SpeedLevel) -> Self {
        self.speed = speed;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
