//! Voxpop
//!
//! Text-to-speech library with a persistent audio archive and support for
//! multiple synthesis backends.
//!
//! ## Features
//!
//! - **Multi-backend synthesis**: macOS `say`, the ElevenLabs cloud API,
//!   and the Chatterbox / Kokoro local neural models
//! - **Closed dispatch**: backends are enum variants, not string lookups,
//!   so every request names exactly one known backend
//! - **Persistent archive**: every generation lands in a flat directory
//!   with a crash-safe JSON index, browsable as history
//! - **Background generation**: long neural syntheses run on a task with
//!   progress updates and cancellation
//! - **Async-first**: built on tokio for non-blocking subprocess and HTTP
//!   driving
//!
//! ## Quick Start
//!
//! ```ignore
//! use voxpop::{AudioStore, ProviderParams, Studio, SynthesisRequest};
//! use voxpop::types::KokoroParams;
//!
//! let studio = Studio::new(AudioStore::open_default()?);
//! let record = studio
//!     .generate(&SynthesisRequest::new(
//!         "Hello, world!",
//!         ProviderParams::Kokoro(KokoroParams::default()),
//!     ))
//!     .await?;
//! println!("archived as {}", record.filename);
//! ```
//!
//! ## Module Structure
//!
//! - [`types`] - Core type definitions (backends, parameters, formats)
//! - [`errors`] - Error types for synthesis and storage
//! - [`providers`] - The [`SpeechSynthesizer`] trait and the four backends
//! - [`dispatch`] - The [`Studio`] orchestrator and background generation
//! - [`store`] - The on-disk audio archive
//! - [`title`] - Display-title derivation from synthesized text
//! - [`playback`] - Playback through system audio players

pub mod dispatch;
pub mod errors;
pub mod playback;
pub mod providers;
pub mod store;
pub mod title;
pub mod types;

// Re-export main types at crate root for convenience
pub use dispatch::{GenerationHandle, Progress, Studio};
pub use errors::{FailureKind, StoreError, SynthesisError};
pub use playback::play_audio_file;
pub use providers::chatterbox::ChatterboxProvider;
pub use providers::elevenlabs::ElevenLabsProvider;
pub use providers::kokoro::KokoroProvider;
pub use providers::say::SayProvider;
pub use providers::{kind_is_ready, SpeechSynthesizer, SynthesisOutput};
pub use store::{AudioRecord, AudioStore};
pub use title::suggest_title;
pub use types::{
    AudioFormat, ChatterboxParams, ElevenLabsParams, KokoroParams, ProviderKind, ProviderParams,
    SayParams, SpeedLevel, SynthesisRequest,
};
