//! Persistent archive of generated audio.
//!
//! Audio files live in a flat directory next to a `metadata.json` index.
//! The index is the source of truth for history listings; every rewrite
//! goes through a temp-file-then-rename so a crash mid-write can never
//! leave a half-written index behind. A corrupt or missing index is
//! tolerated: it logs a warning and starts over empty rather than
//! refusing to run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::types::{AudioFormat, ProviderKind};

const INDEX_FILENAME: &str = "metadata.json";

/// One archived synthesis, as stored in the index.
///
/// Provider-specific fields are optional and omitted from the JSON when
/// absent, so records from different backends coexist in one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRecord {
    /// Audio filename relative to the store directory.
    pub filename: String,
    /// The full text that was synthesized.
    pub text: String,
    /// Display title derived from the text.
    pub title: String,
    /// Speed multiplier used for synthesis.
    pub speed: f32,
    /// Which backend produced the audio.
    pub provider: ProviderKind,
    /// When the audio was generated.
    pub created_at: DateTime<Utc>,
    /// Voice name or ID, where the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Language code (kokoro).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Cloud model ID (elevenlabs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    /// Emotional exaggeration (chatterbox).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exaggeration: Option<f32>,
    /// Classifier-free guidance weight (chatterbox).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg_weight: Option<f32>,
    /// Sampling temperature (chatterbox).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Voice-clone reference audio (chatterbox).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_audio: Option<PathBuf>,
}

/// Directory-backed audio archive with a JSON index.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    /// Open (creating if needed) a store at an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the default per-user store (`<data_dir>/voxpop`).
    pub fn open_default() -> Result<Self, StoreError> {
        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("voxpop"))
    }

    /// The directory audio files are stored in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILENAME)
    }

    /// Absolute path of a stored audio file.
    pub fn audio_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Load all records from the index.
    ///
    /// A missing index is an empty store. A malformed one is logged and
    /// treated as empty so a single bad byte cannot brick history.
    pub fn load(&self) -> Vec<AudioRecord> {
        let path = self.index_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read audio index");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Audio index is malformed; starting with an empty history"
                );
                Vec::new()
            }
        }
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<AudioRecord> {
        let mut records = self.load();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Look up a record by filename.
    pub fn find(&self, filename: &str) -> Option<AudioRecord> {
        self.load().into_iter().find(|r| r.filename == filename)
    }

    /// Append a record to the index.
    pub fn append(&self, record: AudioRecord) -> Result<(), StoreError> {
        let mut records = self.load();
        debug!(filename = %record.filename, provider = %record.provider, "Archiving record");
        records.push(record);
        self.write_atomic(&records)
    }

    /// Remove a record and its audio file.
    ///
    /// Returns `Ok(true)` when a record was removed, `Ok(false)` when no
    /// such record existed. Deleting twice is not an error, and a missing
    /// audio file does not block removal from the index.
    pub fn delete(&self, filename: &str) -> Result<bool, StoreError> {
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| r.filename != filename);
        if records.len() == before {
            return Ok(false);
        }

        if let Err(e) = fs::remove_file(self.audio_path(filename)) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(filename, error = %e, "Could not remove audio file");
            }
        }
        self.write_atomic(&records)?;
        Ok(true)
    }

    /// Pick a fresh filename of the form `tts_<provider>_<timestamp>.<ext>`.
    ///
    /// Same-second collisions get a `_2`, `_3`, ... suffix before the
    /// extension rather than overwriting the earlier file.
    pub fn reserve_filename(
        &self,
        provider: ProviderKind,
        format: AudioFormat,
        now: DateTime<Utc>,
    ) -> String {
        let stamp = now.format("%Y%m%d_%H%M%S");
        let base = format!("tts_{provider}_{stamp}");
        let ext = format.extension();

        let candidate = format!("{base}.{ext}");
        if !self.audio_path(&candidate).exists() {
            return candidate;
        }
        let mut n = 2u32;
        loop {
            let candidate = format!("{base}_{n}.{ext}");
            if !self.audio_path(&candidate).exists() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Rewrite the index via a temp file in the same directory.
    fn write_atomic(&self, records: &[AudioRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        let temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        fs::write(temp.path(), json)?;
        temp.persist(self.index_path())
            .map_err(|e| StoreError::WriteError(e.error))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
