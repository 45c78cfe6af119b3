//! Error types for synthesis and the audio store.
//!
//! Every backend failure carries a [`FailureKind`] discriminator so callers
//! can decide whether to prompt for credentials, report "not installed", or
//! surface a crash without matching on individual variants.

/// Broad failure classification for surfacing generation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend is not installed, not configured, or missing credentials.
    Unavailable,
    /// A network transport error or a non-success API response.
    Network,
    /// The request itself was malformed or cannot be accepted right now.
    BadParameters,
    /// The backend started but crashed or produced unusable output.
    BackendCrash,
}

/// Errors that can occur during audio generation.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// The backend is not available on this system.
    #[error("TTS backend `{provider}` is unavailable: {reason}")]
    Unavailable {
        /// Provider name.
        provider: &'static str,
        /// Why the backend cannot be used.
        reason: String,
    },

    /// No API key configured for a cloud provider.
    #[error("No API key configured for `{provider}` (set {env_var})")]
    MissingApiKey {
        /// Provider name.
        provider: &'static str,
        /// The environment variable the key is read from.
        env_var: &'static str,
    },

    /// The HTTP request could not be completed.
    #[error("Request to `{provider}` failed: {message}")]
    Network {
        /// Provider name.
        provider: &'static str,
        /// Transport-level error description.
        message: String,
    },

    /// The API answered with a non-success status.
    #[error("`{provider}` API returned status {status}")]
    Api {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code of the response.
        status: u16,
    },

    /// The request parameters are invalid.
    #[error("Bad parameters: {reason}")]
    BadParameters {
        /// What is wrong with the request.
        reason: String,
    },

    /// The backend process could not be spawned.
    #[error("Failed to spawn `{provider}`")]
    ProcessSpawnFailed {
        /// Provider name.
        provider: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backend process exited with an error.
    #[error("`{provider}` exited with an error: {stderr}")]
    ProcessFailed {
        /// Provider name.
        provider: &'static str,
        /// Captured error output.
        stderr: String,
    },

    /// The backend produced audio we cannot use.
    #[error("`{provider}` produced malformed audio: {reason}")]
    MalformedAudio {
        /// Provider name.
        provider: &'static str,
        /// What was wrong with the output.
        reason: String,
    },

    /// Another generation is already in flight on this session.
    #[error("Another generation is already in flight")]
    Busy,

    /// The generation was cancelled before it completed.
    #[error("Generation was cancelled")]
    Cancelled,

    /// A temporary file or directory could not be created.
    #[error("Temp file error")]
    TempFile {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A general I/O error.
    #[error("I/O error")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// WAV encoding or decoding failed.
    #[error("WAV error")]
    Wav {
        /// The underlying hound error.
        #[from]
        source: hound::Error,
    },

    /// The audio store rejected the new record.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No audio player was found on this system.
    #[error("No suitable audio player found on this system")]
    NoAudioPlayer,

    /// The system audio player failed.
    #[error("Audio player `{player}` failed: {stderr}")]
    PlaybackFailed {
        /// Player binary name.
        player: String,
        /// Captured error output.
        stderr: String,
    },
}

impl SynthesisError {
    /// Classify this error into one of the four failure kinds.
    ///
    /// `Cancelled` counts as a backend crash (the generation aborted
    /// mid-flight and any partial output was removed); `Busy` counts as
    /// bad parameters (the request cannot be accepted right now).
    pub fn kind(&self) -> FailureKind {
        match self {
            SynthesisError::Unavailable { .. }
            | SynthesisError::MissingApiKey { .. }
            | SynthesisError::ProcessSpawnFailed { .. }
            | SynthesisError::NoAudioPlayer => FailureKind::Unavailable,

            SynthesisError::Network { .. } | SynthesisError::Api { .. } => FailureKind::Network,

            SynthesisError::BadParameters { .. } | SynthesisError::Busy => {
                FailureKind::BadParameters
            }

            _ => FailureKind::BackendCrash,
        }
    }
}

/// Errors that can occur in the audio store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store directory or index could not be written.
    #[error("Store write failed")]
    WriteError(#[from] std::io::Error),

    /// The index could not be serialized.
    #[error("Index serialization failed")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_kind() {
        let err = SynthesisError::Unavailable {
            provider: "say",
            reason: "not installed".into(),
        };
        assert_eq!(err.kind(), FailureKind::Unavailable);
    }

    #[test]
    fn test_missing_api_key_kind() {
        let err = SynthesisError::MissingApiKey {
            provider: "elevenlabs",
            env_var: "ELEVENLABS_API_KEY",
        };
        assert_eq!(err.kind(), FailureKind::Unavailable);
    }

    #[test]
    fn test_network_kinds() {
        let err = SynthesisError::Network {
            provider: "elevenlabs",
            message: "connection refused".into(),
        };
        assert_eq!(err.kind(), FailureKind::Network);

        let err = SynthesisError::Api {
            provider: "elevenlabs",
            status: 401,
        };
        assert_eq!(err.kind(), FailureKind::Network);
    }

    #[test]
    fn test_bad_parameters_kind() {
        let err = SynthesisError::BadParameters {
            reason: "text is empty".into(),
        };
        assert_eq!(err.kind(), FailureKind::BadParameters);
        assert_eq!(SynthesisError::Busy.kind(), FailureKind::BadParameters);
    }

    #[test]
    fn test_crash_kinds() {
        let err = SynthesisError::ProcessFailed {
            provider: "kokoro-tts",
            stderr: "model not found".into(),
        };
        assert_eq!(err.kind(), FailureKind::BackendCrash);
        assert_eq!(SynthesisError::Cancelled.kind(), FailureKind::BackendCrash);
    }

    #[test]
    fn test_spawn_failure_is_unavailable() {
        let err = SynthesisError::ProcessSpawnFailed {
            provider: "say",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.kind(), FailureKind::Unavailable);
    }

    #[test]
    fn test_error_messages() {
        let err = SynthesisError::Api {
            provider: "elevenlabs",
            status: 429,
        };
        assert!(err.to_string().contains("429"));

        let err = SynthesisError::Busy;
        assert!(err.to_string().contains("in flight"));
    }
}
