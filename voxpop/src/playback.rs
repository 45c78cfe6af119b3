//! Cross-platform playback through system audio players.
//!
//! Playback shells out to whatever the platform provides (afplay on macOS,
//! paplay/aplay on Linux, PowerShell on Windows) rather than linking an
//! audio stack into the binary. Player choice is format-aware: on Linux,
//! paplay and aplay only decode WAV/PCM, so MP3 files from the cloud
//! backend must go through mpv/ffplay/play instead.

use std::path::Path;

use tracing::debug;

use crate::errors::SynthesisError;
use crate::types::AudioFormat;

// ============================================================================
// OS-Specific Audio Players
// ============================================================================

/// Audio players by platform preference for WAV.
#[cfg(target_os = "macos")]
const WAV_PLAYERS: &[&str] = &["afplay"];

/// Audio players by platform preference for WAV.
/// paplay and aplay come first since they are lightweight.
#[cfg(target_os = "linux")]
const WAV_PLAYERS: &[&str] = &["paplay", "aplay", "play", "mpv", "ffplay"];

/// Audio players by platform preference for WAV.
#[cfg(target_os = "windows")]
const WAV_PLAYERS: &[&str] = &["powershell"];

/// Fallback for other platforms (WAV).
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const WAV_PLAYERS: &[&str] = &["ffplay", "play"];

/// Audio players that can decode MP3.
#[cfg(target_os = "macos")]
const MP3_PLAYERS: &[&str] = &["afplay"];

/// Audio players that can decode MP3 on Linux.
/// paplay and aplay are excluded: they only handle WAV/PCM and play MP3
/// back as static.
#[cfg(target_os = "linux")]
const MP3_PLAYERS: &[&str] = &["mpv", "ffplay", "play"];

/// Audio players that can decode MP3 on Windows.
#[cfg(target_os = "windows")]
const MP3_PLAYERS: &[&str] = &["powershell"];

/// Fallback MP3 players for other platforms.
#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
const MP3_PLAYERS: &[&str] = &["mpv", "ffplay", "play"];

// ============================================================================
// Player Detection
// ============================================================================

/// First available player that can decode the given format.
pub fn get_audio_player_for_format(format: AudioFormat) -> Option<&'static str> {
    let players = match format {
        AudioFormat::Wav => WAV_PLAYERS,
        AudioFormat::Mp3 => MP3_PLAYERS,
    };
    players
        .iter()
        .copied()
        .find(|player| which::which(player).is_ok())
}

// ============================================================================
// Playback
// ============================================================================

/// Play an audio file through the system player, blocking until it ends.
///
/// ## Errors
///
/// Returns an error if no player supporting the format is installed, the
/// player cannot be spawned, or it exits unsuccessfully.
pub async fn play_audio_file(path: &Path, format: AudioFormat) -> Result<(), SynthesisError> {
    let player = get_audio_player_for_format(format).ok_or(SynthesisError::NoAudioPlayer)?;
    let args = build_player_args(player, path);

    debug!(
        player,
        path = %path.display(),
        format = ?format,
        "Playing audio file"
    );

    let output = tokio::process::Command::new(player)
        .args(&args)
        .output()
        .await
        .map_err(|e| SynthesisError::ProcessSpawnFailed {
            provider: player,
            source: e,
        })?;

    if !output.status.success() {
        return Err(SynthesisError::PlaybackFailed {
            player: player.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}

/// Build the command-line arguments for the audio player.
fn build_player_args(player: &str, path: &Path) -> Vec<String> {
    let path_str = path.to_string_lossy().to_string();

    match player {
        "powershell" => {
            vec![
                "-NoProfile".to_string(),
                "-NonInteractive".to_string(),
                "-Command".to_string(),
                format!(
                    "(New-Object Media.SoundPlayer '{}').PlaySync()",
                    path_str.replace('\'', "''")
                ),
            ]
        }
        "ffplay" => {
            vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
                path_str,
            ]
        }
        "mpv" => {
            vec![
                "--no-video".to_string(),
                "--really-quiet".to_string(),
                path_str,
            ]
        }
        // afplay, paplay, aplay, play: just the file path
        _ => vec![path_str],
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_players_not_empty() {
        assert!(!WAV_PLAYERS.is_empty());
    }

    #[test]
    fn test_mp3_players_not_empty() {
        assert!(!MP3_PLAYERS.is_empty());
    }

    #[test]
    fn test_build_player_args_default() {
        let args = build_player_args("afplay", Path::new("/tmp/test.wav"));
        assert_eq!(args, vec!["/tmp/test.wav"]);
    }

    #[test]
    fn test_build_player_args_powershell() {
        let args = build_player_args("powershell", Path::new("/tmp/test.wav"));
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], "-NoProfile");
        assert!(args[3].contains("PlaySync"));
    }

    #[test]
    fn test_build_player_args_ffplay() {
        let args = build_player_args("ffplay", Path::new("/tmp/test.wav"));
        assert!(args.contains(&"-nodisp".to_string()));
        assert!(args.contains(&"-autoexit".to_string()));
    }

    #[test]
    fn test_build_player_args_mpv() {
        let args = build_player_args("mpv", Path::new("/tmp/test.wav"));
        assert!(args.contains(&"--no-video".to_string()));
    }

    #[test]
    fn test_get_audio_player_for_format_does_not_panic() {
        let _ = get_audio_player_for_format(AudioFormat::Wav);
        let _ = get_audio_player_for_format(AudioFormat::Mp3);
    }

    /// MP3 playback on Linux must not use paplay/aplay: they only decode
    /// WAV/PCM and turn MP3 into static.
    #[test]
    #[cfg(target_os = "linux")]
    fn test_mp3_players_excludes_paplay_aplay_on_linux() {
        assert!(!MP3_PLAYERS.contains(&"paplay"));
        assert!(!MP3_PLAYERS.contains(&"aplay"));
    }
}
