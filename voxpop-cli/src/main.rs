//! Command-line front end for the voxpop library.
//!
//! `voxpop speak` synthesizes and archives text; `history`, `play`, and
//! `delete` browse the archive; `providers` reports which backends are
//! usable on this machine.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use voxpop::{
    AudioFormat, AudioRecord, AudioStore, ChatterboxParams, ElevenLabsParams, KokoroParams,
    ProviderKind, ProviderParams, SayParams, SpeedLevel, Studio, SynthesisRequest,
};

#[derive(Parser)]
#[command(name = "voxpop")]
#[command(about = "Convert text to speech and keep the results", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synthesize text, archive it, and play it back
    Speak {
        /// Text to speak (reads from stdin if not provided)
        text: Vec<String>,

        /// Backend to use: say, elevenlabs, chatterbox, or kokoro
        #[arg(short, long, default_value = "say")]
        provider: String,

        /// Speed multiplier, e.g. 0.75, 1.25, or "2x"
        #[arg(short, long, default_value = "1.0")]
        speed: String,

        /// Voice name (say, kokoro) or voice ID (elevenlabs)
        #[arg(short, long)]
        voice: Option<String>,

        /// Language code (kokoro)
        #[arg(short, long)]
        language: Option<String>,

        /// Model ID (elevenlabs)
        #[arg(short, long)]
        model: Option<String>,

        /// Emotional exaggeration, 0.0-1.0 (chatterbox)
        #[arg(long)]
        exaggeration: Option<f32>,

        /// Classifier-free guidance weight (chatterbox)
        #[arg(long)]
        cfg_weight: Option<f32>,

        /// Sampling temperature (chatterbox)
        #[arg(long)]
        temperature: Option<f32>,

        /// Reference audio for voice cloning (chatterbox)
        #[arg(long)]
        reference_audio: Option<PathBuf>,

        /// Archive only; skip playback
        #[arg(long)]
        no_play: bool,

        /// Speak through the speakers immediately, without archiving
        /// (say backend only)
        #[arg(long, conflicts_with = "no_play")]
        live: bool,
    },

    /// List archived generations, newest first
    History {
        /// Maximum number of entries to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Play an archived generation
    Play {
        /// Filename as shown by `history`
        filename: String,
    },

    /// Delete an archived generation and its audio file
    Delete {
        /// Filename as shown by `history`
        filename: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show which backends are available on this machine
    Providers,
}

/// Joins multiple arguments into a single string with spaces
fn join_args(args: Vec<String>) -> String {
    args.join(" ")
}

/// Reads text from stdin with a 10,000 character limit
fn read_from_stdin() -> io::Result<Option<String>> {
    let mut buffer = String::new();
    let mut handle = io::stdin().take(10_000);
    handle.read_to_string(&mut buffer)?;
    let text = buffer.trim().to_string();
    Ok((!text.is_empty()).then_some(text))
}

fn parse_speed(input: &str) -> Result<SpeedLevel, String> {
    SpeedLevel::parse(input)
        .ok_or_else(|| format!("invalid speed {input:?} (try 0.75, 1.0, 1.25, 1.5, or 2.0)"))
}

fn parse_provider(name: &str) -> Result<ProviderKind, String> {
    ProviderKind::parse(name).ok_or_else(|| {
        let known: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown provider {name:?} (known: {})", known.join(", "))
    })
}

#[allow(clippy::too_many_arguments)]
fn build_params(
    kind: ProviderKind,
    voice: Option<String>,
    language: Option<String>,
    model: Option<String>,
    exaggeration: Option<f32>,
    cfg_weight: Option<f32>,
    temperature: Option<f32>,
    reference_audio: Option<PathBuf>,
) -> ProviderParams {
    match kind {
        ProviderKind::Say => ProviderParams::Say(SayParams { voice }),
        ProviderKind::ElevenLabs => {
            let mut params = ElevenLabsParams::default();
            if let Some(voice) = voice {
                params.voice_id = voice;
            }
            if let Some(model) = model {
                params.model_id = model;
            }
            ProviderParams::ElevenLabs(params)
        }
        ProviderKind::Chatterbox => {
            let mut params = ChatterboxParams::default();
            if let Some(v) = exaggeration {
                params.exaggeration = v;
            }
            if let Some(v) = cfg_weight {
                params.cfg_weight = v;
            }
            if let Some(v) = temperature {
                params.temperature = v;
            }
            params.reference_audio = reference_audio;
            ProviderParams::Chatterbox(params)
        }
        ProviderKind::Kokoro => {
            let mut params = KokoroParams::default();
            if let Some(voice) = voice {
                params.voice = voice;
            }
            if let Some(language) = language {
                params.language = language;
            }
            ProviderParams::Kokoro(params)
        }
    }
}

fn format_of(record: &AudioRecord) -> AudioFormat {
    std::path::Path::new(&record.filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(AudioFormat::from_extension)
        .unwrap_or(AudioFormat::Wav)
}

fn print_record(record: &AudioRecord) {
    println!(
        "{}  {}  {}  {}x",
        record.created_at.format("%Y-%m-%d %H:%M:%S").dimmed(),
        record.provider.as_str().cyan(),
        record.title.bold(),
        record.speed
    );
    println!("    {}", record.filename.dimmed());
}

async fn run(cli: Cli) -> Result<(), String> {
    let store = AudioStore::open_default().map_err(|e| e.to_string())?;

    match cli.command {
        Command::Speak {
            text,
            provider,
            speed,
            voice,
            language,
            model,
            exaggeration,
            cfg_weight,
            temperature,
            reference_audio,
            no_play,
            live,
        } => {
            let message = if text.is_empty() {
                match read_from_stdin().map_err(|e| e.to_string())? {
                    Some(text) => text,
                    None => {
                        eprintln!("Error: No input provided");
                        eprintln!("Usage: voxpop speak <text> or echo \"text\" | voxpop speak");
                        return Err(String::new());
                    }
                }
            } else {
                join_args(text)
            };

            let kind = parse_provider(&provider)?;
            let speed = parse_speed(&speed)?;

            if live {
                if kind != ProviderKind::Say {
                    return Err(format!(
                        "--live is only supported by the say backend, not {}",
                        kind.as_str()
                    ));
                }
                let speaker = voxpop::SayProvider::new(SayParams { voice });
                let speech = speaker
                    .speak_live(&message, speed)
                    .await
                    .map_err(|e| e.to_string())?;
                return speech.wait().await.map_err(|e| e.to_string());
            }

            let params = build_params(
                kind,
                voice,
                language,
                model,
                exaggeration,
                cfg_weight,
                temperature,
                reference_audio,
            );
            let request = SynthesisRequest::new(message, params).with_speed(speed);

            let studio = Studio::new(store);
            let record = studio.generate(&request).await.map_err(|e| e.to_string())?;

            println!(
                "{} {}",
                "Archived".green().bold(),
                record.filename.as_str()
            );
            if !no_play {
                let path = studio.store().audio_path(&record.filename);
                voxpop::play_audio_file(&path, format_of(&record))
                    .await
                    .map_err(|e| e.to_string())?;
            }
            Ok(())
        }

        Command::History { limit } => {
            let records = store.list();
            if records.is_empty() {
                println!("No archived audio yet. Try `voxpop speak \"hello\"`.");
                return Ok(());
            }
            let shown = limit.unwrap_or(records.len());
            for record in records.iter().take(shown) {
                print_record(record);
            }
            if records.len() > shown {
                println!("... and {} more", records.len() - shown);
            }
            Ok(())
        }

        Command::Play { filename } => {
            let record = store
                .find(&filename)
                .ok_or_else(|| format!("no archived audio named {filename:?}"))?;
            let path = store.audio_path(&record.filename);
            voxpop::play_audio_file(&path, format_of(&record))
                .await
                .map_err(|e| e.to_string())
        }

        Command::Delete { filename, yes } => {
            let Some(record) = store.find(&filename) else {
                println!("Nothing to delete: {filename} is not in the archive.");
                return Ok(());
            };

            if !yes {
                let prompt = format!("Delete \"{}\"?", record.title);
                let confirmed = inquire::Confirm::new(&prompt)
                    .with_default(false)
                    .prompt()
                    .map_err(|e| e.to_string())?;
                if !confirmed {
                    println!("Kept {filename}.");
                    return Ok(());
                }
            }

            store.delete(&filename).map_err(|e| e.to_string())?;
            println!("{} {}", "Deleted".red().bold(), filename);
            Ok(())
        }

        Command::Providers => {
            for kind in ProviderKind::ALL {
                let ready = voxpop::kind_is_ready(kind).await;
                let marker = if ready {
                    "ready".green().to_string()
                } else {
                    "unavailable".dimmed().to_string()
                };
                println!("{:<12} {}", kind.as_str().bold(), marker);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{} {}", "Error:".red().bold(), message);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_args_multi_word() {
        let args = vec!["Hello".to_string(), "world".to_string()];
        assert_eq!(join_args(args), "Hello world");
    }

    #[test]
    fn test_join_args_single_word() {
        let args = vec!["Hello".to_string()];
        assert_eq!(join_args(args), "Hello");
    }

    #[test]
    fn test_join_args_empty() {
        let args: Vec<String> = vec![];
        assert_eq!(join_args(args), "");
    }

    #[test]
    fn test_join_args_unicode() {
        let args = vec!["Hello".to_string(), "世界".to_string(), "🚀".to_string()];
        assert_eq!(join_args(args), "Hello 世界 🚀");
    }

    #[test]
    fn test_parse_speed_accepts_x_suffix() {
        assert_eq!(parse_speed("1.25x").unwrap().value(), 1.25);
    }

    #[test]
    fn test_parse_speed_rejects_garbage() {
        assert!(parse_speed("fast").is_err());
        assert!(parse_speed("-1").is_err());
    }

    #[test]
    fn test_parse_provider_aliases() {
        assert_eq!(parse_provider("11labs").unwrap(), ProviderKind::ElevenLabs);
        assert_eq!(parse_provider("macos").unwrap(), ProviderKind::Say);
    }

    #[test]
    fn test_parse_provider_unknown_lists_known_names() {
        let err = parse_provider("espeak").unwrap_err();
        assert!(err.contains("kokoro"));
        assert!(err.contains("espeak"));
    }

    #[test]
    fn test_build_params_kokoro_overrides() {
        let params = build_params(
            ProviderKind::Kokoro,
            Some("am_adam".to_string()),
            Some("en-gb".to_string()),
            None,
            None,
            None,
            None,
            None,
        );
        let ProviderParams::Kokoro(kokoro) = params else {
            panic!("expected kokoro params");
        };
        assert_eq!(kokoro.voice, "am_adam");
        assert_eq!(kokoro.language, "en-gb");
    }

    #[test]
    fn test_build_params_chatterbox_defaults_kept() {
        let params = build_params(
            ProviderKind::Chatterbox,
            None,
            None,
            None,
            Some(0.9),
            None,
            None,
            None,
        );
        let ProviderParams::Chatterbox(chatterbox) = params else {
            panic!("expected chatterbox params");
        };
        assert_eq!(chatterbox.exaggeration, 0.9);
        assert_eq!(chatterbox.cfg_weight, 0.5);
    }
}
