//! Shared PCM plumbing for the neural backends.
//!
//! Both neural engines synthesize text in sentence-sized chunks; the
//! per-chunk WAV segments are concatenated here into one single-channel
//! 16-bit PCM waveform at the engine's fixed sample rate.

use std::path::Path;

use crate::errors::SynthesisError;

/// Soft upper bound on the size of one synthesis chunk, in characters.
const MAX_CHUNK_CHARS: usize = 400;

/// Split text into sentence-grouped chunks for incremental synthesis.
///
/// Sentences are grouped until a chunk would exceed [`MAX_CHUNK_CHARS`];
/// a single sentence longer than the bound becomes its own chunk. Never
/// returns an empty list for non-blank input.
pub(crate) fn split_into_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let candidate_len = if current.is_empty() {
            sentence.chars().count()
        } else {
            current.chars().count() + 1 + sentence.chars().count()
        };

        if !current.is_empty() && candidate_len > MAX_CHUNK_CHARS {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split text on sentence terminators, keeping the terminator attached.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Read a WAV segment into mono 16-bit samples, verifying the sample rate.
///
/// Accepts 16-bit integer or 32-bit float segments (float is rescaled);
/// anything else is reported as malformed output from the backend.
pub(crate) fn read_segment(
    path: &Path,
    provider: &'static str,
    expected_rate: u32,
) -> Result<Vec<i16>, SynthesisError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_rate != expected_rate {
        return Err(SynthesisError::MalformedAudio {
            provider,
            reason: format!(
                "expected {} Hz, segment is {} Hz",
                expected_rate, spec.sample_rate
            ),
        });
    }
    if spec.channels != 1 {
        return Err(SynthesisError::MalformedAudio {
            provider,
            reason: format!("expected mono, segment has {} channels", spec.channels),
        });
    }

    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<Result<Vec<i16>, _>>()
            .map_err(SynthesisError::from),
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<Result<Vec<i16>, _>>()
            .map_err(SynthesisError::from),
        (format, bits) => Err(SynthesisError::MalformedAudio {
            provider,
            reason: format!("unsupported sample format {:?}/{} bits", format, bits),
        }),
    }
}

/// Write concatenated samples as a single-channel 16-bit PCM WAV file.
pub(crate) fn write_pcm_wav(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
) -> Result<(), SynthesisError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_basic() {
        let sentences = split_sentences("One. Two! Three?");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?"]);
    }

    #[test]
    fn test_split_sentences_trailing_fragment() {
        let sentences = split_sentences("A full stop. And a dangling tail");
        assert_eq!(sentences, vec!["A full stop.", "And a dangling tail"]);
    }

    #[test]
    fn test_split_into_chunks_short_text_single_chunk() {
        let chunks = split_into_chunks("Hello world. How are you?");
        assert_eq!(chunks, vec!["Hello world. How are you?"]);
    }

    #[test]
    fn test_split_into_chunks_respects_bound() {
        let sentence = format!("{}.", "word ".repeat(60).trim());
        let text = format!("{} {} {}", sentence, sentence, sentence);
        let chunks = split_into_chunks(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            // A single sentence may exceed the bound, but grouped chunks may not.
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS || !chunk.contains(". "));
        }
    }

    #[test]
    fn test_split_into_chunks_blank_input() {
        assert!(split_into_chunks("").is_empty());
        assert!(split_into_chunks("   ").is_empty());
    }

    #[test]
    fn test_pcm_roundtrip_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segment.wav");
        let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN];

        write_pcm_wav(&path, &samples, 24_000).unwrap();
        let read_back = read_segment(&path, "test", 24_000).unwrap();
        assert_eq!(read_back, samples);
    }

    #[test]
    fn test_read_segment_rejects_wrong_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segment.wav");
        write_pcm_wav(&path, &[0i16; 8], 22_050).unwrap();

        let err = read_segment(&path, "test", 24_000).unwrap_err();
        assert!(matches!(err, SynthesisError::MalformedAudio { .. }));
    }

    #[test]
    fn test_read_segment_converts_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for v in [0.0f32, 0.5, -0.5, 1.0, -1.0] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let samples = read_segment(&path, "test", 24_000).unwrap();
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], i16::MAX);
    }

    #[test]
    fn test_read_segment_rejects_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 24_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let err = read_segment(&path, "test", 24_000).unwrap_err();
        assert!(matches!(err, SynthesisError::MalformedAudio { .. }));
    }
}
