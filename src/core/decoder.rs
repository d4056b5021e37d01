// src/core/decoder.rs
//
// Audio decoding behind a swappable backend capability.
// The default backend uses Symphonia for format-agnostic decoding.

use anyhow::{bail, Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use std::fs::File;
use std::path::Path;

/// Decoded interleaved audio
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl AudioData {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Capability that turns a file into samples.
///
/// `is_available` lets callers distinguish "no decoder installed" from
/// "this file failed to decode"; both yield zeroed features downstream.
pub trait AudioBackend: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    fn decode(&self, path: &Path) -> Result<AudioData>;
}

/// Symphonia-backed decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaBackend;

impl AudioBackend for SymphoniaBackend {
    fn name(&self) -> &str {
        "symphonia"
    }

    fn decode(&self, path: &Path) -> Result<AudioData> {
        decode_audio(path)
    }
}

/// Backend that never decodes anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn decode(&self, path: &Path) -> Result<AudioData> {
        bail!("No audio backend available for {}", path.display())
    }
}

/// Decode audio file to floating-point samples
pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe file format - may be corrupted or unsupported")?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No supported audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("File does not specify sample rate")?;

    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    if channels == 0 {
        bail!("File reports 0 audio channels");
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder for audio codec")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match probed.format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
    })
}

/// Mono mixdown: mean of the first two channels, or the single channel
pub fn extract_mono(audio: &AudioData) -> Vec<f64> {
    if audio.channels == 1 {
        return audio.samples.iter().map(|&s| s as f64).collect();
    }

    audio
        .samples
        .chunks_exact(audio.channels)
        .map(|frame| 0.5 * (frame[0] as f64 + frame[1] as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mono_uses_first_two_channels() {
        let audio = AudioData {
            samples: vec![0.5, -0.5, 0.9, 0.3, 0.1, 0.9],
            sample_rate: 44100,
            channels: 3,
        };

        let mono = extract_mono(&audio);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.0).abs() < 1e-6);
        assert!((mono[1] - 0.2).abs() < 1e-6);
        assert_eq!(audio.frames(), 2);
    }

    #[test]
    fn test_null_backend_fails() {
        let backend = NullBackend;
        assert!(!backend.is_available());
        assert!(backend.decode(Path::new("anything.wav")).is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("garbage.wav");
        std::fs::write(&path, b"dummy").unwrap();
        assert!(SymphoniaBackend.decode(&path).is_err());
    }
}
