//! Audio decoding using Symphonia
//!
//! Decodes a file to a mono f32 sample vector. Multi-channel audio is
//! downmixed by averaging the channels. Decoding failures are fatal for the
//! affected recording; a single corrupt packet inside an otherwise readable
//! stream is skipped with a warning.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AnalysisError;

/// Decode an audio file to mono PCM samples
///
/// # Arguments
///
/// * `path` - Path to the audio file
///
/// # Returns
///
/// Tuple of `(samples, sample_rate)`; samples are mono f32
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` for missing files, unsupported
/// formats or codecs, and streams that yield no audio.
pub fn decode_audio(path: &Path) -> Result<(Vec<f32>, u32), AnalysisError> {
    log::debug!("Decoding audio file: {}", path.display());

    let file = File::open(path).map_err(|e| {
        AnalysisError::DecodingError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AnalysisError::DecodingError(format!("Unsupported format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::DecodingError("No decodable audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AnalysisError::DecodingError(format!("Unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = 0u32;
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(AnalysisError::DecodingError(format!(
                    "Failed to read packet: {}",
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(AnalysisError::DecodingError(format!("Decode failed: {}", e)))
            }
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channels = spec.channels.count();

        let needs_realloc = sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * channels);
        if needs_realloc {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let buf = sample_buf.as_mut().unwrap();
        buf.copy_interleaved_ref(decoded);

        if channels <= 1 {
            samples.extend_from_slice(buf.samples());
        } else {
            for frame in buf.samples().chunks_exact(channels) {
                samples.push(frame.iter().sum::<f32>() / channels as f32);
            }
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(AnalysisError::DecodingError(
            "Stream contained no decodable audio".to_string(),
        ));
    }

    log::debug!(
        "Decoded {} samples at {} Hz ({:.2}s)",
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32
    );

    Ok((samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_missing_file_errors() {
        let result = decode_audio(Path::new("/nonexistent/take.wav"));
        assert!(matches!(result, Err(AnalysisError::DecodingError(_))));
    }

    #[test]
    fn test_decode_garbage_errors() {
        let path = std::env::temp_dir().join("cadenza_dsp_garbage_test.wav");
        std::fs::write(&path, b"this is not audio data at all").unwrap();

        let result = decode_audio(&path);
        assert!(matches!(result, Err(AnalysisError::DecodingError(_))));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_decode_wav_roundtrip() {
        let path = std::env::temp_dir().join("cadenza_dsp_decode_test.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..22050 {
            let value = (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 44100.0).sin();
            writer.write_sample((value * i16::MAX as f32 * 0.5) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sample_rate) = decode_audio(&path).unwrap();

        assert_eq!(sample_rate, 44100);
        assert_eq!(samples.len(), 22050);
        // Signal is present and within range
        let peak = samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(peak > 0.4 && peak <= 1.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_decode_stereo_downmixes() {
        let path = std::env::temp_dir().join("cadenza_dsp_stereo_test.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..11025 {
            // Left at +0.5, right at -0.5: downmix cancels to ~0
            writer.write_sample((0.5 * i16::MAX as f32) as i16).unwrap();
            writer.write_sample((-0.5 * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sample_rate) = decode_audio(&path).unwrap();

        assert_eq!(sample_rate, 22050);
        assert_eq!(samples.len(), 11025);
        let peak = samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!(peak < 0.01, "Downmix of opposite channels should cancel");

        std::fs::remove_file(&path).ok();
    }
}
