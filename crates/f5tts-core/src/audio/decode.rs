//! Decoding reference audio into mono f32 samples

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Mono audio decoded from a file or an in-memory asset
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source before downmixing
    pub source_channels: usize,
}

/// Decode audio bytes, using `hound` for WAV and `symphonia` for anything else.
///
/// `extension` is only a probing hint for non-WAV containers.
pub fn decode_audio(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
    let (interleaved, sample_rate, channels) = if bytes.starts_with(b"RIFF") {
        decode_wav(&bytes)?
    } else {
        decode_container(bytes, extension)?
    };

    if channels > 1 {
        warn!("Reference audio has {} channels, averaging to mono", channels);
    }

    let samples = downmix(&interleaved, channels);
    debug!("Decoded {} samples at {} Hz", samples.len(), sample_rate);

    Ok(DecodedAudio {
        samples,
        sample_rate,
        source_channels: channels,
    })
}

fn decode_wav(bytes: &[u8]) -> Result<(Vec<f32>, u32, usize)> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1u64 << (spec.bits_per_sample.saturating_sub(1) as u64)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok((samples, spec.sample_rate, spec.channels.max(1) as usize))
}

fn decode_container(bytes: Vec<u8>, extension: Option<&str>) -> Result<(Vec<f32>, u32, usize)> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let (track_id, codec_params) = {
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::AudioError("No decodable audio track".to_string()))?;
        (track.id, track.codec_params.clone())
    };

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::AudioError("Audio track has no sample rate".to_string()))?;
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!("Skipping corrupt audio packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    Ok((samples, sample_rate, channels))
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_decode_pcm16_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let audio = decode_audio(wav_bytes(spec, &[0, 16384, -16384]), Some("wav")).unwrap();

        assert_eq!(audio.sample_rate, 24000);
        assert_eq!(audio.source_channels, 1);
        assert_eq!(audio.samples, vec![0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_stereo_is_averaged() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let audio = decode_audio(wav_bytes(spec, &[16384, 0, -16384, -16384]), None).unwrap();

        assert_eq!(audio.source_channels, 2);
        assert_eq!(audio.samples, vec![0.25, -0.5]);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = decode_audio(b"definitely not audio".to_vec(), Some("mp3"));
        assert!(result.is_err());
    }
}
