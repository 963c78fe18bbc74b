//! Audio encoding and output writing

use hound::{WavSpec, WavWriter};
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Writes f32 samples as 32-bit float WAV
pub struct AudioEncoder {
    sample_rate: u32,
    channels: u16,
}

impl AudioEncoder {
    /// Create a new encoder
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Encode and write to `path`.
    ///
    /// Bytes go to a sibling `.part` file that is renamed into place, so a
    /// failed write never leaves a file at `path`.
    pub fn write_wav(&self, path: &Path, samples: &[f32]) -> Result<()> {
        let bytes = self.encode_wav(samples)?;
        let partial = partial_path(path)?;

        if let Err(e) = std::fs::write(&partial, &bytes) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&partial, path) {
            let _ = std::fs::remove_file(&partial);
            return Err(e.into());
        }

        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    fn encode_wav(&self, samples: &[f32]) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut buffer, spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        debug!(
            "Encoded {} samples to float WAV ({} bytes)",
            samples.len(),
            buffer.get_ref().len()
        );
        Ok(buffer.into_inner())
    }
}

/// Little-endian f32 bytes, the bridge's wire format for float arrays
pub fn encode_raw_f32(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for &sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Inverse of [`encode_raw_f32`]
pub fn decode_raw_f32(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::AudioError(format!(
            "raw f32 payload of {} bytes is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn partial_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("output path {:?} has no file name", path)))?;
    let mut partial: OsString = file_name.to_os_string();
    partial.push(".part");
    Ok(path.with_file_name(partial))
}
