// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! WAV loading for pad assets.
//!
//! Pads are read entirely into memory at startup so triggering never touches
//! the filesystem.

use std::path::Path;

use hound::WavReader;
use tracing::{info, warn};

use super::buffer::{FormatError, PcmFormat, SampleBuffer};

/// A pad asset that couldn't be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("audio file error: {0}")]
    Wav(#[from] hound::Error),

    #[error("invalid format in {path}: {source}")]
    Format { path: String, source: FormatError },
}

/// Loads pad WAV files, enforcing the engine's input format.
pub struct SampleLoader {
    /// Sample rate every pad must match.
    required_rate: u32,
}

impl SampleLoader {
    /// Creates a loader for boards running at the given sample rate.
    pub fn new(required_rate: u32) -> SampleLoader {
        SampleLoader { required_rate }
    }

    /// Reads the given WAV file fully into memory, validating that it's mono
    /// unsigned 8-bit PCM at the loader's sample rate.
    pub fn load(&self, path: &Path) -> Result<SampleBuffer, LoadError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        let format = PcmFormat {
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            sample_rate: spec.sample_rate,
        };
        // Checked before decoding; a 16-bit file would otherwise surface as
        // a sample-width error from hound instead of a format mismatch.
        if let Err(source) = format.validate(self.required_rate) {
            return Err(LoadError::Format {
                path: path.display().to_string(),
                source,
            });
        }

        // 8-bit WAV data is stored unsigned; hound hands it out as i8
        // centered on zero.
        let data = reader
            .into_samples::<i8>()
            .map(|sample| sample.map(|s| (i16::from(s) + 128) as u8))
            .collect::<Result<Vec<u8>, hound::Error>>()?;

        let buffer = SampleBuffer::new(data, format, self.required_rate).map_err(|source| {
            LoadError::Format {
                path: path.display().to_string(),
                source,
            }
        })?;

        if buffer.is_empty() {
            warn!(path = %path.display(), "Pad sample has no audio data.");
        }

        info!(
            path = %path.display(),
            samples = buffer.len(),
            "Pad sample loaded."
        );

        Ok(buffer)
    }
}

impl std::fmt::Debug for SampleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleLoader")
            .field("required_rate", &self.required_rate)
            .finish()
    }
}
