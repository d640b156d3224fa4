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

//! In-memory sample data with a per-voice play cursor.

use std::sync::Arc;

/// The zero-amplitude value for unsigned 8-bit PCM.
pub const SILENCE: u8 = 0x80;

/// The channel count the mixing engine accepts.
const REQUIRED_CHANNELS: u16 = 1;

/// The bit depth the mixing engine accepts.
const REQUIRED_BITS_PER_SAMPLE: u16 = 8;

/// The PCM format declared by a decoded sound asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl PcmFormat {
    /// Checks this format against what the mixing engine accepts: a single
    /// channel of unsigned 8-bit samples at the board's sample rate.
    pub fn validate(&self, required_rate: u32) -> Result<(), FormatError> {
        if self.channels != REQUIRED_CHANNELS {
            return Err(FormatError::ChannelCount(self.channels));
        }
        if self.bits_per_sample != REQUIRED_BITS_PER_SAMPLE {
            return Err(FormatError::BitDepth(self.bits_per_sample));
        }
        if self.sample_rate != required_rate {
            return Err(FormatError::SampleRate {
                expected: required_rate,
                found: self.sample_rate,
            });
        }
        Ok(())
    }
}

/// A sound asset whose declared format the engine can't play.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("expected 1 channel, found {0}")]
    ChannelCount(u16),

    #[error("expected 8 bits per sample, found {0}")]
    BitDepth(u16),

    #[error("expected a {expected}Hz sample rate, found {found}Hz")]
    SampleRate { expected: u32, found: u32 },
}

/// Decoded audio for one pad plus a play cursor.
///
/// The sample data is shared and immutable; the cursor is the only mutable
/// state. A cursor equal to the data length means this play-through is
/// finished, zero means it's ready to start from the beginning.
pub struct SampleBuffer {
    data: Arc<[u8]>,
    cursor: usize,
}

impl SampleBuffer {
    /// Creates a sample buffer from decoded audio, rejecting anything that
    /// isn't mono unsigned 8-bit PCM at the required rate.
    pub fn new(data: Vec<u8>, format: PcmFormat, required_rate: u32) -> Result<Self, FormatError> {
        format.validate(required_rate)?;
        Ok(SampleBuffer {
            data: data.into(),
            cursor: 0,
        })
    }

    /// Returns a new cursor over the same shared sample data, positioned at
    /// the start. Used when a pad is armed as a voice.
    pub fn fresh(&self) -> SampleBuffer {
        SampleBuffer {
            data: Arc::clone(&self.data),
            cursor: 0,
        }
    }

    /// Returns true while there are samples left to play.
    pub fn has_next(&self) -> bool {
        self.cursor < self.data.len()
    }

    /// Returns the sample under the cursor and advances. Once exhausted this
    /// yields the silence midpoint without advancing further, so a caller
    /// polling past the end contributes nothing to a mix.
    pub fn next(&mut self) -> u8 {
        if !self.has_next() {
            return SILENCE;
        }
        let sample = self.data[self.cursor];
        self.cursor += 1;
        sample
    }

    /// Rewinds the cursor to the first sample.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns the total number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the asset holds no samples at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
