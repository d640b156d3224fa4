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

//! Board configuration: the audio output settings and the pad table.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default sample rate for playback and pad validation.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Default number of samples per output buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 512;

const DEFAULT_DEVICE: &str = "default";

/// Typed error for board load/parse failures so callers can tell a missing
/// file from a malformed one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read board file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse board file: {0}")]
    Parse(#[from] serde_yml::Error),
}

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Default)]
pub struct Audio {
    /// The audio device.
    device: Option<String>,

    /// Output sample rate in Hz; every pad must match it (default: 22050).
    sample_rate: Option<u32>,

    /// Samples per output buffer (default: 512).
    buffer_size: Option<usize>,
}

impl Audio {
    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the sample rate from the configuration.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the output buffer size from the configuration.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }
}

#[cfg(test)]
impl Audio {
    /// Creates an audio configuration for the given device (test only).
    pub fn new(device: &str, buffer_size: Option<usize>) -> Audio {
        Audio {
            device: Some(device.to_string()),
            sample_rate: None,
            buffer_size,
        }
    }
}

/// A YAML representation of a pad board: the audio output configuration and
/// the table of pad names to WAV files.
#[derive(Deserialize, Clone)]
pub struct Board {
    /// The audio configuration.
    #[serde(default)]
    audio: Audio,

    /// Pad name to WAV file path. Relative paths resolve against the board
    /// file's directory.
    pads: HashMap<String, String>,

    /// Directory the board file was loaded from.
    #[serde(skip)]
    base_path: PathBuf,
}

impl Board {
    /// Parses a board from a YAML file.
    pub fn from_file(path: &Path) -> Result<Board, ConfigError> {
        let mut board: Board = serde_yml::from_str(&fs::read_to_string(path)?)?;
        board.base_path = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(board)
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Returns the pad table.
    pub fn pads(&self) -> &HashMap<String, String> {
        &self.pads
    }

    /// Resolves a pad file path against the board file's directory.
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

#[cfg(test)]
impl Board {
    /// Creates a board directly (test only).
    pub fn new(audio: Audio, pads: HashMap<String, String>, base_path: PathBuf) -> Board {
        Board {
            audio,
            pads,
            base_path,
        }
    }
}
