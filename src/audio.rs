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
use std::{error::Error, fmt, sync::Arc};

use crate::config;

pub mod cpal;
pub mod mock;
pub mod thread_priority;

/// The audio output seam. A sink accepts fixed-size buffers of unsigned
/// 8-bit mono samples; `write` blocks until the device has room for the
/// buffer, which is what paces the output loop.
pub trait Sink: fmt::Display + Send + Sync {
    /// Writes one buffer, blocking on device backpressure.
    fn write(&self, buffer: &[u8]) -> Result<(), SinkError>;

    /// Blocks until previously written audio has played out.
    fn drain(&self) -> Result<(), SinkError>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Sink>, Box<dyn Error>>;
}

/// A sink that couldn't be opened or stopped accepting audio. Runtime
/// failures are fatal to playback; the engine makes no reconnection attempt.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("no output device named {0}")]
    NoDevice(String),

    #[error("failed to enumerate devices: {0}")]
    Devices(#[from] ::cpal::DevicesError),

    #[error("failed to query device config: {0}")]
    DeviceConfig(#[from] ::cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] ::cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] ::cpal::PlayStreamError),

    #[error("audio device unavailable")]
    Unavailable,
}

/// Lists the names of output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Sink::list()
}

/// Gets a sink for the configured device. Device names starting with "mock"
/// return a recording mock sink.
pub fn get_sink(config: &config::Audio) -> Result<Arc<dyn Sink>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Sink::get(device)));
    };

    Ok(Arc::new(cpal::Sink::open(config)?))
}
