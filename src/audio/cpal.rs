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

//! cpal-backed audio output.

use std::{
    error::Error,
    fmt,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{error, info};

use super::SinkError;
use crate::config;
use crate::samples::SILENCE;

/// Number of buffers that may sit between the output loop and the stream
/// callback. Writes block once the queue is full, which is the device-paced
/// backpressure the output loop relies on.
const QUEUE_DEPTH: usize = 2;

/// How long a write may sit on a full queue before the device is declared
/// gone. The callback drains the queue every period, so hitting this means
/// the stream has stopped consuming.
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// A cpal output device playing unsigned 8-bit mono buffers.
///
/// The stream itself lives on a dedicated thread (cpal streams don't move
/// between threads); buffers reach its callback through a small bounded
/// queue, and the mono signal is duplicated across the device's channels.
pub struct Sink {
    name: String,
    buffer_tx: Sender<Vec<u8>>,
    failed: Arc<AtomicBool>,
    buffer_period: Duration,
    /// Dropping this wakes the stream thread, which drops the stream.
    _quit_tx: Sender<()>,
}

impl Sink {
    /// Opens the configured output device at the board's sample rate.
    pub fn open(config: &config::Audio) -> Result<Sink, SinkError> {
        let device_name = config.device().to_string();
        let sample_rate = config.sample_rate();
        let buffer_size = config.buffer_size();

        let (buffer_tx, buffer_rx) = bounded::<Vec<u8>>(QUEUE_DEPTH);
        let (quit_tx, quit_rx) = bounded::<()>(0);
        let (ready_tx, ready_rx) = bounded::<Result<(), SinkError>>(1);
        let failed = Arc::new(AtomicBool::new(false));

        {
            let failed = Arc::clone(&failed);
            let device_name = device_name.clone();
            thread::spawn(move || {
                stream_thread(device_name, sample_rate, buffer_rx, quit_rx, ready_tx, failed)
            });
        }

        ready_rx.recv().map_err(|_| SinkError::Unavailable)??;

        info!(device = device_name, sample_rate, "Audio sink opened.");

        Ok(Sink {
            name: device_name,
            buffer_tx,
            failed,
            buffer_period: Duration::from_secs_f64(buffer_size as f64 / f64::from(sample_rate)),
            _quit_tx: quit_tx,
        })
    }

    /// Lists the names of devices with at least one output configuration.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        let mut names: Vec<String> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let has_output = device
                    .supported_output_configs()
                    .map(|mut configs| configs.next().is_some())
                    .unwrap_or(false);
                if has_output {
                    names.push(device.name()?);
                }
            }
        }

        Ok(names)
    }
}

impl super::Sink for Sink {
    fn write(&self, buffer: &[u8]) -> Result<(), SinkError> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(SinkError::Unavailable);
        }

        self.buffer_tx
            .send_timeout(buffer.to_vec(), WRITE_TIMEOUT)
            .map_err(|_| SinkError::Unavailable)
    }

    fn drain(&self) -> Result<(), SinkError> {
        // Queued buffers drain at device pace; wait them out plus one period
        // for the buffer the callback is currently playing.
        while !self.buffer_tx.is_empty() {
            if self.failed.load(Ordering::Relaxed) {
                return Err(SinkError::Unavailable);
            }
            thread::sleep(self.buffer_period);
        }
        thread::sleep(self.buffer_period);
        Ok(())
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<super::mock::Sink>, Box<dyn Error>> {
        Err("not a mock sink".into())
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (cpal)", self.name)
    }
}

/// Builds and holds the cpal stream until the sink is dropped. Streams
/// aren't Send, so the whole lifecycle stays on this thread.
fn stream_thread(
    device_name: String,
    sample_rate: u32,
    buffer_rx: Receiver<Vec<u8>>,
    quit_rx: Receiver<()>,
    ready_tx: Sender<Result<(), SinkError>>,
    failed: Arc<AtomicBool>,
) {
    let stream = match build_stream(&device_name, sample_rate, buffer_rx, failed) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.into()));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    // Blocks until the sink drops its end of the channel.
    let _ = quit_rx.recv();
}

fn build_stream(
    device_name: &str,
    sample_rate: u32,
    buffer_rx: Receiver<Vec<u8>>,
    failed: Arc<AtomicBool>,
) -> Result<cpal::Stream, SinkError> {
    let host = cpal::default_host();
    let device = if device_name == "default" {
        host.default_output_device()
            .ok_or_else(|| SinkError::NoDevice(device_name.to_string()))?
    } else {
        host.output_devices()?
            .find(|device| {
                device
                    .name()
                    .map(|name| name == device_name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| SinkError::NoDevice(device_name.to_string()))?
    };

    let channels = device.default_output_config()?.channels();
    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let mut callback = output_callback(channels, buffer_rx);
    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback(data),
        move |err| {
            error!(err = %err, "Output stream error.");
            failed.store(true, Ordering::Relaxed);
        },
        None,
    )?;

    Ok(stream)
}

/// Builds the stream data callback: pulls queued buffers, converts the
/// unsigned 8-bit samples to f32, and duplicates the mono signal across the
/// device's channels. Underruns play silence.
fn output_callback(channels: u16, buffer_rx: Receiver<Vec<u8>>) -> impl FnMut(&mut [f32]) {
    let mut current: Vec<u8> = Vec::new();
    let mut position = 0usize;

    move |data: &mut [f32]| {
        for frame in data.chunks_mut(usize::from(channels)) {
            if position >= current.len() {
                if let Ok(next) = buffer_rx.try_recv() {
                    current = next;
                    position = 0;
                }
            }

            let sample = if position < current.len() {
                let sample = current[position];
                position += 1;
                sample
            } else {
                SILENCE
            };

            let value = (f32::from(sample) - 128.0) / 128.0;
            for out in frame.iter_mut() {
                *out = value;
            }
        }
    }
}
