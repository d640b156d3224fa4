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

//! The running sampler: loaded pads, the live voice set, and playback.

use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::audio::{Sink, SinkError};
use crate::config::Board;
use crate::mixer::Mixer;
use crate::output::OutputLoop;
use crate::playsync::CancelHandle;
use crate::samples::{SampleBuffer, SampleLoader, VoiceSet};

/// The engine owns the fixed pad table and the output worker. Pads are
/// loaded once at startup; triggering is lock-per-call and never allocates
/// sample data.
pub struct Engine {
    /// Loaded pads by name. The buffers here are never played directly; each
    /// trigger arms a voice with its own cursor over the shared data.
    pads: HashMap<String, SampleBuffer>,
    voices: Arc<VoiceSet>,
    cancel_handle: CancelHandle,
    finished: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<Result<(), SinkError>>>>,
}

impl Engine {
    /// Loads every pad on the board and starts the output worker. A pad that
    /// can't be read or isn't in the engine's required format aborts startup.
    pub fn start(board: &Board, sink: Arc<dyn Sink>) -> Result<Engine, Box<dyn Error>> {
        let audio = board.audio();
        let loader = SampleLoader::new(audio.sample_rate());

        let mut pads = HashMap::new();
        for (name, file) in board.pads() {
            let buffer = loader.load(&board.resolve(file))?;
            pads.insert(name.clone(), buffer);
        }

        info!(
            pads = pads.len(),
            sample_rate = audio.sample_rate(),
            buffer_size = audio.buffer_size(),
            memory_kb = pads.values().map(|pad| pad.len()).sum::<usize>() / 1024,
            "Board loaded."
        );

        let voices = Arc::new(VoiceSet::new());
        let cancel_handle = CancelHandle::new();
        let finished = Arc::new(AtomicBool::new(false));

        let worker = OutputLoop::new(
            Mixer::new(Arc::clone(&voices)),
            sink,
            audio.buffer_size(),
            cancel_handle.clone(),
            Arc::clone(&finished),
        )
        .spawn()?;

        Ok(Engine {
            pads,
            voices,
            cancel_handle,
            finished,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Arms the named pad, restarting it if it's already sounding. Unknown
    /// pads are ignored with a warning.
    pub fn trigger(&self, pad: &str) {
        match self.pads.get(pad) {
            Some(asset) => self.voices.trigger(pad, asset),
            None => warn!(pad, "Unknown pad."),
        }
    }

    /// Drops every sounding voice without stopping playback.
    pub fn stop_all(&self) {
        self.voices.clear();
    }

    /// Returns the number of currently-sounding voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.active_count()
    }

    /// Blocks until playback ends: either a shutdown request or a sink
    /// failure.
    pub fn wait(&self) {
        self.cancel_handle.wait(Arc::clone(&self.finished));
    }

    /// Requests shutdown without waiting for the worker.
    pub fn request_stop(&self) {
        self.cancel_handle.cancel();
    }

    /// Stops the output worker, drains the sink, and surfaces any sink
    /// failure that ended playback early. Idempotent.
    pub fn shutdown(&self) -> Result<(), Box<dyn Error>> {
        self.cancel_handle.cancel();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.join().map_err(|_| "output worker panicked")??;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pads", &self.pads.len())
            .field("active_voices", &self.active_voice_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::thread;
    use std::time::{Duration, Instant};

    use hound::{SampleFormat, WavSpec, WavWriter};

    use super::*;
    use crate::audio;
    use crate::config::Audio;

    fn write_pad(dir: &Path, name: &str, samples: &[i8]) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(dir.join(name), spec).expect("create wav");
        for sample in samples {
            writer.write_sample(*sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    fn mock_board(dir: &Path, pads: &[(&str, &str)]) -> Board {
        Board::new(
            Audio::new("mock", Some(16)),
            pads.iter()
                .map(|(name, file)| (name.to_string(), file.to_string()))
                .collect::<HashMap<String, String>>(),
            dir.to_path_buf(),
        )
    }

    #[test]
    fn test_triggered_pad_reaches_the_sink() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_pad(dir.path(), "kick.wav", &[10, 10, -10, -10]);
        let board = mock_board(dir.path(), &[("kick", "kick.wav")]);

        let sink = audio::get_sink(board.audio()).expect("mock sink");
        let mock = sink.to_mock().expect("mock sink");
        let engine = Engine::start(&board, sink).expect("engine start");

        engine.trigger("kick");

        // Wait for the pad to play through, then stop.
        let deadline = Instant::now() + Duration::from_secs(1);
        while engine.active_voice_count() > 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(engine.active_voice_count(), 0);
        engine.shutdown().expect("clean shutdown");

        let stream: Vec<u8> = mock.written().concat();
        assert!(stream
            .windows(4)
            .any(|window| window == [138, 138, 118, 118]));
    }

    #[test]
    fn test_unknown_pad_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = mock_board(dir.path(), &[]);

        let sink = audio::get_sink(board.audio()).expect("mock sink");
        let engine = Engine::start(&board, sink).expect("engine start");

        engine.trigger("nope");
        assert_eq!(engine.active_voice_count(), 0);
        engine.shutdown().expect("clean shutdown");
    }

    #[test]
    fn test_bad_pad_format_aborts_startup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let mut writer =
            WavWriter::create(dir.path().join("fast.wav"), spec).expect("create wav");
        writer.write_sample(0i8).expect("write sample");
        writer.finalize().expect("finalize wav");

        let board = mock_board(dir.path(), &[("fast", "fast.wav")]);
        let sink = audio::get_sink(board.audio()).expect("mock sink");
        assert!(Engine::start(&board, sink).is_err());
    }

    #[test]
    fn test_sink_failure_surfaces_through_shutdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let board = mock_board(dir.path(), &[]);

        let sink = audio::get_sink(board.audio()).expect("mock sink");
        let mock = sink.to_mock().expect("mock sink");
        mock.fail_after(3);

        let engine = Engine::start(&board, sink).expect("engine start");

        // The engine notices the dead sink without any stop request.
        engine.wait();
        let result = engine.shutdown();
        assert!(result
            .expect_err("sink failure")
            .downcast_ref::<SinkError>()
            .is_some());
    }
}
