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

//! The playback worker that keeps the audio sink fed.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info, span, Level};

use crate::audio::{thread_priority, Sink, SinkError};
use crate::mixer::Mixer;
use crate::playsync::CancelHandle;
use crate::samples::SILENCE;

/// The dedicated worker that repeatedly fills one output buffer from the
/// mixer and hands it to the sink. The sink's blocking write is the only
/// pacing in the loop; the worker never sleeps on its own.
pub struct OutputLoop {
    mixer: Mixer,
    sink: Arc<dyn Sink>,
    buffer_size: usize,
    cancel_handle: CancelHandle,
    finished: Arc<AtomicBool>,
}

impl OutputLoop {
    /// Creates an output loop. `finished` is set (and the cancel handle
    /// notified) when the worker exits for any reason.
    pub fn new(
        mixer: Mixer,
        sink: Arc<dyn Sink>,
        buffer_size: usize,
        cancel_handle: CancelHandle,
        finished: Arc<AtomicBool>,
    ) -> OutputLoop {
        OutputLoop {
            mixer,
            sink,
            buffer_size,
            cancel_handle,
            finished,
        }
    }

    /// Spawns the worker thread. The returned handle yields the sink error
    /// that ended playback, or Ok(()) after a clean cancel.
    pub fn spawn(self) -> io::Result<JoinHandle<Result<(), SinkError>>> {
        thread::Builder::new()
            .name("padmix-output".to_string())
            .spawn(move || self.run())
    }

    fn run(self) -> Result<(), SinkError> {
        let span = span!(Level::INFO, "output loop");
        let _enter = span.enter();

        thread_priority::configure_output_thread_priority();

        let mut buffer = vec![SILENCE; self.buffer_size];
        info!(
            sink = %self.sink,
            buffer_size = self.buffer_size,
            "Output loop started."
        );

        let result = loop {
            if self.cancel_handle.is_cancelled() {
                break self.sink.drain();
            }

            self.mixer.fill(&mut buffer);
            if let Err(e) = self.sink.write(&buffer) {
                error!(err = %e, "Audio sink unavailable.");
                break Err(e);
            }
        };

        // Wake anyone blocked on playback, whether this was a cancel or a
        // dead sink.
        self.finished.store(true, Ordering::Relaxed);
        self.cancel_handle.notify();

        info!("Output loop stopped.");
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::audio::mock;
    use crate::samples::VoiceSet;

    fn spawn_loop(
        sink: &Arc<mock::Sink>,
    ) -> (
        JoinHandle<Result<(), SinkError>>,
        CancelHandle,
        Arc<AtomicBool>,
    ) {
        let voices = Arc::new(VoiceSet::new());
        let cancel_handle = CancelHandle::new();
        let finished = Arc::new(AtomicBool::new(false));
        let output = OutputLoop::new(
            Mixer::new(voices),
            Arc::clone(sink) as Arc<dyn Sink>,
            8,
            cancel_handle.clone(),
            Arc::clone(&finished),
        );
        (output.spawn().expect("spawn worker"), cancel_handle, finished)
    }

    #[test]
    fn test_writes_silence_until_cancelled() {
        let sink = Arc::new(mock::Sink::get("mock"));
        let (worker, cancel_handle, finished) = spawn_loop(&sink);

        thread::sleep(Duration::from_millis(10));
        cancel_handle.cancel();
        assert!(worker.join().expect("join worker").is_ok());
        assert!(finished.load(Ordering::Relaxed));

        let written = sink.written();
        assert!(!written.is_empty());
        for buffer in written {
            assert_eq!(buffer, vec![SILENCE; 8]);
        }
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let sink = Arc::new(mock::Sink::get("mock"));
        sink.fail_after(2);
        let (worker, cancel_handle, finished) = spawn_loop(&sink);

        // The worker dies on the third write without any cancel request.
        let result = worker.join().expect("join worker");
        assert!(matches!(result, Err(SinkError::Unavailable)));
        assert!(finished.load(Ordering::Relaxed));
        assert!(!cancel_handle.is_cancelled());
        assert_eq!(sink.written().len(), 2);
    }
}
