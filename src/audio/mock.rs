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
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
    thread,
    time::Duration,
};

use parking_lot::Mutex;

use super::SinkError;

/// Sample rate used to pace mock writes.
const MOCK_SAMPLE_RATE: u32 = 22050;

/// A mock sink. Doesn't actually play anything, but records every buffer
/// and blocks on write for roughly as long as a real device would take to
/// play it.
#[derive(Clone)]
pub struct Sink {
    name: String,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    remaining_writes: Arc<AtomicUsize>,
}

impl Sink {
    /// Gets the given mock sink.
    pub fn get(name: &str) -> Sink {
        Sink {
            name: name.to_string(),
            written: Arc::new(Mutex::new(Vec::new())),
            remaining_writes: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    /// Returns a copy of every buffer written so far.
    #[cfg(test)]
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().clone()
    }

    /// Makes the sink report itself unavailable after the given number of
    /// further writes.
    #[cfg(test)]
    pub fn fail_after(&self, writes: usize) {
        self.remaining_writes.store(writes, Ordering::Relaxed);
    }
}

impl super::Sink for Sink {
    fn write(&self, buffer: &[u8]) -> Result<(), SinkError> {
        let remaining = self.remaining_writes.load(Ordering::Relaxed);
        if remaining == 0 {
            return Err(SinkError::Unavailable);
        }
        if remaining != usize::MAX {
            self.remaining_writes.store(remaining - 1, Ordering::Relaxed);
        }

        self.written.lock().push(buffer.to_vec());

        // Emulate device pacing.
        thread::sleep(Duration::from_secs_f64(
            buffer.len() as f64 / f64::from(MOCK_SAMPLE_RATE),
        ));
        Ok(())
    }

    fn drain(&self) -> Result<(), SinkError> {
        Ok(())
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Sink>, Box<dyn std::error::Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
