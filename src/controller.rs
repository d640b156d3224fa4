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

//! Trigger input for the running sampler.

use std::io;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

pub mod keyboard;

/// Events a controller can send to the sampler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Arm the named pad.
    Trigger(String),
    /// Silence every sounding pad.
    Clear,
    /// Stop playback and exit.
    Stop,
}

/// A source of trigger events.
pub trait Driver {
    /// Spawns a worker that forwards events to the given channel until the
    /// input source is exhausted.
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}
