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

//! The concurrent set of currently-sounding voices.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::buffer::SampleBuffer;

/// One playing instance of a pad: the pad's shared sample data plus this
/// play-through's cursor.
pub struct Voice {
    pad: Arc<str>,
    buffer: SampleBuffer,
}

impl Voice {
    fn new(pad: Arc<str>, buffer: SampleBuffer) -> Voice {
        Voice { pad, buffer }
    }

    /// The pad this voice is playing.
    pub fn pad(&self) -> &str {
        &self.pad
    }

    /// Returns the voice's next sample and advances its cursor.
    pub fn next_sample(&mut self) -> u8 {
        self.buffer.next()
    }

    /// True once every sample has been played.
    pub fn is_finished(&self) -> bool {
        !self.buffer.has_next()
    }
}

/// The set of voices currently contributing to the output.
///
/// Triggers arrive from the input thread while the output worker is mixing,
/// so every operation takes the set lock. The mixing worker re-acquires the
/// lock for each output slot rather than holding it across a whole buffer;
/// a trigger landing mid-buffer is audible on the very next slot.
#[derive(Default)]
pub struct VoiceSet {
    active: Mutex<Vec<Voice>>,
}

impl VoiceSet {
    /// Creates an empty voice set.
    pub fn new() -> VoiceSet {
        VoiceSet::default()
    }

    /// Arms a voice for the given pad. A pad that's already sounding is
    /// rewound to its first sample in place; it never gets a second voice.
    pub fn trigger(&self, pad: &str, asset: &SampleBuffer) {
        let mut active = self.active.lock();
        match active.iter_mut().find(|voice| voice.pad() == pad) {
            Some(voice) => voice.buffer.reset(),
            None => active.push(Voice::new(pad.into(), asset.fresh())),
        }
        let voices = active.len();
        drop(active);

        debug!(pad, voices, "Voice armed.");
    }

    /// Runs one output slot's mixing pass. Every active voice is visited
    /// exactly once under the set lock; voices that run out of data during
    /// the pass are removed before the lock is released.
    pub fn slot_pass<F>(&self, mut visit: F)
    where
        F: FnMut(&mut Voice),
    {
        let mut active = self.active.lock();
        active.retain_mut(|voice| {
            visit(voice);
            !voice.is_finished()
        });
    }

    /// Returns the number of currently-sounding voices.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Drops every sounding voice immediately.
    pub fn clear(&self) {
        self.active.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::samples::buffer::PcmFormat;

    fn asset(data: Vec<u8>) -> SampleBuffer {
        SampleBuffer::new(
            data,
            PcmFormat {
                channels: 1,
                bits_per_sample: 8,
                sample_rate: 22050,
            },
            22050,
        )
        .expect("valid format")
    }

    #[test]
    fn test_trigger_inserts_once() {
        let voices = VoiceSet::new();
        let kick = asset(vec![1, 2, 3, 4]);

        voices.trigger("kick", &kick);
        voices.trigger("kick", &kick);
        assert_eq!(voices.active_count(), 1);

        let snare = asset(vec![5, 6]);
        voices.trigger("snare", &snare);
        assert_eq!(voices.active_count(), 2);
    }

    #[test]
    fn test_retrigger_rewinds_in_place() {
        let voices = VoiceSet::new();
        let kick = asset(vec![1, 2, 3, 4]);
        voices.trigger("kick", &kick);

        // Play two slots, then re-trigger: the next slot restarts the pad.
        let mut heard = Vec::new();
        for _ in 0..2 {
            voices.slot_pass(|voice| heard.push(voice.next_sample()));
        }
        assert_eq!(heard, vec![1, 2]);

        voices.trigger("kick", &kick);
        heard.clear();
        voices.slot_pass(|voice| heard.push(voice.next_sample()));
        assert_eq!(heard, vec![1]);
        assert_eq!(voices.active_count(), 1);
    }

    #[test]
    fn test_slot_pass_visits_each_voice_once() {
        let voices = VoiceSet::new();
        voices.trigger("kick", &asset(vec![1, 2]));
        voices.trigger("snare", &asset(vec![3, 4]));

        let mut visited = 0;
        voices.slot_pass(|voice| {
            voice.next_sample();
            visited += 1;
        });
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_exhausted_voices_retire_after_their_last_sample() {
        let voices = VoiceSet::new();
        voices.trigger("blip", &asset(vec![42]));

        let mut heard = Vec::new();
        voices.slot_pass(|voice| heard.push(voice.next_sample()));

        // The final sample still contributed to the slot that consumed it.
        assert_eq!(heard, vec![42]);
        assert_eq!(voices.active_count(), 0);

        heard.clear();
        voices.slot_pass(|voice| heard.push(voice.next_sample()));
        assert!(heard.is_empty());
    }

    #[test]
    fn test_clear() {
        let voices = VoiceSet::new();
        voices.trigger("kick", &asset(vec![1, 2]));
        voices.trigger("snare", &asset(vec![3, 4]));

        voices.clear();
        assert_eq!(voices.active_count(), 0);
    }

    #[test]
    fn test_concurrent_triggers_never_duplicate_a_pad() {
        let voices = Arc::new(VoiceSet::new());
        let kick = asset(vec![0x81; 10_000]);

        let triggers = {
            let voices = Arc::clone(&voices);
            let kick = kick.fresh();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    voices.trigger("kick", &kick);
                }
            })
        };

        for _ in 0..1_000 {
            voices.slot_pass(|voice| {
                voice.next_sample();
            });
        }

        triggers.join().expect("trigger thread");
        assert!(voices.active_count() <= 1);
    }
}
