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
use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{info, span, Level};

use super::Event;

const CLEAR: &str = "clear";
const STOP: &str = "stop";

/// A controller that triggers pads from line input.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads one line and forwards the resulting event. Returns false once
    /// input is exhausted and monitoring should stop.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(writer, "Pad name (or {}, {}): ", CLEAR, STOP)?;
        writer.flush()?;

        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            // A closed input is a stop request.
            send(events_tx, Event::Stop)?;
            return Ok(false);
        }

        let input = input.trim();
        if input.is_empty() {
            return Ok(true);
        }

        if input.eq_ignore_ascii_case(CLEAR) {
            send(events_tx, Event::Clear)?;
            return Ok(true);
        }

        if input.eq_ignore_ascii_case(STOP) {
            send(events_tx, Event::Stop)?;
            return Ok(false);
        }

        send(events_tx, Event::Trigger(input.to_string()))?;
        Ok(true)
    }
}

fn send(events_tx: &Sender<Event>, event: Event) -> Result<(), io::Error> {
    events_tx
        .send(event)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        thread::spawn(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard driver stopped.");
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{BufReader, BufWriter};

    use crossbeam_channel::unbounded;

    use super::*;

    fn get_events(input: &str) -> Result<Vec<Event>, io::Error> {
        let (sender, receiver) = unbounded::<Event>();

        let mut reader = BufReader::new(input.as_bytes());
        let writer_bytes: Vec<u8> = vec![0; 255];
        let mut writer = BufWriter::new(writer_bytes);

        while Driver::monitor_io(&sender, &mut reader, &mut writer)? {}

        // Force the sender to close.
        drop(sender);
        Ok(receiver.iter().collect())
    }

    #[test]
    fn test_keyboard_events() -> Result<(), io::Error> {
        assert_eq!(
            get_events("kick\nsnare\n")?,
            vec![
                Event::Trigger("kick".to_string()),
                Event::Trigger("snare".to_string()),
                Event::Stop,
            ]
        );

        // An explicit stop ends monitoring before EOF is reached.
        assert_eq!(
            get_events("kick\nstop\nsnare\n")?,
            vec![Event::Trigger("kick".to_string()), Event::Stop]
        );

        // Clear silences pads but keeps monitoring.
        assert_eq!(
            get_events("clear\nkick\n")?,
            vec![
                Event::Clear,
                Event::Trigger("kick".to_string()),
                Event::Stop,
            ]
        );

        // Blank lines are ignored; EOF alone still stops.
        assert_eq!(get_events("\n\n")?, vec![Event::Stop]);
        assert_eq!(get_events("")?, vec![Event::Stop]);

        Ok(())
    }
}
