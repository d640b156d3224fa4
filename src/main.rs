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
mod audio;
mod config;
mod controller;
mod engine;
mod mixer;
mod output;
mod playsync;
mod samples;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use clap::{crate_version, Parser, Subcommand};

use crate::controller::{Driver, Event};
use crate::engine::Engine;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A pad-triggered additive sampler."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Loads a board and verifies every pad sample.
    Check {
        /// The path to the board file.
        board_path: String,
    },
    /// Starts the sampler with the given board.
    Start {
        /// The path to the board file.
        board_path: String,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Check { board_path } => {
            let board = config::Board::from_file(Path::new(&board_path))?;
            let loader = samples::SampleLoader::new(board.audio().sample_rate());

            let mut pads: Vec<(&String, &String)> = board.pads().iter().collect();
            pads.sort();

            println!("Pads (count: {}):", pads.len());
            for (name, file) in pads {
                let buffer = loader.load(&board.resolve(file))?;
                println!("- {} ({}, {} samples)", name, file, buffer.len());
            }
        }
        Commands::Start { board_path } => {
            let board = config::Board::from_file(Path::new(&board_path))?;
            let sink = audio::get_sink(board.audio())?;
            let engine = Arc::new(Engine::start(&board, sink)?);

            let (events_tx, events_rx) = crossbeam_channel::unbounded();
            let keyboard = controller::keyboard::Driver::new();
            let _monitor = keyboard.monitor_events(events_tx);

            {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for event in events_rx {
                        match event {
                            Event::Trigger(pad) => engine.trigger(&pad),
                            Event::Clear => engine.stop_all(),
                            Event::Stop => {
                                engine.request_stop();
                                break;
                            }
                        }
                    }
                });
            }

            engine.wait();
            engine.shutdown()?;
        }
    }

    Ok(())
}
