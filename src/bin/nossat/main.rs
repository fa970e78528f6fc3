//! Nossat satellite entrypoint.
//!
//! Wires the recognition engine to a capture backend and starts the three
//! long-lived tasks:
//!
//! - Events: runs posted callbacks, observer feedback and command handlers
//! - Detect: fetches processed audio and drives the command state machine
//! - Feed: reads capture frames and pushes them into the front end
//!
//! Observer feedback and published command events go to stdout as JSON lines;
//! logs go to stderr or the trace file.

mod cli_utils;

use anyhow::{Context, Result};
use nossat::audio::SoundCues;
use nossat::config::AppConfig;
use nossat::satellite::{
    open_capture, register_commands, CommandSet, ConsoleObserver, JsonLinePublisher, JsonLines,
    Satellite,
};
use nossat::sim::{Scenario, ScriptedClassifier, ScriptedFrontEnd};
use nossat::telemetry::init_tracing;
use nossat::{EventLoop, RecognitionEngine};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cli_utils::list_input_devices;

const IDLE_POLL: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_tracing(&config);

    if config.list_input_devices {
        return list_input_devices();
    }

    let commands = match &config.commands {
        Some(path) => CommandSet::load(path)?,
        None => CommandSet::default_set(),
    };
    let scenario = match &config.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let cues = config
        .cue_dir
        .as_deref()
        .map(|dir| SoundCues::load(dir, config.cue_volume))
        .transpose()
        .context("failed to load sound cues")?;

    let out = JsonLines::stdout();
    let observer = Arc::new(ConsoleObserver::new(
        out.clone(),
        cues,
        config.feedback_hold(),
    ));
    let publisher = Arc::new(JsonLinePublisher::new(out));
    let events = EventLoop::with_wait(config.event_queue_capacity, config.event_wait());

    let engine_config = config.engine_config();
    let front_end = Arc::new(ScriptedFrontEnd::new(
        &scenario,
        engine_config.audio_format(),
        config.chunk_samples,
        config.front_end_ring_chunks,
    ));
    let classifier = ScriptedClassifier::new(
        &scenario,
        config.chunk_samples,
        engine_config.sample_rate,
        engine_config.command_timeout_ms,
    );
    let mut engine = RecognitionEngine::new(
        engine_config,
        front_end.clone(),
        Box::new(classifier),
        events.poster(),
        observer,
    );
    register_commands(&mut engine, &commands, publisher)?;

    let capture = open_capture(&config)?;
    let mut satellite = Satellite::start(engine, events, capture)?;

    if config.exit_when_idle {
        while !front_end.is_exhausted() {
            thread::sleep(IDLE_POLL);
        }
        tracing::info!(chunks = front_end.fetched(), "scenario finished");
        satellite.shutdown();
    } else {
        satellite.wait();
    }
    Ok(())
}
