//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use crate::audio::DEFAULT_CUE_VOLUME;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use defaults::*;

/// CLI options for the Nossat satellite. Validated values keep the tasks'
/// buffers and timers within sane bounds.
#[derive(Debug, Parser, Clone)]
#[command(about = "Nossat voice command satellite", author, version)]
pub struct AppConfig {
    /// Where microphone audio comes from
    #[arg(long, value_enum, default_value_t = CaptureSource::Silence)]
    pub capture: CaptureSource,

    /// WAV recording replayed in a loop with `--capture wav`
    #[arg(long = "capture-wav", value_name = "PATH")]
    pub capture_wav: Option<PathBuf>,

    /// Preferred audio input device name
    #[arg(long, env = "NOSSAT_INPUT_DEVICE")]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Microphone channels delivered by the capture backend
    #[arg(long = "mic-channels", default_value_t = DEFAULT_MIC_CHANNELS)]
    pub mic_channels: u32,

    /// Playback reference channels appended for echo cancellation
    #[arg(long = "reference-channels", default_value_t = DEFAULT_REFERENCE_CHANNELS)]
    pub reference_channels: u32,

    /// Capture sample rate (Hz)
    #[arg(long = "sample-rate", default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Capture sample width (bits)
    #[arg(long = "bits-per-sample", default_value_t = DEFAULT_BITS_PER_SAMPLE)]
    pub bits_per_sample: u32,

    /// Samples per channel in each fed and fetched chunk
    #[arg(long = "chunk-samples", default_value_t = DEFAULT_CHUNK_SAMPLES)]
    pub chunk_samples: usize,

    /// Chunks the front end buffers between the feed and detect tasks
    #[arg(long = "front-end-ring-chunks", default_value_t = DEFAULT_FRONT_END_RING_CHUNKS)]
    pub front_end_ring_chunks: usize,

    /// Listening window after the wake word before giving up (milliseconds)
    #[arg(long = "command-timeout-ms", default_value_t = DEFAULT_COMMAND_TIMEOUT_MS)]
    pub command_timeout_ms: u64,

    /// Entries the event queue holds before posters block
    #[arg(long = "event-queue-capacity", default_value_t = DEFAULT_EVENT_QUEUE_CAPACITY)]
    pub event_queue_capacity: usize,

    /// Idle wake-up interval of the event task (milliseconds)
    #[arg(long = "event-wait-ms", default_value_t = DEFAULT_EVENT_WAIT_MS)]
    pub event_wait_ms: u64,

    /// How long timeout and success feedback stays up (milliseconds)
    #[arg(long = "feedback-hold-ms", default_value_t = DEFAULT_FEEDBACK_HOLD_MS)]
    pub feedback_hold_ms: u64,

    /// YAML command set; the built-in set is used when omitted
    #[arg(long, value_name = "PATH", env = "NOSSAT_COMMANDS")]
    pub commands: Option<PathBuf>,

    /// YAML or JSON scenario replayed by the scripted front end
    #[arg(long, value_name = "PATH")]
    pub scenario: Option<PathBuf>,

    /// Directory holding wake.wav, recognized.wav and not_recognized.wav
    #[arg(long = "cue-dir", value_name = "DIR", env = "NOSSAT_CUE_DIR")]
    pub cue_dir: Option<PathBuf>,

    /// Playback gain applied to sound cues
    #[arg(long = "cue-volume", default_value_t = DEFAULT_CUE_VOLUME)]
    pub cue_volume: f32,

    /// Shut down once every scenario step has been replayed
    #[arg(long = "exit-when-idle", default_value_t = false)]
    pub exit_when_idle: bool,

    /// Run capture backends as fast as the pipeline accepts audio
    #[arg(long = "no-realtime", default_value_t = false)]
    pub no_realtime: bool,

    /// Log filter directive (e.g. `info`, `nossat=debug`)
    #[arg(long = "log-level", env = "NOSSAT_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Write JSON logs to the trace file instead of stderr
    #[arg(long = "log-json", env = "NOSSAT_LOG_JSON", default_value_t = false)]
    pub log_json: bool,

    /// Disable all logging (overrides the other log flags)
    #[arg(long = "no-logs", env = "NOSSAT_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

/// Host stand-ins for the board's microphone array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaptureSource {
    Silence,
    Wav,
    Mic,
}

impl CaptureSource {
    pub fn label(self) -> &'static str {
        match self {
            CaptureSource::Silence => "silence",
            CaptureSource::Wav => "wav",
            CaptureSource::Mic => "mic",
        }
    }
}
