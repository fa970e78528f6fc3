pub mod audio;
pub mod config;
pub mod event_loop;
mod lock;
pub mod recognition;
pub mod satellite;
pub mod sim;
pub mod task;
pub mod telemetry;

pub(crate) use lock::lock_or_recover;
pub use event_loop::{EventLoop, EventLoopStats, EventPoster};
pub use recognition::{
    AudioFeeder, CommandDetector, CommandId, DetectionEvent, EngineConfig, Observer,
    RecognitionEngine, RecognitionError,
};
