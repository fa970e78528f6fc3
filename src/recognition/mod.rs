//! Wake-word gated command recognition.
//!
//! The engine is split across two tasks. The feed task pushes captured frames
//! into the acoustic front end through an [`AudioFeeder`]; the detect task owns
//! the [`CommandDetector`], pulls processed chunks back out, drives the command
//! classifier while a command is awaited and posts observer notifications and
//! command handlers onto the event loop.

mod engine;
mod error;
mod frontend;
mod observer;
mod registry;

pub use engine::{
    run_feed_task, AudioFeeder, CommandDetector, DetectionEvent, EngineConfig, RecognitionEngine,
    DEFAULT_COMMAND_TIMEOUT_MS,
};
pub use error::RecognitionError;
pub use frontend::{
    AcousticFrontEnd, ClassifierState, CommandClassifier, CommandId, FetchError, ProcessedChunk,
    RankedCommand, WakeState,
};
pub use observer::Observer;
pub use registry::{Command, CommandHandler, CommandRegistry};
