//! Capabilities the engine drives but does not implement.
//!
//! The acoustic front end (echo cancellation, noise suppression, wake-word
//! detection) and the command classifier are speech-model services. The engine
//! only relies on the contracts below.

use super::RecognitionError;
use crate::audio::AudioFrame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a registered command, assigned in registration order from 0.
pub type CommandId = usize;

/// Wake-word detector verdict attached to each processed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeState {
    #[default]
    NoDetect,
    /// The wake word was heard on some channel.
    Detected,
    /// The front end settled on the channel that carried the wake word.
    ChannelVerified,
}

/// One chunk of enhanced mono audio produced by the front end.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessedChunk {
    pub sequence: u64,
    pub samples: Vec<i16>,
    pub wake_state: WakeState,
    /// Set alongside [`WakeState::ChannelVerified`].
    pub trigger_channel: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no processed audio available yet")]
    NotReady,
    #[error("front end malfunction: {0}")]
    Malfunction(String),
}

/// One entry of the classifier's ranked result list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCommand {
    pub command_id: CommandId,
    pub phrase_id: usize,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierState {
    Detecting,
    Timeout,
    /// `best` is rank 0; `alternatives` continue the ranking.
    Detected {
        best: RankedCommand,
        alternatives: Vec<RankedCommand>,
    },
}

/// Streaming acoustic front end with an integrated wake-word detector.
///
/// `feed` and `fetch` are called from different tasks concurrently; the
/// implementation owns whatever buffering sits between them.
pub trait AcousticFrontEnd: Send + Sync {
    /// Samples per channel each fed frame must hold.
    fn feed_chunk_size(&self) -> usize;

    /// Samples in each processed chunk returned by `fetch`.
    fn fetch_chunk_size(&self) -> usize;

    /// May block while the internal buffer is full.
    fn feed(&self, frame: &AudioFrame);

    /// Blocks until a processed chunk is available or reports a glitch.
    fn fetch(&self) -> Result<ProcessedChunk, FetchError>;

    fn enable_wakenet(&self);

    fn disable_wakenet(&self);
}

/// Phrase classifier that recognises one of a registered set of commands.
pub trait CommandClassifier: Send {
    /// Must equal the front end's fetch chunk size.
    fn chunk_size(&self) -> usize;

    /// Drop every registered phrase.
    fn reset_phrases(&mut self) -> Result<(), RecognitionError>;

    fn add_phrase(&mut self, id: CommandId, phrase: &str) -> Result<(), RecognitionError>;

    /// Compile the phrases added since the last reset.
    fn update_phrases(&mut self) -> Result<(), RecognitionError>;

    /// Consume one chunk; a terminal state resets the classifier's own timer.
    fn detect(&mut self, chunk: &ProcessedChunk) -> ClassifierState;
}
