use super::{
    AcousticFrontEnd, ClassifierState, Command, CommandClassifier, CommandId, CommandRegistry,
    FetchError, Observer, RankedCommand, RecognitionError, WakeState,
};
use crate::audio::{AudioCapture, AudioFormat, AudioFrame};
use crate::event_loop::EventPoster;
use anyhow::{bail, Result};
use std::iter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 3000;

const CAPTURE_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Audio layout and timing the engine is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub mic_channels: u32,
    /// Playback loopback channels used for echo cancellation.
    pub reference_channels: u32,
    pub bits_per_sample: u32,
    pub sample_rate: u32,
    pub command_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mic_channels: 2,
            reference_channels: 1,
            bits_per_sample: 16,
            sample_rate: 16_000,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Format of every frame fed to the front end: microphones then references.
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::new(
            self.mic_channels + self.reference_channels,
            self.bits_per_sample,
            self.sample_rate,
        )
    }

    /// Format a microphone-only capture backend delivers.
    pub fn capture_format(&self) -> AudioFormat {
        AudioFormat::new(self.mic_channels, self.bits_per_sample, self.sample_rate)
    }
}

/// What one detect step observed. Returned for logging and tests only.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    WakeWordDetected,
    CommandChannelVerified {
        channel: Option<usize>,
    },
    CommandNotDetected,
    CommandDetected {
        command_id: CommandId,
        probability: f32,
        alternatives: Vec<RankedCommand>,
    },
}

/// Owns the capabilities and the command table until detection starts.
pub struct RecognitionEngine {
    config: EngineConfig,
    front_end: Arc<dyn AcousticFrontEnd>,
    classifier: Box<dyn CommandClassifier>,
    registry: CommandRegistry,
    poster: EventPoster,
    observer: Arc<dyn Observer>,
}

impl RecognitionEngine {
    pub fn new(
        config: EngineConfig,
        front_end: Arc<dyn AcousticFrontEnd>,
        classifier: Box<dyn CommandClassifier>,
        poster: EventPoster,
        observer: Arc<dyn Observer>,
    ) -> Self {
        tracing::info!(
            format = %config.audio_format(),
            feed_chunk = front_end.feed_chunk_size(),
            fetch_chunk = front_end.fetch_chunk_size(),
            command_timeout_ms = config.command_timeout_ms,
            "recognition engine created"
        );
        Self {
            config,
            front_end,
            classifier,
            registry: CommandRegistry::new(),
            poster,
            observer,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Open a registration session, clearing the classifier's phrase table.
    pub fn begin_add_commands(&mut self) -> Result<(), RecognitionError> {
        self.registry.begin()?;
        self.classifier.reset_phrases()?;
        tracing::info!("adding commands");
        Ok(())
    }

    /// Register a command under the next sequential id and return that id.
    ///
    /// `message` defaults to the first phrase.
    pub fn add_command<I, S, F>(
        &mut self,
        phrases: I,
        handler: F,
        message: Option<&str>,
    ) -> Result<CommandId, RecognitionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn() + Send + Sync + 'static,
    {
        self.registry.ensure_open()?;
        let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
        let command = self.registry.push(phrases, Box::new(handler), message)?;
        for phrase in command.phrases() {
            self.classifier.add_phrase(command.id(), phrase)?;
        }
        tracing::debug!(
            command_id = command.id(),
            message = command.message(),
            phrases = ?command.phrases(),
            "command registered"
        );
        Ok(command.id())
    }

    /// Compile the phrase table and close registration for good.
    pub fn end_add_commands(&mut self) -> Result<(), RecognitionError> {
        self.registry.ensure_open()?;
        self.classifier.update_phrases()?;
        self.registry.finalize()?;
        for command in self.registry.iter() {
            tracing::info!(command_id = command.id(), phrases = ?command.phrases(), "phrase table entry");
        }
        tracing::info!(commands = self.registry.len(), "command registration finished");
        Ok(())
    }

    /// Handle for the feed task; usable while the detector runs elsewhere.
    pub fn feeder(&self) -> AudioFeeder {
        AudioFeeder {
            front_end: self.front_end.clone(),
            format: self.config.audio_format(),
            chunk_samples: self.front_end.feed_chunk_size(),
        }
    }

    /// Consume the engine into the detect-task state machine.
    pub fn into_detector(self) -> Result<CommandDetector, RecognitionError> {
        if !self.registry.is_finalized() {
            return Err(RecognitionError::RegistrationPending);
        }
        let front_end = self.front_end.fetch_chunk_size();
        let classifier = self.classifier.chunk_size();
        if front_end != classifier {
            return Err(RecognitionError::ChunkSizeMismatch {
                front_end,
                classifier,
            });
        }
        Ok(CommandDetector {
            front_end: self.front_end,
            classifier: self.classifier,
            registry: self.registry,
            poster: self.poster,
            observer: self.observer,
            awaiting_command: false,
            glitches: 0,
        })
    }
}

/// Pushes captured frames into the front end.
#[derive(Clone)]
pub struct AudioFeeder {
    front_end: Arc<dyn AcousticFrontEnd>,
    format: AudioFormat,
    chunk_samples: usize,
}

impl AudioFeeder {
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn chunk_samples(&self) -> usize {
        self.chunk_samples
    }

    /// Hand one frame to the front end; may block on backpressure.
    ///
    /// # Panics
    /// If the frame's format or length differs from what the front end expects.
    pub fn feed(&self, frame: &AudioFrame) {
        assert_eq!(
            frame.format(),
            self.format,
            "fed frame format {} does not match engine format {}",
            frame.format(),
            self.format
        );
        assert_eq!(
            frame.num_samples(),
            self.chunk_samples,
            "fed frame holds {} samples, front end expects {}",
            frame.num_samples(),
            self.chunk_samples
        );
        self.front_end.feed(frame);
    }
}

/// Feed-task body: capture, pad reference channels, feed, repeat.
///
/// A backend may deliver either the full engine format or microphone channels
/// only; in the latter case silent reference channels are appended. Capture
/// failures are logged and retried. Returns once `stop` is raised.
pub fn run_feed_task(
    feeder: &AudioFeeder,
    capture: &mut dyn AudioCapture,
    stop: Option<&AtomicBool>,
) -> Result<()> {
    let source = capture.format();
    let target = feeder.format();
    let padding = if source == target {
        0
    } else if source.channel_count < target.channel_count
        && source.with_channels(target.channel_count) == target
    {
        target.channel_count - source.channel_count
    } else {
        bail!(
            "{} capture delivers {source}, which cannot be padded to engine format {target}",
            capture.name()
        );
    };
    tracing::info!(
        backend = capture.name(),
        capture_format = %source,
        padding,
        chunk_samples = feeder.chunk_samples(),
        "feed task started"
    );

    let mut captured = AudioFrame::new(source, feeder.chunk_samples());
    let mut failures: u64 = 0;
    while !stop.is_some_and(|flag| flag.load(Ordering::Acquire)) {
        if let Err(err) = capture.capture(&mut captured) {
            failures += 1;
            tracing::warn!(error = %format!("{err:#}"), failures, "audio capture failed; retrying");
            thread::sleep(CAPTURE_RETRY_DELAY);
            continue;
        }
        if padding == 0 {
            feeder.feed(&captured);
        } else {
            let mut padded = captured.clone();
            padded.add_channels(padding);
            feeder.feed(&padded);
        }
    }
    tracing::info!(failures, "feed task stopped");
    Ok(())
}

/// Detect-task state machine.
///
/// `awaiting_command` is true exactly while the wake-word detector is
/// disabled: between a verified trigger channel and the classifier's next
/// terminal result.
pub struct CommandDetector {
    front_end: Arc<dyn AcousticFrontEnd>,
    classifier: Box<dyn CommandClassifier>,
    registry: CommandRegistry,
    poster: EventPoster,
    observer: Arc<dyn Observer>,
    awaiting_command: bool,
    glitches: u64,
}

impl CommandDetector {
    pub fn is_awaiting_command(&self) -> bool {
        self.awaiting_command
    }

    /// Front-end malfunctions seen so far.
    pub fn glitches(&self) -> u64 {
        self.glitches
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Fetch and process one chunk.
    ///
    /// A fetch failure is returned untouched; the caller just tries again.
    pub fn step(&mut self) -> Result<Vec<DetectionEvent>, FetchError> {
        let chunk = match self.front_end.fetch() {
            Ok(chunk) => chunk,
            Err(err) => {
                if let FetchError::Malfunction(reason) = &err {
                    self.glitches += 1;
                    tracing::warn!(%reason, glitches = self.glitches, "front end fetch failed");
                }
                return Err(err);
            }
        };

        let mut events = Vec::new();
        match chunk.wake_state {
            WakeState::NoDetect => {}
            WakeState::Detected => {
                tracing::info!(sequence = chunk.sequence, "wake word detected");
                let observer = self.observer.clone();
                self.poster.post(move || observer.on_waiting_for_command());
                events.push(DetectionEvent::WakeWordDetected);
            }
            WakeState::ChannelVerified => {
                self.awaiting_command = true;
                self.front_end.disable_wakenet();
                tracing::info!(channel = ?chunk.trigger_channel, "channel verified");
                events.push(DetectionEvent::CommandChannelVerified {
                    channel: chunk.trigger_channel,
                });
            }
        }

        if !self.awaiting_command {
            return Ok(events);
        }

        match self.classifier.detect(&chunk) {
            ClassifierState::Detecting => {}
            ClassifierState::Timeout => {
                tracing::warn!("command timeout");
                let observer = self.observer.clone();
                self.poster.post(move || observer.on_command_not_detected());
                self.finish_command();
                events.push(DetectionEvent::CommandNotDetected);
            }
            ClassifierState::Detected { best, alternatives } => {
                for (rank, ranked) in iter::once(&best).chain(&alternatives).enumerate() {
                    tracing::info!(
                        rank = rank + 1,
                        command_id = ranked.command_id,
                        phrase_id = ranked.phrase_id,
                        probability = ranked.probability,
                        "classifier result"
                    );
                }
                let command = self.lookup(best.command_id);
                let observer = self.observer.clone();
                self.poster.post(move || {
                    tracing::info!(command_id = command.id(), message = command.message(), "handling command");
                    observer.on_command_handling_started(command.message());
                    command.handle();
                    observer.on_command_handling_finished();
                });
                self.finish_command();
                events.push(DetectionEvent::CommandDetected {
                    command_id: best.command_id,
                    probability: best.probability,
                    alternatives,
                });
            }
        }
        Ok(events)
    }

    /// Step until `stop` is raised; forever without one.
    pub fn run(&mut self, stop: Option<&AtomicBool>) {
        tracing::info!(commands = self.registry.len(), "detect task started");
        while !stop.is_some_and(|flag| flag.load(Ordering::Acquire)) {
            // Failures are logged in `step`.
            let _ = self.step();
        }
        tracing::info!(glitches = self.glitches, "detect task stopped");
    }

    fn lookup(&self, id: CommandId) -> Arc<Command> {
        match self.registry.get(id) {
            Some(command) => command.clone(),
            None => panic!(
                "classifier reported command {id} but only {} commands are registered",
                self.registry.len()
            ),
        }
    }

    fn finish_command(&mut self) {
        self.front_end.enable_wakenet();
        self.awaiting_command = false;
    }
}
