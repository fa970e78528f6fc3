use super::{Scenario, ScenarioStep};
use crate::audio::{AudioFormat, AudioFrame};
use crate::recognition::{AcousticFrontEnd, FetchError, ProcessedChunk, WakeState};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Chunks the front end buffers between feed and fetch.
pub const DEFAULT_RING_CHUNKS: usize = 50;

const DEFAULT_FETCH_WAIT: Duration = Duration::from_millis(50);

/// Front end that passes the first microphone channel through unchanged and
/// reports wake-word states from a scenario.
///
/// Feeding blocks once `ring_chunks` chunks are waiting, which is the
/// backpressure the feed task sees from a real front end. Scripted wake
/// states are suppressed while the wake-word detector is disabled.
pub struct ScriptedFrontEnd {
    steps: Vec<ScenarioStep>,
    format: AudioFormat,
    chunk_samples: usize,
    ring_tx: Sender<Vec<i16>>,
    ring_rx: Receiver<Vec<i16>>,
    fetch_wait: Duration,
    sequence: AtomicU64,
    wakenet: AtomicBool,
    exhausted: AtomicBool,
}

impl ScriptedFrontEnd {
    pub fn new(scenario: &Scenario, format: AudioFormat, chunk_samples: usize, ring_chunks: usize) -> Self {
        let steps = scenario.expanded();
        let (ring_tx, ring_rx) = bounded(ring_chunks.max(1));
        Self {
            exhausted: AtomicBool::new(steps.is_empty()),
            steps,
            format,
            chunk_samples,
            ring_tx,
            ring_rx,
            fetch_wait: DEFAULT_FETCH_WAIT,
            sequence: AtomicU64::new(0),
            wakenet: AtomicBool::new(true),
        }
    }

    /// How long `fetch` waits for audio before reporting `NotReady`.
    pub fn with_fetch_wait(mut self, wait: Duration) -> Self {
        self.fetch_wait = wait;
        self
    }

    /// True once every scripted chunk has been fetched.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }

    pub fn wakenet_enabled(&self) -> bool {
        self.wakenet.load(Ordering::Acquire)
    }

    /// Chunks fetched so far.
    pub fn fetched(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    fn first_channel(&self, frame: &AudioFrame) -> Vec<i16> {
        let bits = self.format.bits_per_sample;
        (0..frame.num_samples())
            .map(|n| {
                let sample = frame.sample(n, 0);
                match bits {
                    8 => (sample << 8) as i16,
                    32 => (sample >> 16) as i16,
                    _ => sample as i16,
                }
            })
            .collect()
    }
}

impl AcousticFrontEnd for ScriptedFrontEnd {
    fn feed_chunk_size(&self) -> usize {
        self.chunk_samples
    }

    fn fetch_chunk_size(&self) -> usize {
        self.chunk_samples
    }

    fn feed(&self, frame: &AudioFrame) {
        let samples = self.first_channel(frame);
        // Only fails once the receiving half is gone, which it never is while
        // `self` is alive.
        let _ = self.ring_tx.send(samples);
    }

    fn fetch(&self) -> Result<ProcessedChunk, FetchError> {
        let samples = match self.ring_rx.recv_timeout(self.fetch_wait) {
            Ok(samples) => samples,
            Err(RecvTimeoutError::Timeout) => return Err(FetchError::NotReady),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(FetchError::Malfunction("audio ring closed".to_string()))
            }
        };
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel);
        let index = sequence as usize;
        if index + 1 >= self.steps.len() {
            self.exhausted.store(true, Ordering::Release);
        }
        let Some(step) = self.steps.get(index) else {
            return Ok(ProcessedChunk {
                sequence,
                samples,
                ..ProcessedChunk::default()
            });
        };
        if let Some(reason) = &step.fault {
            return Err(FetchError::Malfunction(reason.clone()));
        }

        let wake_state = if self.wakenet_enabled() {
            step.wake
        } else {
            if step.wake != WakeState::NoDetect {
                tracing::debug!(sequence, wake = ?step.wake, "wake word disabled; state suppressed");
            }
            WakeState::NoDetect
        };
        let trigger_channel =
            (wake_state == WakeState::ChannelVerified).then(|| step.channel.unwrap_or(0));
        Ok(ProcessedChunk {
            sequence,
            samples,
            wake_state,
            trigger_channel,
        })
    }

    fn enable_wakenet(&self) {
        self.wakenet.store(true, Ordering::Release);
    }

    fn disable_wakenet(&self) {
        self.wakenet.store(false, Ordering::Release);
    }
}
