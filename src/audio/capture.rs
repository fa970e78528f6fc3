//! Capture backends that fill fixed-size frames for the feed task.
//!
//! A backend declares one format for the whole session and fills the caller's
//! frame synchronously, blocking until every sample is present. Host backends
//! that synthesise audio pace themselves to real time so the feed task never
//! runs faster than a microphone would.

use super::{AudioFormat, AudioFrame};
use anyhow::{bail, Result};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Source of microphone audio for the feed task.
pub trait AudioCapture: Send {
    /// Format of every frame this backend fills; fixed for the session.
    fn format(&self) -> AudioFormat;

    /// Fill `frame` completely. The frame's format must equal [`Self::format`].
    fn capture(&mut self, frame: &mut AudioFrame) -> Result<()>;

    fn name(&self) -> &'static str {
        "unknown_capture"
    }
}

fn check_frame_format(expected: AudioFormat, frame: &AudioFrame) -> Result<()> {
    if frame.format() != expected {
        bail!(
            "capture frame format {} does not match backend format {expected}",
            frame.format()
        );
    }
    Ok(())
}

/// Sleeps until the wall-clock deadline of each captured block.
#[derive(Debug)]
struct Pacer {
    next: Option<Instant>,
}

impl Pacer {
    fn new() -> Self {
        Self { next: None }
    }

    fn wait(&mut self, period: Duration) {
        let now = Instant::now();
        let deadline = self.next.unwrap_or(now) + period;
        if deadline > now {
            thread::sleep(deadline - now);
            self.next = Some(deadline);
        } else {
            // Fell behind by more than a block; resynchronise instead of bursting.
            self.next = Some(now);
        }
    }
}

/// Produces digital silence; the default host "microphone".
#[derive(Debug)]
pub struct SilenceCapture {
    format: AudioFormat,
    pacer: Option<Pacer>,
}

impl SilenceCapture {
    pub fn new(format: AudioFormat, realtime: bool) -> Self {
        Self {
            format,
            pacer: realtime.then(Pacer::new),
        }
    }
}

impl AudioCapture for SilenceCapture {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn capture(&mut self, frame: &mut AudioFrame) -> Result<()> {
        check_frame_format(self.format, frame)?;
        frame.as_bytes_mut().fill(0);
        if let Some(pacer) = self.pacer.as_mut() {
            pacer.wait(self.format.duration_of(frame.num_samples()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "silence"
    }
}

/// Replays a recorded WAV file in a loop.
#[derive(Debug)]
pub struct WavReplayCapture {
    source: AudioFrame,
    position: usize,
    pacer: Option<Pacer>,
}

impl WavReplayCapture {
    pub fn open(path: &Path, realtime: bool) -> Result<Self> {
        Self::from_frame(AudioFrame::load_wav(path)?, realtime)
    }

    pub fn from_frame(source: AudioFrame, realtime: bool) -> Result<Self> {
        if source.is_empty() {
            bail!("cannot replay an empty recording");
        }
        Ok(Self {
            source,
            position: 0,
            pacer: realtime.then(Pacer::new),
        })
    }
}

impl AudioCapture for WavReplayCapture {
    fn format(&self) -> AudioFormat {
        self.source.format()
    }

    fn capture(&mut self, frame: &mut AudioFrame) -> Result<()> {
        check_frame_format(self.source.format(), frame)?;
        let stride = self.source.format().stride();
        let source = self.source.as_bytes();
        let mut written = 0;
        let target = frame.as_bytes_mut();
        while written < target.len() {
            let available = source.len() - self.position;
            let take = available.min(target.len() - written);
            target[written..written + take]
                .copy_from_slice(&source[self.position..self.position + take]);
            written += take;
            self.position = (self.position + take) % source.len();
        }
        debug_assert_eq!(self.position % stride, 0);
        if let Some(pacer) = self.pacer.as_mut() {
            pacer.wait(self.source.format().duration_of(frame.num_samples()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wav_replay"
    }
}
