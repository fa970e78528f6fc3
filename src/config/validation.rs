use super::{
    AppConfig, CaptureSource, MAX_CHANNELS, MAX_CHUNK_SAMPLES, MAX_COMMAND_TIMEOUT_MS,
    MAX_EVENT_QUEUE_CAPACITY, MAX_FEEDBACK_HOLD_MS, MAX_RING_CHUNKS,
};
use crate::recognition::EngineConfig;
use anyhow::{bail, Result};
use clap::Parser;
use std::time::Duration;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values against the bounds the tasks can handle.
    pub fn validate(&mut self) -> Result<()> {
        if !(1..=MAX_CHANNELS).contains(&self.mic_channels) {
            bail!(
                "--mic-channels must be between 1 and {MAX_CHANNELS}, got {}",
                self.mic_channels
            );
        }
        if self.reference_channels > MAX_CHANNELS {
            bail!(
                "--reference-channels must be at most {MAX_CHANNELS}, got {}",
                self.reference_channels
            );
        }
        if !(8_000..=96_000).contains(&self.sample_rate) {
            bail!(
                "--sample-rate must be between 8000 and 96000 Hz, got {}",
                self.sample_rate
            );
        }
        if ![8, 16, 32].contains(&self.bits_per_sample) {
            bail!(
                "--bits-per-sample must be 8, 16 or 32, got {}",
                self.bits_per_sample
            );
        }
        if !(1..=MAX_CHUNK_SAMPLES).contains(&self.chunk_samples) {
            bail!(
                "--chunk-samples must be between 1 and {MAX_CHUNK_SAMPLES}, got {}",
                self.chunk_samples
            );
        }
        if !(1..=MAX_RING_CHUNKS).contains(&self.front_end_ring_chunks) {
            bail!(
                "--front-end-ring-chunks must be between 1 and {MAX_RING_CHUNKS}, got {}",
                self.front_end_ring_chunks
            );
        }
        if !(100..=MAX_COMMAND_TIMEOUT_MS).contains(&self.command_timeout_ms) {
            bail!(
                "--command-timeout-ms must be between 100 and {MAX_COMMAND_TIMEOUT_MS} ms, got {}",
                self.command_timeout_ms
            );
        }
        if !(1..=MAX_EVENT_QUEUE_CAPACITY).contains(&self.event_queue_capacity) {
            bail!(
                "--event-queue-capacity must be between 1 and {MAX_EVENT_QUEUE_CAPACITY}, got {}",
                self.event_queue_capacity
            );
        }
        if !(10..=10_000).contains(&self.event_wait_ms) {
            bail!(
                "--event-wait-ms must be between 10 and 10000 ms, got {}",
                self.event_wait_ms
            );
        }
        if self.feedback_hold_ms > MAX_FEEDBACK_HOLD_MS {
            bail!(
                "--feedback-hold-ms must be at most {MAX_FEEDBACK_HOLD_MS} ms, got {}",
                self.feedback_hold_ms
            );
        }
        if !(0.0..=1.0).contains(&self.cue_volume) {
            bail!(
                "--cue-volume must be between 0.0 and 1.0, got {}",
                self.cue_volume
            );
        }
        match (self.capture, &self.capture_wav) {
            (CaptureSource::Wav, None) => bail!("--capture wav requires --capture-wav <PATH>"),
            (CaptureSource::Wav, Some(path)) if !path.is_file() => {
                bail!("--capture-wav {} is not a file", path.display())
            }
            (CaptureSource::Silence | CaptureSource::Mic, Some(_)) => {
                bail!("--capture-wav is only used with --capture wav")
            }
            _ => {}
        }
        if self.capture == CaptureSource::Mic && self.bits_per_sample != 16 {
            bail!("--capture mic records 16-bit audio; drop --bits-per-sample or set it to 16");
        }
        if self.exit_when_idle && self.scenario.is_none() {
            bail!("--exit-when-idle needs a --scenario to run out of");
        }
        if let Some(input_device) = &self.input_device {
            let trimmed = input_device.trim();
            if trimmed.is_empty() {
                bail!("--input-device must not be empty");
            }
            if trimmed.len() != input_device.len() {
                self.input_device = Some(trimmed.to_string());
            }
        }
        if self.log_level.trim().is_empty() {
            bail!("--log-level must not be empty");
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            mic_channels: self.mic_channels,
            reference_channels: self.reference_channels,
            bits_per_sample: self.bits_per_sample,
            sample_rate: self.sample_rate,
            command_timeout_ms: self.command_timeout_ms,
        }
    }

    pub fn event_wait(&self) -> Duration {
        Duration::from_millis(self.event_wait_ms)
    }

    pub fn feedback_hold(&self) -> Duration {
        Duration::from_millis(self.feedback_hold_ms)
    }

    /// Host capture backends pace themselves unless `--no-realtime` is set.
    pub fn realtime(&self) -> bool {
        !self.no_realtime
    }
}
