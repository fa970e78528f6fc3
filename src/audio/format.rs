use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Sample widths the frame accessors know how to decode.
const SUPPORTED_BITS: [u32; 3] = [8, 16, 32];

/// Channel layout, bit depth and rate of interleaved PCM audio.
///
/// Two formats are compatible only when all three fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AudioFormat {
    pub channel_count: u32,
    pub bits_per_sample: u32,
    pub sample_rate: u32,
}

impl AudioFormat {
    pub const fn new(channel_count: u32, bits_per_sample: u32, sample_rate: u32) -> Self {
        Self {
            channel_count,
            bits_per_sample,
            sample_rate,
        }
    }

    /// Same width and rate with a different channel count.
    pub const fn with_channels(self, channel_count: u32) -> Self {
        Self {
            channel_count,
            ..self
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample / 8) as usize
    }

    /// Bytes occupied by one sample across all channels.
    pub fn stride(&self) -> usize {
        self.bytes_per_sample() * self.channel_count as usize
    }

    /// Wall-clock length of `num_samples` samples per channel.
    pub fn duration_of(&self, num_samples: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(num_samples as u64 * 1_000_000 / u64::from(self.sample_rate))
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel_count == 0 {
            bail!("audio format needs at least one channel");
        }
        if !SUPPORTED_BITS.contains(&self.bits_per_sample) {
            bail!(
                "unsupported sample width {} bits (supported: 8, 16, 32)",
                self.bits_per_sample
            );
        }
        if self.sample_rate == 0 {
            bail!("audio format sample rate must be non-zero");
        }
        Ok(())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}ch/{}bit/{}Hz",
            self.channel_count, self.bits_per_sample, self.sample_rate
        )
    }
}
