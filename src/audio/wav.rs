//! WAV resource decoding.

use super::{AudioFormat, AudioFrame};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::Path;

impl AudioFrame {
    /// Decode an integer PCM WAV file held in memory, keeping its own format.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = hound::WavReader::new(Cursor::new(bytes)).context("invalid WAV data")?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int {
            bail!("only integer PCM WAV files are supported");
        }
        let format = AudioFormat::new(
            u32::from(spec.channels),
            u32::from(spec.bits_per_sample),
            spec.sample_rate,
        );
        format.validate()?;

        let mut data = Vec::with_capacity(reader.len() as usize * format.bytes_per_sample());
        match spec.bits_per_sample {
            8 => {
                for sample in reader.into_samples::<i8>() {
                    data.push(sample.context("truncated WAV sample data")? as u8);
                }
            }
            16 => {
                for sample in reader.into_samples::<i16>() {
                    data.extend_from_slice(
                        &sample.context("truncated WAV sample data")?.to_le_bytes(),
                    );
                }
            }
            32 => {
                for sample in reader.into_samples::<i32>() {
                    data.extend_from_slice(
                        &sample.context("truncated WAV sample data")?.to_le_bytes(),
                    );
                }
            }
            other => bail!("unsupported WAV sample width {other} bits"),
        }
        Self::from_bytes(format, data)
    }

    pub fn load_wav(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_wav_bytes(&bytes).with_context(|| format!("failed to decode {}", path.display()))
    }
}
