use super::AudioFormat;
use anyhow::{bail, Result};

/// Owned block of interleaved PCM audio.
///
/// The byte buffer always holds a whole number of samples: its length is an
/// exact multiple of `format.stride()`. Sample values are signed little-endian
/// integers of the format's width.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioFrame {
    format: AudioFormat,
    data: Vec<u8>,
}

impl AudioFrame {
    /// Zero-filled frame holding `num_samples` samples per channel.
    ///
    /// # Panics
    /// If `format` fails [`AudioFormat::validate`].
    pub fn new(format: AudioFormat, num_samples: usize) -> Self {
        if let Err(err) = format.validate() {
            panic!("cannot allocate a {format} frame: {err}");
        }
        let mut frame = Self {
            format,
            data: Vec::new(),
        };
        frame.resize(num_samples);
        frame
    }

    pub fn from_bytes(format: AudioFormat, data: Vec<u8>) -> Result<Self> {
        format.validate()?;
        if data.len() % format.stride() != 0 {
            bail!(
                "{} bytes is not a whole number of {format} samples (stride {})",
                data.len(),
                format.stride()
            );
        }
        Ok(Self { format, data })
    }

    /// Build a 16-bit frame from interleaved samples.
    pub fn from_i16_samples(format: AudioFormat, samples: &[i16]) -> Result<Self> {
        if format.bits_per_sample != 16 {
            bail!("expected a 16-bit format, got {format}");
        }
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::from_bytes(format, data)
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    pub fn num_samples(&self) -> usize {
        match self.format.stride() {
            0 => 0,
            stride => self.data.len() / stride,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn resize(&mut self, num_samples: usize) {
        self.data.resize(num_samples * self.format.stride(), 0);
    }

    fn offset(&self, sample: usize, channel: usize) -> usize {
        let num_samples = self.num_samples();
        let channels = self.format.channel_count as usize;
        assert!(
            sample < num_samples && channel < channels,
            "sample {sample}/channel {channel} is outside a {num_samples}-sample {} frame",
            self.format
        );
        sample * self.format.stride() + channel * self.format.bytes_per_sample()
    }

    pub fn sample(&self, sample: usize, channel: usize) -> i32 {
        let at = self.offset(sample, channel);
        read_sample(&self.data[at..], self.format.bits_per_sample)
    }

    /// Store `value`, saturating to the sample width.
    pub fn set_sample(&mut self, sample: usize, channel: usize, value: i32) {
        let at = self.offset(sample, channel);
        write_sample(&mut self.data[at..], self.format.bits_per_sample, value);
    }

    pub fn to_i16_samples(&self) -> Vec<i16> {
        assert_eq!(
            self.format.bits_per_sample, 16,
            "to_i16_samples needs a 16-bit frame, got {}",
            self.format
        );
        self.data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Append `extra` silent channels after the existing ones in every sample.
    ///
    /// Used to pad microphone captures with the reference channels the acoustic
    /// front end expects.
    pub fn add_channels(&mut self, extra: u32) {
        if extra == 0 {
            return;
        }
        let num_samples = self.num_samples();
        let old_block = self.format.stride();
        self.format.channel_count += extra;
        let new_block = self.format.stride();
        self.data.resize(num_samples * new_block, 0);

        // Walk backwards so samples are moved before they are overwritten.
        for index in (0..num_samples).rev() {
            let src = index * old_block;
            let dst = index * new_block;
            self.data.copy_within(src..src + old_block, dst);
            self.data[dst + old_block..dst + new_block].fill(0);
        }
    }

    /// Append another frame of the same format.
    pub fn join(&mut self, other: &AudioFrame) {
        assert_eq!(
            self.format, other.format,
            "cannot join a {} frame onto a {} frame",
            other.format, self.format
        );
        self.data.extend_from_slice(&other.data);
    }

    /// Scale every sample by `factor`, saturating at the sample width.
    pub fn adjust_volume(&mut self, factor: f32) {
        let bits = self.format.bits_per_sample;
        let width = self.format.bytes_per_sample();
        if width == 0 {
            return;
        }
        for chunk in self.data.chunks_exact_mut(width) {
            let scaled = (read_sample(chunk, bits) as f64 * f64::from(factor))
                .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
            write_sample(chunk, bits, scaled);
        }
    }
}

fn read_sample(bytes: &[u8], bits: u32) -> i32 {
    match bits {
        8 => i32::from(bytes[0] as i8),
        16 => i32::from(i16::from_le_bytes([bytes[0], bytes[1]])),
        32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        other => panic!("unsupported sample width {other} bits"),
    }
}

fn write_sample(bytes: &mut [u8], bits: u32, value: i32) {
    match bits {
        8 => bytes[0] = value.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8 as u8,
        16 => {
            let clamped = value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
            bytes[..2].copy_from_slice(&clamped.to_le_bytes());
        }
        32 => bytes[..4].copy_from_slice(&value.to_le_bytes()),
        other => panic!("unsupported sample width {other} bits"),
    }
}
