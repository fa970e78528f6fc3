//! System microphone capture via CPAL.
//!
//! CPAL delivers samples on its own callback thread. The callback never blocks:
//! it forwards blocks through a bounded channel and counts the ones it has to
//! drop, and `capture` reassembles them into fixed-size frames.

use super::capture::AudioCapture;
use super::{AudioFormat, AudioFrame};
use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const BLOCK_CHANNEL_CAPACITY: usize = 64;
const CAPTURE_STALL_TIMEOUT: Duration = Duration::from_secs(1);

/// List microphone names so the CLI can expose a selector.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("no input devices available")?;
    let mut names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            names.push(name);
        }
    }
    Ok(names)
}

fn find_device(preferred: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    match preferred {
        Some(name) => {
            let mut devices = host.input_devices().context("no input devices available")?;
            devices
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| anyhow!("input device '{name}' not found"))
        }
        None => host
            .default_input_device()
            .context("no default input device available"),
    }
}

fn forward_block(sender: &Sender<Vec<i16>>, dropped: &AtomicUsize, block: Vec<i16>) {
    if let Err(TrySendError::Full(_)) = sender.try_send(block) {
        dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Microphone capture at a fixed 16-bit format.
pub struct MicCapture {
    format: AudioFormat,
    receiver: Receiver<Vec<i16>>,
    pending: Vec<i16>,
    dropped: Arc<AtomicUsize>,
    stop: Option<Sender<()>>,
    stream_thread: Option<JoinHandle<()>>,
}

impl MicCapture {
    pub fn open(preferred_device: Option<&str>, format: AudioFormat) -> Result<Self> {
        format.validate()?;
        if format.bits_per_sample != 16 {
            bail!("microphone capture delivers 16-bit PCM, requested {format}");
        }
        let channels = u16::try_from(format.channel_count)
            .context("microphone channel count out of range")?;
        let device_name = preferred_device.map(str::to_string);
        let (sender, receiver) = bounded::<Vec<i16>>(BLOCK_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = bounded::<Result<String, String>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let dropped = Arc::new(AtomicUsize::new(0));
        let callback_dropped = dropped.clone();

        // cpal streams are not Send on every platform, so one thread owns it for
        // the lifetime of the capture.
        let stream_thread = thread::Builder::new()
            .name("mic-stream".to_string())
            .spawn(move || {
                let stream = match build_stream(
                    device_name.as_deref(),
                    channels,
                    format.sample_rate,
                    sender,
                    callback_dropped,
                ) {
                    Ok((stream, name)) => {
                        let _ = ready_tx.send(Ok(name));
                        stream
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(format!("{err:#}")));
                        return;
                    }
                };
                let _ = stop_rx.recv();
                if let Err(err) = stream.pause() {
                    tracing::debug!(%err, "failed to pause microphone stream");
                }
            })
            .context("failed to spawn microphone stream thread")?;

        let device = ready_rx
            .recv()
            .map_err(|_| anyhow!("microphone stream thread exited during start-up"))?
            .map_err(|err| anyhow!(err))?;
        tracing::info!(device = %device, %format, "microphone capture started");

        Ok(Self {
            format,
            receiver,
            pending: Vec::new(),
            dropped,
            stop: Some(stop_tx),
            stream_thread: Some(stream_thread),
        })
    }

    /// Callback blocks dropped because the capture side fell behind.
    pub fn dropped_blocks(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn build_stream(
    preferred: Option<&str>,
    channels: u16,
    sample_rate: u32,
    sender: Sender<Vec<i16>>,
    dropped: Arc<AtomicUsize>,
) -> Result<(cpal::Stream, String)> {
    let device = find_device(preferred)?;
    let name = device
        .name()
        .unwrap_or_else(|_| "unknown input device".to_string());
    let sample_format = device.default_input_config()?.sample_format();
    let config = StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let err_fn = |err: cpal::StreamError| tracing::warn!(%err, "microphone stream error");

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _| forward_block(&sender, &dropped, data.to_vec()),
            err_fn,
            None,
        )?,
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _| {
                let block = data
                    .iter()
                    .map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
                    .collect();
                forward_block(&sender, &dropped, block);
            },
            err_fn,
            None,
        )?,
        other => bail!("unsupported microphone sample format: {other:?}"),
    };
    stream.play()?;
    Ok((stream, name))
}

impl AudioCapture for MicCapture {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn capture(&mut self, frame: &mut AudioFrame) -> Result<()> {
        if frame.format() != self.format {
            bail!(
                "capture frame format {} does not match microphone format {}",
                frame.format(),
                self.format
            );
        }
        let needed = frame.num_samples() * self.format.channel_count as usize;
        while self.pending.len() < needed {
            match self.receiver.recv_timeout(CAPTURE_STALL_TIMEOUT) {
                Ok(block) => self.pending.extend_from_slice(&block),
                Err(RecvTimeoutError::Timeout) => {
                    bail!("microphone delivered no audio for {CAPTURE_STALL_TIMEOUT:?}")
                }
                Err(RecvTimeoutError::Disconnected) => bail!("microphone stream disconnected"),
            }
        }
        for (slot, sample) in frame
            .as_bytes_mut()
            .chunks_exact_mut(2)
            .zip(self.pending.drain(..needed))
        {
            slot.copy_from_slice(&sample.to_le_bytes());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "microphone"
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
        let dropped = self.dropped_blocks();
        if dropped > 0 {
            tracing::warn!(dropped_blocks = dropped, "microphone capture fell behind");
        } else {
            tracing::info!("microphone capture stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_block_channel_counts_drops() {
        let (sender, receiver) = bounded::<Vec<i16>>(1);
        let dropped = AtomicUsize::new(0);
        forward_block(&sender, &dropped, vec![1, 2]);
        forward_block(&sender, &dropped, vec![3, 4]);
        forward_block(&sender, &dropped, vec![5, 6]);
        assert_eq!(dropped.load(Ordering::Relaxed), 2);
        assert_eq!(receiver.try_recv().unwrap(), vec![1, 2]);
        assert!(receiver.try_recv().is_err());
    }
}
