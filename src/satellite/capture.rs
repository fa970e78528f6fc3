use crate::audio::{AudioCapture, SilenceCapture, WavReplayCapture};
use crate::config::{AppConfig, CaptureSource};
use anyhow::{bail, Result};

/// Open the capture backend selected on the command line.
///
/// Backends deliver either the full engine layout or microphone channels only;
/// the feed task pads the latter with silent reference channels.
pub fn open_capture(config: &AppConfig) -> Result<Box<dyn AudioCapture>> {
    let engine = config.engine_config();
    let capture: Box<dyn AudioCapture> = match config.capture {
        CaptureSource::Silence => Box::new(SilenceCapture::new(
            engine.capture_format(),
            config.realtime(),
        )),
        CaptureSource::Wav => {
            let Some(path) = config.capture_wav.as_deref() else {
                bail!("--capture wav requires --capture-wav <PATH>");
            };
            let replay = WavReplayCapture::open(path, config.realtime())?;
            let format = replay.format();
            if format != engine.capture_format() && format != engine.audio_format() {
                bail!(
                    "{} is {format}; expected {} or {}",
                    path.display(),
                    engine.capture_format(),
                    engine.audio_format()
                );
            }
            Box::new(replay)
        }
        CaptureSource::Mic => open_mic(config)?,
    };
    tracing::info!(
        source = config.capture.label(),
        backend = capture.name(),
        format = %capture.format(),
        "capture backend ready"
    );
    Ok(capture)
}

#[cfg(feature = "mic")]
fn open_mic(config: &AppConfig) -> Result<Box<dyn AudioCapture>> {
    use anyhow::Context;

    let format = config.engine_config().capture_format();
    let mic = crate::audio::MicCapture::open(config.input_device.as_deref(), format)
        .context("failed to open microphone")?;
    Ok(Box::new(mic))
}

#[cfg(not(feature = "mic"))]
fn open_mic(_config: &AppConfig) -> Result<Box<dyn AudioCapture>> {
    bail!("this build has no microphone support; rebuild with the `mic` feature")
}
