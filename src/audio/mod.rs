//! PCM frames, capture backends and sound-cue resources.
//!
//! Every block of audio in the satellite travels as an [`AudioFrame`]: an owned,
//! interleaved byte buffer tagged with its [`AudioFormat`]. Nothing in this
//! module resamples or converts bit depth; formats either match exactly or the
//! caller is told so.

mod capture;
mod cues;
#[cfg(feature = "mic")]
mod device;
mod format;
mod frame;
#[cfg(test)]
mod tests;
mod wav;

pub use capture::{AudioCapture, SilenceCapture, WavReplayCapture};
pub use cues::{Cue, SoundCues, DEFAULT_CUE_VOLUME};
#[cfg(feature = "mic")]
pub use device::{list_input_devices, MicCapture};
pub use format::AudioFormat;
pub use frame::AudioFrame;
