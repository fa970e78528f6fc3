use super::AudioFrame;
use anyhow::Result;
use std::path::Path;

/// Cue resources are mastered loud; play them well below full scale.
pub const DEFAULT_CUE_VOLUME: f32 = 0.05;

/// Feedback sounds played around a voice command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Wake,
    Recognized,
    NotRecognized,
}

impl Cue {
    pub fn file_name(self) -> &'static str {
        match self {
            Cue::Wake => "wake.wav",
            Cue::Recognized => "recognized.wav",
            Cue::NotRecognized => "not_recognized.wav",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Cue::Wake => "wake",
            Cue::Recognized => "recognized",
            Cue::NotRecognized => "not_recognized",
        }
    }
}

/// Decoded, attenuated cue sounds loaded once at start-up.
#[derive(Debug, Clone)]
pub struct SoundCues {
    wake: AudioFrame,
    recognized: AudioFrame,
    not_recognized: AudioFrame,
}

impl SoundCues {
    pub fn load(dir: &Path, volume: f32) -> Result<Self> {
        let load = |cue: Cue| -> Result<AudioFrame> {
            let mut frame = AudioFrame::load_wav(&dir.join(cue.file_name()))?;
            frame.adjust_volume(volume);
            Ok(frame)
        };
        Ok(Self {
            wake: load(Cue::Wake)?,
            recognized: load(Cue::Recognized)?,
            not_recognized: load(Cue::NotRecognized)?,
        })
    }

    pub fn get(&self, cue: Cue) -> &AudioFrame {
        match cue {
            Cue::Wake => &self.wake,
            Cue::Recognized => &self.recognized,
            Cue::NotRecognized => &self.not_recognized,
        }
    }
}
