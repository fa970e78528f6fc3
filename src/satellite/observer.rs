use super::JsonLines;
use crate::audio::{Cue, SoundCues};
use crate::recognition::Observer;
use serde::Serialize;
use std::thread;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct FeedbackLine<'a> {
    observer: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display: Option<&'a str>,
    led: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cue: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cue_ms: Option<u64>,
}

/// Host rendition of the board's feedback: the display text, LED colour and
/// sound cue of every interaction step are written as one JSON line.
///
/// Timeout and success feedback is held for `feedback_hold` on the event
/// task, as the board does before clearing its display.
pub struct ConsoleObserver {
    out: JsonLines,
    cues: Option<SoundCues>,
    feedback_hold: Duration,
}

impl ConsoleObserver {
    pub fn new(out: JsonLines, cues: Option<SoundCues>, feedback_hold: Duration) -> Self {
        Self {
            out,
            cues,
            feedback_hold,
        }
    }

    fn cue_ms(&self, cue: Cue) -> Option<u64> {
        self.cues.as_ref().map(|cues| {
            let frame = cues.get(cue);
            frame.format().duration_of(frame.num_samples()).as_millis() as u64
        })
    }

    fn emit(&self, observer: &'static str, display: Option<&str>, led: &'static str, cue: Option<Cue>) {
        self.out.emit(&FeedbackLine {
            observer,
            message: None,
            display,
            led,
            cue: cue.map(Cue::label),
            cue_ms: cue.and_then(|cue| self.cue_ms(cue)),
        });
    }

    fn hold(&self) {
        if !self.feedback_hold.is_zero() {
            thread::sleep(self.feedback_hold);
        }
    }
}

impl Observer for ConsoleObserver {
    fn on_waiting_for_command(&self) {
        tracing::info!("waiting for command");
        self.emit("waiting_for_command", Some("Say command"), "blue", Some(Cue::Wake));
    }

    fn on_command_not_detected(&self) {
        tracing::info!("command not detected");
        self.emit("command_not_detected", Some("Timeout"), "red", Some(Cue::NotRecognized));
        self.hold();
    }

    fn on_command_handling_started(&self, message: &str) {
        self.out.emit(&FeedbackLine {
            observer: "command_started",
            message: Some(message),
            display: Some(message),
            led: "green",
            cue: None,
            cue_ms: None,
        });
    }

    fn on_command_handling_finished(&self) {
        self.emit("command_finished", None, "off", Some(Cue::Recognized));
        self.hold();
    }
}
