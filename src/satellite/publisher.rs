use super::JsonLines;
use crate::recognition::CommandId;
use serde::Serialize;

/// Event type every voice command event entity advertises.
pub const VOICE_COMMAND_EVENT_TYPE: &str = "voice_command";

/// One fired home-automation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEvent {
    pub event_type: &'static str,
    pub event: String,
    pub command_id: CommandId,
}

impl CommandEvent {
    pub fn voice_command(event: impl Into<String>, command_id: CommandId) -> Self {
        Self {
            event_type: VOICE_COMMAND_EVENT_TYPE,
            event: event.into(),
            command_id,
        }
    }
}

/// Bridge to the home-automation system. Called from command handlers.
pub trait CommandPublisher: Send + Sync {
    fn publish(&self, event: &CommandEvent);
}

/// Writes each event as one JSON line.
pub struct JsonLinePublisher {
    out: JsonLines,
}

impl JsonLinePublisher {
    pub fn new(out: JsonLines) -> Self {
        Self { out }
    }
}

impl CommandPublisher for JsonLinePublisher {
    fn publish(&self, event: &CommandEvent) {
        tracing::info!(event = %event.event, command_id = event.command_id, "publishing command event");
        self.out.emit(event);
    }
}
