//! Runtime wiring of the satellite on a host.
//!
//! Loads the command set, binds each command to a home-automation event,
//! reports observer feedback on stdout and starts the feed, detect and event
//! tasks. Shutdown stops them in pipeline order so no posted callback is lost.

mod capture;
mod commands;
mod observer;
mod output;
mod publisher;
mod runtime;
#[cfg(test)]
mod tests;

pub use capture::open_capture;
pub use commands::{event_id_for, register_commands, CommandSet, CommandSpec};
pub use observer::ConsoleObserver;
pub use output::JsonLines;
pub use publisher::{CommandEvent, CommandPublisher, JsonLinePublisher, VOICE_COMMAND_EVENT_TYPE};
pub use runtime::Satellite;
