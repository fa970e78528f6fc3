/// Receives the lifecycle of one voice interaction.
///
/// Every callback runs on the event task, never on the detect task, so
/// implementations may block (play a sound, hold a light) without starving
/// the audio path.
pub trait Observer: Send + Sync {
    /// The wake word was heard; a command is expected next.
    fn on_waiting_for_command(&self);

    /// The classifier gave up without recognising a command.
    fn on_command_not_detected(&self);

    /// A command was recognised; `message` is its display text. Its handler
    /// runs right after this returns.
    fn on_command_handling_started(&self, message: &str);

    fn on_command_handling_finished(&self);
}
