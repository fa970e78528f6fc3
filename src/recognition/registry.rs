use super::{CommandId, RecognitionError};
use std::fmt;
use std::sync::Arc;

/// Action bound to a command; runs on the event task.
pub type CommandHandler = Box<dyn Fn() + Send + Sync>;

pub struct Command {
    id: CommandId,
    phrases: Vec<String>,
    message: String,
    handler: CommandHandler,
}

impl Command {
    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Display text; the first phrase unless one was given explicitly.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn handle(&self) {
        (self.handler)()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("phrases", &self.phrases)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Closed,
    Open,
    Finalized,
}

/// Append-only command table filled during one registration session.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    phase: Phase,
    commands: Vec<Arc<Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin(&mut self) -> Result<(), RecognitionError> {
        match self.phase {
            Phase::Closed => {
                self.phase = Phase::Open;
                Ok(())
            }
            Phase::Open => Err(RecognitionError::RegistrationAlreadyOpen),
            Phase::Finalized => Err(RecognitionError::RegistrationFinalized),
        }
    }

    /// Store a command under the next id. Phrases are not deduplicated.
    pub(crate) fn push(
        &mut self,
        phrases: Vec<String>,
        handler: CommandHandler,
        message: Option<&str>,
    ) -> Result<Arc<Command>, RecognitionError> {
        self.ensure_open()?;
        let Some(first) = phrases.first() else {
            return Err(RecognitionError::EmptyPhrases);
        };
        let message = message.unwrap_or(first).to_string();
        let command = Arc::new(Command {
            id: self.commands.len(),
            phrases,
            message,
            handler,
        });
        self.commands.push(command.clone());
        Ok(command)
    }

    pub(crate) fn finalize(&mut self) -> Result<(), RecognitionError> {
        self.ensure_open()?;
        self.phase = Phase::Finalized;
        Ok(())
    }

    pub(crate) fn ensure_open(&self) -> Result<(), RecognitionError> {
        match self.phase {
            Phase::Open => Ok(()),
            Phase::Closed => Err(RecognitionError::RegistrationNotOpen),
            Phase::Finalized => Err(RecognitionError::RegistrationFinalized),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.phase == Phase::Finalized
    }

    pub fn get(&self, id: CommandId) -> Option<&Arc<Command>> {
        self.commands.get(id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.iter()
    }
}
