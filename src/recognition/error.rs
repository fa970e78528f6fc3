use thiserror::Error;

/// Failures of the command registration protocol and classifier set-up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("command registration has not been started")]
    RegistrationNotOpen,
    #[error("command registration is already in progress")]
    RegistrationAlreadyOpen,
    #[error("command registration is already finalized")]
    RegistrationFinalized,
    #[error("command registration must be finalized before detection starts")]
    RegistrationPending,
    #[error("a command needs at least one phrase")]
    EmptyPhrases,
    #[error("classifier chunk size {classifier} does not match front-end fetch chunk size {front_end}")]
    ChunkSizeMismatch { front_end: usize, classifier: usize },
    #[error("classifier phrase table: {0}")]
    PhraseTable(String),
}
