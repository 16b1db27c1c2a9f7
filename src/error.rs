use thiserror::Error;

#[derive(Error, Debug)]
pub enum GramevoError {
    /// Grammar text is empty, references an undefined rule, or can never terminate.
    #[error("Malformed grammar: {0}")]
    GrammarMalformed(String),

    /// A derivation or initialisation was requested with an unusable setup.
    #[error("Invalid state: {0}")]
    State(String),

    #[error("Gave up on individual {index} after {attempts} duplicate derivations")]
    DuplicateRetriesExhausted { index: usize, attempts: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GramevoError>;
