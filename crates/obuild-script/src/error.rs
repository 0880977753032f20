//! Error types for script scanning and evaluation.

use thiserror::Error;

/// Result type alias for script operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning or evaluating build-file code.
#[derive(Error, Debug)]
pub enum Error {
    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: unterminated block")]
    UnterminatedBlock { line: usize },

    #[error("line {line}: unterminated substitution")]
    UnterminatedParen { line: usize },

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected} argument(s), got {got}")]
    WrongArity {
        command: &'static str,
        expected: &'static str,
        got: usize,
    },

    /// An engine failure surfaced while a command ran. Kept intact so build
    /// errors keep their identity through nested evaluation.
    #[error(transparent)]
    Engine(#[from] obuild_core::Error),
}

impl Error {
    #[must_use]
    pub fn wrong_arity(command: &'static str, expected: &'static str, got: usize) -> Self {
        Error::WrongArity {
            command,
            expected,
            got,
        }
    }

    /// Flatten into an engine error for the driver: engine errors pass
    /// through untouched, script-level failures become script errors.
    #[must_use]
    pub fn into_engine(self) -> obuild_core::Error {
        match self {
            Error::Engine(err) => err,
            other => obuild_core::Error::script(other.to_string()),
        }
    }
}
