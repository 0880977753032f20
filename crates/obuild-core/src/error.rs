//! Error types for the build engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or executing a build.
#[derive(Error, Debug)]
pub enum Error {
    /// No rule matched the target and it does not exist as a source file.
    #[error("no rule to run target '{0}'")]
    NoRule(String),

    /// Like [`Error::NoRule`], reported while expanding another rule's deps.
    #[error("no rule to run target '{target}' (needed by '{needed_by}')")]
    NoRuleNeededBy { target: String, needed_by: String },

    /// More than one body-bearing rule matched a target with equal
    /// specificity.
    #[error("redefinition of rule '{0}'")]
    Redefinition(String),

    /// A target was reached again while it was still being visited.
    #[error("dependency cycle detected at target '{0}'")]
    DependencyCycle(String),

    /// A shell command enqueued by a rule body exited non-zero.
    #[error("command exited with status {status}")]
    CommandFailed { status: i32 },

    /// `shell` was called while no build scope was active.
    #[error("'shell' is only valid while a build is running")]
    ShellOutsideBuild,

    /// The script evaluator reported an error while running a rule body.
    #[error("{0}")]
    Script(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build the resolution-failure error, naming the requesting rule when
    /// one is known.
    #[must_use]
    pub fn no_rule(target: impl Into<String>, needed_by: Option<&str>) -> Self {
        match needed_by {
            Some(from) => Error::NoRuleNeededBy {
                target: target.into(),
                needed_by: from.to_string(),
            },
            None => Error::NoRule(target.into()),
        }
    }

    /// Wrap a script-evaluator failure.
    #[must_use]
    pub fn script(message: impl Into<String>) -> Self {
        Error::Script(message.into())
    }
}
