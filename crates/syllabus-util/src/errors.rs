use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Syllabus operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SyllabusError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration (e.g. `~/.syllabus/config.toml`).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.syllabus/config.toml for syntax errors"))]
    Config { message: String },

    /// The topic store could not be read or written.
    #[error("Store error: {message}")]
    #[diagnostic(help("Check that the store file is readable and well-formed TOML"))]
    Store { message: String },

    /// A topic mutation was rejected before any state changed.
    #[error("Rejected: {message}")]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A topic reference given on the command line matched nothing.
    #[error("Topic '{reference}' not found")]
    #[diagnostic(help("Run `syllabus list` to see the ids and names of your topics"))]
    UnknownTopic { reference: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type SyllabusResult<T> = miette::Result<T>;
