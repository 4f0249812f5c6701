//! Error types for typist.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for typing test operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the results store or config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Results file could not be written or a row could not be encoded.
    #[error("results file error: {0}")]
    Csv(#[from] csv::Error),

    /// Config file could not be encoded.
    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    /// The corpus has no usable line to sample from.
    #[error("the text corpus is empty, add at least one line of text")]
    EmptyCorpus,

    /// The corpus file is missing or could not be read.
    #[error("cannot read text corpus {}: {source}", path.display())]
    CorpusUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A test was started without a username.
    #[error("please enter your name to start the test")]
    MissingUsername,

    /// The requested action is not allowed in the current session state.
    #[error("cannot {action} while the session is {from}")]
    InvalidTransition {
        from: crate::session::SessionState,
        action: &'static str,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Result type alias using typist's Error.
pub type Result<T> = std::result::Result<T, Error>;
