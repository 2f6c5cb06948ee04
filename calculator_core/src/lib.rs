use std::error::Error as StdError;
use std::fmt;

pub mod format;
pub mod language;
pub mod servers;
pub mod session;

pub use format::format_number;
pub use language::{evaluate, evaluate_in, ErrorKind, EvaluationError, Scope};
pub use session::Session;

/// Failures outside of evaluation: configuration, sockets, TLS material.
#[derive(Debug, Clone)]
pub enum CoreError {
    IoError(String),
    ConfigParseError(String),
    ServerStartFailed(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::IoError(s) => write!(f, "IO Error: {}", s),
            CoreError::ConfigParseError(s) => write!(f, "Config Parse Error: {}", s),
            CoreError::ServerStartFailed(s) => write!(f, "Server Start Failed: {}", s),
        }
    }
}

impl StdError for CoreError {}
