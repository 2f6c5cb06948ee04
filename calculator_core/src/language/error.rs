use std::fmt;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Syntax,
    UnknownIdentifier,
    DivisionByZero,
    Domain,
    Overflow,
}

/// The single failure type of the evaluator. `Display` yields the text shown
/// to users on the terminal and in the HTTP error payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationError {
    pub kind: ErrorKind,
    pub message: String,
    pub column: Option<usize>,
}

impl EvaluationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        EvaluationError {
            kind,
            message: message.into(),
            column: None,
        }
    }

    pub fn at(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Syntax => match self.column {
                Some(column) => write!(f, "syntax error: {} (column {})", self.message, column),
                None => write!(f, "syntax error: {}", self.message),
            },
            ErrorKind::UnknownIdentifier => write!(f, "unknown identifier: {}", self.message),
            ErrorKind::DivisionByZero => write!(f, "division by zero"),
            ErrorKind::Domain => write!(f, "domain error: {}", self.message),
            ErrorKind::Overflow => write!(f, "overflow: {}", self.message),
        }
    }
}

impl std::error::Error for EvaluationError {}

pub type Result<T> = std::result::Result<T, EvaluationError>;

#[macro_export]
macro_rules! syntax_error {
    ($msg:expr, $col:expr) => {
        Err($crate::language::error::EvaluationError::new(
            $crate::language::error::ErrorKind::Syntax,
            $msg,
        )
        .at($col))
    };
}

#[macro_export]
macro_rules! unknown_identifier {
    ($name:expr) => {
        Err($crate::language::error::EvaluationError::new(
            $crate::language::error::ErrorKind::UnknownIdentifier,
            $name,
        ))
    };
}

#[macro_export]
macro_rules! division_by_zero {
    () => {
        Err($crate::language::error::EvaluationError::new(
            $crate::language::error::ErrorKind::DivisionByZero,
            "division by zero",
        ))
    };
}

#[macro_export]
macro_rules! domain_error {
    ($msg:expr) => {
        Err($crate::language::error::EvaluationError::new(
            $crate::language::error::ErrorKind::Domain,
            $msg,
        ))
    };
}
