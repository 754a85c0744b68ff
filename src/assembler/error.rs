//! Errors produced while assembling a source file.
//!
//! Every pass stops at the first error it finds; there is no recovery.
use std::fmt;
use thiserror::Error;

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum ErrorKind {
    #[error("unknown instruction `{0}`")]
    UnknownMnemonic(String),

    #[error("missing operand for `{0}`")]
    MissingOperand(String),

    #[error("invalid operand `{0}`")]
    InvalidOperandSyntax(String),

    #[error("value {value} out of range (0-{max})")]
    OperandRange { value: u32, max: u32 },

    #[error("undefined label `{0}`")]
    UndefinedLabel(String),
}

/// An error with the source line it was found on, if there is one.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AsmError {
    pub line: Option<usize>,
    pub kind: ErrorKind,
}

impl AsmError {
    pub fn new(kind: ErrorKind) -> Self {
        AsmError { line: None, kind }
    }

    /// Attaches a line number unless one is already set.
    pub fn at(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }
}

impl From<ErrorKind> for AsmError {
    fn from(kind: ErrorKind) -> Self {
        AsmError::new(kind)
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AsmError {}

pub type Result<T> = std::result::Result<T, AsmError>;
