//! Syntax errors recorded while parsing a GDB/MI line
//!
//! None of these abort parsing. The first one hit is stored on the
//! resulting record next to whatever part of the tree was recovered.

use serde::Serialize;
use thiserror::Error;

/// Non-fatal syntax problem; `at` is a character offset into the line.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MiSyntaxError {
    #[error("unterminated string starting at {at}")]
    UnterminatedString { at: usize },

    #[error("dangling escape at {at}")]
    DanglingEscape { at: usize },

    #[error("unexpected {found} at {at}, expected {expected}")]
    UnexpectedToken {
        at: usize,
        found: String,
        expected: &'static str,
    },

    #[error("unexpected end of input at {at}, expected {expected}")]
    UnexpectedEnd { at: usize, expected: &'static str },

    #[error("no record marker found at {at}")]
    MissingMarker { at: usize },

    #[error("nesting deeper than the parser accepts at {at}")]
    TooDeep { at: usize },

    #[error("record token {token} at {at} is out of range")]
    TokenOverflow { at: usize, token: String },
}

impl MiSyntaxError {
    /// Character offset the error points at
    pub fn position(&self) -> usize {
        match self {
            MiSyntaxError::UnterminatedString { at }
            | MiSyntaxError::DanglingEscape { at }
            | MiSyntaxError::UnexpectedToken { at, .. }
            | MiSyntaxError::UnexpectedEnd { at, .. }
            | MiSyntaxError::MissingMarker { at }
            | MiSyntaxError::TooDeep { at }
            | MiSyntaxError::TokenOverflow { at, .. } => *at,
        }
    }
}
