//! CLI support for sage-lang
//!
//! The pieces behind the `sage` binary, usable from other tools that want to
//! check or run expressions the same way.

mod check;
mod docs;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use docs::describe_grammar;

use std::io;

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Lex, parse or evaluation failure
    #[error(transparent)]
    Expression(#[from] crate::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no input provided; use --input or pipe JSON to stdin")]
    NoInput,
}
