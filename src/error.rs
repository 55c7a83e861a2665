//! Rich diagnostic error types for the demande extractor.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives.
//! Field extraction itself never fails: a missing field is an empty value, not an
//! error. What can fail is configuration, reading input, MIME intake,
//! the AI path and the sink.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::ai::AiError;
use crate::config::ConfigError;
use crate::intake::SinkError;
use crate::normalize::mime::MimeError;

/// Top-level error type.
///
/// Each variant wraps a subsystem-specific error, preserving its diagnostic
/// code and help text through to the CLI report.
#[derive(Debug, Error, Diagnostic)]
pub enum DemandeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mime(#[from] MimeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to read input: {}", path.display())]
    #[diagnostic(
        code(demande::input),
        help("Pass a readable file, or `-` to read from stdin.")
    )]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used across the crate.
pub type DemandeResult<T> = std::result::Result<T, DemandeError>;
