//! Named-entity recognition for person and place mentions.
//!
//! Each supported [`Language`] has its own recognizer behind the
//! [`EntityRecognizer`] trait. Recognizers are loaded lazily through the
//! process-wide [`RecognizerRegistry`]; when loading fails the registry hands
//! out a [`BlankRecognizer`] so extraction continues with reduced recall.

pub mod gazetteer;
pub mod registry;

pub use gazetteer::{GazetteerFile, GazetteerRecognizer};
pub use registry::{BuiltinLoader, ModelLoader, RecognizerRegistry};

use std::ops::Range;

use miette::Diagnostic;
use thiserror::Error;

use crate::lang::Language;

/// Errors raised while loading a recognizer model.
///
/// Never surfaced to extraction callers: the registry degrades to a blank
/// recognizer instead.
#[derive(Debug, Error, Diagnostic)]
pub enum NerError {
    #[error("failed to read entity model: {path}")]
    #[diagnostic(
        code(demande::ner::model_read),
        help("Check that the gazetteer directory exists and the file is readable.")
    )]
    ModelRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse entity model {path}: {message}")]
    #[diagnostic(
        code(demande::ner::model_parse),
        help("Gazetteer files are TOML with optional `persons` and `locations` string arrays.")
    )]
    ModelParse { path: String, message: String },
}

pub type NerResult<T> = std::result::Result<T, NerError>;

/// Entity classes the extractors care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    /// A person (PER).
    Person,
    /// A city, region or landmark (LOC/GPE).
    Location,
}

/// A recognized span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    /// Byte range in the annotated text.
    pub span: Range<usize>,
    pub label: EntityLabel,
}

/// A per-language entity recognizer.
pub trait EntityRecognizer: Send + Sync {
    /// Language this recognizer was built for; `None` for the blank fallback.
    fn language(&self) -> Option<Language>;

    /// Entities in `text`, ordered by start offset, non-overlapping.
    fn recognize_entities(&self, text: &str) -> Vec<Entity>;
}

/// Recognizer used when a language model is unavailable: finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlankRecognizer;

impl EntityRecognizer for BlankRecognizer {
    fn language(&self) -> Option<Language> {
        None
    }

    fn recognize_entities(&self, _text: &str) -> Vec<Entity> {
        Vec::new()
    }
}

/// Texts of the entities carrying `label`, in order.
pub fn texts_with_label(entities: &[Entity], label: EntityLabel) -> Vec<&str> {
    entities
        .iter()
        .filter(|e| e.label == label)
        .map(|e| e.text.as_str())
        .collect()
}
