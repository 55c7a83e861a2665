// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # demande-extract
//!
//! Turns free-form ground-transport booking emails (French, English, Danish,
//! with Dutch form labels) into structured `demande` records.
//!
//! ## Architecture
//!
//! - **Normalizer** (`normalize`): MIME parts and HTML to one text string
//! - **Language detection** (`lang`): keyword voting over fr/en/da
//! - **Entity recognition** (`ner`): per-language recognizers behind a lazy registry
//! - **Field extractors** (`fields`): name, contact, dates, party size, places, vehicle
//! - **Segmenter** (`segment`): label-alias injection and block splitting
//! - **Orchestrators**: rule-based (`extract`) and LLM-backed (`ai`)
//! - **Selection** (`select`): dedup and best-record choice
//! - **Intake** (`intake`): the per-email pipeline with AI fallback and sinks
//!
//! ## Library usage
//!
//! ```no_run
//! use demande_extract::{extraire_infos, extraire_infos_ai};
//!
//! let text = "Bonjour, je voudrais louer un minibus à Lyon pour 12 personnes.";
//! let records = extraire_infos_ai(text).unwrap_or_else(|_| extraire_infos(text));
//! println!("{}", records[0].ville);
//! ```

pub mod ai;
pub mod config;
pub mod error;
pub mod extract;
pub mod fields;
pub mod geo;
pub mod intake;
pub mod lang;
pub mod ner;
pub mod normalize;
pub mod record;
pub mod segment;
pub mod select;
pub mod text;

pub use ai::extraire_infos_ai;
pub use error::{DemandeError, DemandeResult};
pub use extract::extraire_infos;
pub use record::ExtractedRecord;
