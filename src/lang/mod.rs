//! Supported languages and language detection.

pub mod detect;

pub use detect::{DetectionResult, detect, detect_language, keyword_vote};

use serde::{Deserialize, Serialize};

/// The closed set of languages the rule-based path knows how to annotate.
///
/// Declaration order is the tie-break priority: French, then English, then Danish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "da")]
    Danish,
}

impl Language {
    /// All supported languages in priority order.
    pub const ALL: [Language; 3] = [Language::French, Language::English, Language::Danish];

    /// ISO 639-1 code, as stored in `langue_detectee`.
    pub fn code(self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
            Self::Danish => "da",
        }
    }

    /// Parse an ISO 639-1 code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" => Some(Self::French),
            "en" => Some(Self::English),
            "da" => Some(Self::Danish),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
