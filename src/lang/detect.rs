//! Language detection via marker-word frequency with a keyword-vote fallback.
//!
//! Two stages, both dependency-free:
//!
//! 1. **Statistical**: frequency of high-frequency function words per language,
//!    normalised by word count, plus diacritic evidence (`é`/`ç` for French,
//!    `æ`/`ø`/`å` for Danish). A clear winner is returned with a confidence.
//! 2. **Keyword vote**: when the text is empty or the classifier cannot separate
//!    the languages, count domain keywords (greetings, rental vocabulary) per
//!    language. Ties resolve in priority order French > English > Danish, and a
//!    vote with no hits defaults to French.

use super::Language;

/// Result of language detection for a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub language: Language,
    /// Confidence score (0.0–1.0).
    pub confidence: f32,
    /// Whether the keyword vote decided instead of the classifier.
    pub fallback: bool,
}

const FRENCH_MARKERS: &[&str] = &[
    "le", "la", "les", "des", "du", "au", "aux", "est", "dans", "avec", "une", "un", "sur",
    "pour", "pas", "qui", "que", "je", "nous", "vous", "mais", "cette", "ces", "notre", "votre",
    "bonjour", "merci", "cordialement", "voudrais", "souhaite", "personnes",
];

const ENGLISH_MARKERS: &[&str] = &[
    "the", "is", "are", "was", "with", "from", "this", "that", "and", "for", "not", "have",
    "will", "would", "could", "we", "you", "my", "our", "to", "of", "please", "hello",
    "thanks", "regards", "people", "need",
];

const DANISH_MARKERS: &[&str] = &[
    "og", "er", "det", "jeg", "vi", "til", "på", "med", "har", "ikke", "som", "af", "fra",
    "vil", "gerne", "skal", "kan", "hej", "tak", "venlig", "hilsen", "personer", "bus",
];

/// Keyword sets for the fallback vote, matched as substrings of the lowercased text.
const FRENCH_KEYWORDS: &[&str] = &[
    "bonjour", "merci", "voiture", "location", "réservation", "demande",
];
const ENGLISH_KEYWORDS: &[&str] = &["hello", "thank", "car", "rental", "booking", "request"];
const DANISH_KEYWORDS: &[&str] = &["hej", "tak", "bil", "leje", "booking"];

/// Minimum normalised marker score for the classifier to commit.
const MIN_SCORE: f32 = 0.02;

/// Detect the language of a text block.
pub fn detect(text: &str) -> Language {
    detect_language(text).language
}

/// Detect the language of a text block, with confidence.
pub fn detect_language(text: &str) -> DetectionResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DetectionResult {
            language: Language::French,
            confidence: 0.0,
            fallback: true,
        };
    }

    classify(trimmed).unwrap_or_else(|| DetectionResult {
        language: keyword_vote(trimmed),
        confidence: 0.3,
        fallback: true,
    })
}

/// Marker-word classifier. `None` when there is no clear winner.
fn classify(text: &str) -> Option<DetectionResult> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }

    let mut scores = [0.0f32; 3];
    for word in &words {
        if FRENCH_MARKERS.contains(word) {
            scores[0] += 1.0;
        }
        if ENGLISH_MARKERS.contains(word) {
            scores[1] += 1.0;
        }
        if DANISH_MARKERS.contains(word) {
            scores[2] += 1.0;
        }
    }

    if lower.contains(['é', 'è', 'ê', 'ç', 'à', 'ù', 'î', 'ô', 'œ']) {
        scores[0] += 2.0;
    }
    if lower.contains(['æ', 'ø', 'å']) {
        scores[2] += 3.0;
    }

    let word_count = words.len() as f32;
    let mut ranked: Vec<(Language, f32)> = Language::ALL
        .iter()
        .zip(scores)
        .map(|(lang, score)| (*lang, score / word_count))
        .collect();
    // Stable sort keeps priority order among equal scores.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (language, best) = ranked[0];
    let second = ranked[1].1;
    if best < MIN_SCORE || (best - second).abs() < f32::EPSILON {
        return None;
    }

    Some(DetectionResult {
        language,
        confidence: (0.60 + (best - second).min(0.25)).min(0.85),
        fallback: false,
    })
}

/// Count keyword hits per language; ties go to the higher-priority language.
pub fn keyword_vote(text: &str) -> Language {
    let lower = text.to_lowercase();
    let count = |keywords: &[&str]| keywords.iter().filter(|k| lower.contains(*k)).count();

    let counts = [
        (Language::French, count(FRENCH_KEYWORDS)),
        (Language::English, count(ENGLISH_KEYWORDS)),
        (Language::Danish, count(DANISH_KEYWORDS)),
    ];

    let mut winner = counts[0];
    for candidate in &counts[1..] {
        if candidate.1 > winner.1 {
            winner = *candidate;
        }
    }
    winner.0
}
