//! Rule-based recognizer: capitalised spans classified by gazetteer lookup and
//! local cues.
//!
//! A span is a run of capitalised words, optionally joined by lowercase
//! particles (`de`, `van`, `der`, ...). Greetings, weekdays, months and form
//! labels break spans. Each span is then classified:
//!
//! - known city, country or venue word → `Location`
//! - preceded by a location preposition of the language (`à`, `in`, `til`) → `Location`
//! - preceded by an honorific (`M.`, `Mrs`, `Hr.`) → `Person`
//! - listed in the person gazetteer, or two or more capitalised words → `Person`
//!
//! Single capitalised words without a cue are ignored; sentence-initial
//! capitals make them too noisy.

use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{Entity, EntityLabel, EntityRecognizer, NerError, NerResult};
use crate::geo;
use crate::lang::Language;
use crate::text::fold;

static CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\p{Lu}[\p{L}'’\-]*\p{L}(?:[ \t]+(?:(?:de|du|des|la|le|van|der|den|von|di|da|del|el)[ \t]+)?\p{Lu}[\p{L}'’\-]*\p{L})*",
    )
    .unwrap()
});

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}'’\-]+").unwrap());

const FRENCH_PREPOSITIONS: &[&str] = &["a", "vers", "depuis", "pour", "en", "au", "jusqu'a"];
const ENGLISH_PREPOSITIONS: &[&str] = &["in", "to", "from", "at", "near", "via", "into"];
const DANISH_PREPOSITIONS: &[&str] = &["i", "til", "fra", "ved", "via"];
/// Dutch cues, accepted by every recognizer for Dutch-labelled forms.
const SHARED_PREPOSITIONS: &[&str] = &["naar", "vanuit"];

const HONORIFICS: &[&str] = &[
    "m", "mr", "mrs", "ms", "mme", "mlle", "monsieur", "madame", "mademoiselle", "dr", "hr",
    "fru", "dhr", "mevr", "mevrouw", "meneer",
];

/// Capitalised words that never belong to a name or place span.
const SKIP_WORDS: &[&str] = &[
    // greetings and closings
    "bonjour", "bonsoir", "salut", "cher", "chere", "merci", "cordialement", "bien",
    "salutations", "hello", "hi", "dear", "thanks", "thank", "regards", "best", "kind",
    "sincerely", "hej", "kære", "kaere", "tak", "venlig", "hilsen", "med", "goedendag",
    "goedemiddag", "beste", "groeten", "vriendelijke",
    // honorifics (they cue a person but are not part of the name)
    "m", "mr", "mrs", "ms", "mme", "mlle", "monsieur", "madame", "mademoiselle", "dr", "hr",
    "fru", "dhr", "mevr", "mevrouw", "meneer",
    // weekdays
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche", "monday",
    "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "mandag", "tirsdag",
    "onsdag", "torsdag", "fredag", "lørdag", "søndag", "maandag", "dinsdag", "woensdag",
    "donderdag", "vrijdag", "zaterdag", "zondag",
    // months
    "janvier", "fevrier", "mars", "avril", "mai", "juin", "juillet", "aout", "septembre",
    "octobre", "novembre", "decembre", "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december", "januar", "februar",
    "marts", "juni", "juli", "oktober", "januari", "februari", "maart", "mei", "augustus",
    // form labels
    "nom", "prenom", "name", "naam", "navn", "email", "e-mail", "e-mailadres", "courriel",
    "telephone", "phone", "tel", "mobile", "date", "depart", "arrivee", "from", "to", "ville",
    "city", "pays", "country", "subject", "sujet", "objet", "re", "fwd", "tr", "vehicule",
    "vehicle", "passengers", "passagers", "personnes", "pax", "trip", "type", "voyage",
    "retour", "aller", "vertrekstad", "aankomststad", "vertrekdatum", "terugkeerdatum",
    "hoeveel", "voor", "lieu", "destination", "itinerary", "itineraire",
    // pronouns and articles that open sentences
    "je", "nous", "vous", "we", "i", "the", "le", "la", "les", "this", "my", "our", "jeg", "vi",
    "ik", "wij", "un", "une", "a", "an",
    // vehicles
    "bus", "van", "suv", "minibus", "minivan", "coach", "autocar", "car", "taxi", "limousine",
];

/// Optional extra entries for a language, stored as `<code>.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GazetteerFile {
    #[serde(default)]
    pub persons: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

impl GazetteerFile {
    /// Read a gazetteer file. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> NerResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|source| NerError::ModelRead {
            path: path.display().to_string(),
            source,
        })?;
        let file = toml::from_str(&content).map_err(|e| NerError::ModelParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(file))
    }
}

/// Gazetteer- and cue-based recognizer for one language.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    language: Language,
    locations: HashSet<String>,
    persons: HashSet<String>,
    prepositions: HashSet<&'static str>,
    skip_words: HashSet<String>,
}

impl GazetteerRecognizer {
    /// Recognizer seeded with the built-in city table and the language's cues.
    pub fn builtin(language: Language) -> Self {
        let own: &[&str] = match language {
            Language::French => FRENCH_PREPOSITIONS,
            Language::English => ENGLISH_PREPOSITIONS,
            Language::Danish => DANISH_PREPOSITIONS,
        };
        Self {
            language,
            locations: geo::CITY_COUNTRIES.iter().map(|(c, _)| fold(c)).collect(),
            persons: HashSet::new(),
            prepositions: own.iter().chain(SHARED_PREPOSITIONS).copied().collect(),
            skip_words: SKIP_WORDS.iter().map(|w| fold(w)).collect(),
        }
    }

    /// Extend the gazetteers with entries from a file.
    pub fn with_file(mut self, file: GazetteerFile) -> Self {
        self.locations.extend(file.locations.iter().map(|l| fold(l.trim())));
        self.persons.extend(file.persons.iter().map(|p| fold(p.trim())));
        self
    }

    /// Capitalised spans, split at skip words and trimmed of edge particles.
    fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut out = Vec::new();
        for cand in CANDIDATE.find_iter(text) {
            let mut current: Vec<Range<usize>> = Vec::new();
            for tok in TOKEN.find_iter(cand.as_str()) {
                let range = cand.start() + tok.start()..cand.start() + tok.end();
                if starts_upper(tok.as_str()) && self.skip_words.contains(&fold(tok.as_str())) {
                    close_span(text, &mut current, &mut out);
                } else {
                    current.push(range);
                }
            }
            close_span(text, &mut current, &mut out);
        }
        out
    }

    fn classify(&self, text: &str, span: &Range<usize>) -> Option<EntityLabel> {
        let surface = &text[span.clone()];
        let folded = fold(surface);
        let previous = previous_word(text, span.start);

        if self.locations.contains(&folded) || geo::is_venue(surface) || geo::is_country(surface)
        {
            return Some(EntityLabel::Location);
        }
        if self.prepositions.contains(previous.as_str()) {
            return Some(EntityLabel::Location);
        }
        if HONORIFICS.contains(&previous.as_str()) || self.persons.contains(&folded) {
            return Some(EntityLabel::Person);
        }
        let capitalised = TOKEN
            .find_iter(surface)
            .filter(|t| starts_upper(t.as_str()))
            .count();
        (capitalised >= 2).then_some(EntityLabel::Person)
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn language(&self) -> Option<Language> {
        Some(self.language)
    }

    fn recognize_entities(&self, text: &str) -> Vec<Entity> {
        self.spans(text)
            .into_iter()
            .filter_map(|span| {
                let label = self.classify(text, &span)?;
                Some(Entity {
                    text: text[span.clone()].to_string(),
                    span,
                    label,
                })
            })
            .collect()
    }
}

fn starts_upper(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

/// Push the accumulated tokens as one span, without lowercase particles at its edges.
fn close_span(text: &str, current: &mut Vec<Range<usize>>, out: &mut Vec<Range<usize>>) {
    while current.last().is_some_and(|r| !starts_upper(&text[r.clone()])) {
        current.pop();
    }
    let first_upper = current.iter().position(|r| starts_upper(&text[r.clone()]));
    if let (Some(first), Some(last)) = (first_upper, current.last()) {
        out.push(current[first].start..last.end);
    }
    current.clear();
}

/// The folded word immediately before byte offset `start`, punctuation removed.
fn previous_word(text: &str, start: usize) -> String {
    text[..start]
        .split_whitespace()
        .next_back()
        .map(|w| fold(w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')))
        .unwrap_or_default()
}
