//! Party size (number of passengers) extraction.
//!
//! An ordered list of [`PartyRule`]s over the folded text; the first rule that
//! matches wins. Results are a bare integer (`"12"`) or a range (`"10-20"`).

use std::sync::LazyLock;

use regex::Regex;

use crate::text::fold;

/// Words that count people (FR, EN, DA, NL), folded.
const PEOPLE: &str = "personnes|personne|pers|people|persons|person|passengers|passenger|passagers|passager|pax|participants|participant|travellers|travelers|voyageurs|reizigers|personen|personer|deltagere|rejsende|adultes|adults|voksne|guests|invites|gaester|gæster";

const SPELLED: &[(&str, u32)] = &[
    ("un", 1), ("une", 1), ("one", 1), ("deux", 2), ("two", 2), ("trois", 3), ("three", 3),
    ("quatre", 4), ("four", 4), ("cinq", 5), ("five", 5), ("six", 6), ("sept", 7),
    ("seven", 7), ("huit", 8), ("eight", 8), ("neuf", 9), ("nine", 9), ("dix", 10),
    ("ten", 10), ("onze", 11), ("eleven", 11), ("douze", 12), ("twelve", 12),
    ("treize", 13), ("thirteen", 13), ("quatorze", 14), ("fourteen", 14), ("quinze", 15),
    ("fifteen", 15), ("seize", 16), ("sixteen", 16),
];

// ── Regex patterns ──────────────────────────────────────────────────────

/// A people label followed by `:` or `|` within the same row, as in
/// "Hoeveel reizigers nemen deel aan deze reis? | 10 - 20". The label is the
/// first cell of its line: no digit or separator may precede the value.
static RE_LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[^\n\d:|]{0,60}\b(?:passengers|passagers|nombre de personnes|nb personnes|personnes|pax|number of people|people|group size|reizigers|aantal personen|antal personer|personer|deltagere|participants)[^\n\d|:]{0,40}[:|][ \t]*(\d{1,4})(?:[ \t]*(?:-|–|a|to|tot|til)[ \t]*(\d{1,4}))?\b",
    )
    .unwrap()
});

/// A labelled value that continues as a date ("12/10/2026") is not a count.
static RE_DATE_TAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[/.\-]\d").unwrap());

static RE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:(?:entre|between|mellem|tussen)\s+)?(\d{{1,4}})\s*(?:-|–|a|to|til|tot|et|and|og|en)\s*(\d{{1,4}})\s*(?:{PEOPLE})\b"
    ))
    .unwrap()
});

static RE_ADULTS_CHILDREN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,3})\s*(?:adultes?|adults?|voksne|volwassenen)\s*(?:,|et|and|\+|og|en|&)?\s*(\d{1,3})\s*(?:enfants?|children|child|kids|børn|kinderen)\b",
    )
    .unwrap()
});

static RE_DIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,4}})\s*(?:{PEOPLE})\b|\b(?:group of|groupe de|gruppe pa|groep van)\s+(\d{{1,4}})\b"
    ))
    .unwrap()
});

static RE_SPELLED: LazyLock<Regex> = LazyLock::new(|| {
    let words = SPELLED.iter().map(|(w, _)| *w).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"\b({words})\s+(?:{PEOPLE})\b")).unwrap()
});

// ── Rules ───────────────────────────────────────────────────────────────

/// One step of the party-size cascade, applied to folded text.
pub struct PartyRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<String>,
}

/// Ranges come before single numbers so "20 à 30 personnes" is not read as 30.
pub const PARTY_RULES: &[PartyRule] = &[
    PartyRule { name: "labelled", apply: labelled_rule },
    PartyRule { name: "range", apply: range_rule },
    PartyRule { name: "adults_children", apply: adults_children_rule },
    PartyRule { name: "direct", apply: direct_rule },
    PartyRule { name: "spelled", apply: spelled_rule },
];

/// Party size as `"N"` or `"N-M"`; empty when nothing matches.
pub fn extract_party_size(text: &str) -> String {
    let folded = fold(text);
    PARTY_RULES
        .iter()
        .find_map(|rule| {
            let size = (rule.apply)(&folded)?;
            tracing::trace!(rule = rule.name, size = %size, "party rule matched");
            Some(size)
        })
        .unwrap_or_default()
}

fn number_or_range(low: &str, high: Option<&str>) -> Option<String> {
    let low: u32 = low.parse().ok()?;
    match high.and_then(|h| h.parse::<u32>().ok()) {
        Some(high) if high > low => Some(format!("{low}-{high}")),
        Some(high) if high < low => Some(format!("{high}-{low}")),
        _ => (low > 0).then(|| low.to_string()),
    }
}

pub fn labelled_rule(folded: &str) -> Option<String> {
    let caps = RE_LABELLED.captures(folded)?;
    if RE_DATE_TAIL.is_match(&folded[caps.get(0)?.end()..]) {
        return None;
    }
    number_or_range(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
}

pub fn range_rule(folded: &str) -> Option<String> {
    let caps = RE_RANGE.captures(folded)?;
    number_or_range(caps.get(1)?.as_str(), Some(caps.get(2)?.as_str()))
}

pub fn adults_children_rule(folded: &str) -> Option<String> {
    let caps = RE_ADULTS_CHILDREN.captures(folded)?;
    let adults: u32 = caps.get(1)?.as_str().parse().ok()?;
    let children: u32 = caps.get(2)?.as_str().parse().ok()?;
    Some((adults + children).to_string())
}

pub fn direct_rule(folded: &str) -> Option<String> {
    RE_DIRECT.captures_iter(folded).find_map(|caps| {
        let n = caps.get(1).or_else(|| caps.get(2))?;
        number_or_range(n.as_str(), None)
    })
}

pub fn spelled_rule(folded: &str) -> Option<String> {
    let caps = RE_SPELLED.captures(folded)?;
    let word = caps.get(1)?.as_str();
    SPELLED
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| n.to_string())
}
