//! Email address and phone number extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::digit_count;

// ── Regex patterns ──────────────────────────────────────────────────────

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

/// A leading digit run, or an international prefix (`+`, `00`) whose country
/// code may be followed by a one-digit group (`+33 6`). Then groups of 2 to 4
/// digits behind a single separator or a parenthesised trunk prefix (`(0)6`).
/// A lone digit after the number ("78 2 adultes") ends it.
static RE_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:\+{1,2}|00)(?:\d{1,4}[ \t.\-]\d{1,12}|\d{1,15})|\d{1,15})\b(?:(?:[ \t.\-]?\(\d{1,4}\)[ \t.\-]?\d{1,4}|[ \t.\-]\d{2,4})\b)*",
    )
    .unwrap()
});

static RE_DATE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[.\-]\d{1,2}[.\-]\d{2,4})$").unwrap()
});

const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;

/// First email address in `text`, domain lowercased. Empty when none.
pub fn extract_email(text: &str) -> String {
    RE_EMAIL
        .find(text)
        .map(|m| normalize_email(m.as_str()))
        .unwrap_or_default()
}

/// Lowercase the domain part; the local part is kept as written.
pub fn normalize_email(address: &str) -> String {
    match address.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => address.trim().to_string(),
    }
}

/// First phone-like run with 8 to 15 digits, normalised to digits and a
/// leading `+`. Date-shaped runs are skipped. Empty when none.
pub fn extract_phone(text: &str) -> String {
    RE_PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|raw| !RE_DATE_LIKE.is_match(raw))
        .filter(|raw| (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digit_count(raw)))
        .map(normalize_phone)
        .next()
        .unwrap_or_default()
}

/// Keep digits and `+`, collapsing repeated leading `+` signs.
pub fn normalize_phone(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    let digits = kept.trim_start_matches('+');
    if kept.starts_with('+') {
        // A `+` inside the number is noise.
        format!("+{}", digits.replace('+', ""))
    } else {
        digits.replace('+', "")
    }
}
