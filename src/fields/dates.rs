//! Travel date extraction.
//!
//! Dates are searched in the folded text (lowercase, accents stripped), so
//! month names and keywords are written without diacritics below. Extraction
//! runs an ordered list of [`DateRule`]s and the first rule that yields a
//! start date wins:
//!
//! 1. relative weekday phrases ("semaine prochaine ... mardi", "next friday")
//! 2. explicit ranges: two dates joined by a connector ("du X au Y", "X - Y")
//! 3. labelled departure/return values ("Departure date: ...")
//! 4. every date mention in the block, future ones preferred
//!
//! Dates without a year take the current year. A month without a day resolves
//! to the first of the month as a start and the last of the month as an end.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;

use crate::text::fold;

/// Month names and abbreviations (FR, EN, DA, NL), folded.
const MONTHS: &[(&str, u32)] = &[
    ("janvier", 1), ("january", 1), ("januar", 1), ("januari", 1), ("janv", 1), ("jan", 1),
    ("fevrier", 2), ("february", 2), ("februar", 2), ("februari", 2), ("fevr", 2), ("fev", 2), ("feb", 2),
    ("mars", 3), ("march", 3), ("marts", 3), ("maart", 3), ("mar", 3),
    ("avril", 4), ("april", 4), ("avr", 4), ("apr", 4),
    ("mai", 5), ("may", 5), ("maj", 5), ("mei", 5),
    ("juin", 6), ("june", 6), ("juni", 6), ("jun", 6),
    ("juillet", 7), ("july", 7), ("juli", 7), ("juil", 7), ("jul", 7),
    ("aout", 8), ("august", 8), ("augustus", 8), ("aug", 8),
    ("septembre", 9), ("september", 9), ("sept", 9), ("sep", 9),
    ("octobre", 10), ("october", 10), ("oktober", 10), ("oct", 10), ("okt", 10),
    ("novembre", 11), ("november", 11), ("nov", 11),
    ("decembre", 12), ("december", 12), ("dec", 12),
];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("lundi", Weekday::Mon), ("mardi", Weekday::Tue), ("mercredi", Weekday::Wed),
    ("jeudi", Weekday::Thu), ("vendredi", Weekday::Fri), ("samedi", Weekday::Sat),
    ("dimanche", Weekday::Sun), ("monday", Weekday::Mon), ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed), ("thursday", Weekday::Thu), ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat), ("sunday", Weekday::Sun), ("mandag", Weekday::Mon),
    ("tirsdag", Weekday::Tue), ("onsdag", Weekday::Wed), ("torsdag", Weekday::Thu),
    ("fredag", Weekday::Fri), ("lørdag", Weekday::Sat), ("søndag", Weekday::Sun),
];

/// Regex alternation of the month names, longest first.
fn month_alternation() -> String {
    let mut names: Vec<&str> = MONTHS.iter().map(|(name, _)| *name).collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    names.join("|")
}

fn weekday_alternation() -> String {
    WEEKDAYS.iter().map(|(name, _)| *name).collect::<Vec<_>>().join("|")
}

// ── Regex patterns ──────────────────────────────────────────────────────

static RE_ISO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b").unwrap()
});

static RE_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})([/.\-])(\d{1,2})(?:[/.\-](\d{4}|\d{2}))?\b").unwrap()
});

static RE_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}})(?:er|st|nd|rd|th|\.)?\s+(?:de\s+|of\s+)?({})\b\.?(?:,?\s+(\d{{4}})\b)?",
        month_alternation()
    ))
    .unwrap()
});

static RE_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({})\b\.?\s+(\d{{4}})\b", month_alternation())).unwrap()
});

static RE_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b({})\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?",
        month_alternation()
    ))
    .unwrap()
});

static RE_NEXT_WEEK: LazyLock<Regex> = LazyLock::new(|| {
    let days = weekday_alternation();
    Regex::new(&format!(
        r"semaine prochaine[^\n.]*?\b({days})\b|\b({days})\b[^\n.]{{0,20}}?semaine prochaine|\bnext\s+({days})\b|\b({days})\s+next week\b|\bnæste\s+({days})\b"
    ))
    .unwrap()
});

static RE_FROM_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:a partir d[eu]|starting(?: from)?|fra og med)\s+({})\b",
        weekday_alternation()
    ))
    .unwrap()
});

static RE_DEPARTURE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:departure date|date de depart|date d'aller|vertrekdatum|afrejsedato|afgangsdato)\s*[:|]\s*([^\n]+)",
    )
    .unwrap()
});

static RE_RETURN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:return date|date de retour|terugkeerdatum|terugreisdatum|hjemrejsedato|returdato)\s*[:|]\s*([^\n]+)",
    )
    .unwrap()
});

static RE_CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:au|a|jusqu'au|to|till?|until|tot|t/m|-|–|and|et)\s*$").unwrap()
});

/// A bare start day left of a range connector: "du 3 au" in "du 3 au 7 octobre".
static RE_BARE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:du|from|van|fra|between|entre)\s+(\d{1,2})(?:er|st|nd|rd|th|\.)?\s*(?:au|a|jusqu'au|to|till?|until|tot|-|–|and|et)\s*$",
    )
    .unwrap()
});

// ── Date mentions ───────────────────────────────────────────────────────

/// Which end of a range an incomplete date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Start,
    End,
}

/// A date found in text, possibly missing its day or year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMention {
    /// Byte range in the folded text.
    pub span: Range<usize>,
    pub day: Option<u32>,
    pub month: u32,
    pub year: Option<i32>,
}

impl DateMention {
    /// Concrete date: the current year fills a missing year, and a missing
    /// day becomes the first or last of the month depending on `end`.
    pub fn resolve(&self, today: NaiveDate, end: RangeEnd) -> Option<NaiveDate> {
        let year = self.year.unwrap_or(today.year());
        if !(1900..=2100).contains(&year) {
            return None;
        }
        match (self.day, end) {
            (Some(day), _) => NaiveDate::from_ymd_opt(year, self.month, day),
            (None, RangeEnd::Start) => NaiveDate::from_ymd_opt(year, self.month, 1),
            (None, RangeEnd::End) => last_of_month(year, self.month),
        }
    }
}

fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()
    }
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, month)| *month)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(if s.len() == 2 { 2000 + year } else { year })
}

/// Day and month from two numeric components, day first unless only the
/// second one can be a day.
fn day_month(a: u32, b: u32) -> (u32, u32) {
    if b > 12 && a <= 12 { (b, a) } else { (a, b) }
}

/// Every date mention in folded text, ordered by position, non-overlapping.
pub fn find_mentions(folded: &str) -> Vec<DateMention> {
    let mut mentions: Vec<DateMention> = Vec::new();
    let push = |mention: DateMention, mentions: &mut Vec<DateMention>| {
        let overlaps = mentions
            .iter()
            .any(|m| m.span.start < mention.span.end && mention.span.start < m.span.end);
        if !overlaps && (1..=12).contains(&mention.month) {
            mentions.push(mention);
        }
    };

    for caps in RE_ISO.captures_iter(folded) {
        let (Some(all), Some(y), Some(m), Some(d)) = (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let (Ok(month), Ok(day)) = (m.as_str().parse(), d.as_str().parse()) else {
            continue;
        };
        push(
            DateMention { span: all.range(), day: Some(day), month, year: parse_year(y.as_str()) },
            &mut mentions,
        );
    }

    for caps in RE_NUMERIC.captures_iter(folded) {
        let (Some(all), Some(a), Some(sep), Some(b)) = (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let year = caps.get(4).and_then(|y| parse_year(y.as_str()));
        // Without a year only `D/M` is a date; `10-20` and `3.5` are not.
        if year.is_none() && sep.as_str() != "/" {
            continue;
        }
        if part_of_longer_number(folded, all.range()) {
            continue;
        }
        let (Ok(a), Ok(b)) = (a.as_str().parse(), b.as_str().parse()) else {
            continue;
        };
        let (day, month) = day_month(a, b);
        push(DateMention { span: all.range(), day: Some(day), month, year }, &mut mentions);
    }

    for caps in RE_DAY_MONTH.captures_iter(folded) {
        let (Some(all), Some(d), Some(m)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let (Ok(day), Some(month)) = (d.as_str().parse(), month_number(m.as_str())) else {
            continue;
        };
        let year = caps.get(3).and_then(|y| parse_year(y.as_str()));
        push(DateMention { span: all.range(), day: Some(day), month, year }, &mut mentions);
    }

    for caps in RE_MONTH_YEAR.captures_iter(folded) {
        let (Some(all), Some(m), Some(y)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(month) = month_number(m.as_str()) else {
            continue;
        };
        push(
            DateMention { span: all.range(), day: None, month, year: parse_year(y.as_str()) },
            &mut mentions,
        );
    }

    for caps in RE_MONTH_DAY.captures_iter(folded) {
        let (Some(all), Some(m), Some(d)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let (Some(month), Ok(day)) = (month_number(m.as_str()), d.as_str().parse()) else {
            continue;
        };
        let year = caps.get(3).and_then(|y| parse_year(y.as_str()));
        push(DateMention { span: all.range(), day: Some(day), month, year }, &mut mentions);
    }

    mentions.sort_by_key(|m| m.span.start);
    mentions
}

/// Whether a numeric match is a slice of a dotted/dashed number such as a
/// phone number written `06.12.34.56.78`.
fn part_of_longer_number(text: &str, span: Range<usize>) -> bool {
    let before = text[..span.start].as_bytes();
    let after = text[span.end..].as_bytes();
    let sep = |c: u8| matches!(c, b'.' | b'/' | b'-');
    let joined_before = before.len() >= 2
        && sep(before[before.len() - 1])
        && before[before.len() - 2].is_ascii_digit();
    let joined_after = after.len() >= 2 && sep(after[0]) && after[1].is_ascii_digit();
    joined_before || joined_after
}

/// First date in `text`, read as a start date.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    find_mentions(&fold(text))
        .first()
        .and_then(|m| m.resolve(today, RangeEnd::Start))
}

// ── Rules ───────────────────────────────────────────────────────────────

/// Start and optional end date of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    fn single(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    /// Build a range from two dates. An implicit-year end before its start
    /// rolls into the next year; otherwise reversed dates are swapped.
    fn between(start: NaiveDate, end: NaiveDate, end_year_implicit: bool) -> Self {
        let end = if end < start && end_year_implicit {
            end.with_year(end.year() + 1).unwrap_or(end)
        } else {
            end
        };
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        Self {
            start,
            end: (end != start).then_some(end),
        }
    }

    /// `(date_debut, date_fin)` as `YYYY-MM-DD` strings, empty when absent.
    pub fn to_strings(self) -> (String, String) {
        (
            self.start.format("%Y-%m-%d").to_string(),
            self.end.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        )
    }
}

/// One step of the date cascade, applied to folded text.
pub struct DateRule {
    pub name: &'static str,
    pub apply: fn(&str, NaiveDate) -> Option<DateRange>,
}

pub const DATE_RULES: &[DateRule] = &[
    DateRule { name: "relative", apply: relative_rule },
    DateRule { name: "range", apply: range_rule },
    DateRule { name: "labelled", apply: labelled_rule },
    DateRule { name: "mentions", apply: mentions_rule },
];

/// Run the cascade; `None` when the text holds no usable date.
pub fn extract_dates(text: &str, today: NaiveDate) -> Option<DateRange> {
    let folded = fold(text);
    DATE_RULES.iter().find_map(|rule| {
        let range = (rule.apply)(&folded, today)?;
        tracing::trace!(rule = rule.name, start = %range.start, "date rule matched");
        Some(range)
    })
}

fn weekday_named(name: &str) -> Option<Weekday> {
    WEEKDAYS.iter().find(|(n, _)| *n == name).map(|(_, wd)| *wd)
}

/// First `weekday` strictly after `base`.
fn weekday_after(base: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + weekday.num_days_from_monday() - base.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    base.checked_add_days(Days::new(u64::from(ahead)))
}

/// "semaine prochaine ... mardi" / "next tuesday": the weekday after today + 7.
/// "à partir de mardi": the weekday after today.
pub fn relative_rule(folded: &str, today: NaiveDate) -> Option<DateRange> {
    if let Some(caps) = RE_NEXT_WEEK.captures(folded) {
        let name = caps.iter().skip(1).flatten().next()?;
        let base = today.checked_add_days(Days::new(7))?;
        return weekday_after(base, weekday_named(name.as_str())?).map(DateRange::single);
    }
    let caps = RE_FROM_WEEKDAY.captures(folded)?;
    weekday_after(today, weekday_named(caps.get(1)?.as_str())?).map(DateRange::single)
}

/// Labelled departure/return values, as written by forms or by alias injection.
pub fn labelled_rule(folded: &str, today: NaiveDate) -> Option<DateRange> {
    let departure = RE_DEPARTURE_LABEL
        .captures(folded)
        .and_then(|c| find_mentions(c.get(1)?.as_str()).into_iter().next())?;
    let start = departure.resolve(today, RangeEnd::Start)?;

    let ret = RE_RETURN_LABEL
        .captures(folded)
        .and_then(|c| find_mentions(c.get(1)?.as_str()).into_iter().next());
    match ret.and_then(|m| Some((m.resolve(today, RangeEnd::End)?, m.year.is_none()))) {
        Some((end, implicit)) => Some(DateRange::between(start, end, implicit)),
        None => Some(DateRange::single(start)),
    }
}

/// Two dates joined by a range connector. The start may be a bare day that
/// borrows its month and year from the end ("du 3 au 7 octobre").
pub fn range_rule(folded: &str, today: NaiveDate) -> Option<DateRange> {
    let mentions = find_mentions(folded);

    for (i, end) in mentions.iter().enumerate() {
        let start = match i.checked_sub(1).map(|j| &mentions[j]) {
            Some(prev) if RE_CONNECTOR.is_match(&folded[prev.span.end..end.span.start]) => {
                prev.clone()
            }
            _ => {
                let floor = i.checked_sub(1).map_or(0, |j| mentions[j].span.end);
                let Some(caps) = RE_BARE_START.captures(&folded[floor..end.span.start]) else {
                    continue;
                };
                let Some(day) = caps.get(1).and_then(|d| d.as_str().parse().ok()) else {
                    continue;
                };
                DateMention { span: end.span.clone(), day: Some(day), month: end.month, year: end.year }
            }
        };
        let (Some(s), Some(e)) = (start.resolve(today, RangeEnd::Start), end.resolve(today, RangeEnd::End))
        else {
            continue;
        };
        return Some(DateRange::between(s, e, end.year.is_none()));
    }
    None
}

/// Every mention; future dates win when there are any.
pub fn mentions_rule(folded: &str, today: NaiveDate) -> Option<DateRange> {
    let mut dates: Vec<NaiveDate> = find_mentions(folded)
        .iter()
        .filter_map(|m| m.resolve(today, RangeEnd::Start))
        .collect();
    if dates.iter().any(|d| *d >= today) {
        dates.retain(|d| *d >= today);
    }
    dates.sort();
    dates.dedup();
    let start = *dates.first()?;
    let end = dates.last().copied().filter(|d| *d != start);
    Some(DateRange { start, end })
}
