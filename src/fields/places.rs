//! Place, country and itinerary extraction.
//!
//! Candidates are gathered in priority order (departure label, arrival label,
//! generic city label, `A -> B` itinerary, location entities), filtered and
//! deduplicated. Venues and country names never count as cities.

use std::sync::LazyLock;

use regex::Regex;

use crate::geo;
use crate::ner::{Entity, EntityLabel};
use crate::text::{clean_value, squash_whitespace};

const MAX_PLACE_LEN: usize = 40;

static RE_DEPARTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t\-*>]*(?:from|ville de d[ée]part|lieu de d[ée]part|d[ée]part|departure city|departure|pick-?up|vertrekstad|vertrekplaats|vertrek|afrejsested|afgang|fra)[ \t]*[:|][ \t]*([^\n|]+)",
    )
    .unwrap()
});

static RE_ARRIVAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t\-*>]*(?:to|ville d'arriv[ée]e|lieu d'arriv[ée]e|arriv[ée]e|arrival city|arrival|destination|drop-?off|aankomststad|aankomstplaats|aankomst|bestemming|ankomst|til)[ \t]*[:|][ \t]*([^\n|]+)",
    )
    .unwrap()
});

static RE_CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t\-*>]*(?:ville|city|lieu|location|plaats|stad|by|sted)[ \t]*[:|][ \t]*([^\n|]+)")
        .unwrap()
});

static RE_COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t\-*>]*(?:pays|country|land)[ \t]*[:|][ \t]*([^\n|]+)").unwrap()
});

/// `Paris -> Lyon`, `Paris → Lyon`.
static RE_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\p{Lu}[\p{L}'’\-]+(?:[ \t]+\p{Lu}[\p{L}'’\-]+)*)[ \t]*(?:->|→|=>|—>)[ \t]*(\p{Lu}[\p{L}'’\-]+(?:[ \t]+\p{Lu}[\p{L}'’\-]+)*)",
    )
    .unwrap()
});

/// `Paris to Lyon`, `Amsterdam naar Brussel`, `Aarhus til Odense`.
static RE_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\b((?i:from|de|du|depuis|van|vanuit|fra))[ \t]+)?(\p{Lu}[\p{L}'’\-]+)[ \t]+(?:to|naar|til|vers|jusqu'à)[ \t]+(\p{Lu}[\p{L}'’\-]+)",
    )
    .unwrap()
});

/// Places found in a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Places {
    pub ville: String,
    pub villes: Vec<String>,
    pub pays: String,
    pub itinerary: String,
}

/// Whether a candidate can stand as a city.
fn is_city_candidate(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_PLACE_LEN
        && !name.contains('@')
        && !name.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
        && !geo::is_venue(name)
        && !geo::is_country(name)
}

/// Reduce a labelled value to a city: "12 rue de Rivoli, 75001 Paris, France"
/// becomes "Paris". `None` when nothing plausible remains.
pub fn reduce_place(value: &str) -> Option<String> {
    let value = clean_value(value);
    if value.is_empty() || value.contains('@') {
        return None;
    }
    let segments: Vec<String> = value
        .split([',', ';', '/'])
        .map(|segment| {
            let words: Vec<&str> = segment
                .split_whitespace()
                .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
                .collect();
            squash_whitespace(&clean_value(&words.join(" ")))
        })
        .filter(|s| !s.is_empty())
        .collect();

    segments
        .iter()
        .find(|s| geo::is_known_city(s))
        .or_else(|| segments.iter().find(|s| is_city_candidate(s)))
        .cloned()
}

fn labelled(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .find_map(|caps| reduce_place(caps.get(1)?.as_str()))
}

/// Itinerary endpoints from an arrow, or from "A to B" when it is anchored by
/// a "from" word or both ends are known cities.
fn itinerary_pattern(text: &str) -> Option<(String, String)> {
    if let Some(caps) = RE_ARROW.captures(text) {
        return Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()));
    }
    RE_TO.captures_iter(text).find_map(|caps| {
        let from = caps.get(2)?.as_str();
        let to = caps.get(3)?.as_str();
        let anchored = caps.get(1).is_some();
        (anchored || (geo::is_known_city(from) && geo::is_known_city(to)))
            .then(|| (from.to_string(), to.to_string()))
    })
}

/// Gather cities, the primary city, the country and the itinerary.
pub fn extract_places(text: &str, entities: &[Entity], telephone: &str) -> Places {
    let departure = labelled(&RE_DEPARTURE, text);
    let arrival = labelled(&RE_ARRIVAL, text);
    let city = labelled(&RE_CITY, text);
    let route = itinerary_pattern(text);

    let mut candidates: Vec<String> = Vec::new();
    candidates.extend(departure.clone());
    candidates.extend(arrival.clone());
    candidates.extend(city);
    if let Some((from, to)) = &route {
        candidates.push(from.clone());
        candidates.push(to.clone());
    }
    candidates.extend(
        entities
            .iter()
            .filter(|e| e.label == EntityLabel::Location)
            .map(|e| clean_value(&e.text)),
    );

    let mut villes: Vec<String> = Vec::new();
    for candidate in candidates {
        if is_city_candidate(&candidate) && !villes.contains(&candidate) {
            villes.push(candidate);
        }
    }
    let ville = villes.first().cloned().unwrap_or_default();

    let pays = RE_COUNTRY
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean_value(m.as_str()))
        .filter(|p| !p.is_empty())
        .or_else(|| geo::country_for_city(&ville).map(str::to_string))
        .or_else(|| geo::country_for_phone(telephone).map(str::to_string))
        .unwrap_or_default();

    let itinerary = match (departure, arrival) {
        (Some(from), Some(to)) => format!("{from}->{to}"),
        _ => route.map(|(from, to)| format!("{from}->{to}")).unwrap_or_default(),
    };

    Places {
        ville,
        villes,
        pays,
        itinerary,
    }
}
