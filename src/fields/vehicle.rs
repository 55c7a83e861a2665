//! Vehicle type and trip type extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::{TRIP_ONE_WAY, TRIP_ROUND};

/// Vehicle vocabulary in match priority order: specific before generic.
pub const VEHICLES: &[&str] = &[
    "minibus", "minivan", "midibus", "autocar", "touringcar", "kleinbus", "coach", "bus",
    "limousine", "berline", "sedan", "monospace", "SUV", "4x4", "van", "camionnette",
    "camionette", "truck", "lastbil", "voiture", "citadine", "hatchback", "taxi", "car", "bil",
];

/// One case-insensitive word-boundary regex per vocabulary entry.
static VEHICLE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    VEHICLES
        .iter()
        .map(|v| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(v))).unwrap();
            (re, *v)
        })
        .collect()
});

/// "van" in a name or place ("Jan van Dijk", "van der Berg") is not a vehicle.
static RE_VAN_PARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(?:\p{Lu}|de\b|der\b|den\b|het\b)").unwrap());

/// Bare "retour" only counts as a form value ("Type reis | Retour"); in
/// running text it is usually "dans l'attente de votre retour".
static RE_ROUND_TRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:aller[- ]retour|aller et retour|a/r|round[- ]trip|return trip|return journey|retourreis|heen en terug|tur[- ]retur|returrejse)\b|[:|][ \t]*retour[ \t]*(?:$|\n|\|)",
    )
    .unwrap()
});

static RE_ONE_WAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:aller simple|one[- ]way|single trip|single journey|enkele reis|enkeltrejse|enkel rejse|envejs)\b",
    )
    .unwrap()
});

/// First vocabulary entry found in `text`, in vocabulary spelling. Empty when none.
pub fn extract_vehicle(text: &str) -> String {
    VEHICLE_PATTERNS
        .iter()
        .find(|(re, word)| {
            re.find_iter(text).any(|m| {
                !(word.eq_ignore_ascii_case("van") && RE_VAN_PARTICLE.is_match(&text[m.end()..]))
            })
        })
        .map(|(_, word)| (*word).to_string())
        .unwrap_or_default()
}

/// `"aller-retour"`, `"aller simple"`, or empty.
pub fn extract_trip_type(text: &str) -> String {
    if RE_ROUND_TRIP.is_match(text) {
        TRIP_ROUND.to_string()
    } else if RE_ONE_WAY.is_match(text) {
        TRIP_ONE_WAY.to_string()
    } else {
        String::new()
    }
}
