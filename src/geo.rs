//! Static geography tables: city → country, country names, venue words and
//! phone calling codes.
//!
//! The city table is deliberately small. A city outside it yields no country
//! from the lookup, and country inference falls through to the phone prefix.

use crate::text::fold;

/// Known cities (including local and French/English exonyms) and their country.
pub const CITY_COUNTRIES: &[(&str, &str)] = &[
    // France
    ("paris", "France"),
    ("lyon", "France"),
    ("marseille", "France"),
    ("nice", "France"),
    ("bordeaux", "France"),
    ("toulouse", "France"),
    ("lille", "France"),
    ("nantes", "France"),
    ("strasbourg", "France"),
    ("montpellier", "France"),
    ("rennes", "France"),
    ("cannes", "France"),
    ("annecy", "France"),
    ("grenoble", "France"),
    ("reims", "France"),
    // United Kingdom
    ("london", "United Kingdom"),
    ("londres", "United Kingdom"),
    ("manchester", "United Kingdom"),
    ("liverpool", "United Kingdom"),
    ("edinburgh", "United Kingdom"),
    ("birmingham", "United Kingdom"),
    // Denmark
    ("københavn", "Denmark"),
    ("kobenhavn", "Denmark"),
    ("copenhagen", "Denmark"),
    ("copenhague", "Denmark"),
    ("aarhus", "Denmark"),
    ("odense", "Denmark"),
    ("aalborg", "Denmark"),
    ("esbjerg", "Denmark"),
    // Netherlands
    ("amsterdam", "Netherlands"),
    ("rotterdam", "Netherlands"),
    ("utrecht", "Netherlands"),
    ("den haag", "Netherlands"),
    ("the hague", "Netherlands"),
    ("la haye", "Netherlands"),
    ("eindhoven", "Netherlands"),
    ("groningen", "Netherlands"),
    ("maastricht", "Netherlands"),
    // Belgium
    ("bruxelles", "Belgium"),
    ("brussels", "Belgium"),
    ("brussel", "Belgium"),
    ("antwerpen", "Belgium"),
    ("antwerp", "Belgium"),
    ("anvers", "Belgium"),
    ("gent", "Belgium"),
    ("gand", "Belgium"),
    ("ghent", "Belgium"),
    ("bruges", "Belgium"),
    ("brugge", "Belgium"),
    ("liege", "Belgium"),
    // Germany
    ("berlin", "Germany"),
    ("munich", "Germany"),
    ("münchen", "Germany"),
    ("hamburg", "Germany"),
    ("frankfurt", "Germany"),
    ("cologne", "Germany"),
    ("köln", "Germany"),
    // Spain
    ("madrid", "Spain"),
    ("barcelona", "Spain"),
    ("barcelone", "Spain"),
    ("seville", "Spain"),
    ("sevilla", "Spain"),
    ("valencia", "Spain"),
    ("malaga", "Spain"),
    // Italy
    ("rome", "Italy"),
    ("roma", "Italy"),
    ("milan", "Italy"),
    ("milano", "Italy"),
    ("venice", "Italy"),
    ("venise", "Italy"),
    ("florence", "Italy"),
    ("firenze", "Italy"),
    // Portugal
    ("lisbon", "Portugal"),
    ("lisbonne", "Portugal"),
    ("lisboa", "Portugal"),
    ("porto", "Portugal"),
    // Switzerland
    ("geneve", "Switzerland"),
    ("geneva", "Switzerland"),
    ("zurich", "Switzerland"),
    ("lausanne", "Switzerland"),
    ("basel", "Switzerland"),
    // Morocco
    ("casablanca", "Morocco"),
    ("marrakech", "Morocco"),
    ("rabat", "Morocco"),
    ("tanger", "Morocco"),
    ("tangier", "Morocco"),
    ("fes", "Morocco"),
    ("agadir", "Morocco"),
    // Elsewhere
    ("dublin", "Ireland"),
    ("vienna", "Austria"),
    ("wien", "Austria"),
    ("vienne", "Austria"),
    ("prague", "Czech Republic"),
    ("stockholm", "Sweden"),
    ("oslo", "Norway"),
    ("luxembourg", "Luxembourg"),
];

/// Country names (several languages) that must never be taken as a city.
pub const COUNTRY_NAMES: &[&str] = &[
    "france", "danemark", "denmark", "danmark", "angleterre", "england", "royaume-uni",
    "united kingdom", "uk", "belgique", "belgium", "belgie", "allemagne", "germany",
    "deutschland", "espagne", "spain", "italie", "italy", "portugal", "suisse", "switzerland",
    "maroc", "morocco", "nederland", "netherlands", "pays-bas", "holland", "ireland", "irlande",
    "austria", "autriche", "sweden", "suede", "norway", "norvege", "europe",
];

/// Words that mark a venue or landmark rather than a city.
pub const VENUE_WORDS: &[&str] = &[
    "airport", "aeroport", "aéroport", "lufthavn", "luchthaven", "station", "gare", "banegård",
    "banegard", "hotel", "hôtel", "hotell", "center", "centre", "centrum", "stadium", "stade",
    "museum", "musée", "musee", "terminal", "port", "harbour", "havn", "haven", "university",
    "université", "universite", "universitet", "hospital", "hôpital", "hopital", "church",
    "église", "eglise", "kirke", "restaurant", "arena", "palais", "palace", "castle", "château",
    "chateau", "slot", "park", "parc", "campus", "venue", "street", "rue", "avenue", "boulevard",
    "road", "gade", "straat", "vej",
];

/// Country calling codes, longest prefixes first.
pub const CALLING_CODES: &[(&str, &str)] = &[
    ("212", "Morocco"),
    ("351", "Portugal"),
    ("352", "Luxembourg"),
    ("353", "Ireland"),
    ("31", "Netherlands"),
    ("32", "Belgium"),
    ("33", "France"),
    ("34", "Spain"),
    ("39", "Italy"),
    ("41", "Switzerland"),
    ("43", "Austria"),
    ("44", "United Kingdom"),
    ("45", "Denmark"),
    ("46", "Sweden"),
    ("47", "Norway"),
    ("49", "Germany"),
    ("1", "United States"),
];

/// Country of a known city, matched case- and accent-insensitively.
pub fn country_for_city(city: &str) -> Option<&'static str> {
    let key = fold(city.trim());
    CITY_COUNTRIES
        .iter()
        .find(|(name, _)| fold(name) == key)
        .map(|(_, country)| *country)
}

/// Whether `name` is a known city.
pub fn is_known_city(name: &str) -> bool {
    country_for_city(name).is_some()
}

/// Whether `name` is a country name.
pub fn is_country(name: &str) -> bool {
    let key = fold(name.trim());
    COUNTRY_NAMES.iter().any(|c| fold(c) == key)
}

/// Whether `name` contains a venue/landmark word.
pub fn is_venue(name: &str) -> bool {
    let folded = fold(name);
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|word| VENUE_WORDS.iter().any(|v| fold(v) == word))
}

/// Country inferred from an international phone number (`+CC...` or `00CC...`).
///
/// National numbers without a prefix yield `None`.
pub fn country_for_phone(phone: &str) -> Option<&'static str> {
    let digits = if let Some(rest) = phone.strip_prefix('+') {
        rest
    } else if let Some(rest) = phone.strip_prefix("00") {
        rest
    } else {
        return None;
    };
    CALLING_CODES
        .iter()
        .find(|(code, _)| digits.starts_with(code))
        .map(|(_, country)| *country)
}
