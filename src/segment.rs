//! Block segmentation and label-alias injection.
//!
//! Forms arrive as `Label | Value` table rows (HTML tables converted by the
//! normalizer) or `Label: Value` lines, labelled in whichever language the
//! sender used. [`inject_aliases`] recognises the labels and appends one
//! canonical English line per field, so the field extractors only need to know
//! the English vocabulary. [`split_blocks`] then cuts the text at blank lines.

use std::sync::LazyLock;

use regex::Regex;

use crate::record::Block;
use crate::text::{clean_value, fold};

/// Longest text still treated as a label.
pub const MAX_LABEL_LEN: usize = 40;

/// Keywords shorter than this only match whole words.
const SUBSTRING_MIN_LEN: usize = 5;

static RE_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").unwrap());

/// Fields a form label can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Email,
    Name,
    Phone,
    Departure,
    Arrival,
    City,
    DepartureDate,
    ReturnDate,
    PartySize,
    Vehicle,
    TripType,
}

impl FieldKey {
    /// Order in which labels are tested. Compound labels ("date de départ")
    /// come before the fields their words also belong to ("départ").
    pub const CHECK_ORDER: [FieldKey; 11] = [
        FieldKey::Email,
        FieldKey::Phone,
        FieldKey::ReturnDate,
        FieldKey::DepartureDate,
        FieldKey::TripType,
        FieldKey::Vehicle,
        FieldKey::PartySize,
        FieldKey::Arrival,
        FieldKey::Departure,
        FieldKey::City,
        FieldKey::Name,
    ];

    /// Order of the appended canonical lines.
    pub const OUTPUT_ORDER: [FieldKey; 11] = [
        FieldKey::Email,
        FieldKey::Name,
        FieldKey::Phone,
        FieldKey::Departure,
        FieldKey::Arrival,
        FieldKey::City,
        FieldKey::DepartureDate,
        FieldKey::ReturnDate,
        FieldKey::PartySize,
        FieldKey::Vehicle,
        FieldKey::TripType,
    ];

    /// English label written by [`inject_aliases`].
    pub fn canonical_label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Name => "Name",
            Self::Phone => "Phone",
            Self::Departure => "From",
            Self::Arrival => "To",
            Self::City => "City",
            Self::DepartureDate => "Departure date",
            Self::ReturnDate => "Return date",
            Self::PartySize => "Passengers",
            Self::Vehicle => "Vehicle",
            Self::TripType => "Trip type",
        }
    }

    /// Folded label vocabulary (FR, EN, NL, DA).
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Email => &["email", "e-mail", "mail", "courriel", "e-mailadres"],
            Self::Phone => &[
                "telephone", "phone", "tel", "tlf", "telefoon", "telefon", "mobile", "mobil",
                "portable", "gsm",
            ],
            Self::ReturnDate => &[
                "date de retour", "date retour", "return date", "terugkeerdatum", "terugreisdatum",
                "hjemrejse", "returdato",
            ],
            Self::DepartureDate => &[
                "date de depart", "date d'aller", "date aller", "departure date", "vertrekdatum",
                "afrejsedato", "afgangsdato", "reisdatum", "rejsedato", "travel date",
                "date du voyage",
            ],
            Self::TripType => &[
                "type de voyage", "trip type", "type of trip", "type reis", "soort reis",
                "rejsetype", "aller-retour",
            ],
            Self::Vehicle => &[
                "vehicule", "vehicle", "voertuig", "køretøj", "koretoj", "bus", "car",
            ],
            Self::PartySize => &[
                "personnes", "passagers", "passengers", "pax", "people", "participants",
                "reizigers", "personen", "personer", "deltagere", "nombre", "group size", "groupe",
            ],
            Self::Arrival => &[
                "arrivee", "arrival", "destination", "aankomst", "bestemming", "ankomst", "to",
                "til",
            ],
            Self::Departure => &[
                "depart", "departure", "from", "vertrek", "afrejse", "afgang", "fra", "pick-up",
                "pickup", "ophalen",
            ],
            Self::City => &["ville", "city", "lieu", "plaats", "stad", "by"],
            Self::Name => &["nom", "name", "naam", "navn", "full name", "contact"],
        }
    }

    fn matches(self, folded_label: &str) -> bool {
        self.keywords().iter().any(|kw| {
            if kw.chars().count() >= SUBSTRING_MIN_LEN {
                folded_label.contains(kw)
            } else {
                folded_label
                    .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '\'')
                    .any(|word| word == *kw)
            }
        })
    }
}

/// Field a label refers to, if any.
pub fn classify_label(label: &str) -> Option<FieldKey> {
    let folded = fold(label.trim());
    if folded.is_empty() || folded.chars().count() > MAX_LABEL_LEN {
        return None;
    }
    FieldKey::CHECK_ORDER.into_iter().find(|key| key.matches(&folded))
}

/// Split a line into `(label, value)` when it has a form-row shape:
/// `Label | Value | ...`, `Label: Value` or `Label - Value`.
fn split_row(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.contains('|') {
        let mut cells = line.split('|').map(str::trim).filter(|c| !c.is_empty());
        let label = cells.next()?;
        let value = cells.next()?;
        return Some((label, value));
    }
    if let Some((label, value)) = line.split_once(':') {
        return Some((label, value));
    }
    line.split_once(" - ")
}

/// Recognised `(field, value)` pairs in line order, first value per field.
pub fn build_label_map(text: &str) -> Vec<(FieldKey, String)> {
    let mut map: Vec<(FieldKey, String)> = Vec::new();
    for line in text.lines() {
        let Some((label, value)) = split_row(line) else {
            continue;
        };
        let value = clean_value(value);
        if value.is_empty() {
            continue;
        }
        let Some(key) = classify_label(label) else {
            continue;
        };
        if map.iter().all(|(k, _)| *k != key) {
            map.push((key, value));
        }
    }
    map
}

/// Append canonical `Label: Value` lines for every recognised form field.
///
/// Fields already labelled with their canonical English label are not
/// repeated.
pub fn inject_aliases(text: &str) -> String {
    let map = build_label_map(text);
    let mut aliases: Vec<String> = Vec::new();
    for key in FieldKey::OUTPUT_ORDER {
        let Some((_, value)) = map.iter().find(|(k, _)| *k == key) else {
            continue;
        };
        let line = format!("{}: {}", key.canonical_label(), value);
        let already_canonical = text.lines().any(|l| l.trim() == line);
        if !already_canonical {
            aliases.push(line);
        }
    }
    if aliases.is_empty() {
        return text.to_string();
    }
    tracing::trace!(aliases = aliases.len(), "injected label aliases");
    format!("{}\n{}", text.trim_end(), aliases.join("\n"))
}

/// Split text at blank lines; blocks with no content are dropped.
pub fn split_blocks(text: &str) -> Vec<Block> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    RE_BLANK_LINES
        .split(&normalized)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .enumerate()
        .map(|(index, block)| Block {
            index,
            text: block.to_string(),
        })
        .collect()
}

/// Alias injection followed by block splitting.
pub fn segment(text: &str) -> Vec<Block> {
    split_blocks(&inject_aliases(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUTCH_FORM: &str = "Naam | Jan Bakker\nE-mailadres | jan@x.nl\nVertrekstad | Amsterdam\nHoeveel reizigers nemen deel aan deze reis? | 10 - 20";

    #[test]
    fn classify_multilingual_labels() {
        assert_eq!(classify_label("E-mailadres"), Some(FieldKey::Email));
        assert_eq!(classify_label("Naam"), Some(FieldKey::Name));
        assert_eq!(classify_label("Vertrekstad"), Some(FieldKey::Departure));
        assert_eq!(classify_label("Vertrekdatum"), Some(FieldKey::DepartureDate));
        assert_eq!(classify_label("Date de retour"), Some(FieldKey::ReturnDate));
        assert_eq!(classify_label("Date de départ"), Some(FieldKey::DepartureDate));
        assert_eq!(classify_label("Arrivée"), Some(FieldKey::Arrival));
        assert_eq!(classify_label("Téléphone"), Some(FieldKey::Phone));
        assert_eq!(classify_label("Type de voyage"), Some(FieldKey::TripType));
        assert_eq!(classify_label("Nombre de personnes"), Some(FieldKey::PartySize));
        assert_eq!(classify_label("Ville"), Some(FieldKey::City));
        assert_eq!(classify_label("Remarques"), None);
    }

    #[test]
    fn forwarded_date_header_is_not_a_travel_date() {
        assert_eq!(classify_label("Date"), None);
        assert_eq!(classify_label("Datum"), None);
        assert_eq!(classify_label("Reisdatum"), Some(FieldKey::DepartureDate));
        let text = inject_aliases("Date: 14/09/2026\nBonjour, un bus du 05/11/2026 au 07/11/2026");
        assert!(!text.contains("Departure date"));
    }

    #[test]
    fn short_keywords_need_whole_words() {
        // "to" inside "photo", "tel" inside "hotel".
        assert_eq!(classify_label("Photo"), None);
        assert_eq!(classify_label("Hotel"), None);
        assert_eq!(classify_label("To"), Some(FieldKey::Arrival));
    }

    #[test]
    fn long_labels_are_ignored() {
        assert_eq!(
            classify_label("Hoeveel reizigers nemen deel aan deze reis?"),
            None
        );
    }

    #[test]
    fn label_map_from_pipe_rows() {
        let map = build_label_map(DUTCH_FORM);
        assert_eq!(
            map,
            vec![
                (FieldKey::Name, "Jan Bakker".to_string()),
                (FieldKey::Email, "jan@x.nl".to_string()),
                (FieldKey::Departure, "Amsterdam".to_string()),
            ]
        );
    }

    #[test]
    fn label_map_from_colon_and_dash_rows() {
        let map = build_label_map("Départ : Lyon\nArrivée - Annecy\nhttps://example.com");
        assert_eq!(
            map,
            vec![
                (FieldKey::Departure, "Lyon".to_string()),
                (FieldKey::Arrival, "Annecy".to_string()),
            ]
        );
    }

    #[test]
    fn aliases_are_appended_in_canonical_order() {
        let injected = inject_aliases(DUTCH_FORM);
        assert!(injected.starts_with(DUTCH_FORM));
        let tail: Vec<&str> = injected.lines().skip(4).collect();
        assert_eq!(tail, vec!["Email: jan@x.nl", "Name: Jan Bakker", "From: Amsterdam"]);
    }

    #[test]
    fn canonical_lines_are_not_repeated() {
        let text = "Email: a@b.dk\nName: Ole Hansen";
        assert_eq!(inject_aliases(text), text);
    }

    #[test]
    fn blocks_split_on_blank_lines() {
        let blocks = split_blocks("first\r\n\r\nsecond\nline\n \n\n\nthird\n\n   \n");
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second\nline", "third"]);
        assert_eq!(blocks[2].index, 2);
    }

    #[test]
    fn empty_text_has_no_blocks() {
        assert!(segment("  \n\n ").is_empty());
    }
}
