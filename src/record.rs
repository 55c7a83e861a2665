//! The `demande` record produced by both extraction paths.
//!
//! Every field is always present: empty strings and empty vectors stand in for
//! "not found", so the persistence side can bind by name without existence
//! checks. Field names are part of the wire contract with the storage layer and
//! the AI prompt, hence the French identifiers.

use serde::{Deserialize, Serialize};

/// Trip type value for a return journey.
pub const TRIP_ROUND: &str = "aller-retour";

/// Trip type value for a one-way journey.
pub const TRIP_ONE_WAY: &str = "aller simple";

/// One booking inquiry extracted from an email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedRecord {
    /// Last name.
    pub nom: String,
    /// First name.
    pub prenom: String,
    pub email: String,
    /// Digits with an optional leading `+`.
    pub telephone: String,
    /// Primary city of service.
    pub ville: String,
    /// Every place mention, `ville` included, in discovery order.
    pub villes: Vec<String>,
    pub pays: String,
    /// `YYYY-MM-DD` or empty.
    pub date_debut: String,
    /// `YYYY-MM-DD` or empty; empty when only one date is known.
    pub date_fin: String,
    pub type_vehicule: String,
    /// [`TRIP_ROUND`], [`TRIP_ONE_WAY`] or empty.
    pub type_voyage: String,
    /// A bare integer or an `N-M` range.
    pub nb_personnes: String,
    /// Source block kept for manual review.
    pub infos_libres: String,
    /// Full source text of the email.
    pub corps_mail: String,
    /// Language code (`fr`, `en`, `da`), or whatever the model reported.
    pub langue_detectee: String,
    /// `A->B` or empty.
    pub itinerary: String,
}

impl ExtractedRecord {
    /// A record carrying only the raw text, every other field empty.
    pub fn raw(text: &str) -> Self {
        Self {
            infos_libres: text.to_string(),
            corps_mail: text.to_string(),
            ..Default::default()
        }
    }

    /// Full name as "prenom nom", trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }
}

/// A contiguous segment of email text treated as one candidate inquiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Position of the block in its source text.
    pub index: usize,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_record_has_every_key() {
        let json = serde_json::to_value(ExtractedRecord::default()).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "nom",
            "prenom",
            "email",
            "telephone",
            "ville",
            "villes",
            "pays",
            "date_debut",
            "date_fin",
            "type_vehicule",
            "type_voyage",
            "nb_personnes",
            "infos_libres",
            "corps_mail",
            "langue_detectee",
            "itinerary",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
            assert!(!obj[key].is_null());
        }
        assert!(obj["villes"].is_array());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let rec: ExtractedRecord = serde_json::from_str(r#"{"nom": "Dupont"}"#).unwrap();
        assert_eq!(rec.nom, "Dupont");
        assert!(rec.villes.is_empty());
        assert_eq!(rec.date_fin, "");
    }

    #[test]
    fn raw_record_keeps_text() {
        let rec = ExtractedRecord::raw("hello");
        assert_eq!(rec.infos_libres, "hello");
        assert_eq!(rec.corps_mail, "hello");
        assert!(rec.email.is_empty());
    }

    #[test]
    fn full_name_joins_parts() {
        let rec = ExtractedRecord {
            nom: "Dupont".into(),
            prenom: "Jean".into(),
            ..Default::default()
        };
        assert_eq!(rec.full_name(), "Jean Dupont");
        assert_eq!(ExtractedRecord::default().full_name(), "");
    }
}
