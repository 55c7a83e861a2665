//! Customer name extraction.
//!
//! Sources, first hit wins: first/last-name labels, a full-name label, a
//! self-introduction phrase, then the first person entity.

use std::sync::LazyLock;

use regex::Regex;

use crate::ner::{Entity, EntityLabel};
use crate::text::{clean_value, squash_whitespace};

static RE_FULL_NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t\-*>]*(?:naam|nom complet|nom|full name|name|navn|fulde navn)[ \t]*[:|\-][ \t]*([^\n|]+)")
        .unwrap()
});

static RE_FIRST_NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t\-*>]*(?:prénom|prenom|first name|firstname|given name|voornaam|fornavn)[ \t]*[:|\-][ \t]*([^\n|]+)")
        .unwrap()
});

static RE_LAST_NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t\-*>]*(?:nom de famille|last name|lastname|surname|family name|achternaam|efternavn)[ \t]*[:|\-][ \t]*([^\n|]+)")
        .unwrap()
});

/// Introduction phrase (any case) followed by one to three capitalised words.
static RE_INTRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?i:je m'appelle|je m’appelle|mon nom est|je suis|my name is|i am|i'm|mijn naam is|ik heet|ik ben|jeg hedder|mit navn er|jeg er))[ \t]+(\p{Lu}[\p{L}'’\-]+(?:[ \t]+\p{Lu}[\p{L}'’\-]+){0,2})",
    )
    .unwrap()
});

const HONORIFICS: &[&str] = &[
    "m.", "m", "mr", "mr.", "mrs", "mrs.", "ms", "ms.", "mme", "mme.", "mlle", "monsieur",
    "madame", "dr", "dr.", "hr.", "hr", "fru", "dhr.", "mevr.",
];

/// First and last name; either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    pub prenom: String,
    pub nom: String,
}

impl PersonName {
    /// Split a full name on whitespace: a single token is a last name,
    /// otherwise the first token is the first name and the rest the last name.
    pub fn from_full(full: &str) -> Self {
        let tokens: Vec<&str> = full
            .split_whitespace()
            .skip_while(|t| HONORIFICS.contains(&t.to_lowercase().as_str()))
            .collect();
        match tokens.as_slice() {
            [] => Self::default(),
            [single] => Self {
                prenom: String::new(),
                nom: (*single).to_string(),
            },
            [first, rest @ ..] => Self {
                prenom: (*first).to_string(),
                nom: rest.join(" "),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prenom.is_empty() && self.nom.is_empty()
    }
}

/// A labelled value that plausibly holds a name.
fn name_value(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text).find_map(|caps| {
        let value = squash_whitespace(&clean_value(caps.get(1)?.as_str()));
        let plausible = !value.is_empty()
            && !value.contains('@')
            && !value.chars().any(|c| c.is_ascii_digit())
            && value.split_whitespace().count() <= 5;
        plausible.then_some(value)
    })
}

/// Name from labels, introduction phrases or person entities.
pub fn extract_name(text: &str, entities: &[Entity]) -> PersonName {
    let first = name_value(&RE_FIRST_NAME_LABEL, text);
    let last = name_value(&RE_LAST_NAME_LABEL, text);
    let full = name_value(&RE_FULL_NAME_LABEL, text);

    match (first, last, full) {
        (Some(prenom), Some(nom), _) => return PersonName { prenom, nom },
        // A French form pairs "Prénom" with a plain "Nom" label.
        (Some(prenom), None, Some(nom)) => return PersonName { prenom, nom },
        (Some(prenom), None, None) => {
            return PersonName {
                prenom,
                nom: String::new(),
            };
        }
        (None, Some(nom), _) => {
            return PersonName {
                prenom: String::new(),
                nom,
            };
        }
        (None, None, Some(full)) => return PersonName::from_full(&full),
        (None, None, None) => {}
    }

    if let Some(name) = RE_INTRO.captures(text).and_then(|c| c.get(1)) {
        return PersonName::from_full(name.as_str());
    }

    entities
        .iter()
        .find(|e| e.label == EntityLabel::Person)
        .map(|e| PersonName::from_full(&e.text))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_phrase() {
        let name = extract_name(
            "Bonjour, je m'appelle Jean Dupont, 0612345678, je voudrais louer un SUV",
            &[],
        );
        assert_eq!(name.prenom, "Jean");
        assert_eq!(name.nom, "Dupont");
    }

    #[test]
    fn dutch_label() {
        let name = extract_name("Naam | Jan Bakker\nE-mailadres | jan@x.nl", &[]);
        assert_eq!(name, PersonName { prenom: "Jan".into(), nom: "Bakker".into() });
    }

    #[test]
    fn french_form_with_prenom_and_nom() {
        let name = extract_name("Nom : Martin\nPrénom : Claire\nEmail : c@x.fr", &[]);
        assert_eq!(name, PersonName { prenom: "Claire".into(), nom: "Martin".into() });
    }

    #[test]
    fn single_token_goes_to_last_name() {
        assert_eq!(
            PersonName::from_full("Mme Lefebvre"),
            PersonName { prenom: String::new(), nom: "Lefebvre".into() }
        );
        assert_eq!(
            PersonName::from_full("Jan van der Berg"),
            PersonName { prenom: "Jan".into(), nom: "van der Berg".into() }
        );
    }

    #[test]
    fn entity_fallback() {
        let entities = vec![
            Entity { text: "Lyon".into(), span: 0..4, label: EntityLabel::Location },
            Entity { text: "Mary Smith".into(), span: 10..20, label: EntityLabel::Person },
        ];
        let name = extract_name("no labels here", &entities);
        assert_eq!(name.prenom, "Mary");
        assert_eq!(name.nom, "Smith");
    }

    #[test]
    fn implausible_label_values_are_skipped() {
        let name = extract_name("Name: jan@x.nl", &[]);
        assert!(name.is_empty());
    }

    #[test]
    fn lowercase_after_intro_is_not_a_name() {
        assert!(extract_name("je suis intéressé par un devis", &[]).is_empty());
    }
}
