//! End-to-end tests for the demande extraction pipeline.
//!
//! These exercise the public API from raw text or MIME bytes through
//! segmentation, field extraction, selection and the AI fallback.

use chrono::NaiveDate;

use demande_extract::ai::{AiError, AiExtractor};
use demande_extract::config::{AiConfig, ExtractConfig};
use demande_extract::extract::RuleExtractor;
use demande_extract::intake::Pipeline;
use demande_extract::normalize::{MailPart, normalize_parts, parse_mime};
use demande_extract::select::select_records;
use demande_extract::{ExtractedRecord, extraire_infos};

fn extractor() -> RuleExtractor {
    RuleExtractor::new().with_today(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
}

#[test]
fn french_rental_request() {
    let text = "Bonjour, je m'appelle Jean Dupont, 0612345678, je voudrais louer un SUV à \
                Casablanca du 2025-10-01 au 2025-10-07. Merci.";
    let records = extractor().extract(text);
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.nom, "Dupont");
    assert_eq!(rec.prenom, "Jean");
    assert_eq!(rec.telephone, "0612345678");
    assert_eq!(rec.ville, "Casablanca");
    assert_eq!(rec.pays, "Morocco");
    assert!(rec.type_vehicule.eq_ignore_ascii_case("suv"));
    assert_eq!(rec.date_debut, "2025-10-01");
    assert_eq!(rec.date_fin, "2025-10-07");
    assert_eq!(rec.langue_detectee, "fr");
    assert_eq!(rec.corps_mail, text);
}

#[test]
fn dutch_form_table() {
    let text = "Naam | Jan Bakker\nE-mailadres | jan@x.nl\nVertrekstad | Amsterdam\n\
                Hoeveel reizigers nemen deel aan deze reis? | 10 - 20";
    let records = extractor().extract(text);
    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.email, "jan@x.nl");
    assert_eq!(rec.ville, "Amsterdam");
    assert_eq!(rec.nb_personnes, "10-20");
    assert_eq!(rec.full_name(), "Jan Bakker");
}

#[test]
fn venue_is_never_the_city() {
    let records = extraire_infos(
        "Hello, we land at Charles de Gaulle Airport and need a coach to Paris for 25 people.",
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ville, "Paris");
    assert!(!records[0].villes.iter().any(|v| v.contains("Airport")));
    assert_eq!(records[0].langue_detectee, "en");
}

#[test]
fn no_date_text_leaves_dates_empty() {
    let records = extraire_infos("Bonjour, un minibus pour 8 personnes à Lyon, s'il vous plaît.");
    assert_eq!(records[0].date_debut, "");
    assert_eq!(records[0].date_fin, "");
}

#[test]
fn range_with_bare_start_day() {
    let records = extractor().extract("Location d'un autocar du 3 au 7 octobre 2026 pour 40 personnes.");
    assert_eq!(records[0].date_debut, "2026-10-03");
    assert_eq!(records[0].date_fin, "2026-10-07");
    assert_eq!(records[0].nb_personnes, "40");
}

#[test]
fn extraction_is_idempotent() {
    let text = "Hej, vi vil gerne leje en bus til 20 personer fra Aarhus.\n\nTak";
    assert_eq!(extraire_infos(text), extraire_infos(text));
}

#[test]
fn every_record_has_the_full_shape() {
    let records = extraire_infos("bonjour");
    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 16);
}

#[test]
fn near_identical_blocks_are_deduplicated() {
    let text = "Email jean@mail.fr, tel 0612345678. Un bus à Lyon le 12/10/2025. Merci pour tout.\n\n\
                Email jean@mail.fr, tel 0612345678. Un bus à Lyon le 12/10/2025. Nous sommes flexibles.";
    let records = extractor().extract(text);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date_debut, "2025-10-12");
    assert_eq!(select_records(records.clone(), false).len(), 1);
    assert_eq!(select_records(records, true).len(), 1);
}

#[test]
fn ai_without_credential_falls_back_to_rules() {
    let text = "Bonjour, un autocar pour 30 personnes à Lyon.";
    let records = match AiExtractor::new(&AiConfig::default()) {
        Ok(_) => panic!("no key is configured"),
        Err(err) => {
            assert!(matches!(err, AiError::MissingCredential));
            extraire_infos(text)
        }
    };
    assert_eq!(records[0].ville, "Lyon");

    let mut config = ExtractConfig::default();
    config.ai.api_key = None;
    let pipeline = Pipeline::new(&config);
    assert!(!pipeline.uses_ai());
    assert_eq!(pipeline.extract_text(text)[0].nb_personnes, "30");
}

#[test]
fn html_table_rows_become_lines() {
    let html = "<html><body><p>Offerte aanvraag</p><table>\
                <tr><td>Naam</td><td>Jan Bakker</td></tr>\
                <tr><td>E-mailadres</td><td>jan@x.nl</td></tr>\
                <tr><td>Vertrekstad</td><td>Amsterdam</td></tr>\
                </table></body></html>";
    let text = normalize_parts(&[MailPart::new("text/html; charset=utf-8", html)]);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.contains(&"Naam | Jan Bakker"));
    assert!(lines.contains(&"E-mailadres | jan@x.nl"));
    assert!(lines.contains(&"Vertrekstad | Amsterdam"));

    let records = extractor().extract(&text);
    let best = select_records(records, false);
    assert_eq!(best[0].email, "jan@x.nl");
    assert_eq!(best[0].ville, "Amsterdam");
}

#[test]
fn eml_message_through_the_pipeline() {
    let email = "From: Anna <anna@example.com>\r\n\
Subject: Coach hire\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Hello, we are 2 adults and 3 children and need a minibus in London. Thanks\r\n";
    let mut config = ExtractConfig::default();
    config.ai.enabled = false;
    let pipeline = Pipeline::new(&config).with_rules(extractor());
    let records = pipeline.process_eml(email.as_bytes()).unwrap();
    assert_eq!(records.len(), 1);
    let rec: &ExtractedRecord = &records[0];
    assert_eq!(rec.email, "anna@example.com");
    assert_eq!(rec.nb_personnes, "5");
    assert_eq!(rec.ville, "London");
    assert!(rec.infos_libres.starts_with("Subject: Coach hire\n"));

    assert!(parse_mime(b"").is_err());
}

#[test]
fn gazetteer_directory_extends_recognizers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fr.toml"), "persons = [\"Zorglub\"]\n").unwrap();
    let mut config = ExtractConfig::default();
    config.ai.enabled = false;
    config.nlp.gazetteer_dir = Some(dir.path().to_path_buf());

    let records = Pipeline::new(&config).extract_text("Bonjour, ici Zorglub. Un car pour Lyon, merci.");
    assert_eq!(records[0].nom, "Zorglub");
    assert_eq!(records[0].ville, "Lyon");
}

#[test]
fn forwarded_header_date_keeps_the_requested_range() {
    let text = "Date: 14/09/2026\nBonjour, un bus à Lyon du 05/11/2026 au 07/11/2026 pour 40 personnes, \
                départ: 12/10/2026. Dans l'attente de votre retour.";
    let records = extractor().extract(text);
    assert_eq!(records[0].date_debut, "2026-11-05");
    assert_eq!(records[0].date_fin, "2026-11-07");
    assert_eq!(records[0].nb_personnes, "40");
    assert_eq!(records[0].type_voyage, "");
}
