//! LLM-backed extraction.
//!
//! The whole email goes to the model in one prompt; the JSON answer is parsed
//! leniently and every item is defaulted field by field into an
//! [`ExtractedRecord`]. Any failure is an [`AiError`], which callers treat as
//! "fall back to the rule-based extractor".

pub mod client;
pub mod prompt;

use miette::Diagnostic;
use serde_json::{Value, json};
use thiserror::Error;

pub use client::{Endpoint, OpenAiClient};
pub use prompt::build_prompt;

use crate::config::{AiConfig, ExtractConfig};
use crate::record::ExtractedRecord;

/// Errors from the AI extraction path.
#[derive(Debug, Error, Diagnostic)]
pub enum AiError {
    #[error("no OpenAI API key configured")]
    #[diagnostic(
        code(demande::ai::missing_credential),
        help("Set OPENAI_API_KEY (or OPENAI_API_TOKEN), add it to credentials.txt, or use --no-ai.")
    )]
    MissingCredential,

    #[error("{endpoint} request failed: {message}")]
    #[diagnostic(
        code(demande::ai::request),
        help("Check network access, the API key and the configured base URL.")
    )]
    Request { endpoint: String, message: String },

    #[error("all AI endpoints failed (responses: {responses}; chat: {chat})")]
    #[diagnostic(
        code(demande::ai::all_endpoints_failed),
        help("The rule-based extractor is used instead; rerun with RUST_LOG=debug for details.")
    )]
    AllEndpointsFailed { responses: String, chat: String },

    #[error("failed to serialize AI request: {message}")]
    #[diagnostic(code(demande::ai::serialize))]
    Serialize { message: String },
}

pub type AiResult<T> = std::result::Result<T, AiError>;

/// Extractor bound to one configured client.
#[derive(Debug)]
pub struct AiExtractor {
    client: OpenAiClient,
}

impl AiExtractor {
    /// Fails with [`AiError::MissingCredential`] when no API key is set.
    pub fn new(config: &AiConfig) -> AiResult<Self> {
        let client = OpenAiClient::from_config(config).ok_or(AiError::MissingCredential)?;
        Ok(Self { client })
    }

    /// Records for one email; at least one when the model answered at all.
    pub fn extract(&self, text: &str) -> AiResult<Vec<ExtractedRecord>> {
        let answer = self.client.complete(&build_prompt(text))?;
        let records = records_from_answer(&parse_json_lenient(&answer), text);
        tracing::debug!(model = self.client.model(), records = records.len(), "AI extraction done");
        Ok(records)
    }
}

/// AI extraction configured from the environment and `credentials.txt`.
pub fn extraire_infos_ai(text: &str) -> AiResult<Vec<ExtractedRecord>> {
    AiExtractor::new(&ExtractConfig::from_env().ai)?.extract(text)
}

/// Parse the outermost `{...}` of a model answer; `{"demandes": []}` when
/// nothing parses.
pub fn parse_json_lenient(answer: &str) -> Value {
    let trimmed = answer.trim();
    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(candidate).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "unparsable AI answer, treating it as empty");
        json!({ "demandes": [] })
    })
}

/// Normalize every item of `demandes`; a single raw record when there are none.
pub fn records_from_answer(answer: &Value, text: &str) -> Vec<ExtractedRecord> {
    let items: &[Value] = answer["demandes"]
        .as_array()
        .or_else(|| answer.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let records: Vec<ExtractedRecord> = items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| normalize_item(item, text))
        .collect();

    if records.is_empty() {
        vec![ExtractedRecord::raw(text)]
    } else {
        records
    }
}

/// Scalar as a string: numbers and booleans are rendered, null is empty.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// `villes` as an array, or a comma-separated string.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(scalar).filter(|s| !s.is_empty()).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// One model item as a record. Missing free-text fields carry the email text.
pub fn normalize_item(item: &Value, text: &str) -> ExtractedRecord {
    let field = |key: &str| scalar(&item[key]);
    let or_text = |key: &str| match &item[key] {
        Value::Null => text.to_string(),
        other => scalar(other),
    };
    ExtractedRecord {
        nom: field("nom"),
        prenom: field("prenom"),
        email: field("email"),
        telephone: field("telephone"),
        ville: field("ville"),
        villes: string_list(&item["villes"]),
        pays: field("pays"),
        date_debut: field("date_debut"),
        date_fin: field("date_fin"),
        type_vehicule: field("type_vehicule"),
        type_voyage: field("type_voyage"),
        nb_personnes: field("nb_personnes"),
        infos_libres: or_text("infos_libres"),
        corps_mail: or_text("corps_mail"),
        langue_detectee: field("langue_detectee"),
        itinerary: field("itinerary"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_recoverable_error() {
        let err = AiExtractor::new(&AiConfig::default()).unwrap_err();
        assert!(matches!(err, AiError::MissingCredential));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn lenient_parse_strips_prose() {
        let value = parse_json_lenient("Sure! ```json\n{\"demandes\": [{\"nom\": \"Dupont\"}]}\n```");
        assert_eq!(value["demandes"][0]["nom"], "Dupont");
    }

    #[test]
    fn lenient_parse_defaults_on_garbage() {
        assert_eq!(parse_json_lenient("no json here"), json!({ "demandes": [] }));
        assert_eq!(parse_json_lenient("{broken"), json!({ "demandes": [] }));
    }

    #[test]
    fn items_are_defaulted_field_by_field() {
        let answer = json!({ "demandes": [{
            "nom": "Dupont",
            "prenom": null,
            "nb_personnes": 30,
            "villes": "Lyon, Annecy",
            "infos_libres": ""
        }]});
        let records = records_from_answer(&answer, "email body");
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.nom, "Dupont");
        assert_eq!(rec.prenom, "");
        assert_eq!(rec.nb_personnes, "30");
        assert_eq!(rec.villes, vec!["Lyon", "Annecy"]);
        assert_eq!(rec.infos_libres, "");
        assert_eq!(rec.corps_mail, "email body");
        assert_eq!(rec.date_fin, "");
    }

    #[test]
    fn zero_items_yield_one_raw_record() {
        for answer in [json!({ "demandes": [] }), json!({}), json!({ "demandes": ["x"] })] {
            let records = records_from_answer(&answer, "raw text");
            assert_eq!(records, vec![ExtractedRecord::raw("raw text")]);
        }
    }

    #[test]
    fn bare_array_answer_is_accepted() {
        let records = records_from_answer(&json!([{ "email": "a@b.fr" }, { "email": "c@d.fr" }]), "t");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].email, "c@d.fr");
    }

    #[test]
    fn extractor_end_to_end_over_loopback() {
        let answer = json!({ "demandes": [{
            "nom": "Bakker", "prenom": "Jan", "email": "jan@x.nl",
            "ville": "Amsterdam", "villes": ["Amsterdam"], "nb_personnes": "10-20",
            "langue_detectee": "nl"
        }]})
        .to_string();
        let body = json!({ "output_text": answer }).to_string();
        let (url, _requests) = client::loopback::serve(vec![(200, body)]);
        let config = AiConfig {
            api_key: Some("sk-test".into()),
            base_url: url,
            ..Default::default()
        };
        let records = AiExtractor::new(&config).unwrap().extract("Naam | Jan Bakker").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].full_name(), "Jan Bakker");
        assert_eq!(records[0].nb_personnes, "10-20");
        assert_eq!(records[0].infos_libres, "Naam | Jan Bakker");
    }

    #[test]
    fn unparsable_model_answer_yields_raw_record() {
        let body = json!({ "output_text": "I cannot help with that." }).to_string();
        let (url, _requests) = client::loopback::serve(vec![(200, body)]);
        let config = AiConfig {
            api_key: Some("sk-test".into()),
            base_url: url,
            ..Default::default()
        };
        let records = AiExtractor::new(&config).unwrap().extract("hello").unwrap();
        assert_eq!(records, vec![ExtractedRecord::raw("hello")]);
    }
}
