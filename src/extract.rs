//! Rule-based orchestrator.
//!
//! Segments the text into blocks, then for each block: detect the language,
//! fetch that language's recognizer from the registry, run every field
//! extractor and assemble an [`ExtractedRecord`]. Never fails; a field the
//! extractors cannot find is left empty.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::fields;
use crate::lang;
use crate::ner::RecognizerRegistry;
use crate::record::{Block, ExtractedRecord};
use crate::segment;

/// Rule-based extractor bound to a recognizer registry and a reference date.
#[derive(Debug, Clone)]
pub struct RuleExtractor {
    registry: Arc<RecognizerRegistry>,
    /// Fixed "today" for date resolution; the local date when unset.
    today: Option<NaiveDate>,
}

impl Default for RuleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleExtractor {
    /// Extractor using the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(RecognizerRegistry::global())
    }

    pub fn with_registry(registry: Arc<RecognizerRegistry>) -> Self {
        Self {
            registry,
            today: None,
        }
    }

    /// Resolve relative and year-less dates against `today` instead of the clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// One record per non-empty block, in block order.
    pub fn extract(&self, text: &str) -> Vec<ExtractedRecord> {
        let today = self.today();
        let blocks = segment::segment(text);
        tracing::debug!(blocks = blocks.len(), "segmented text");
        blocks
            .iter()
            .map(|block| self.extract_block(block, text, today))
            .collect()
    }

    /// Run every field extractor over one block.
    pub fn extract_block(&self, block: &Block, full_text: &str, today: NaiveDate) -> ExtractedRecord {
        let detection = lang::detect_language(&block.text);
        let recognizer = self.registry.get(detection.language);
        let entities = recognizer.recognize_entities(&block.text);

        let name = fields::extract_name(&block.text, &entities);
        let telephone = fields::extract_phone(&block.text);
        let places = fields::extract_places(&block.text, &entities, &telephone);
        let (date_debut, date_fin) = fields::extract_dates(&block.text, today)
            .map(fields::DateRange::to_strings)
            .unwrap_or_default();

        let record = ExtractedRecord {
            nom: name.nom,
            prenom: name.prenom,
            email: fields::extract_email(&block.text),
            telephone,
            ville: places.ville,
            villes: places.villes,
            pays: places.pays,
            date_debut,
            date_fin,
            type_vehicule: fields::extract_vehicle(&block.text),
            type_voyage: fields::extract_trip_type(&block.text),
            nb_personnes: fields::extract_party_size(&block.text),
            infos_libres: block.text.clone(),
            corps_mail: full_text.to_string(),
            langue_detectee: detection.language.code().to_string(),
            itinerary: places.itinerary,
        };
        tracing::debug!(
            block = block.index,
            lang = %detection.language,
            confidence = detection.confidence,
            entities = entities.len(),
            ville = %record.ville,
            "extracted block"
        );
        record
    }
}

/// Rule-based extraction with the process-wide registry. Always succeeds.
pub fn extraire_infos(text: &str) -> Vec<ExtractedRecord> {
    RuleExtractor::new().extract(text)
}
