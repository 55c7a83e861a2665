//! Per-email pipeline and the persistence sink contract.
//!
//! normalized text -> AI extractor (when configured) or rule-based extractor
//! -> selection/dedup -> sender and subject post-processing -> sink.
//!
//! An AI failure is never surfaced: it is logged and the rule-based records
//! are used for the same text. A sink failure for one record is logged and
//! does not stop the following ones.

use std::io::Write;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::ai::AiExtractor;
use crate::config::ExtractConfig;
use crate::extract::RuleExtractor;
use crate::ner::{BuiltinLoader, RecognizerRegistry};
use crate::normalize::mime::{MimeMessage, MimeResult, parse_mime};
use crate::record::ExtractedRecord;
use crate::select::select_records;

/// Errors from a persistence sink.
#[derive(Debug, Error, Diagnostic)]
pub enum SinkError {
    #[error("failed to write record")]
    #[diagnostic(
        code(demande::sink::write),
        help("Check that the output is writable.")
    )]
    Write(#[source] std::io::Error),

    #[error("failed to serialize record: {message}")]
    #[diagnostic(code(demande::sink::serialize))]
    Serialize { message: String },
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Destination of extracted records, one at a time.
pub trait DemandeSink {
    fn store(&mut self, record: &ExtractedRecord) -> SinkResult<()>;
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DemandeSink for JsonLinesSink<W> {
    fn store(&mut self, record: &ExtractedRecord) -> SinkResult<()> {
        let line = serde_json::to_string(record).map_err(|e| SinkError::Serialize {
            message: e.to_string(),
        })?;
        writeln!(self.writer, "{line}").map_err(SinkError::Write)?;
        self.writer.flush().map_err(SinkError::Write)?;
        self.written += 1;
        Ok(())
    }
}

/// Collects records in memory.
impl DemandeSink for Vec<ExtractedRecord> {
    fn store(&mut self, record: &ExtractedRecord) -> SinkResult<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// The configured extraction pipeline.
#[derive(Debug)]
pub struct Pipeline {
    multi_record: bool,
    rules: RuleExtractor,
    ai: Option<AiExtractor>,
}

impl Pipeline {
    /// Build from configuration. The AI extractor is set up only when it is
    /// enabled and a key is available.
    pub fn new(config: &ExtractConfig) -> Self {
        let registry = match &config.nlp.gazetteer_dir {
            Some(dir) => Arc::new(RecognizerRegistry::new(Box::new(BuiltinLoader::new(Some(
                dir.clone(),
            ))))),
            None => RecognizerRegistry::global(),
        };
        let ai = if config.ai.enabled {
            AiExtractor::new(&config.ai)
                .inspect_err(|e| tracing::debug!(reason = %e, "AI extractor not available"))
                .ok()
        } else {
            None
        };
        Self {
            multi_record: config.multi_record,
            rules: RuleExtractor::with_registry(registry),
            ai,
        }
    }

    /// Replace the rule-based extractor (fixed date, custom registry).
    pub fn with_rules(mut self, rules: RuleExtractor) -> Self {
        self.rules = rules;
        self
    }

    pub fn uses_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Records for one normalized email text.
    pub fn extract_text(&self, text: &str) -> Vec<ExtractedRecord> {
        let records = match &self.ai {
            Some(ai) => match ai.extract(text) {
                Ok(records) => records,
                Err(err) => {
                    tracing::warn!(error = %err, "AI extraction failed, falling back to rules");
                    self.rules.extract(text)
                }
            },
            None => self.rules.extract(text),
        };
        let extracted = records.len();
        let selected = select_records(records, self.multi_record);
        tracing::info!(
            extracted,
            selected = selected.len(),
            multi_record = self.multi_record,
            "processed email"
        );
        selected
    }

    /// Records for a parsed message, with sender and subject attached.
    pub fn process_message(&self, message: &MimeMessage) -> Vec<ExtractedRecord> {
        let mut records = self.extract_text(&message.text());
        for record in &mut records {
            attach_message_context(record, message);
        }
        records
    }

    /// Parse raw RFC 5322 bytes and process the message.
    pub fn process_eml(&self, data: &[u8]) -> MimeResult<Vec<ExtractedRecord>> {
        Ok(self.process_message(&parse_mime(data)?))
    }
}

/// Fill a missing email from the sender and prefix the subject to the free text.
pub fn attach_message_context(record: &mut ExtractedRecord, message: &MimeMessage) {
    if record.email.trim().is_empty() {
        if let Some(from) = &message.from {
            record.email = from.trim().to_lowercase();
        }
    }
    if let Some(subject) = &message.subject {
        record.infos_libres = if record.infos_libres.is_empty() {
            format!("Subject: {subject}")
        } else {
            format!("Subject: {subject}\n{}", record.infos_libres)
        };
    }
}

/// Hand every record to the sink; returns how many were stored.
pub fn store_all(records: &[ExtractedRecord], sink: &mut dyn DemandeSink) -> usize {
    let mut stored = 0;
    for (index, record) in records.iter().enumerate() {
        match sink.store(record) {
            Ok(()) => stored += 1,
            Err(err) => tracing::warn!(record = index, error = %err, "failed to store record"),
        }
    }
    stored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn offline_pipeline(multi_record: bool) -> Pipeline {
        let mut config = ExtractConfig::default();
        config.ai.enabled = false;
        config.multi_record = multi_record;
        Pipeline::new(&config)
            .with_rules(RuleExtractor::new().with_today(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()))
    }

    #[test]
    fn no_key_means_no_ai() {
        let pipeline = Pipeline::new(&ExtractConfig::default());
        assert!(!pipeline.uses_ai());
    }

    #[test]
    fn unreachable_ai_falls_back_to_rules() {
        let mut config = ExtractConfig::default();
        config.ai.api_key = Some("sk-test".into());
        config.ai.base_url = "http://127.0.0.1:1".into();
        let pipeline = Pipeline::new(&config);
        assert!(pipeline.uses_ai());
        let records = pipeline.extract_text("Bonjour, un autocar pour 30 personnes à Lyon. Merci");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ville, "Lyon");
        assert_eq!(records[0].nb_personnes, "30");
    }

    #[test]
    fn single_mode_keeps_the_best_block() {
        let text = "Bonjour,\n\nUn minibus pour 12 personnes à Lyon.\nEmail: a@b.fr\n\nCordialement";
        let records = offline_pipeline(false).extract_text(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "a@b.fr");
    }

    #[test]
    fn multi_mode_keeps_distinct_blocks() {
        let text = "Un car à Lyon.\nEmail: a@b.fr\n\nUn car à Nice.\nEmail: c@d.fr";
        let records = offline_pipeline(true).extract_text(text);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn message_context_is_attached() {
        let message = MimeMessage {
            subject: Some("Devis".into()),
            from: Some("Client@Example.FR".into()),
            ..Default::default()
        };
        let mut record = ExtractedRecord::raw("body");
        attach_message_context(&mut record, &message);
        assert_eq!(record.email, "client@example.fr");
        assert_eq!(record.infos_libres, "Subject: Devis\nbody");

        let mut record = ExtractedRecord {
            email: "x@y.fr".into(),
            ..Default::default()
        };
        attach_message_context(&mut record, &message);
        assert_eq!(record.email, "x@y.fr");
        assert_eq!(record.infos_libres, "Subject: Devis");
    }

    #[test]
    fn eml_end_to_end() {
        let email = "From: Ole <ole@example.dk>\r\nSubject: Bus\r\nContent-Type: text/plain\r\n\r\nHej, vi vil gerne leje en bus til 20 personer fra Aarhus. Tak\r\n";
        let records = offline_pipeline(false).process_eml(email.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "ole@example.dk");
        assert!(records[0].infos_libres.starts_with("Subject: Bus\n"));
        assert_eq!(records[0].langue_detectee, "da");
    }

    #[test]
    fn json_lines_sink_writes_one_line_per_record() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let records = vec![ExtractedRecord::raw("a"), ExtractedRecord::raw("b")];
        assert_eq!(store_all(&records, &mut sink), 2);
        assert_eq!(sink.written(), 2);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let back: ExtractedRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back.infos_libres, "b");
    }

    struct FlakySink {
        calls: usize,
        kept: Vec<ExtractedRecord>,
    }

    impl DemandeSink for FlakySink {
        fn store(&mut self, record: &ExtractedRecord) -> SinkResult<()> {
            self.calls += 1;
            if self.calls == 1 {
                return Err(SinkError::Write(std::io::Error::other("disk full")));
            }
            self.kept.push(record.clone());
            Ok(())
        }
    }

    #[test]
    fn sink_failure_does_not_stop_later_records() {
        let mut sink = FlakySink {
            calls: 0,
            kept: Vec::new(),
        };
        let records = vec![ExtractedRecord::raw("a"), ExtractedRecord::raw("b")];
        assert_eq!(store_all(&records, &mut sink), 1);
        assert_eq!(sink.kept[0].infos_libres, "b");
    }

    #[test]
    fn vec_sink_collects() {
        let mut sink: Vec<ExtractedRecord> = Vec::new();
        store_all(&[ExtractedRecord::raw("a")], &mut sink);
        assert_eq!(sink.len(), 1);
    }
}
