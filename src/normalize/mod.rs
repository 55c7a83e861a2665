//! Text normalizer: multi-part email content to one text string.
//!
//! Attachments are skipped. Plain-text parts win; HTML parts are only
//! converted when the plain text is missing or not meaningful. Decoding never
//! fails: the charset cascade ends in a single-byte encoding that maps every
//! byte.

pub mod html;
pub mod mime;

use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use regex::Regex;

pub use html::html_to_text;
pub use mime::{MimeMessage, parse_mime};

/// Plain text shorter than this is not worth keeping over the HTML part.
pub const MIN_MEANINGFUL_CHARS: usize = 30;

static RE_WORD_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}{5}").unwrap());

/// One MIME part as seen by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailPart {
    /// `type/subtype`, parameters allowed.
    pub content_type: String,
    pub charset: Option<String>,
    /// `Content-Disposition` type (`inline`, `attachment`).
    pub disposition: Option<String>,
    pub filename: Option<String>,
    pub body: Vec<u8>,
}

impl MailPart {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            charset: None,
            disposition: None,
            filename: None,
            body: body.into(),
        }
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.disposition = Some(disposition.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Flagged by disposition or carrying a file name.
    pub fn is_attachment(&self) -> bool {
        self.filename.is_some()
            || self
                .disposition
                .as_deref()
                .is_some_and(|d| d.trim().to_ascii_lowercase().starts_with("attachment"))
    }

    /// Lower-cased `type/subtype` without parameters.
    pub fn mime_type(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    pub fn decoded(&self) -> String {
        decode_bytes(&self.body, self.charset.as_deref())
    }
}

/// Decode with the declared charset, then UTF-8, then Windows-1252.
///
/// `encoding_rs` resolves the `latin1`/`iso-8859-1` labels to Windows-1252,
/// which maps every byte, so the last step cannot fail.
pub fn decode_bytes(bytes: &[u8], charset: Option<&str>) -> String {
    let declared = charset.and_then(|label| Encoding::for_label(label.trim().as_bytes()));
    if let Some(encoding) = declared {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return text.into_owned();
        }
        tracing::debug!(charset = encoding.name(), "declared charset failed, trying fallbacks");
    }
    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(strip_bom(bytes)) {
        return text.into_owned();
    }
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// At least [`MIN_MEANINGFUL_CHARS`] characters and a run of five letters.
pub fn is_meaningful(text: &str) -> bool {
    let text = text.trim();
    text.chars().count() >= MIN_MEANINGFUL_CHARS && RE_WORD_RUN.is_match(text)
}

/// One text string for a set of parts.
pub fn normalize_parts(parts: &[MailPart]) -> String {
    let inline: Vec<&MailPart> = parts.iter().filter(|p| !p.is_attachment()).collect();

    let plain = join_parts(
        inline
            .iter()
            .filter(|p| p.mime_type() == "text/plain")
            .map(|p| p.decoded()),
    );
    if is_meaningful(&plain) {
        return plain;
    }

    let html = join_parts(
        inline
            .iter()
            .filter(|p| p.mime_type() == "text/html")
            .map(|p| html_to_text(&p.decoded())),
    );
    if html.is_empty() {
        tracing::debug!("no usable HTML part, keeping short plain text");
        plain
    } else {
        html
    }
}

fn join_parts(texts: impl Iterator<Item = String>) -> String {
    texts
        .map(|t| t.replace("\r\n", "\n").replace('\r', "\n").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_PLAIN: &str = "Bonjour, nous cherchons un autocar pour 40 personnes.";

    #[test]
    fn plain_text_is_preferred() {
        let parts = vec![
            MailPart::new("text/plain; charset=utf-8", LONG_PLAIN),
            MailPart::new("text/html", "<p>Ignored</p>"),
        ];
        assert_eq!(normalize_parts(&parts), LONG_PLAIN);
    }

    #[test]
    fn short_plain_text_falls_back_to_html() {
        let parts = vec![
            MailPart::new("text/plain", "See HTML"),
            MailPart::new("text/html", "<table><tr><td>Naam</td><td>Jan</td></tr></table>"),
        ];
        assert_eq!(normalize_parts(&parts), "Naam | Jan");
    }

    #[test]
    fn letterless_plain_text_is_not_meaningful() {
        assert!(!is_meaningful("12 34 56 78 90 12 34 56 78 90 12 34 56"));
        assert!(!is_meaningful("short"));
        assert!(is_meaningful(LONG_PLAIN));
    }

    #[test]
    fn attachments_are_skipped() {
        let parts = vec![
            MailPart::new("text/plain", "attached notes, long enough to be meaningful text")
                .with_filename("notes.txt"),
            MailPart::new("text/plain", "inline but also an attachment by disposition header")
                .with_disposition("attachment; filename=\"x\""),
            MailPart::new("text/plain", LONG_PLAIN).with_disposition("inline"),
        ];
        assert_eq!(normalize_parts(&parts), LONG_PLAIN);
    }

    #[test]
    fn plain_parts_accumulate() {
        let parts = vec![
            MailPart::new("text/plain", "Première partie du message client,\r\n"),
            MailPart::new("text/plain", "seconde partie."),
        ];
        assert_eq!(normalize_parts(&parts), "Première partie du message client,\n\nseconde partie.");
    }

    #[test]
    fn no_html_keeps_short_plain() {
        assert_eq!(normalize_parts(&[MailPart::new("text/plain", " Merci ")]), "Merci");
        assert_eq!(normalize_parts(&[]), "");
    }

    #[test]
    fn charset_cascade() {
        // "Arrivée" in Latin-1.
        let latin1 = b"Arriv\xe9e";
        assert_eq!(decode_bytes(latin1, Some("iso-8859-1")), "Arrivée");
        // Wrongly declared UTF-8 falls through to Windows-1252.
        assert_eq!(decode_bytes(latin1, Some("utf-8")), "Arrivée");
        // Unknown label, valid UTF-8.
        assert_eq!(decode_bytes("Køretøj".as_bytes(), Some("x-unknown")), "Køretøj");
        // BOM is dropped.
        assert_eq!(decode_bytes(b"\xEF\xBB\xBFhej", None), "hej");
        // Windows-1252 specific byte.
        assert_eq!(decode_bytes(b"\x80 100", None), "€ 100");
    }
}
