//! Raw RFC 5322 intake via `mail-parser`.
//!
//! Flattens a message into [`MailPart`]s plus the sender and subject the
//! pipeline attaches to its records.

use mail_parser::{MessageParser, MessagePart, MimeHeaders, PartType};
use miette::Diagnostic;
use thiserror::Error;

use super::{MailPart, normalize_parts};

/// Errors from MIME intake.
#[derive(Debug, Error, Diagnostic)]
pub enum MimeError {
    #[error("failed to parse MIME message: {message}")]
    #[diagnostic(
        code(demande::mime::parse),
        help("The input is not an RFC 5322 message; drop --eml to read it as plain text.")
    )]
    Parse { message: String },
}

pub type MimeResult<T> = std::result::Result<T, MimeError>;

/// A parsed message reduced to what extraction needs.
#[derive(Debug, Clone, Default)]
pub struct MimeMessage {
    pub subject: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Sender display name.
    pub from_display: Option<String>,
    /// Leaf parts in document order.
    pub parts: Vec<MailPart>,
}

impl MimeMessage {
    /// The normalized body text.
    pub fn text(&self) -> String {
        normalize_parts(&self.parts)
    }
}

/// Parse raw message bytes.
pub fn parse_mime(data: &[u8]) -> MimeResult<MimeMessage> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(MimeError::Parse {
            message: "empty input".into(),
        });
    }
    let message = MessageParser::default()
        .parse(data)
        .ok_or_else(|| MimeError::Parse {
            message: format!("unparsable message ({} bytes)", data.len()),
        })?;

    let (from, from_display) = message
        .from()
        .and_then(|addr| addr.first())
        .map(|first| {
            (
                first.address().map(str::to_string),
                first.name().map(str::to_string),
            )
        })
        .unwrap_or_default();

    let subject = message
        .subject()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let parts: Vec<MailPart> = message.parts.iter().filter_map(leaf_part).collect();
    tracing::debug!(parts = parts.len(), has_subject = subject.is_some(), "parsed MIME message");

    Ok(MimeMessage {
        subject,
        from,
        from_display,
        parts,
    })
}

/// Convert one leaf part; containers and embedded messages yield `None`.
fn leaf_part(part: &MessagePart<'_>) -> Option<MailPart> {
    let (default_type, decoded) = match &part.body {
        PartType::Text(_) => ("text/plain", true),
        PartType::Html(_) => ("text/html", true),
        PartType::Binary(_) | PartType::InlineBinary(_) => ("application/octet-stream", false),
        PartType::Message(_) | PartType::Multipart(_) => return None,
    };

    let content_type = part
        .content_type()
        .map(|ct| match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| default_type.to_string());

    let mut mail_part = MailPart::new(content_type, part.contents().to_vec());
    // Text and HTML bodies are already decoded to UTF-8 by the parser.
    if decoded {
        mail_part = mail_part.with_charset("utf-8");
    } else if let Some(charset) = part.content_type().and_then(|ct| ct.attribute("charset")) {
        mail_part = mail_part.with_charset(charset);
    }
    if let Some(disposition) = part.content_disposition() {
        mail_part = mail_part.with_disposition(disposition.ctype());
    }
    if let Some(name) = part.attachment_name() {
        mail_part = mail_part.with_filename(name);
    }
    Some(mail_part)
}
