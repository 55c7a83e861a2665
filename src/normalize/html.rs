//! HTML to plain text.
//!
//! Table rows become one line each with cells joined by ` | `, so form tables
//! come out as `Label | Value` rows the segmenter understands. Block elements
//! become line or paragraph breaks; `<script>` and `<style>` are dropped.
//! Entities are decoded by the parser.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

static RE_REPEATED_PIPES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\|(?:[ \t]*\|)+").unwrap());
static RE_INLINE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

const SKIPPED: &[&str] = &["script", "style", "head", "title", "noscript", "template"];
const PARAGRAPHS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "section", "article", "ul",
    "ol", "pre", "address",
];

/// Render an HTML document or fragment as text.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    render(document.root_element(), &mut out);
    tidy(&out)
}

fn render(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_inline(out, text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        match name {
            _ if SKIPPED.contains(&name) => {}
            "br" => out.push('\n'),
            "tr" => {
                line_break(out);
                out.push_str(&render_row(child));
                out.push('\n');
            }
            "table" => {
                line_break(out);
                render(child, out);
                out.push('\n');
            }
            "li" => {
                line_break(out);
                out.push_str("- ");
                render(child, out);
                out.push('\n');
            }
            _ if PARAGRAPHS.contains(&name) => {
                line_break(out);
                render(child, out);
                out.push_str("\n\n");
            }
            _ => render(child, out),
        }
    }
}

/// Non-empty cells of a row, each flattened to one line, joined by ` | `.
fn render_row(row: ElementRef<'_>) -> String {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| {
            let mut text = String::new();
            render(cell, &mut text);
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Source whitespace inside text is insignificant.
fn push_inline(out: &mut String, text: &str) {
    let mut words = text.split_whitespace().peekable();
    if words.peek().is_none() {
        if !text.is_empty() && !out.ends_with([' ', '\n']) {
            out.push(' ');
        }
        return;
    }
    if text.starts_with(char::is_whitespace) && !out.ends_with([' ', '\n']) && !out.is_empty() {
        out.push(' ');
    }
    out.push_str(&words.collect::<Vec<_>>().join(" "));
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Collapse separators, trim lines and keep at most one blank line in a row.
fn tidy(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = RE_INLINE_SPACE.replace_all(line, " ");
        let line = RE_REPEATED_PIPES.replace_all(&line, "|");
        let line = line.trim();
        if line.is_empty() && lines.last().is_none_or(String::is_empty) {
            continue;
        }
        lines.push(line.to_string());
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}
