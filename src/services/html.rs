//! HTML helpers for editor content
//!
//! News bodies and descriptions arrive as HTML from the rich-text editor.
//! List pages need plain-text excerpts, and AI answers written in Markdown
//! are rendered to HTML before they go back into the editor.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser};
use regex::Regex;

/// Default excerpt length in characters
pub const EXCERPT_LENGTH: usize = 200;

static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<\s*(br|/p|/div|/li|/h[1-6]|/blockquote|/tr)\s*/?\s*>")
        .expect("valid block regex")
});
static DROPPED_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<\s*(script|style)[^>]*>.*?<\s*/\s*(script|style)\s*>").expect("valid script regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Remove every tag and return readable plain text.
///
/// Script and style bodies are dropped, block ends become spaces, common
/// entities are decoded and whitespace is collapsed.
pub fn strip_tags(input: &str) -> String {
    let without_scripts = DROPPED_BLOCKS.replace_all(input, " ");
    let spaced = BLOCK_BREAK.replace_all(&without_scripts, " ");
    let text = TAG.replace_all(&spaced, "");
    let decoded = decode_entities(&text);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Plain-text excerpt of at most `max_chars` characters.
///
/// Cuts at the last word boundary that fits and appends `...`.
pub fn make_excerpt(input: &str, max_chars: usize) -> String {
    let text = strip_tags(input);
    if text.chars().count() <= max_chars {
        return text;
    }

    let cut: String = text.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end_matches(|c: char| c.is_ascii_punctuation() || c == ' '))
}

/// Render Markdown to HTML.
///
/// Raw HTML inside the Markdown is escaped, not passed through.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

/// Reduce an HTML fragment to plain paragraphs separated by blank lines.
///
/// Script and style bodies are dropped and every tag is removed, so the
/// result can be fed to [`markdown_to_html`] without any markup surviving.
pub fn html_to_paragraphs(input: &str) -> String {
    let without_scripts = DROPPED_BLOCKS.replace_all(input, "\n");
    let broken = BLOCK_BREAK.replace_all(&without_scripts, "\n");
    let text = decode_entities(&TAG.replace_all(&broken, ""));

    text.lines()
        .map(|line| WHITESPACE.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}
