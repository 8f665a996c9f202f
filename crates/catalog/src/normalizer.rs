//! Turns raw feed bytes into text an XML parser accepts.
//!
//! Feeds are served in a legacy single-byte code page and routinely carry an
//! `encoding` declaration that does not match their bytes. Decoding is total: every
//! byte sequence produces some text.

use std::sync::OnceLock;

use encoding_rs::{Encoding, WINDOWS_1250};
use regex::Regex;
use tracing::debug;

pub const FEED_ENCODING: &Encoding = WINDOWS_1250;
pub const DEFAULT_EXCERPT_CHARS: usize = 512;

const UNICODE_DECLARATION: &str = "\"UTF-8\"";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedFeed {
    pub text: String,
    pub encoding: &'static str,
    pub had_replacements: bool,
    pub declaration_rewritten: bool,
}

fn declaration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)^(\s*<\?xml\b[^?]*?\bencoding\s*=\s*)(?:"[^"]*"|'[^']*')"#)
            .expect("encoding declaration pattern is valid")
    })
}

/// Decodes with the feed code page (a byte-order mark, when present, wins), replaces
/// characters XML forbids and points the declaration at UTF-8.
pub fn normalize_feed(raw: &[u8]) -> NormalizedFeed {
    let (decoded, used_encoding, had_errors) = FEED_ENCODING.decode(raw);
    let (sanitized, stripped_controls) = replace_forbidden_chars(&decoded);
    let (text, declaration_rewritten) = rewrite_encoding_declaration(&sanitized);

    debug!(
        event_name = "catalog.feed.normalized",
        encoding = used_encoding.name(),
        bytes = raw.len(),
        had_errors,
        stripped_controls,
        declaration_rewritten,
        "feed payload normalized"
    );

    NormalizedFeed {
        text,
        encoding: used_encoding.name(),
        had_replacements: had_errors || stripped_controls,
        declaration_rewritten,
    }
}

pub fn rewrite_encoding_declaration(text: &str) -> (String, bool) {
    let pattern = declaration_pattern();
    if !pattern.is_match(text) {
        return (text.to_owned(), false);
    }
    let rewritten = pattern.replace(text, |captures: &regex::Captures<'_>| {
        format!("{}{UNICODE_DECLARATION}", &captures[1])
    });
    (rewritten.into_owned(), true)
}

fn replace_forbidden_chars(text: &str) -> (String, bool) {
    let forbidden = |ch: char| ch < '\u{20}' && !matches!(ch, '\t' | '\n' | '\r');
    if !text.contains(forbidden) {
        return (text.to_owned(), false);
    }
    let replaced = text
        .chars()
        .map(|ch| if forbidden(ch) { char::REPLACEMENT_CHARACTER } else { ch })
        .collect();
    (replaced, true)
}

/// Leading characters of a payload, for operator troubleshooting.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Leading characters of the undecoded payload. Invalid UTF-8 shows up as U+FFFD.
pub fn raw_excerpt(raw: &[u8], max_chars: usize) -> String {
    // Four bytes per char at most, so this prefix always holds `max_chars` characters.
    let prefix = &raw[..raw.len().min(max_chars.saturating_mul(4))];
    excerpt(&String::from_utf8_lossy(prefix), max_chars)
}
