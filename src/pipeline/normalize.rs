//! Text normalisation applied when fragment text is joined into lines,
//! blocks and table cells.
//!
//! Fragment producers hand over text exactly as extracted: zero-width
//! characters, soft hyphens and stray control whitespace included. Joining
//! such runs naively yields double spaces and invisible junk in every
//! downstream format, so each run is cleaned here first. The fragments
//! themselves are never modified; only the joined strings are.

use crate::model::TextFragment;
use once_cell::sync::Lazy;
use regex::Regex;

// ── Rule 1: Strip invisible Unicode ──────────────────────────────────────────

static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200B}\u{200C}\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

fn remove_invisible_chars(input: &str) -> String {
    RE_INVISIBLE.replace_all(input, "").into_owned()
}

// ── Rule 2: Collapse whitespace (CR, LF, tabs, NBSP runs) ────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\u{00A0}]+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").trim().to_string()
}

/// Clean one fragment's text: strip invisible characters, collapse all
/// whitespace runs to a single space, trim both ends.
pub fn clean_text(input: &str) -> String {
    collapse_whitespace(&remove_invisible_chars(input))
}

/// Join fragments with a single space. Fragments that are empty after
/// cleaning contribute nothing, so no doubled separators appear.
pub fn join_fragments<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a TextFragment>,
{
    fragments
        .into_iter()
        .map(|f| clean_text(&f.text))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
