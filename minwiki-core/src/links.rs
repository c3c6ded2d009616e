//! Wiki-link extraction for `[[Title]]` and `[[Title|label]]` markers.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

static WIKILINK_REGEX: OnceLock<Regex> = OnceLock::new();

/// Matches one balanced `[[...]]` marker; brackets may not appear inside
pub(crate) fn wikilink_regex() -> &'static Regex {
    WIKILINK_REGEX.get_or_init(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("wikilink regex is valid"))
}

/// The parts of a single wiki-link marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink<'a> {
    /// Referenced document title
    pub target: &'a str,
    /// Text shown in place of the marker
    pub label: &'a str,
}

/// Split the inside of a marker into target and label
///
/// The target is kept byte-for-byte, since titles match exactly. Returns
/// `None` when the target is blank, in which case the marker is plain text.
pub fn parse_marker(inner: &str) -> Option<WikiLink<'_>> {
    let (target, label) = match inner.split_once('|') {
        Some((target, label)) => (target, label.trim()),
        None => (inner, inner),
    };

    if target.trim().is_empty() {
        return None;
    }

    Some(WikiLink {
        target,
        label: if label.is_empty() { target } else { label },
    })
}

/// Extract referenced titles from a markdown body, in source order
///
/// Duplicates are kept. Markers inside code blocks and inline code are
/// literal text, matching how the markdown transform renders them.
///
/// # Example
///
/// ```
/// use minwiki_core::extract_links;
///
/// let links = extract_links("See [[Rust]] and [[Go|golang]], then [[Rust]] again.");
/// assert_eq!(links, vec!["Rust", "Go", "Rust"]);
/// ```
pub fn extract_links(body: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut in_code_block = false;
    let mut merged_text = String::new();

    for event in Parser::new_ext(body, crate::markdown::markdown_options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(text) if !in_code_block => {
                merged_text.push_str(&text);
                continue;
            }
            _ => {}
        }
        collect_markers(&merged_text, &mut links);
        merged_text.clear();
    }
    collect_markers(&merged_text, &mut links);

    links
}

fn collect_markers(text: &str, links: &mut Vec<String>) {
    if !text.contains("[[") {
        return;
    }
    for captures in wikilink_regex().captures_iter(text) {
        if let Some(link) = captures.get(1).and_then(|m| parse_marker(m.as_str())) {
            links.push(link.target.to_string());
        }
    }
}
