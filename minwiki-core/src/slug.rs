//! Slug generation and normalization.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn separator_regex() -> &'static Regex {
    SEPARATOR_REGEX.get_or_init(|| Regex::new(r"[\s-]+").expect("separator regex is valid"))
}

/// Convert a title to a URL-safe slug
///
/// Rules:
/// - Decompose (NFKD) and drop anything outside ASCII, so diacritics are stripped
/// - Lowercase
/// - Remove characters that are not alphanumeric, whitespace or hyphen
/// - Collapse runs of whitespace and hyphens into one hyphen
/// - Trim leading/trailing hyphens
///
/// The result may be empty when the title has no representable characters;
/// callers that need an address use [`fallback_slug`] in that case.
///
/// # Examples
///
/// ```
/// use minwiki_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("Café au lait"), "cafe-au-lait");
/// ```
pub fn slugify(input: &str) -> String {
    let folded = input
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase();

    let cleaned = folded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || *c == '-')
        .collect::<String>();

    let collapsed = separator_regex().replace_all(&cleaned, "-");

    collapsed.trim_matches('-').to_string()
}

/// Positional slug for documents whose title normalizes to nothing.
///
/// `position` is the 1-based load position of the document.
pub fn fallback_slug(position: usize) -> String {
    format!("untitled-{}", position)
}
