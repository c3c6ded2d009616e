//! Frontmatter parsing from markdown files.

use crate::models::Frontmatter;
use thiserror::Error;

/// Line that opens and closes the header block
pub const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML header: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Split raw file content into an optional header block and the body
///
/// A delimiter is a line consisting of `---` (trailing whitespace ignored).
/// With at least two delimiters, the header is the text between the first
/// two and the body is everything after the second, later delimiters
/// included. Otherwise there is no header and the whole content is the body.
/// The body is trimmed of surrounding whitespace.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let mut delimiters = Vec::with_capacity(2);
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            delimiters.push((offset, offset + line.len()));
            if delimiters.len() == 2 {
                break;
            }
        }
        offset += line.len();
    }

    match delimiters.as_slice() {
        [(_, header_start), (header_end, body_start)] => (
            Some(&content[*header_start..*header_end]),
            content[*body_start..].trim(),
        ),
        _ => (None, content.trim()),
    }
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body). Without a header block
/// the frontmatter is empty and the full content is the body. Required keys
/// are not checked here; see [`crate::loader`].
///
/// # Example
///
/// ```
/// use minwiki_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\ndate: 2025-01-01\n---\n# Hello World\n";
///
/// let (fm, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.title.as_deref(), Some("My Post"));
/// assert_eq!(fm.date.as_deref(), Some("2025-01-01"));
/// assert_eq!(body, "# Hello World");
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let (header, body) = split_frontmatter(content);

    let frontmatter = match header {
        // An empty block is an empty mapping, not a YAML document
        Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml)?,
        _ => Frontmatter::default(),
    };

    if !frontmatter.extra.is_empty() {
        tracing::debug!(
            "Ignoring unrecognized header keys: {}",
            frontmatter
                .extra
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok((frontmatter, body.to_string()))
}
