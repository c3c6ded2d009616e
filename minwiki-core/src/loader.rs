//! Loading a single document file into a typed [`Document`].

use crate::frontmatter::{parse_frontmatter, FrontmatterError};
use crate::links::extract_links;
use crate::models::{Diagnostic, Document, ErrorKind, Frontmatter};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a document could not be loaded
#[derive(Error, Debug)]
pub enum ParseErrorKind {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("{0}")]
    Header(#[from] FrontmatterError),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid date `{0}` (expected YYYY-MM-DD, optionally with a time)")]
    InvalidDate(String),
}

/// A document that failed to load, with the file it came from
#[derive(Error, Debug)]
#[error("{}: {kind}", .path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn error_kind(&self) -> ErrorKind {
        match self.kind {
            ParseErrorKind::Read(_) => ErrorKind::ReadError,
            ParseErrorKind::Header(_) => ErrorKind::HeaderParseError,
            ParseErrorKind::MissingField(_) => ErrorKind::MissingField,
            ParseErrorKind::InvalidDate(_) => ErrorKind::InvalidDate,
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            path: self.path.clone(),
            kind: self.error_kind(),
            message: self.kind.to_string(),
        }
    }
}

/// Read and parse the document at `path`
///
/// The returned document has no slug yet; the corpus resolver assigns it.
pub fn load_document(path: &Path) -> Result<Document, ParseError> {
    let content = fs::read_to_string(path).map_err(|e| ParseError {
        path: path.to_path_buf(),
        kind: e.into(),
    })?;

    parse_document(path, &content)
}

/// Parse already-read file content as the document at `path`
pub fn parse_document(path: &Path, content: &str) -> Result<Document, ParseError> {
    build_document(path, content).map_err(|kind| ParseError {
        path: path.to_path_buf(),
        kind,
    })
}

fn build_document(path: &Path, content: &str) -> Result<Document, ParseErrorKind> {
    let (frontmatter, body) = parse_frontmatter(content)?;
    let Frontmatter {
        title,
        date,
        description,
        ..
    } = frontmatter;

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ParseErrorKind::MissingField("title"))?;

    let date = date
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or(ParseErrorKind::MissingField("date"))?;
    let date = parse_date(&date).ok_or(ParseErrorKind::InvalidDate(date))?;

    let outbound_links = extract_links(&body);

    tracing::debug!(
        "Loaded {:?} ({} outbound links)",
        path,
        outbound_links.len()
    );

    Ok(Document {
        title,
        date,
        slug: String::new(),
        description: description.filter(|d| !d.trim().is_empty()),
        body_raw: body,
        outbound_links,
        source_path: path.to_path_buf(),
    })
}

/// Parse an ISO-8601-like timestamp
///
/// Accepts a bare date, a date with `T` or space separated time (with or
/// without seconds), and RFC 3339 with an offset, which is converted to UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    if let Some(parsed) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(parsed);
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}
