//! Content model structs for documents and build diagnostics.

use chrono::{NaiveDateTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Header keys recognized in a document's frontmatter
///
/// `title` and `date` are required; they are optional here so that their
/// absence can be reported as a typed error instead of a YAML error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub description: Option<String>,

    /// Keys with no meaning to the build; kept only so they can be reported
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Accept any YAML scalar as text (`title: 1984` is a valid title)
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(de::Error::custom("expected a string, found a sequence or mapping")),
    }
}

/// A single content document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Display title, as written in the header
    pub title: String,

    /// Publication timestamp (UTC)
    pub date: NaiveDateTime,

    /// URL slug, attached by the corpus resolver (empty until then)
    pub slug: String,

    /// Optional summary from the header
    pub description: Option<String>,

    /// Markdown body without the header
    pub body_raw: String,

    /// Titles referenced by `[[...]]` markers, in source order
    pub outbound_links: Vec<String>,

    /// Origin file, for diagnostics only
    pub source_path: PathBuf,
}

impl Document {
    /// Relative output path for this document (no leading slash)
    pub fn output_rel_path(&self) -> String {
        format!("{}/{}.html", crate::POSTS_DIR, self.slug)
    }

    /// URL for this document including a base path
    pub fn url_with_base(&self, base_url: &str) -> String {
        format!(
            "{}{}",
            crate::config::normalize_base_url(base_url),
            self.output_rel_path()
        )
    }

    /// Date as shown to readers: the day, plus the time when it is not midnight
    pub fn display_date(&self) -> String {
        if self.date.num_seconds_from_midnight() == 0 {
            self.date.format("%Y-%m-%d").to_string()
        } else {
            self.date.format("%Y-%m-%d %H:%M").to_string()
        }
    }
}

/// Category of a build failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    MissingField,
    HeaderParseError,
    InvalidDate,
    ReadError,
    DuplicateSlug,
    OutputWriteError,
    TemplateError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "missing-field",
            ErrorKind::HeaderParseError => "header-parse-error",
            ErrorKind::InvalidDate => "invalid-date",
            ErrorKind::ReadError => "read-error",
            ErrorKind::DuplicateSlug => "duplicate-slug",
            ErrorKind::OutputWriteError => "output-write-error",
            ErrorKind::TemplateError => "template-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing problem tied to a source or output path
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error[{}] {}: {}",
            self.kind,
            self.path.display(),
            self.message
        )
    }
}
