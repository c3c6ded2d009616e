//! Askama template definitions.

use askama::Template;

/// A document linking to the page being rendered
#[derive(Debug, Clone)]
pub struct BacklinkEntry {
    pub url: String,
    pub title: String,
}

/// One row of the index listing
#[derive(Debug, Clone)]
pub struct PostEntry {
    pub url: String,
    pub title: String,
    /// Human-readable date
    pub date: String,
    /// Machine-readable date for the `datetime` attribute
    pub datetime: String,
    pub description: Option<String>,
}

/// Template for a single document page
#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    // Page metadata
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub datetime: String,

    // Rendered body, inserted unescaped
    pub content: String,

    pub backlinks: Vec<BacklinkEntry>,

    // Site metadata
    pub site_title: String,
    pub site_author: Option<String>,
    pub base_url: String,
}

/// Template for the site index
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub site_title: String,
    pub site_description: Option<String>,
    pub site_author: Option<String>,
    pub base_url: String,

    /// Documents, already sorted newest first
    pub posts: Vec<PostEntry>,
}
