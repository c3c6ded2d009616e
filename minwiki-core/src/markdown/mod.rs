//! Markdown processing pipeline with custom extensions.

pub mod highlight;
pub mod wikilinks;

use crate::slug::slugify;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

pub use highlight::HighlightTransformer;
pub use wikilinks::{LinkResolver, WikilinkTransformer};

/// CSS class for wikilinks whose target does not exist
pub const DEFAULT_UNRESOLVED_CLASS: &str = "wikilink-missing";

/// Parser options shared by link extraction and rendering
pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// Markdown processor with custom extensions
pub struct MarkdownProcessor {
    options: Options,
    unresolved_class: String,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        Self {
            options: markdown_options(),
            unresolved_class: DEFAULT_UNRESOLVED_CLASS.to_string(),
        }
    }

    /// Use a different CSS class for dead wikilinks
    pub fn with_unresolved_class(mut self, class: impl Into<String>) -> Self {
        self.unresolved_class = class.into();
        self
    }

    /// Convert markdown to HTML, resolving wikilinks through `resolver`
    pub fn convert(&self, markdown: &str, resolver: &dyn LinkResolver) -> String {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();

        let wikilink_transformer = WikilinkTransformer::new(resolver, &self.unresolved_class);
        let events = wikilink_transformer.transform(events);

        let events = attach_heading_ids(events);

        let highlight_transformer = HighlightTransformer::new();
        let events = highlight_transformer.transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Convert markdown to HTML with every wikilink left unresolved
    pub fn convert_simple(&self, markdown: &str) -> String {
        self.convert(markdown, &|_: &str| -> Option<String> { None })
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Give every heading without an explicit id a slug of its text
///
/// Repeated headings get `-2`, `-3`, ... suffixes so anchors stay unique.
fn attach_heading_ids(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let ids = collect_heading_ids(&events);
    let mut ids = ids.into_iter();
    let mut result = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let generated = ids.next().flatten();
                let id = id.or_else(|| generated.map(|s| CowStr::Boxed(s.into_boxed_str())));
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            other => result.push(other),
        }
    }

    result
}

fn collect_heading_ids(events: &[Event<'_>]) -> Vec<Option<String>> {
    let mut ids = Vec::new();
    let mut current: Option<String> = None;

    // Explicit `{#id}` anchors are reserved before any are generated
    let mut seen: HashMap<String, usize> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some((id.to_string(), 1)),
            _ => None,
        })
        .collect();

    for event in events {
        match event {
            Event::Start(Tag::Heading { id: Some(_), .. }) => ids.push(None),
            Event::Start(Tag::Heading { .. }) => current = Some(String::new()),
            Event::Text(text) | Event::Code(text) => {
                if let Some(title) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(title) = current.take() {
                    let base = slugify(&title);
                    if base.is_empty() {
                        ids.push(None);
                        continue;
                    }
                    let mut count = seen.get(&base).copied().unwrap_or(0) + 1;
                    let mut id = base.clone();
                    if count > 1 {
                        id = format!("{}-{}", base, count);
                        while seen.contains_key(&id) {
                            count += 1;
                            id = format!("{}-{}", base, count);
                        }
                    }
                    seen.insert(base, count);
                    seen.entry(id.clone()).or_insert(1);
                    ids.push(Some(id));
                }
            }
            _ => {}
        }
    }

    ids
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
