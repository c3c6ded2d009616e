//! Wikilink transformation for [[target]] and [[target|text]] syntax.

use crate::links::{parse_marker, wikilink_regex};
use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};

/// Maps a referenced title to the URL of the document carrying it
pub trait LinkResolver {
    /// Returns `None` for titles no document carries (dead links)
    fn resolve(&self, title: &str) -> Option<String>;
}

impl<F> LinkResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, title: &str) -> Option<String> {
        self(title)
    }
}

/// Transformer for wikilink syntax
pub struct WikilinkTransformer<'a> {
    resolver: &'a dyn LinkResolver,
    unresolved_class: &'a str,
}

impl<'a> WikilinkTransformer<'a> {
    pub fn new(resolver: &'a dyn LinkResolver, unresolved_class: &'a str) -> Self {
        Self {
            resolver,
            unresolved_class,
        }
    }

    /// Transform events, converting [[wikilinks]] to HTML links
    ///
    /// Titles the resolver does not know become a `<span>` with the
    /// unresolved class instead of a link.
    pub fn transform(&self, events: Vec<Event<'_>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut events = events.into_iter().peekable();
        let mut in_code_block = false;

        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::CodeBlock(_)) => {
                    in_code_block = true;
                    result.push(event.into_static());
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    result.push(event.into_static());
                }
                Event::Text(text) if !in_code_block => {
                    // Brackets split text into several events; merge them back
                    let mut merged_text = text.to_string();
                    while let Some(Event::Text(next)) = events.peek() {
                        merged_text.push_str(next);
                        events.next();
                    }

                    if merged_text.contains("[[") {
                        self.process_wikilinks(&merged_text, &mut result);
                    } else {
                        result.push(Event::Text(CowStr::Boxed(merged_text.into_boxed_str())));
                    }
                }
                other => result.push(other.into_static()),
            }
        }

        result
    }

    fn process_wikilinks(&self, text: &str, out: &mut Vec<Event<'static>>) {
        let mut last = 0;

        for captures in wikilink_regex().captures_iter(text) {
            let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let Some(link) = parse_marker(inner.as_str()) else {
                continue;
            };

            if whole.start() > last {
                out.push(text_event(&text[last..whole.start()]));
            }
            self.push_link(link.target, link.label, out);
            last = whole.end();
        }

        if last < text.len() {
            out.push(text_event(&text[last..]));
        }
    }

    fn push_link(&self, target: &str, label: &str, out: &mut Vec<Event<'static>>) {
        match self.resolver.resolve(target) {
            Some(href) => {
                out.push(Event::Start(Tag::Link {
                    link_type: LinkType::Inline,
                    dest_url: CowStr::Boxed(href.into_boxed_str()),
                    title: CowStr::Borrowed(""),
                    id: CowStr::Borrowed(""),
                }));
                out.push(text_event(label));
                out.push(Event::End(TagEnd::Link));
            }
            None => {
                tracing::debug!("Unresolved wikilink: {}", target);
                let open = format!(
                    "<span class=\"{}\" title=\"{}\">",
                    super::html_escape(self.unresolved_class),
                    super::html_escape(target)
                );
                out.push(Event::InlineHtml(CowStr::Boxed(open.into_boxed_str())));
                out.push(text_event(label));
                out.push(Event::InlineHtml(CowStr::Borrowed("</span>")));
            }
        }
    }
}

fn text_event(text: &str) -> Event<'static> {
    Event::Text(CowStr::Boxed(text.to_string().into_boxed_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(title: &str) -> Option<String> {
        match title {
            "Rust Safety" => Some("/posts/rust-safety.html".to_string()),
            _ => None,
        }
    }

    fn link_targets(events: &[Event<'_>]) -> Vec<String> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_simple_wikilink() {
        let transformer = WikilinkTransformer::new(&resolver, "missing");
        let events = vec![Event::Text(CowStr::Borrowed("Check out [[Rust Safety]]"))];

        let result = transformer.transform(events);

        assert_eq!(link_targets(&result), vec!["/posts/rust-safety.html"]);
        assert!(matches!(&result[0], Event::Text(t) if t.as_ref() == "Check out "));
    }

    #[test]
    fn test_wikilink_with_display_text() {
        let transformer = WikilinkTransformer::new(&resolver, "missing");
        let events = vec![Event::Text(CowStr::Borrowed(
            "See [[Rust Safety|this guide]]",
        ))];
        let result = transformer.transform(events);

        assert_eq!(link_targets(&result), vec!["/posts/rust-safety.html"]);
        assert!(result
            .iter()
            .any(|e| matches!(e, Event::Text(t) if t.as_ref() == "this guide")));
    }

    #[test]
    fn test_split_text_events_are_merged() {
        let transformer = WikilinkTransformer::new(&resolver, "missing");
        let events = vec![
            Event::Text(CowStr::Borrowed("a [")),
            Event::Text(CowStr::Borrowed("[Rust Safety]")),
            Event::Text(CowStr::Borrowed("] b")),
        ];
        let result = transformer.transform(events);
        assert_eq!(link_targets(&result), vec!["/posts/rust-safety.html"]);
    }

    #[test]
    fn test_unresolved_wikilink_becomes_span() {
        let transformer = WikilinkTransformer::new(&resolver, "wikilink-missing");
        let events = vec![Event::Text(CowStr::Borrowed("Soon: [[Future Post]]."))];
        let result = transformer.transform(events);

        assert!(link_targets(&result).is_empty());
        assert!(result.iter().any(|e| matches!(
            e,
            Event::InlineHtml(h) if h.as_ref() == "<span class=\"wikilink-missing\" title=\"Future Post\">"
        )));
        assert!(matches!(result.last(), Some(Event::Text(t)) if t.as_ref() == "."));
    }

    #[test]
    fn test_code_block_untouched() {
        let transformer = WikilinkTransformer::new(&resolver, "missing");
        let events = vec![
            Event::Start(Tag::CodeBlock(pulldown_cmark::CodeBlockKind::Indented)),
            Event::Text(CowStr::Borrowed("[[Rust Safety]]")),
            Event::End(TagEnd::CodeBlock),
        ];
        let result = transformer.transform(events);
        assert!(link_targets(&result).is_empty());
    }
}
