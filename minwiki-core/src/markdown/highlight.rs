//! Code syntax highlighting using syntect.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Option<Theme>> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> Option<&'static Theme> {
    THEME
        .get_or_init(|| {
            let mut theme_set = ThemeSet::load_defaults();
            theme_set
                .themes
                .remove("InspiredGitHub")
                .or_else(|| theme_set.themes.remove("base16-ocean.light"))
        })
        .as_ref()
}

/// Transformer for syntax highlighting fenced code blocks
///
/// Blocks without a language, or with one syntect does not know, are emitted
/// as plain `<pre><code>`.
pub struct HighlightTransformer;

impl HighlightTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                    code_lang = Some(lang.to_string());
                    code_content.clear();
                }
                Event::Text(text) if code_lang.is_some() => {
                    code_content.push_str(&text);
                }
                Event::End(TagEnd::CodeBlock) if code_lang.is_some() => {
                    let lang = code_lang.take().unwrap_or_default();
                    let html = self.highlight_code(&code_content, &lang);
                    result.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
                }
                other => result.push(other),
            }
        }

        result
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        // Info strings may carry attributes after the language token
        let token = lang.split_whitespace().next().unwrap_or("");

        if let (Some(syntax), Some(theme)) = (find_syntax(token), theme()) {
            if let Ok(html) = highlighted_html_for_string(code, syntax_set(), syntax, theme) {
                return html;
            }
            tracing::warn!("Failed to highlight {} code block", token);
        }

        plain_code_block(code, token)
    }
}

impl Default for HighlightTransformer {
    fn default() -> Self {
        Self::new()
    }
}

fn find_syntax(token: &str) -> Option<&'static SyntaxReference> {
    if token.is_empty() {
        return None;
    }
    let ss = syntax_set();
    ss.find_syntax_by_token(token)
        .or_else(|| ss.find_syntax_by_extension(token))
}

fn plain_code_block(code: &str, token: &str) -> String {
    if token.is_empty() {
        format!("<pre><code>{}</code></pre>\n", super::html_escape(code))
    } else {
        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            super::html_escape(token),
            super::html_escape(code)
        )
    }
}
