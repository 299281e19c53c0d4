//! Rendering of chat content for display
//!
//! Model output is untrusted: it goes through Markdown → HTML → sanitizer, in
//! that order, before anything is shown. User input is never interpreted and
//! stays plain text.

use pulldown_cmark::{Options, Parser, html};

use crate::state::ChatRole;

/// Converts Markdown source into HTML.
pub trait MarkdownParser {
    fn parse(&self, markdown: &str) -> String;
}

/// Removes anything executable from an HTML fragment.
pub trait Sanitizer {
    fn sanitize(&self, html: &str) -> String;
}

/// CommonMark with the usual GitHub extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkParser;

impl MarkdownParser for CommonMarkParser {
    fn parse(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Allow-list sanitizer backed by ammonia's defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmmoniaSanitizer;

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        ammonia::clean(html)
    }
}

/// HTML that has been through the sanitizer.
///
/// Only [`UntrustedRenderer`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeMarkup(String);

impl SafeMarkup {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// What gets inserted into the chat history for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedContent {
    Markup(SafeMarkup),
    PlainText(String),
}

/// Parse-then-sanitize pipeline for model output.
#[derive(Debug, Clone, Default)]
pub struct UntrustedRenderer<P = CommonMarkParser, S = AmmoniaSanitizer> {
    parser: P,
    sanitizer: S,
}

impl UntrustedRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: MarkdownParser, S: Sanitizer> UntrustedRenderer<P, S> {
    pub fn with_parts(parser: P, sanitizer: S) -> Self {
        Self { parser, sanitizer }
    }

    pub fn render_untrusted(&self, text: &str) -> SafeMarkup {
        let html = self.parser.parse(text);
        SafeMarkup(self.sanitizer.sanitize(&html))
    }

    pub fn render(&self, role: ChatRole, content: &str) -> RenderedContent {
        match role {
            ChatRole::Ai => RenderedContent::Markup(self.render_untrusted(content)),
            ChatRole::User => RenderedContent::PlainText(content.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const PAYLOAD: &str = r#"<img src=x onerror="alert(1)"> and <script>alert(2)</script>"#;

    #[test]
    fn test_markdown_becomes_html() {
        let renderer = UntrustedRenderer::new();
        let markup = renderer.render_untrusted("# Title\n\n**bold** and `code`");
        assert!(markup.as_str().contains("<h1>Title</h1>"));
        assert!(markup.as_str().contains("<strong>bold</strong>"));
        assert!(markup.as_str().contains("<code>code</code>"));
    }

    #[test]
    fn test_ai_payload_is_neutralized() {
        let renderer = UntrustedRenderer::new();
        let markup = renderer.render_untrusted(PAYLOAD);
        let html = markup.as_str();
        assert!(!html.contains("onerror"));
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert(2)"));
    }

    #[test]
    fn test_javascript_links_are_dropped() {
        let renderer = UntrustedRenderer::new();
        let markup = renderer.render_untrusted("[click](javascript:alert(1))");
        assert!(!markup.as_str().contains("javascript:"));
        assert!(markup.as_str().contains("click"));
    }

    #[test]
    fn test_user_content_stays_literal() {
        let renderer = UntrustedRenderer::new();
        match renderer.render(ChatRole::User, PAYLOAD) {
            RenderedContent::PlainText(text) => assert_eq!(text, PAYLOAD),
            other => panic!("expected plain text, got {:?}", other),
        }
    }

    struct TracingParser<'a>(&'a RefCell<Vec<&'static str>>);
    struct TracingSanitizer<'a>(&'a RefCell<Vec<&'static str>>);

    impl MarkdownParser for TracingParser<'_> {
        fn parse(&self, markdown: &str) -> String {
            self.0.borrow_mut().push("parse");
            format!("<p>{}</p>", markdown)
        }
    }

    impl Sanitizer for TracingSanitizer<'_> {
        fn sanitize(&self, html: &str) -> String {
            self.0.borrow_mut().push("sanitize");
            html.replace("<p>", "").replace("</p>", "")
        }
    }

    #[test]
    fn test_parse_runs_before_sanitize() {
        let calls = RefCell::new(Vec::new());
        let renderer =
            UntrustedRenderer::with_parts(TracingParser(&calls), TracingSanitizer(&calls));

        let markup = renderer.render_untrusted("x");
        assert_eq!(markup.as_str(), "x");
        assert_eq!(*calls.borrow(), vec!["parse", "sanitize"]);
    }
}
