//! Turn rendered chat content into styled terminal lines.
//!
//! Model replies arrive as sanitized HTML; this walks the element tree and
//! maps the handful of tags Markdown produces onto ratatui styles. Every text
//! node is also stripped of terminal control characters so a reply cannot
//! smuggle escape sequences into the terminal.

use ragchat_core::{RenderedContent, SafeMarkup};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use scraper::{ElementRef, Html, Node};

/// Strip C0/C1 control characters except tab and newline.
pub fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&ch| {
            let code = ch as u32;
            if ch == '\t' || ch == '\n' {
                return true;
            }
            // C0 (includes ESC), DEL, C1 (includes CSI)
            !(code <= 0x1F || code == 0x7F || (0x80..=0x9F).contains(&code))
        })
        .collect()
}

pub fn content_to_lines(content: &RenderedContent) -> Vec<Line<'static>> {
    match content {
        RenderedContent::PlainText(text) => plain_text_lines(text),
        RenderedContent::Markup(markup) => markup_to_lines(markup),
    }
}

/// User text is shown exactly as typed, one terminal line per input line.
pub fn plain_text_lines(text: &str) -> Vec<Line<'static>> {
    strip_control_chars(text)
        .split('\n')
        .map(|line| Line::from(line.to_string()))
        .collect()
}

pub fn markup_to_lines(markup: &SafeMarkup) -> Vec<Line<'static>> {
    let fragment = Html::parse_fragment(markup.as_str());
    let mut writer = LineWriter::default();
    writer.walk(fragment.root_element(), Style::default());
    writer.finish()
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    // One entry per open list: None for <ul>, Some(next number) for <ol>
    lists: Vec<Option<u64>>,
    in_pre: bool,
}

impl LineWriter {
    fn walk(&mut self, element: ElementRef<'_>, style: Style) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    let text: &str = text;
                    self.push_text(text, style);
                }
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.element(el, style);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef<'_>, style: Style) {
        let name = el.value().name();
        match name {
            "p" | "div" => {
                self.flush();
                self.walk(el, style);
                self.blank();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let heading = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
                self.current.push(Span::styled(format!("{} ", "#".repeat(level)), heading));
                self.walk(el, heading);
                self.blank();
            }
            "strong" | "b" => self.walk(el, style.add_modifier(Modifier::BOLD)),
            "em" | "i" => self.walk(el, style.add_modifier(Modifier::ITALIC)),
            "del" | "s" => self.walk(el, style.add_modifier(Modifier::CROSSED_OUT)),
            "code" => self.walk(el, style.fg(Color::Yellow)),
            "pre" => {
                self.flush();
                self.in_pre = true;
                self.walk(el, style.fg(Color::Yellow));
                self.in_pre = false;
                self.blank();
            }
            "blockquote" => {
                self.flush();
                self.walk(el, style.fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
                self.blank();
            }
            "ul" | "ol" => {
                self.flush();
                let start = el
                    .value()
                    .attr("start")
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(1);
                self.lists.push(if name == "ol" { Some(start) } else { None });
                self.walk(el, style);
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            "li" => {
                self.flush();
                let depth = self.lists.len().max(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current
                    .push(Span::styled(format!("{}{}", "  ".repeat(depth - 1), marker), style));
                self.walk(el, style);
                self.flush();
            }
            "a" => {
                self.walk(el, style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED));
                if let Some(href) = el.value().attr("href") {
                    let label: String = el.text().collect();
                    if label.trim() != href {
                        self.current.push(Span::styled(
                            format!(" ({})", strip_control_chars(href)),
                            style.fg(Color::DarkGray),
                        ));
                    }
                }
            }
            "img" => {
                let alt = el.value().attr("alt").unwrap_or("image");
                self.current.push(Span::styled(
                    format!("[{}]", strip_control_chars(alt)),
                    style.fg(Color::DarkGray),
                ));
            }
            "br" => self.flush(),
            "hr" => {
                self.flush();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), style.fg(Color::DarkGray))));
                self.blank();
            }
            "table" => {
                self.flush();
                self.walk(el, style);
                self.blank();
            }
            "tr" => {
                self.flush();
                let mut first = true;
                for cell in el.children().filter_map(ElementRef::wrap) {
                    if !first {
                        self.current.push(Span::styled(" │ ", style.fg(Color::DarkGray)));
                    }
                    first = false;
                    let cell_style = if cell.value().name() == "th" {
                        style.add_modifier(Modifier::BOLD)
                    } else {
                        style
                    };
                    self.walk(cell, cell_style);
                }
                self.flush();
            }
            "input" => {
                // Task list checkbox
                let marker = if el.value().attr("checked").is_some() { "[x] " } else { "[ ] " };
                self.current.push(Span::styled(marker, style));
            }
            _ => self.walk(el, style),
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        let text = strip_control_chars(text);

        if self.in_pre {
            let mut parts = text.split('\n').peekable();
            while let Some(part) = parts.next() {
                if !part.is_empty() {
                    self.current.push(Span::styled(part.to_string(), style));
                }
                if parts.peek().is_some() {
                    self.flush_pre_line();
                }
            }
            return;
        }

        let mut collapsed = collapse_whitespace(&text);
        if self.current.is_empty() {
            collapsed = collapsed.trim_start().to_string();
        }
        if !collapsed.is_empty() {
            self.current.push(Span::styled(collapsed, style));
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    /// Inside <pre> empty lines are significant.
    fn flush_pre_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| !is_blank(l)) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(is_blank) {
            self.lines.pop();
        }
        self.lines
    }
}

fn is_blank(line: &Line<'_>) -> bool {
    line.spans.iter().all(|s| s.content.trim().is_empty())
}

/// Collapse runs of whitespace to one space, keeping a single leading or
/// trailing space when the input had one.
fn collapse_whitespace(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return if text.is_empty() { String::new() } else { " ".to_string() };
    }

    let mut out = String::new();
    if text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&words.join(" "));
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::UntrustedRenderer;

    fn render(markdown: &str) -> Vec<Line<'static>> {
        markup_to_lines(&UntrustedRenderer::new().render_untrusted(markdown))
    }

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_and_italic_spans() {
        let lines = render("some **bold** and *soft* text");
        assert_eq!(lines.len(), 1);
        assert_eq!(text_of(&lines[0]), "some bold and soft text");

        let bold = lines[0].spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let soft = lines[0].spans.iter().find(|s| s.content == "soft").unwrap();
        assert!(soft.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let lines = render("# Title\n\nFirst paragraph.\n\nSecond one.");
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["# Title", "", "First paragraph.", "", "Second one."]);
    }

    #[test]
    fn test_lists() {
        let lines = render("- apples\n- pears\n\n1. one\n2. two");
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["• apples", "• pears", "", "1. one", "2. two"]);
    }

    #[test]
    fn test_code_block_keeps_lines() {
        let lines = render("```\nfn main() {\n    run();\n}\n```");
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["fn main() {", "    run();", "}"]);
    }

    #[test]
    fn test_link_target_is_shown() {
        let lines = render("see [docs](https://example.com/docs)");
        assert_eq!(text_of(&lines[0]), "see docs (https://example.com/docs)");
    }

    #[test]
    fn test_injected_markup_renders_inert() {
        let lines = render(r#"<img src=x onerror="alert(1)" alt="pic"><script>alert(2)</script>"#);
        let all: String = lines.iter().map(text_of).collect::<Vec<_>>().join("\n");
        assert!(!all.contains("alert"));
        assert!(all.contains("[pic]"));
    }

    #[test]
    fn test_user_text_is_literal() {
        let lines = plain_text_lines("<b>not bold</b>\nsecond");
        let texts: Vec<String> = lines.iter().map(text_of).collect();
        assert_eq!(texts, vec!["<b>not bold</b>", "second"]);
    }

    #[test]
    fn test_control_chars_are_stripped() {
        assert_eq!(strip_control_chars("a\x1b[31mred\x07\u{9b}b"), "a[31mredb");
        assert_eq!(strip_control_chars("tab\tnew\nline"), "tab\tnew\nline");
    }
}
