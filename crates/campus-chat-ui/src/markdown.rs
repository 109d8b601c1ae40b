//! Renders assistant markdown into styled ratatui lines.
//!
//! Lines produced here are logical lines: they are not wrapped. Wrapping to the viewport width is
//! left to the caller, which needs exact line counts for scrolling.

use pulldown_cmark::{
    Event as MdEvent,
    HeadingLevel,
    Options,
    Parser,
    Tag,
    TagEnd,
};
use ratatui::style::{
    Modifier,
    Style,
};
use ratatui::text::{
    Line,
    Span,
};

use crate::ui::theme::ColorTheme;

const CODE_INDENT: &str = "    ";

#[derive(Clone, Copy)]
enum ListKind {
    Bullet,
    Ordered(u64),
}

struct Renderer<'a> {
    theme: &'a ColorTheme,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<ListKind>,
    links: Vec<String>,
    quote_depth: usize,
    in_code_block: bool,
}

impl<'a> Renderer<'a> {
    fn new(theme: &'a ColorTheme) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![Style::default().fg(theme.text)],
            lists: Vec::new(),
            links: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current
                .push(Span::styled("│ ".repeat(self.quote_depth), Style::default().fg(self.theme.muted)));
        }
        let style = self.style();
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    /// Separates blocks with a single blank line, never more.
    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.blank();
                let mut style = Style::default().fg(self.theme.primary).add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.push_style(style);
            },
            Tag::Paragraph => {
                // Paragraphs inside list items continue the item line
                if self.lists.is_empty() {
                    self.blank();
                }
            },
            Tag::BlockQuote(_) => {
                self.blank();
                self.quote_depth += 1;
                self.push_style(Style::default().fg(self.theme.muted).add_modifier(Modifier::ITALIC));
            },
            Tag::CodeBlock(_) => {
                self.blank();
                self.in_code_block = true;
            },
            Tag::HtmlBlock | Tag::Table(_) => self.blank(),
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.blank();
                } else {
                    self.flush();
                }
                self.lists.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Bullet,
                });
            },
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    },
                    _ => format!("{indent}• "),
                };
                self.current
                    .push(Span::styled(marker, Style::default().fg(self.theme.primary)));
            },
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.links.push(dest_url.into_string());
                self.push_style(Style::default().fg(self.theme.link).add_modifier(Modifier::UNDERLINED));
            },
            _ => {},
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.pop_style();
                self.flush();
            },
            TagEnd::Paragraph => self.flush(),
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.pop_style();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            },
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.flush();
            },
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            },
            TagEnd::Item | TagEnd::TableHead | TagEnd::TableRow => self.flush(),
            TagEnd::TableCell => self.push_text(" │ "),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.links.pop() {
                    let rendered_text = self.current.last().map(|s| s.content.to_string());
                    // Autolinks already show the url as their text
                    if rendered_text.as_deref() != Some(url.as_str()) {
                        self.current
                            .push(Span::styled(format!(" <{url}>"), Style::default().fg(self.theme.muted)));
                    }
                }
            },
            _ => {},
        }
    }

    fn code_block_text(&mut self, text: &str) {
        let style = Style::default().fg(self.theme.code);
        for code_line in text.lines() {
            self.lines
                .push(Line::from(Span::styled(format!("{CODE_INDENT}{code_line}"), style)));
        }
    }

    fn render(mut self, markdown: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(markdown, options) {
            match event {
                MdEvent::Start(tag) => self.start(tag),
                MdEvent::End(tag) => self.end(tag),
                MdEvent::Text(text) if self.in_code_block => self.code_block_text(&text),
                MdEvent::Text(text) => self.push_text(&text),
                MdEvent::Code(code) => {
                    let style = self.style().fg(self.theme.code);
                    self.current.push(Span::styled(format!("`{code}`"), style));
                },
                MdEvent::SoftBreak => self.push_text(" "),
                MdEvent::HardBreak => self.flush(),
                MdEvent::Rule => {
                    self.blank();
                    self.lines
                        .push(Line::from(Span::styled("─".repeat(24), Style::default().fg(self.theme.muted))));
                },
                MdEvent::TaskListMarker(checked) => self.push_text(if checked { "[x] " } else { "[ ] " }),
                MdEvent::Html(html) => {
                    for html_line in html.lines() {
                        self.push_text(html_line);
                        self.flush();
                    }
                },
                MdEvent::InlineHtml(html) => self.push_text(&html),
                _ => {},
            }
        }
        self.flush();

        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Renders `markdown` into unwrapped, styled lines using the colors of `theme`.
pub fn render_markdown(markdown: &str, theme: &ColorTheme) -> Vec<Line<'static>> {
    Renderer::new(theme).render(markdown)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn render(markdown: &str) -> Vec<String> {
        plain(&render_markdown(markdown, &ColorTheme::default()))
    }

    #[test]
    fn test_paragraphs_are_separated_by_one_blank_line() {
        assert_eq!(render("first\n\n\n\nsecond"), vec!["first", "", "second"]);
    }

    #[test]
    fn test_soft_breaks_join_lines() {
        assert_eq!(render("one\ntwo"), vec!["one two"]);
    }

    #[test]
    fn test_lists() {
        let rendered = render(indoc! {"
            Steps:

            1. Apply online
            2. Pay the fee

            - hostel
            - library
        "});
        assert_eq!(rendered, vec![
            "Steps:",
            "",
            "1. Apply online",
            "2. Pay the fee",
            "",
            "• hostel",
            "• library",
        ]);
    }

    #[test]
    fn test_nested_list_is_indented() {
        let rendered = render("- outer\n  - inner\n");
        assert_eq!(rendered, vec!["• outer", "  • inner"]);
    }

    #[test]
    fn test_code_block_is_indented_and_kept_verbatim() {
        let rendered = render(indoc! {"
            Run:

            ```sh
            cargo   build
            ```
        "});
        assert_eq!(rendered, vec!["Run:", "", "    cargo   build"]);
    }

    #[test]
    fn test_inline_code_and_links() {
        let rendered = render("Use `ls` and see [the portal](https://example.edu/portal).");
        assert_eq!(rendered, vec![
            "Use `ls` and see the portal <https://example.edu/portal>."
        ]);
    }

    #[test]
    fn test_autolink_is_not_repeated() {
        assert_eq!(render("<https://example.edu>"), vec!["https://example.edu"]);
    }

    #[test]
    fn test_heading_style() {
        let lines = render_markdown("# Admissions\n\nbody", &ColorTheme::default());
        assert_eq!(plain(&lines), vec!["Admissions", "", "body"]);
        let heading_style = lines[0].spans[0].style;
        assert!(heading_style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(heading_style.fg, Some(ColorTheme::default().primary));
    }

    #[test]
    fn test_emphasis_is_styled_not_marked() {
        let lines = render_markdown("a **bold** move", &ColorTheme::default());
        assert_eq!(plain(&lines), vec!["a bold move"]);
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(!lines[0].spans[2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_block_quote_and_rule() {
        let rendered = render("> quoted\n\n---\n\nafter");
        assert_eq!(rendered, vec!["│ quoted", "", "─".repeat(24).as_str(), "", "after"]);
    }

    #[test]
    fn test_table_rows() {
        let rendered = render("| Course | Credits |\n|---|---|\n| CSE101 | 4 |\n");
        assert_eq!(rendered, vec!["Course │ Credits │ ", "CSE101 │ 4 │ "]);
    }

    #[test]
    fn test_html_is_shown_as_text() {
        assert_eq!(render("<think>still thinking"), vec!["<think>still thinking"]);
        assert_eq!(render("a <b>tag</b>"), vec!["a <b>tag</b>"]);
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert!(render("").is_empty());
        assert!(render("   \n\n").is_empty());
    }
}
