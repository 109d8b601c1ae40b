use chrono::Datelike as _;
use crossterm::event::{
    KeyCode,
    KeyEvent,
    KeyEventKind,
};
use ratatui::layout::{
    Alignment,
    Constraint,
    Layout,
    Rect,
};
use ratatui::style::{
    Modifier,
    Style,
};
use ratatui::text::{
    Line,
    Span,
};
use ratatui::widgets::{
    Paragraph,
    Wrap,
};

use super::Component;
use crate::ui::action::{
    Action,
    Page,
};
use crate::ui::theme::ColorTheme;

const DESCRIPTION: &str = "Campus Chat helps you quickly find answers about your university: regulations, \
                           admissions, courses, campus resources and more. Ask a question in plain language \
                           and get an answer backed by the university's own documents.";

/// Rows needed by the welcome text at the column width, description wrapped to three rows
const CONTENT_HEIGHT: u16 = 10;

#[derive(Default)]
pub struct Landing;

impl Component for Landing {
    fn handle_key_events(&mut self, key: KeyEvent) -> eyre::Result<Option<Action>> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }

        Ok(match key.code {
            KeyCode::Enter => Some(Action::Navigate(Page::Chat)),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        })
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>, rect: Rect, theme: &ColorTheme) -> eyre::Result<()> {
        let [body, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(rect);
        let [_, column, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Max(64),
            Constraint::Fill(1),
        ])
        .areas(body);

        let content = vec![
            Line::from(Span::styled("( campus chat )", Style::default().fg(theme.primary))),
            Line::default(),
            Line::from(Span::styled(
                "Welcome to Campus Chat",
                theme.title().add_modifier(Modifier::UNDERLINED),
            )),
            Line::default(),
            Line::from(Span::styled(DESCRIPTION, Style::default().fg(theme.text))),
            Line::default(),
            Line::from(vec![
                Span::styled("Press ", theme.muted()),
                Span::styled(
                    "Enter",
                    Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to start chatting  ·  ", theme.muted()),
                Span::styled("q", Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)),
                Span::styled(" to quit", theme.muted()),
            ]),
        ];
        let paragraph = Paragraph::new(content)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        let height = CONTENT_HEIGHT.min(column.height);
        let [_, centered, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .areas(column);
        f.render_widget(paragraph, centered);

        let year = chrono::Local::now().year();
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("© {year} Campus Chat. All rights reserved."),
                theme.muted(),
            )))
            .alignment(Alignment::Center),
            footer,
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::components::test_util::{
        key,
        render_component,
    };

    #[test]
    fn test_keys() {
        let mut landing = Landing;
        assert_eq!(
            landing.handle_key_events(key(KeyCode::Enter)).unwrap(),
            Some(Action::Navigate(Page::Chat))
        );
        assert_eq!(landing.handle_key_events(key(KeyCode::Char('q'))).unwrap(), Some(Action::Quit));
        assert_eq!(landing.handle_key_events(key(KeyCode::Char('x'))).unwrap(), None);
    }

    #[test]
    fn test_render() {
        let rows = render_component(&mut Landing, 80, 24);
        assert!(rows.iter().any(|r| r.contains("Welcome to Campus Chat")));
        assert!(rows.iter().any(|r| r.contains("to start chatting")));
        assert!(rows[23].contains("Campus Chat. All rights reserved."));
    }
}
