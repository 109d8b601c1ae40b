use ratatui::layout::Rect;
use ratatui::style::{
    Modifier,
    Style,
};
use ratatui::text::{
    Line,
    Span,
};
use ratatui::widgets::{
    Block,
    Borders,
    Paragraph,
};

use super::Component;
use crate::protocol::{
    Event as SessionEvent,
    Role,
};
use crate::ui::action::Action;
use crate::ui::theme::ColorTheme;
use crate::util::truncate_chars;

pub const SIDEBAR_WIDTH: u16 = 30;

/// Navigation panel of the chat screen, listing the questions asked in this session.
#[derive(Default)]
pub struct Sidebar {
    open: bool,
    history_expanded: bool,
    questions: Vec<String>,
}

impl Sidebar {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

impl Component for Sidebar {
    fn handle_session_events(&mut self, session_event: &SessionEvent) -> eyre::Result<Option<Action>> {
        match session_event {
            SessionEvent::TurnAppended(turn) if turn.role == Role::User => {
                self.questions.push(turn.text.clone());
            },
            SessionEvent::TranscriptCleared => self.questions.clear(),
            _ => {},
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> eyre::Result<Option<Action>> {
        match action {
            Action::ToggleSidebar => self.open = !self.open,
            Action::ToggleHistory => self.history_expanded = !self.history_expanded,
            _ => {},
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>, rect: Rect, theme: &ColorTheme) -> eyre::Result<()> {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(false))
            .title(Span::styled(" Campus Chat ", theme.title()));
        let item_width = (block.inner(rect).width as usize).saturating_sub(5);

        let entry = |label: &str, shortcut: &str| {
            Line::from(vec![
                Span::styled(label.to_string(), Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {shortcut}"), theme.muted()),
            ])
        };

        let arrow = if self.history_expanded { "▾" } else { "▸" };
        let mut lines = vec![
            entry("+ New chat", "Ctrl+N"),
            Line::default(),
            entry(&format!("{arrow} This session"), "Ctrl+E"),
        ];
        if self.history_expanded {
            if self.questions.is_empty() {
                lines.push(Line::from(Span::styled("    No questions yet", theme.muted())));
            }
            for question in &self.questions {
                let first_line = question.lines().next().unwrap_or_default();
                let label = truncate_chars(first_line, item_width.saturating_sub(3));
                lines.push(Line::from(Span::styled(
                    format!("    {label}"),
                    Style::default().fg(theme.text),
                )));
            }
        }
        lines.push(Line::default());
        lines.push(entry("⚙ Settings", "Ctrl+O"));

        f.render_widget(Paragraph::new(lines).block(block), rect);

        Ok(())
    }
}
