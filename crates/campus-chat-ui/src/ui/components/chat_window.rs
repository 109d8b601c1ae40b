use crossterm::event::{
    KeyCode,
    KeyEvent,
    KeyEventKind,
    KeyModifiers,
};
use ratatui::layout::{
    Alignment,
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
    Block,
    Borders,
    Paragraph,
};

use super::{
    Component,
    TypingIndicator,
};
use crate::markdown::render_markdown;
use crate::protocol::{
    Event as SessionEvent,
    InputEvent,
    Role,
    TurnView,
};
use crate::segment::{
    SegmentedAnswer,
    segment_response,
};
use crate::ui::action::{
    Action,
    Scroll,
    ScrollDistance,
};
use crate::ui::theme::ColorTheme;
use crate::util::{
    truncate_chars,
    wrap_lines,
};

/// Characters of a source document shown in the sources block
pub const SOURCE_PREVIEW_CHARS: usize = 200;

pub const MORE_BELOW_MARKER: &str = " ↓ more below (End) ";

#[derive(Debug, Clone)]
struct Message {
    turn: TurnView,
    /// Present for assistant turns only
    segmented: Option<SegmentedAnswer>,
    show_reasoning: bool,
    show_sources: bool,
}

impl Message {
    fn new(turn: TurnView) -> Self {
        let segmented = match turn.role {
            Role::Assistant => Some(segment_response(&turn.text)),
            Role::User => None,
        };

        Self {
            turn,
            segmented,
            show_reasoning: false,
            show_sources: false,
        }
    }

    fn has_reasoning(&self) -> bool {
        self.segmented.as_ref().and_then(|s| s.shown_reasoning()).is_some()
    }

    fn lines(&self, theme: &ColorTheme, user_label: &str, focused: bool) -> Vec<Line<'static>> {
        let (label, label_color) = match self.turn.role {
            Role::User => (user_label.to_string(), theme.user),
            Role::Assistant => ("Assistant".to_string(), theme.assistant),
        };
        let mut label_style = Style::default().fg(label_color).add_modifier(Modifier::BOLD);
        if focused {
            label_style = label_style.add_modifier(Modifier::REVERSED);
        }

        let mut lines = vec![Line::from(vec![
            Span::styled(format!("[{}] ", self.turn.timestamp), theme.muted()),
            Span::styled(label, label_style),
        ])];

        match &self.segmented {
            None => {
                let text = strip_ansi_escapes::strip_str(&self.turn.text);
                lines.extend(
                    text.lines()
                        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme.text)))),
                );
            },
            Some(segmented) => {
                if let Some(reasoning) = segmented.shown_reasoning() {
                    lines.push(toggle_line(
                        "Assistant's Reasoning",
                        self.show_reasoning,
                        "Ctrl+R",
                        theme,
                    ));
                    if self.show_reasoning {
                        let reasoning = strip_ansi_escapes::strip_str(reasoning);
                        lines.extend(reasoning_lines(&reasoning, theme));
                    }
                }
                if !segmented.visible.is_empty() {
                    let visible = strip_ansi_escapes::strip_str(&segmented.visible);
                    lines.extend(render_markdown(&visible, theme));
                }
            },
        }

        if !self.turn.sources.is_empty() {
            let title = format!("Sources ({})", self.turn.sources.len());
            lines.push(toggle_line(&title, self.show_sources, "Ctrl+S", theme));
            if self.show_sources {
                for (i, source) in self.turn.sources.iter().enumerate() {
                    lines.push(Line::from(Span::styled(
                        format!("  Source {}:", i + 1),
                        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                    )));
                    let preview = truncate_chars(&source.content, SOURCE_PREVIEW_CHARS).replace('\n', " ");
                    lines.push(Line::from(Span::styled(format!("  {preview}"), theme.muted())));
                }
            }
        }

        lines
    }
}

/// Reasoning goes through the same markdown renderer as the answer, indented and muted.
fn reasoning_lines(reasoning: &str, theme: &ColorTheme) -> Vec<Line<'static>> {
    render_markdown(reasoning, theme)
        .into_iter()
        .map(|line| {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(line.spans.into_iter().map(|span| {
                let style = match span.style.fg {
                    Some(fg) if fg == theme.text => span.style.fg(theme.muted),
                    _ => span.style,
                };
                span.style(style.add_modifier(Modifier::ITALIC))
            }));
            Line::from(spans)
        })
        .collect()
}

fn toggle_line(title: &str, expanded: bool, shortcut: &str, theme: &ColorTheme) -> Line<'static> {
    let arrow = if expanded { "▾" } else { "▸" };
    Line::from(vec![
        Span::styled(format!("{arrow} {title}"), Style::default().fg(theme.primary)),
        Span::styled(format!(" ({shortcut})"), theme.muted()),
    ])
}

/// The message list of the chat screen.
///
/// Scrolling works on wrapped rows. The window follows the newest message until the user scrolls
/// away from the bottom, and resumes following once the bottom is reached again.
pub struct ChatWindow {
    messages: Vec<Message>,
    pending: bool,
    typing: TypingIndicator,
    user_label: String,
    /// Index of the first visible row
    scroll_offset: usize,
    follow: bool,
    focused: Option<usize>,
    scroll_to_focused: bool,
    /// Row at which each message starts, as of the last draw
    offsets: Vec<usize>,
    viewport_height: usize,
    max_scroll: usize,
}

impl Default for ChatWindow {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            pending: false,
            typing: TypingIndicator::default(),
            user_label: "You".to_string(),
            scroll_offset: 0,
            follow: true,
            focused: None,
            scroll_to_focused: false,
            offsets: Vec::new(),
            viewport_height: 0,
            max_scroll: 0,
        }
    }
}

impl ChatWindow {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Whether rows exist below the viewport
    pub fn has_more_below(&self) -> bool {
        self.scroll_offset < self.max_scroll
    }

    /// The message toggles act on: the focused one, else the latest assistant message.
    fn toggle_target(&self) -> Option<usize> {
        self.focused
            .or_else(|| self.messages.iter().rposition(|m| m.turn.role == Role::Assistant))
    }

    fn clear(&mut self) {
        self.messages.clear();
        self.focused = None;
        self.scroll_offset = 0;
        self.follow = true;
        self.scroll_to_focused = false;
        self.offsets.clear();
        self.max_scroll = 0;
    }

    fn focus(&mut self, idx: usize) {
        self.focused = Some(idx);
        self.follow = false;
        self.scroll_to_focused = true;
    }

    fn scroll(&mut self, scroll: &Scroll) -> Option<Action> {
        match scroll {
            Scroll::Up(ScrollDistance::Message) => {
                let target = match self.focused {
                    Some(0) => return None,
                    Some(idx) => idx - 1,
                    None => self.messages.len().checked_sub(1)?,
                };
                self.focus(target);
            },
            Scroll::Down(ScrollDistance::Message) => {
                let idx = self.focused?;
                if idx + 1 >= self.messages.len() {
                    return None;
                }
                self.focus(idx + 1);
            },
            Scroll::Up(ScrollDistance::Line(n)) => {
                self.scroll_offset = self.scroll_offset.saturating_sub(*n as usize);
                self.follow = false;
            },
            Scroll::Down(ScrollDistance::Line(n)) => {
                self.scroll_offset = self.scroll_offset.saturating_add(*n as usize).min(self.max_scroll);
            },
            Scroll::Bottom => {
                self.follow = true;
                self.focused = None;
            },
        }

        None
    }

    fn content_lines(&mut self, theme: &ColorTheme, width: usize) -> Vec<Line<'static>> {
        let mut rows = Vec::new();
        self.offsets.clear();

        for (i, message) in self.messages.iter().enumerate() {
            self.offsets.push(rows.len());
            let lines = message.lines(theme, &self.user_label, self.focused == Some(i));
            rows.extend(wrap_lines(&lines, width));
            rows.push(Line::default());
        }

        if self.pending {
            rows.extend(wrap_lines(&[self.typing.line(theme)], width));
        } else {
            // Drop the separator after the last message
            rows.pop();
        }

        rows
    }

    fn draw_empty_state(&self, f: &mut ratatui::Frame<'_>, inner: Rect, theme: &ColorTheme) {
        let top_padding = inner.height.saturating_sub(3) / 2;
        let mut lines = vec![Line::default(); top_padding as usize];
        lines.push(Line::from(Span::styled("Campus Chat Assistant", theme.title())));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "How can I assist you today with information about your university?",
            theme.muted(),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true });
        f.render_widget(paragraph, inner);
    }
}

impl Component for ChatWindow {
    fn handle_key_events(&mut self, key: KeyEvent) -> eyre::Result<Option<Action>> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }

        let page = (self.viewport_height / 2).max(1).min(u16::MAX as usize) as u16;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            KeyCode::Up => Action::Scroll(Scroll::Up(ScrollDistance::Message)),
            KeyCode::Down => Action::Scroll(Scroll::Down(ScrollDistance::Message)),
            KeyCode::PageUp => Action::Scroll(Scroll::Up(ScrollDistance::Line(page))),
            KeyCode::PageDown => Action::Scroll(Scroll::Down(ScrollDistance::Line(page))),
            KeyCode::End => Action::Scroll(Scroll::Bottom),
            KeyCode::Char('r') if ctrl => Action::ToggleReasoning,
            KeyCode::Char('s') if ctrl => Action::ToggleSources,
            _ => return Ok(None),
        };

        Ok(Some(action))
    }

    fn handle_session_events(&mut self, session_event: &SessionEvent) -> eyre::Result<Option<Action>> {
        match session_event {
            SessionEvent::TurnAppended(turn) => {
                self.messages.push(Message::new(turn.clone()));
            },
            SessionEvent::TranscriptCleared => self.clear(),
            SessionEvent::PendingChanged(pending) => {
                self.pending = *pending;
                self.typing.reset();
            },
            SessionEvent::PreferencesLoaded(preferences) => {
                self.user_label.clone_from(&preferences.display_name);
            },
            _ => {},
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> eyre::Result<Option<Action>> {
        match action {
            Action::Tick if self.pending => self.typing.advance(),
            Action::Scroll(scroll) => return Ok(self.scroll(scroll)),
            Action::ToggleReasoning => {
                if let Some(message) = self.toggle_target().and_then(|i| self.messages.get_mut(i)) {
                    if message.has_reasoning() {
                        message.show_reasoning = !message.show_reasoning;
                    }
                }
            },
            Action::ToggleSources => {
                if let Some(message) = self.toggle_target().and_then(|i| self.messages.get_mut(i)) {
                    if !message.turn.sources.is_empty() {
                        message.show_sources = !message.show_sources;
                    }
                }
            },
            Action::Input(InputEvent::SavePreferences(preferences)) => {
                self.user_label.clone_from(&preferences.display_name);
            },
            _ => {},
        }

        Ok(None)
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>, rect: Rect, theme: &ColorTheme) -> eyre::Result<()> {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(true))
            .title(Span::styled(" Chat ", theme.title()));

        let inner = block.inner(rect);
        self.viewport_height = inner.height as usize;

        if self.messages.is_empty() && !self.pending {
            self.max_scroll = 0;
            self.scroll_offset = 0;
            f.render_widget(block, rect);
            self.draw_empty_state(f, inner, theme);
            return Ok(());
        }

        let rows = self.content_lines(theme, inner.width as usize);
        self.max_scroll = rows.len().saturating_sub(self.viewport_height);

        if self.scroll_to_focused {
            self.scroll_to_focused = false;
            if let Some(offset) = self.focused.and_then(|i| self.offsets.get(i)) {
                self.scroll_offset = *offset;
            }
        }
        if self.follow {
            self.scroll_offset = self.max_scroll;
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll);
        self.follow = self.scroll_offset == self.max_scroll && self.focused.is_none();

        if self.has_more_below() {
            block = block.title_bottom(
                Line::from(Span::styled(MORE_BELOW_MARKER, Style::default().fg(theme.warning))).right_aligned(),
            );
        }

        let visible = rows
            .into_iter()
            .skip(self.scroll_offset)
            .take(self.viewport_height)
            .collect::<Vec<_>>();

        f.render_widget(Paragraph::new(visible).block(block), rect);

        Ok(())
    }
}
