use crossterm::event::{
    KeyCode,
    KeyEvent,
    KeyEventKind,
    KeyModifiers,
};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{
    Line,
    Span,
};
use ratatui::widgets::{
    Block,
    Borders,
    Paragraph,
};
use unicode_width::UnicodeWidthStr as _;

use super::Component;
use crate::protocol::{
    Event as SessionEvent,
    InputEvent,
};
use crate::ui::action::Action;
use crate::ui::theme::ColorTheme;

const PROMPT: &str = "> ";
const PLACEHOLDER: &str = "Ask your question here...";

#[derive(Default)]
pub struct InputBar {
    input: String,
    /// Cursor position counted in characters, not bytes
    cursor_position: usize,
    pending: bool,
}

impl InputBar {
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Submission is allowed only with a non-blank input and no request in flight
    pub fn can_submit(&self) -> bool {
        !self.pending && !self.input.trim().is_empty()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input.len())
    }

    fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.cursor_position.saturating_sub(1);
        self.cursor_position = cursor_moved_left;
    }

    fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor_position.saturating_add(1);
        self.cursor_position = cursor_moved_right.min(self.input.chars().count());
    }

    fn enter_char(&mut self, new_char: char) {
        let index = self.byte_index();
        self.input.insert(index, new_char);
        self.move_cursor_right();
    }

    fn delete_char(&mut self) {
        let is_not_cursor_leftmost = self.cursor_position != 0;
        if is_not_cursor_leftmost {
            let current_index = self.cursor_position;
            let from_left_to_current_index = current_index - 1;
            let before_char_to_delete = self.input.chars().take(from_left_to_current_index);
            let after_char_to_delete = self.input.chars().skip(current_index);
            self.input = before_char_to_delete.chain(after_char_to_delete).collect();
            self.move_cursor_left();
        }
    }

    fn delete_char_forward(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.move_cursor_right();
            self.delete_char();
        }
    }

    fn submit_message(&mut self) -> String {
        let message = self.input.clone();
        self.input.clear();
        self.cursor_position = 0;
        message
    }

    /// Puts a returned question back in front of whatever has been typed since
    fn restore(&mut self, text: &str) {
        self.input = match self.input.trim().is_empty() {
            true => text.to_string(),
            false => format!("{text} {}", self.input),
        };
        self.cursor_position = self.input.chars().count();
    }

    fn hint(&self) -> &'static str {
        if self.pending {
            " waiting for response... "
        } else if self.can_submit() {
            " Enter to send "
        } else {
            ""
        }
    }
}

impl Component for InputBar {
    fn draw(&mut self, f: &mut ratatui::Frame<'_>, rect: Rect, theme: &ColorTheme) -> eyre::Result<()> {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(!self.pending))
            .title(Span::styled(" Message ", theme.title()))
            .title_bottom(Line::from(Span::styled(self.hint(), theme.muted())).right_aligned());
        let inner = block.inner(rect);

        let before_cursor = self.input.chars().take(self.cursor_position).collect::<String>();
        let cursor_x = PROMPT.width() + before_cursor.width();
        let horizontal_scroll = cursor_x.saturating_sub((inner.width as usize).saturating_sub(1));

        let body = if self.input.is_empty() {
            Span::styled(PLACEHOLDER, theme.muted())
        } else {
            Span::styled(self.input.as_str(), Style::default().fg(theme.text))
        };
        let input = Paragraph::new(Line::from(vec![
            Span::styled(PROMPT, Style::default().fg(theme.primary)),
            body,
        ]))
        .scroll((0, horizontal_scroll.min(u16::MAX as usize) as u16))
        .block(block);
        f.render_widget(input, rect);

        if !self.pending {
            f.set_cursor_position((
                inner.x + (cursor_x - horizontal_scroll).min(u16::MAX as usize) as u16,
                inner.y,
            ));
        }

        Ok(())
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> eyre::Result<Option<Action>> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Delete => self.delete_char_forward(),
            KeyCode::Enter => {
                if self.can_submit() {
                    let message = self.submit_message();
                    // Stay locked until the session reports the request as settled
                    self.pending = true;
                    return Ok(Some(Action::Input(InputEvent::Submit(message))));
                }
            },
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::Char('u') if ctrl => {
                self.submit_message();
            },
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => self.enter_char(ch),
            _ => {},
        }

        Ok(None)
    }

    fn handle_paste(&mut self, text: &str) -> eyre::Result<Option<Action>> {
        for ch in text.chars() {
            match ch {
                '\r' | '\n' => self.enter_char(' '),
                ch if ch.is_control() => {},
                ch => self.enter_char(ch),
            }
        }
        Ok(None)
    }

    fn handle_session_events(&mut self, session_event: &SessionEvent) -> eyre::Result<Option<Action>> {
        match session_event {
            SessionEvent::PendingChanged(pending) => self.pending = *pending,
            SessionEvent::SubmitRejected(text) => self.restore(text),
            SessionEvent::TranscriptCleared => {
                self.submit_message();
            },
            _ => {},
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> eyre::Result<Option<Action>> {
        if let Action::Input(InputEvent::NewChat) = action {
            self.submit_message();
        }
        Ok(None)
    }
}
