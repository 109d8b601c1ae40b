use ratatui::style::{
    Modifier,
    Style,
};
use ratatui::text::{
    Line,
    Span,
};

use crate::ui::theme::ColorTheme;

const DOTS: usize = 3;

/// Three dots pulsing one after another, advanced once per tick.
#[derive(Debug, Default)]
pub struct TypingIndicator {
    frame: usize,
}

impl TypingIndicator {
    pub fn advance(&mut self) {
        self.frame = (self.frame + 1) % DOTS;
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }

    pub fn line(&self, theme: &ColorTheme) -> Line<'static> {
        let mut spans = vec![Span::styled("Assistant is typing ", theme.muted())];
        for i in 0..DOTS {
            let style = if i == self.frame {
                Style::default().fg(theme.assistant).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            spans.push(Span::styled("●", style));
            if i + 1 < DOTS {
                spans.push(Span::raw(" "));
            }
        }
        Line::from(spans)
    }
}
