use std::time::Duration;

use crossterm::event::{
    KeyCode,
    KeyEvent,
    KeyEventKind,
    KeyModifiers,
};
use ratatui::layout::{
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
    Block,
    Borders,
    Paragraph,
    Tabs,
};
use strum::IntoEnumIterator as _;

use super::{
    Component,
    TICK_RATE,
};
use crate::protocol::{
    Event as SessionEvent,
    InputEvent,
    Preferences,
};
use crate::ui::action::{
    Action,
    Page,
};
use crate::ui::theme::{
    ColorTheme,
    ThemeName,
};

/// How long the "Saved!" confirmation stays on screen
pub const SAVED_NOTICE: Duration = Duration::from_secs(2);
const SAVED_TICKS: u32 = (SAVED_NOTICE.as_millis() / TICK_RATE.as_millis()) as u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum SettingsTab {
    #[default]
    General,
    Appearance,
    Account,
}

impl SettingsTab {
    fn fields(self) -> &'static [Field] {
        match self {
            Self::General => &[Field::Notifications, Field::SoundEffects],
            Self::Appearance => &[Field::DarkMode],
            Self::Account => &[Field::DisplayName, Field::Email],
        }
    }

    fn index(self) -> usize {
        Self::iter().position(|t| t == self).unwrap_or_default()
    }

    fn offset(self, delta: isize) -> Self {
        let tabs = Self::iter().collect::<Vec<_>>();
        let idx = (self.index() as isize + delta).rem_euclid(tabs.len() as isize) as usize;
        tabs[idx]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Notifications,
    SoundEffects,
    DarkMode,
    DisplayName,
    Email,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Self::Notifications => "Notifications",
            Self::SoundEffects => "Sound effects",
            Self::DarkMode => "Dark mode",
            Self::DisplayName => "Display name",
            Self::Email => "Email",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Notifications => "Show a notice when a new response arrives",
            Self::SoundEffects => "Ring the terminal bell when a new response arrives",
            Self::DarkMode => "Switch between dark and light colors (Ctrl+T)",
            Self::DisplayName => "Name shown next to your messages",
            Self::Email => "Contact address for your account",
        }
    }
}

/// The settings screen. Edits go to a draft that is only persisted on save.
#[derive(Default)]
pub struct SettingsPage {
    tab: SettingsTab,
    selected: usize,
    /// Buffer of the text field being edited
    editing: Option<String>,
    baseline: Preferences,
    draft: Preferences,
    active: bool,
    awaiting_save: bool,
    saved_ticks: u32,
}

impl SettingsPage {
    pub fn draft(&self) -> &Preferences {
        &self.draft
    }

    pub fn tab(&self) -> SettingsTab {
        self.tab
    }

    pub fn is_showing_saved(&self) -> bool {
        self.saved_ticks > 0
    }

    fn selected_field(&self) -> Option<Field> {
        self.tab.fields().get(self.selected).copied()
    }

    fn switch_tab(&mut self, delta: isize) {
        self.tab = self.tab.offset(delta);
        self.selected = 0;
    }

    fn activate(&mut self) -> Option<Action> {
        match self.selected_field()? {
            Field::Notifications => self.draft.notifications = !self.draft.notifications,
            Field::SoundEffects => self.draft.sound_effects = !self.draft.sound_effects,
            Field::DarkMode => return Some(Action::ToggleTheme),
            Field::DisplayName => self.editing = Some(self.draft.display_name.clone()),
            Field::Email => self.editing = Some(self.draft.email.clone()),
        }
        None
    }

    fn commit_edit(&mut self) {
        let Some(value) = self.editing.take() else {
            return;
        };
        let value = value.trim().to_string();
        match self.selected_field() {
            Some(Field::DisplayName) if !value.is_empty() => self.draft.display_name = value,
            Some(Field::Email) => self.draft.email = value,
            _ => {},
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.editing = None,
            KeyCode::Enter => self.commit_edit(),
            KeyCode::Backspace => {
                if let Some(buffer) = self.editing.as_mut() {
                    buffer.pop();
                }
            },
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(buffer) = self.editing.as_mut() {
                    buffer.push(ch);
                }
            },
            _ => {},
        }
    }

    fn field_value(&self, field: Field) -> String {
        let toggle = |on: bool| (if on { "[x] on" } else { "[ ] off" }).to_string();
        match field {
            Field::Notifications => toggle(self.draft.notifications),
            Field::SoundEffects => toggle(self.draft.sound_effects),
            Field::DarkMode => toggle(self.draft.theme == ThemeName::Dark),
            Field::DisplayName => self.draft.display_name.clone(),
            Field::Email => self.draft.email.clone(),
        }
    }

    fn field_lines(&self, theme: &ColorTheme) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (i, field) in self.tab.fields().iter().enumerate() {
            let selected = i == self.selected;
            let marker = if selected { "▶ " } else { "  " };
            let label_style = if selected {
                Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };

            let value = match (&self.editing, selected) {
                (Some(buffer), true) => Span::styled(
                    format!("{buffer}▏"),
                    Style::default().fg(theme.text).add_modifier(Modifier::UNDERLINED),
                ),
                _ => Span::styled(self.field_value(*field), Style::default().fg(theme.text)),
            };

            lines.push(Line::from(vec![
                Span::styled(marker, label_style),
                Span::styled(format!("{:<16}", field.label()), label_style),
                value,
            ]));
            lines.push(Line::from(Span::styled(format!("  {}", field.description()), theme.muted())));
            lines.push(Line::default());
        }
        lines
    }
}

impl Component for SettingsPage {
    fn handle_key_events(&mut self, key: KeyEvent) -> eyre::Result<Option<Action>> {
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        if self.editing.is_some() {
            self.handle_editing_key(key);
            return Ok(None);
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            KeyCode::Esc => Some(Action::Navigate(Page::Chat)),
            KeyCode::Char('s') if ctrl => {
                self.awaiting_save = true;
                Some(Action::Input(InputEvent::SavePreferences(self.draft.clone())))
            },
            KeyCode::Tab | KeyCode::Right => {
                self.switch_tab(1);
                None
            },
            KeyCode::BackTab | KeyCode::Left => {
                self.switch_tab(-1);
                None
            },
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            },
            KeyCode::Down => {
                self.selected = (self.selected + 1).min(self.tab.fields().len().saturating_sub(1));
                None
            },
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(),
            _ => None,
        };

        Ok(action)
    }

    fn handle_session_events(&mut self, session_event: &SessionEvent) -> eyre::Result<Option<Action>> {
        match session_event {
            SessionEvent::PreferencesLoaded(preferences) => {
                self.baseline = preferences.clone();
                self.draft = preferences.clone();
            },
            SessionEvent::PreferencesSaved if self.awaiting_save => {
                self.awaiting_save = false;
                self.saved_ticks = SAVED_TICKS;
            },
            SessionEvent::Error(_) => self.awaiting_save = false,
            _ => {},
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> eyre::Result<Option<Action>> {
        match action {
            Action::Navigate(Page::Settings) if !self.active => {
                self.active = true;
                self.draft = self.baseline.clone();
                self.tab = SettingsTab::default();
                self.selected = 0;
                self.editing = None;
            },
            Action::Navigate(page) => self.active = *page == Page::Settings,
            Action::ToggleTheme => {
                self.draft.theme = self.draft.theme.toggled();
                self.baseline.theme = self.baseline.theme.toggled();
            },
            Action::Input(InputEvent::SavePreferences(preferences)) => self.baseline = preferences.clone(),
            Action::Tick => self.saved_ticks = self.saved_ticks.saturating_sub(1),
            _ => {},
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>, rect: Rect, theme: &ColorTheme) -> eyre::Result<()> {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(true))
            .title(Span::styled(" Settings ", theme.title()));
        let inner = block.inner(rect);
        f.render_widget(block, rect);

        let [tabs_area, _, fields_area, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let tabs = Tabs::new(SettingsTab::iter().map(|t| t.to_string()))
            .select(self.tab.index())
            .style(theme.muted())
            .highlight_style(Style::default().fg(theme.primary).add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
            .divider("│");
        f.render_widget(tabs, tabs_area);

        f.render_widget(Paragraph::new(self.field_lines(theme)), fields_area);

        let mut footer = vec![Span::styled(
            "Tab switch tab · ↑↓ select · Enter change · Ctrl+S save · Esc back",
            theme.muted(),
        )];
        if self.is_showing_saved() {
            footer.push(Span::styled(
                "  Saved!",
                Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
            ));
        } else if self.draft != self.baseline {
            footer.push(Span::styled("  unsaved changes", Style::default().fg(theme.warning)));
        }
        f.render_widget(Paragraph::new(Line::from(footer)), footer_area);

        Ok(())
    }
}
