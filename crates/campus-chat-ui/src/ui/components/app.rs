use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{
    Event as TerminalEvent,
    EventStream,
    KeyCode,
    KeyEvent,
    KeyEventKind,
    KeyModifiers,
};
use eyre::Result;
use futures::StreamExt as _;
use ratatui::Frame;
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
    Paragraph,
};
use tracing::{
    debug,
    error,
};

use super::{
    ChatWindow,
    Component,
    InputBar,
    Landing,
    SIDEBAR_WIDTH,
    SettingsPage,
    Sidebar,
};
use crate::conduit::ViewEnd;
use crate::protocol::{
    Event as SessionEvent,
    InputEvent,
    Preferences,
    Role,
};
use crate::ui::action::{
    Action,
    Page,
};
use crate::ui::theme::ColorTheme;
use crate::ui::tui::Tui;

pub const TICK_RATE: Duration = Duration::from_millis(250);
const NOTICE_TICKS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A short-lived message shown in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    ticks_left: u32,
}

impl Notice {
    fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            ticks_left: NOTICE_TICKS,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub page: Page,
    pub view_end: ViewEnd,
    pub preferences: Preferences,
    pub theme: ColorTheme,
    pub pending: bool,
    pub notice: Option<Notice>,
    /// Set when the terminal bell should ring before the next frame
    pub ring_bell: bool,
    pub landing: Landing,
    pub chat_window: ChatWindow,
    pub input_bar: InputBar,
    pub sidebar: Sidebar,
    pub settings_page: SettingsPage,
}

impl App {
    pub fn new(view_end: ViewEnd, page: Page) -> Self {
        let preferences = Preferences::default();
        Self {
            should_quit: false,
            page,
            view_end,
            theme: preferences.theme.palette(),
            preferences,
            pending: false,
            notice: None,
            ring_bell: false,
            landing: Landing,
            chat_window: ChatWindow::default(),
            input_bar: InputBar::default(),
            sidebar: Sidebar::default(),
            settings_page: SettingsPage::default(),
        }
    }

    fn components_mut(&mut self) -> [&mut dyn Component; 5] {
        [
            &mut self.landing,
            &mut self.chat_window,
            &mut self.input_bar,
            &mut self.sidebar,
            &mut self.settings_page,
        ]
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let mut terminal_events = EventStream::new();
        let mut ticker = tokio::time::interval(TICK_RATE);

        while !self.should_quit {
            tui.terminal.draw(|f| self.render(f))?;

            tokio::select! {
                terminal_event = terminal_events.next() => {
                    match terminal_event {
                        Some(Ok(event)) => self.handle_terminal_event(event)?,
                        Some(Err(e)) => error!("Error reading terminal event: {:?}", e),
                        None => break,
                    }
                },
                session_event = self.view_end.receiver.recv() => {
                    let Some(session_event) = session_event else {
                        debug!("control end closed, leaving the ui");
                        break;
                    };
                    self.handle_session_event(session_event)?;
                },
                _ = ticker.tick() => self.dispatch(Action::Tick)?,
            }

            if std::mem::take(&mut self.ring_bell) {
                if let Err(e) = tui.bell() {
                    error!("Error ringing the bell: {:?}", e);
                }
            }
        }

        if let Err(e) = self.view_end.send(InputEvent::Quit) {
            debug!("control end already gone on quit: {:?}", e);
        }
        tui.exit()?;

        Ok(())
    }

    pub fn handle_terminal_event(&mut self, event: TerminalEvent) -> Result<()> {
        match event {
            TerminalEvent::Key(key) => self.handle_key(key),
            TerminalEvent::Paste(_) => {
                let action = match self.page {
                    Page::Chat => self.input_bar.handle_events(event)?,
                    _ => None,
                };
                if let Some(action) = action {
                    self.dispatch(action)?;
                }
                Ok(())
            },
            _ => Ok(()),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let action = match self.global_action(&key) {
            Some(action) => Some(action),
            None => match self.page {
                Page::Landing => self.landing.handle_key_events(key)?,
                Page::Chat => match self.chat_window.handle_key_events(key)? {
                    Some(action) => Some(action),
                    None => self.input_bar.handle_key_events(key)?,
                },
                Page::Settings => self.settings_page.handle_key_events(key)?,
            },
        };

        if let Some(action) = action {
            self.dispatch(action)?;
        }

        Ok(())
    }

    fn global_action(&self, key: &KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Some(Action::Quit),
            KeyCode::Esc if self.page != Page::Settings => Some(Action::Quit),
            KeyCode::Char('n') if ctrl => Some(Action::Input(InputEvent::NewChat)),
            KeyCode::Char('o') if ctrl => Some(Action::Navigate(Page::Settings)),
            KeyCode::Char('t') if ctrl => Some(Action::ToggleTheme),
            KeyCode::Char('b') if ctrl && self.page == Page::Chat => Some(Action::ToggleSidebar),
            KeyCode::Char('e') if ctrl && self.page == Page::Chat => Some(Action::ToggleHistory),
            _ => None,
        }
    }

    fn send_input(&self, input: InputEvent) {
        if let Err(e) = self.view_end.send(input) {
            error!("Error sending input event to control end: {:?}", e);
        }
    }

    fn apply_preferences(&mut self, preferences: Preferences) {
        self.theme = preferences.theme.palette();
        self.preferences = preferences;
    }

    /// Applies `action` to the app and every component, then any actions they produce in turn.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        let mut queue = VecDeque::from([action]);

        while let Some(action) = queue.pop_front() {
            match &action {
                Action::Quit => self.should_quit = true,
                Action::Tick => {
                    if let Some(notice) = self.notice.as_mut() {
                        notice.ticks_left = notice.ticks_left.saturating_sub(1);
                        if notice.ticks_left == 0 {
                            self.notice = None;
                        }
                    }
                },
                Action::Navigate(page) => self.page = *page,
                Action::Input(input) => {
                    match input {
                        InputEvent::NewChat => self.page = Page::Chat,
                        InputEvent::SavePreferences(preferences) => self.apply_preferences(preferences.clone()),
                        InputEvent::Submit(_) => self.pending = true,
                        InputEvent::Quit => {},
                    }
                    self.send_input(input.clone());
                },
                Action::ToggleTheme => {
                    let mut preferences = self.preferences.clone();
                    preferences.theme = preferences.theme.toggled();
                    self.apply_preferences(preferences);
                    self.send_input(InputEvent::SavePreferences(self.preferences.clone()));
                },
                _ => {},
            }

            for component in self.components_mut() {
                match component.update(&action) {
                    Ok(Some(subsequent_action)) => queue.push_back(subsequent_action),
                    Ok(None) => {},
                    Err(e) => error!("Error updating component: {:?}", e),
                }
            }
        }

        Ok(())
    }

    pub fn handle_session_event(&mut self, session_event: SessionEvent) -> Result<()> {
        match &session_event {
            SessionEvent::PendingChanged(pending) => self.pending = *pending,
            SessionEvent::PreferencesLoaded(preferences) => self.apply_preferences(preferences.clone()),
            SessionEvent::TurnAppended(turn) if turn.role == Role::Assistant => {
                if self.preferences.notifications {
                    self.notice = Some(Notice::new(NoticeKind::Info, "New response received"));
                }
                if self.preferences.sound_effects {
                    self.ring_bell = true;
                }
            },
            SessionEvent::SubmitRejected(_) => {
                self.notice = Some(Notice::new(NoticeKind::Info, "Please wait for the current answer"));
            },
            SessionEvent::Error(message) => self.notice = Some(Notice::new(NoticeKind::Error, message.clone())),
            _ => {},
        }

        let mut subsequent_actions = Vec::new();
        for component in self.components_mut() {
            match component.handle_session_events(&session_event) {
                Ok(Some(action)) => subsequent_actions.push(action),
                Ok(None) => {},
                Err(e) => error!("Error handling session event by component: {:?}", e),
            }
        }
        for action in subsequent_actions {
            self.dispatch(action)?;
        }

        Ok(())
    }

    pub fn render(&mut self, f: &mut Frame<'_>) {
        let area = f.area();
        let theme = self.theme.clone();
        f.render_widget(Block::default().style(theme.base()), area);

        let result = match self.page {
            Page::Landing => self.landing.draw(f, area, &theme),
            Page::Settings => self.settings_page.draw(f, area, &theme),
            Page::Chat => self.render_chat(f, area, &theme),
        };
        if let Err(e) = result {
            error!("Error rendering component {:?}", e);
        }
    }

    fn render_chat(&mut self, f: &mut Frame<'_>, area: Rect, theme: &ColorTheme) -> Result<()> {
        let [header, body, input] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .areas(area);

        self.render_header(f, header, theme);

        let chat_area = if self.sidebar.is_open() {
            let [sidebar, chat] =
                Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)]).areas(body);
            self.sidebar.draw(f, sidebar, theme)?;
            chat
        } else {
            body
        };

        self.chat_window.draw(f, chat_area, theme)?;
        self.input_bar.draw(f, input, theme)?;

        Ok(())
    }

    fn render_header(&self, f: &mut Frame<'_>, area: Rect, theme: &ColorTheme) {
        let mut spans = vec![Span::styled(" Campus Chat ", theme.title())];
        if let Some(notice) = &self.notice {
            let color = match notice.kind {
                NoticeKind::Info => theme.success,
                NoticeKind::Error => theme.error,
            };
            spans.push(Span::styled(
                format!(" {} ", notice.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);

        if self.notice.is_some() {
            return;
        }
        let hints = Line::from(Span::styled(
            "Ctrl+N new chat · Ctrl+B sidebar · Ctrl+O settings · Esc quit ",
            theme.muted(),
        ))
        .right_aligned();
        f.render_widget(Paragraph::new(hints), area);
    }
}
