use crate::protocol::InputEvent;

/// Screens of the terminal UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum Page {
    #[default]
    Landing,
    Chat,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Tick,
    Quit,
    Navigate(Page),
    Input(InputEvent),
    Scroll(Scroll),
    ToggleSidebar,
    ToggleHistory,
    ToggleTheme,
    ToggleReasoning,
    ToggleSources,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scroll {
    Up(ScrollDistance),
    Down(ScrollDistance),
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollDistance {
    Message,
    Line(u16),
}
