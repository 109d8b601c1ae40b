use ratatui::style::{
    Color,
    Modifier,
    Style,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Predefined theme names
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn palette(self) -> ColorTheme {
        match self {
            Self::Dark => ColorTheme::dark_theme(),
            Self::Light => ColorTheme::light_theme(),
        }
    }
}

/// Color theme definitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorTheme {
    pub background: Color,
    pub text: Color,
    /// Timestamps, hints, borders of inactive widgets
    pub muted: Color,
    pub primary: Color,
    pub user: Color,
    pub assistant: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub code: Color,
    pub link: Color,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self::dark_theme()
    }
}

impl ColorTheme {
    pub fn dark_theme() -> Self {
        Self {
            background: Color::Reset,
            text: Color::White,
            muted: Color::DarkGray,
            primary: Color::Cyan,
            user: Color::LightBlue,
            assistant: Color::LightGreen,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            code: Color::LightYellow,
            link: Color::LightCyan,
        }
    }

    /// Terminal-friendly theme for terminals with light backgrounds
    pub fn light_theme() -> Self {
        Self {
            background: Color::Rgb(250, 250, 250),
            text: Color::Black,
            muted: Color::Gray,
            primary: Color::Rgb(0, 95, 135),
            user: Color::Blue,
            assistant: Color::Rgb(0, 110, 60),
            success: Color::Rgb(0, 120, 0),
            error: Color::Rgb(170, 0, 0),
            warning: Color::Rgb(150, 100, 0),
            code: Color::Rgb(130, 40, 120),
            link: Color::Rgb(0, 80, 170),
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.primary).add_modifier(Modifier::BOLD)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.primary)
        } else {
            Style::default().fg(self.muted)
        }
    }
}
