use crossterm::event::{
    Event,
    KeyEvent,
};
use eyre::Result;
use ratatui::Frame;
use ratatui::layout::Rect;

use super::action::Action;
use super::theme::ColorTheme;
use crate::protocol::Event as SessionEvent;

mod app;
mod chat_window;
mod input_bar;
mod landing;
mod settings_page;
mod sidebar;
mod typing_indicator;

pub use app::*;
pub use chat_window::*;
pub use input_bar::*;
pub use landing::*;
pub use settings_page::*;
pub use sidebar::*;
pub use typing_indicator::*;

pub trait Component {
    fn handle_events(&mut self, event: Event) -> Result<Option<Action>> {
        let r = match event {
            Event::Key(key_event) => self.handle_key_events(key_event)?,
            Event::Paste(text) => self.handle_paste(&text)?,
            _ => None,
        };
        Ok(r)
    }
    #[allow(unused_variables)]
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }
    #[allow(unused_variables)]
    fn handle_paste(&mut self, text: &str) -> Result<Option<Action>> {
        Ok(None)
    }
    #[allow(unused_variables)]
    fn handle_session_events(&mut self, session_event: &SessionEvent) -> Result<Option<Action>> {
        Ok(None)
    }
    #[allow(unused_variables)]
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }
    fn draw(&mut self, f: &mut Frame<'_>, rect: Rect, theme: &ColorTheme) -> Result<()>;
}
