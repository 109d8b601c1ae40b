use std::io::{
    Stdout,
    Write as _,
    stdout,
};

use crossterm::cursor;
use crossterm::event::{
    DisableBracketedPaste,
    EnableBracketedPaste,
};
use crossterm::terminal::{
    EnterAlternateScreen,
    LeaveAlternateScreen,
    disable_raw_mode,
    enable_raw_mode,
};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::error;

/// Owns the terminal for the lifetime of the interactive session.
///
/// The terminal is put back into cooked mode on the main screen when this is dropped, so an early
/// return or a panic unwinding through the app never leaves the user's shell in raw mode.
pub struct Tui {
    pub terminal: Terminal<CrosstermBackend<Stdout>>,
    entered: bool,
}

impl Tui {
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(stdout()))?,
            entered: false,
        })
    }

    pub fn enter(&mut self) -> Result<()> {
        enable_raw_mode()?;
        crossterm::execute!(stdout(), EnterAlternateScreen, EnableBracketedPaste, cursor::Hide)?;
        self.entered = true;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        if self.entered {
            self.terminal.flush()?;
            crossterm::execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen, cursor::Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }

    /// Rings the terminal bell
    pub fn bell(&mut self) -> Result<()> {
        let mut out = stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.exit() {
            error!("Failed to restore terminal: {:?}", e);
        }
    }
}
