//! Terminal view layer of campus chat.
//!
//! The view owns the terminal and talks to the control layer only through the
//! [conduit](conduit::get_conduit_pair).

pub mod conduit;
pub mod markdown;
pub mod protocol;
pub mod segment;
pub mod ui;
pub mod util;

pub use ui::action::Page;
use ui::App;

pub fn get_app(view_end: conduit::ViewEnd, page: Page) -> App {
    App::new(view_end, page)
}
