pub mod action;
pub mod components;
pub mod theme;
pub mod tui;

pub use components::*;
