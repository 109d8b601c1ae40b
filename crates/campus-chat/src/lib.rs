//! Terminal client for the campus information chatbot.
//!
//! The view lives in `campus_chat_ui`. This crate owns everything behind it: the chat session,
//! the HTTP client, settings and the command line.

pub mod api_client;
pub mod cli;
pub mod request;
pub mod session;
pub mod settings;
pub mod util;
