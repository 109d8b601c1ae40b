/// Default backend when neither flag, environment nor settings name one
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub mod env_var {
    macro_rules! define_env_vars {
        ($($(#[$meta:meta])* $ident:ident = $name:expr),*) => {
            $(
                $(#[$meta])*
                pub const $ident: &str = $name;
            )*
        }
    }

    define_env_vars! {
        /// Overrides the directory holding settings and logs
        DATA_DIR = "CAMPUS_CHAT_DATA_DIR",

        /// Overrides the chatbot backend endpoint
        ENDPOINT = "CAMPUS_CHAT_ENDPOINT",

        /// Editor used by `settings open`
        EDITOR = "EDITOR"
    }
}
