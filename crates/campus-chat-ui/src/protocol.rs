//! Messages exchanged between the view and the control layer.
//!
//! Everything in here is plain data. The view never sees HTTP types or the settings file; the
//! control layer translates its own state into these shapes before sending them through the
//! [conduit](crate::conduit).

use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

use crate::ui::theme::ThemeName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A supporting document returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceView {
    pub content: String,
}

/// A transcript turn as the view renders it.
///
/// `text` is always the raw text as it was stored. Assistant turns are segmented into reasoning
/// and visible parts at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub sources: Vec<SourceView>,
    /// Local wall clock time, already formatted for display
    pub timestamp: String,
}

/// User preferences editable from the settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub notifications: bool,
    pub sound_effects: bool,
    pub display_name: String,
    pub email: String,
    pub theme: ThemeName,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: true,
            sound_effects: true,
            display_name: "User".to_string(),
            email: "user@example.com".to_string(),
            theme: ThemeName::default(),
        }
    }
}

/// State changes sent from the control layer to the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    TurnAppended(TurnView),
    TranscriptCleared,
    PendingChanged(bool),
    /// A question arrived while another was in flight. Carries the text back to the view.
    SubmitRejected(String),
    PreferencesLoaded(Preferences),
    PreferencesSaved,
    Error(String),
}

/// User intents sent from the view to the control layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Submit(String),
    NewChat,
    SavePreferences(Preferences),
    Quit,
}
