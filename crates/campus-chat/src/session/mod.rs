//! Conversation state and request orchestration.
//!
//! [ChatSession] owns the transcript, the input buffer and the pending flag. Every mutation goes
//! through one of its methods, so the rules about when a question may be sent and which answers
//! are accepted live in one place.

pub mod control;
pub mod history;

use campus_chat_ui::protocol::{
    SourceView,
    TurnView,
};
pub use campus_chat_ui::protocol::Role;
use chrono::{
    DateTime,
    Local,
    Utc,
};
pub use control::SessionController;
use tracing::{
    debug,
    warn,
};
use uuid::Uuid;

use crate::api_client::{
    ApiClientError,
    ChatBackend,
    ChatRequest,
    ChatResponse,
    Source,
};
use history::build_chat_history;

/// One message in the transcript. Turns are never edited once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    /// Raw text. Assistant answers keep any reasoning markers.
    pub text: String,
    /// Empty when the answer carried no sources
    pub sources: Vec<Source>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), Vec::new())
    }

    pub fn assistant(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self::new(Role::Assistant, text.into(), sources)
    }

    fn new(role: Role, text: String, sources: Vec<Source>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            sources,
            created_at: Utc::now(),
        }
    }

    pub fn to_view(&self) -> TurnView {
        TurnView {
            id: self.id,
            role: self.role,
            text: self.text.clone(),
            sources: self
                .sources
                .iter()
                .map(|source| SourceView {
                    content: source.content.clone(),
                })
                .collect(),
            timestamp: self.created_at.with_timezone(&Local).format("%H:%M:%S").to_string(),
        }
    }
}

/// A question that has been recorded and still needs an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Session epoch the question was asked in
    pub epoch: u64,
    pub request: ChatRequest,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Vec<Turn>,
    input: String,
    pending: bool,
    /// Bumped by [ChatSession::clear]. Answers tagged with an older epoch are dropped.
    epoch: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Empties the input, returning what it held
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.pending && !self.input.trim().is_empty()
    }

    /// Records the current input as a user turn and returns the request to send for it.
    ///
    /// Returns `None` without touching the transcript when the input is blank or a request is
    /// already in flight.
    pub fn begin_submit(&mut self) -> Option<PendingRequest> {
        if !self.can_submit() {
            debug!(pending = self.pending, "ignoring submit");
            return None;
        }

        let question = self.input.trim().to_string();
        let chat_history = build_chat_history(&self.transcript);

        self.transcript.push(Turn::user(question.clone()));
        self.input.clear();
        self.pending = true;

        debug!(epoch = self.epoch, history = chat_history.len(), "question recorded");
        Some(PendingRequest {
            epoch: self.epoch,
            request: ChatRequest { question, chat_history },
        })
    }

    /// Applies the outcome of a request started in `epoch`.
    ///
    /// Returns the appended assistant turn, or `None` if the outcome was stale.
    pub fn complete(
        &mut self,
        epoch: u64,
        outcome: Result<ChatResponse, ApiClientError>,
    ) -> Option<&Turn> {
        if epoch != self.epoch || !self.pending {
            warn!(epoch, current = self.epoch, "discarding stale response");
            return None;
        }

        self.pending = false;
        let turn = match outcome {
            Ok(response) => Turn::assistant(response.answer, response.sources),
            Err(err) => {
                warn!(%err, "request failed, answering with error message");
                Turn::assistant(err.user_message(), Vec::new())
            },
        };
        self.transcript.push(turn);
        self.transcript.last()
    }

    /// Sends the current input to `backend` and waits for the answer
    pub async fn submit(&mut self, backend: &dyn ChatBackend) -> Option<&Turn> {
        let PendingRequest { epoch, request } = self.begin_submit()?;
        let outcome = backend.ask(request).await;
        self.complete(epoch, outcome)
    }

    /// Starts a new chat. Answers to questions asked before this call are discarded.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.input.clear();
        self.pending = false;
        self.epoch += 1;
        debug!(epoch = self.epoch, "session cleared");
    }
}
