use std::sync::Arc;

use campus_chat_ui::conduit::{
    ConduitError,
    ControlEnd,
};
use campus_chat_ui::protocol::{
    Event,
    InputEvent,
    Preferences,
};
use tokio::sync::mpsc::{
    UnboundedSender,
    unbounded_channel,
};
use tracing::{
    debug,
    error,
    info,
};

use super::ChatSession;
use crate::api_client::{
    ApiClientError,
    ChatBackend,
    ChatResponse,
};
use crate::settings::Settings;

type Completion = (u64, Result<ChatResponse, ApiClientError>);

/// Owns the [ChatSession] and serves the view through the control end of the conduit.
pub struct SessionController {
    session: ChatSession,
    backend: Arc<dyn ChatBackend>,
    settings: Settings,
    control_end: ControlEnd,
}

impl SessionController {
    pub fn new(backend: Arc<dyn ChatBackend>, settings: Settings, control_end: ControlEnd) -> Self {
        Self {
            session: ChatSession::new(),
            backend,
            settings,
            control_end,
        }
    }

    /// Runs until the view quits or hangs up. `initial_prompt` is submitted right away.
    pub async fn run(mut self, initial_prompt: Option<String>) -> Result<(), ConduitError> {
        let (completion_tx, mut completion_rx) = unbounded_channel::<Completion>();

        self.control_end
            .send(Event::PreferencesLoaded(self.settings.preferences()))?;

        if let Some(prompt) = initial_prompt {
            self.submit(prompt, &completion_tx)?;
        }

        loop {
            tokio::select! {
                input = self.control_end.receiver.recv() => match input {
                    Some(InputEvent::Quit) | None => {
                        info!("view closed, stopping session");
                        break;
                    },
                    Some(input) => self.handle_input(input, &completion_tx).await?,
                },
                Some((epoch, outcome)) = completion_rx.recv() => self.handle_completion(epoch, outcome)?,
            }
        }

        Ok(())
    }

    async fn handle_input(
        &mut self,
        input: InputEvent,
        completion_tx: &UnboundedSender<Completion>,
    ) -> Result<(), ConduitError> {
        match input {
            InputEvent::Submit(text) => self.submit(text, completion_tx)?,
            InputEvent::NewChat => {
                let was_pending = self.session.pending();
                self.session.clear();
                self.control_end.send(Event::TranscriptCleared)?;
                if was_pending {
                    self.control_end.send(Event::PendingChanged(false))?;
                }
            },
            InputEvent::SavePreferences(preferences) => self.save_preferences(preferences).await?,
            InputEvent::Quit => {},
        }
        Ok(())
    }

    fn submit(&mut self, text: String, completion_tx: &UnboundedSender<Completion>) -> Result<(), ConduitError> {
        self.session.set_input(text);
        let Some(pending) = self.session.begin_submit() else {
            let rejected = self.session.take_input();
            if !rejected.trim().is_empty() {
                info!("question arrived while another is pending, returning it to the view");
                self.control_end.send(Event::SubmitRejected(rejected))?;
            }
            return Ok(());
        };

        if let Some(turn) = self.session.transcript().last() {
            self.control_end.send(Event::TurnAppended(turn.to_view()))?;
        }
        self.control_end.send(Event::PendingChanged(true))?;

        let backend = Arc::clone(&self.backend);
        let completion_tx = completion_tx.clone();
        tokio::spawn(async move {
            let outcome = backend.ask(pending.request).await;
            if completion_tx.send((pending.epoch, outcome)).is_err() {
                debug!(epoch = pending.epoch, "session stopped before the answer arrived");
            }
        });

        Ok(())
    }

    fn handle_completion(
        &mut self,
        epoch: u64,
        outcome: Result<ChatResponse, ApiClientError>,
    ) -> Result<(), ConduitError> {
        if let Some(turn) = self.session.complete(epoch, outcome) {
            let view = turn.to_view();
            self.control_end.send(Event::TurnAppended(view))?;
            self.control_end.send(Event::PendingChanged(false))?;
        }
        Ok(())
    }

    async fn save_preferences(&mut self, preferences: Preferences) -> Result<(), ConduitError> {
        match self.settings.save_preferences(&preferences).await {
            Ok(()) => {
                debug!(?preferences, "preferences saved");
                self.control_end.send(Event::PreferencesSaved)
            },
            Err(err) => {
                error!(%err, "failed to save preferences");
                self.control_end
                    .send(Event::Error(format!("Failed to save settings: {err}")))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use campus_chat_ui::conduit::{
        ViewEnd,
        get_conduit_pair,
    };
    use campus_chat_ui::protocol::Role;
    use campus_chat_ui::ui::theme::ThemeName;
    use tokio::sync::{
        Notify,
        mpsc,
    };
    use tokio::task::JoinHandle;

    use super::*;
    use crate::api_client::FALLBACK_ERROR_MESSAGE;
    use crate::session::tests::{
        MockBackend,
        Reply,
    };

    fn start(
        backend: MockBackend,
        settings: Settings,
        initial_prompt: Option<String>,
    ) -> (ViewEnd, Arc<MockBackend>, JoinHandle<Result<(), ConduitError>>) {
        let (view_end, control_end) = get_conduit_pair();
        let backend = Arc::new(backend);
        let controller = SessionController::new(backend.clone(), settings, control_end);
        let handle = tokio::spawn(controller.run(initial_prompt));
        (view_end, backend, handle)
    }

    async fn next_event(view_end: &mut ViewEnd) -> Event {
        tokio::time::timeout(Duration::from_secs(5), view_end.receiver.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("controller hung up")
    }

    async fn next_turn(view_end: &mut ViewEnd) -> (Role, String) {
        match next_event(view_end).await {
            Event::TurnAppended(turn) => (turn.role, turn.text),
            other => panic!("expected a turn, got {other:?}"),
        }
    }

    async fn stop(view_end: ViewEnd, handle: JoinHandle<Result<(), ConduitError>>) -> Vec<Event> {
        let ViewEnd { sender, mut receiver } = view_end;
        sender.send(InputEvent::Quit).unwrap();
        handle.await.unwrap().unwrap();

        let mut rest = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            rest.push(event);
        }
        rest
    }

    #[tokio::test]
    async fn test_question_and_answer_flow() {
        let (mut view_end, backend, handle) = start(MockBackend::new(Reply::Echo), Settings::in_memory(), None);
        assert_eq!(
            next_event(&mut view_end).await,
            Event::PreferencesLoaded(Preferences::default())
        );

        view_end.send(InputEvent::Submit("  Library hours?  ".to_string())).unwrap();
        assert_eq!(next_turn(&mut view_end).await, (Role::User, "Library hours?".to_string()));
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(true));

        match next_event(&mut view_end).await {
            Event::TurnAppended(turn) => {
                assert_eq!(turn.role, Role::Assistant);
                assert_eq!(turn.text, "answer to Library hours?");
                assert_eq!(turn.sources.len(), 1);
            },
            other => panic!("expected the answer, got {other:?}"),
        }
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(false));

        assert!(stop(view_end, handle).await.is_empty());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_initial_prompt_is_submitted() {
        let (mut view_end, backend, handle) = start(
            MockBackend::new(Reply::Fallback),
            Settings::in_memory(),
            Some("Admissions deadline?".to_string()),
        );
        assert!(matches!(next_event(&mut view_end).await, Event::PreferencesLoaded(_)));
        assert_eq!(next_turn(&mut view_end).await, (Role::User, "Admissions deadline?".to_string()));
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(true));
        assert_eq!(
            next_turn(&mut view_end).await,
            (Role::Assistant, FALLBACK_ERROR_MESSAGE.to_string())
        );
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(false));

        stop(view_end, handle).await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_submit_does_nothing() {
        let (mut view_end, backend, handle) = start(MockBackend::new(Reply::Echo), Settings::in_memory(), None);
        next_event(&mut view_end).await;

        view_end.send(InputEvent::Submit("   ".to_string())).unwrap();
        assert!(stop(view_end, handle).await.is_empty());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_new_chat_drops_late_answer() {
        let gate = Arc::new(Notify::new());
        let (answered_tx, mut answered_rx) = mpsc::unbounded_channel();
        let mut backend = MockBackend::new(Reply::Echo);
        backend.slow_question = Some(("slow".to_string(), gate.clone()));
        backend.answered = Some(answered_tx);

        let (mut view_end, backend, handle) = start(backend, Settings::in_memory(), None);
        next_event(&mut view_end).await;

        view_end.send(InputEvent::Submit("slow".to_string())).unwrap();
        assert_eq!(next_turn(&mut view_end).await, (Role::User, "slow".to_string()));
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(true));

        view_end.send(InputEvent::NewChat).unwrap();
        assert_eq!(next_event(&mut view_end).await, Event::TranscriptCleared);
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(false));

        // Let the old answer arrive before asking again
        gate.notify_one();
        assert_eq!(answered_rx.recv().await.as_deref(), Some("slow"));

        view_end.send(InputEvent::Submit("fast".to_string())).unwrap();
        assert_eq!(next_turn(&mut view_end).await, (Role::User, "fast".to_string()));
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(true));
        assert_eq!(
            next_turn(&mut view_end).await,
            (Role::Assistant, "answer to fast".to_string())
        );
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(false));

        assert!(stop(view_end, handle).await.is_empty());
        assert_eq!(backend.calls(), 2);
        assert!(backend.requests.lock().unwrap()[1].chat_history.is_empty());
    }

    #[tokio::test]
    async fn test_question_sent_while_pending_is_returned() {
        let gate = Arc::new(Notify::new());
        let mut backend = MockBackend::new(Reply::Echo);
        backend.slow_question = Some(("first".to_string(), gate.clone()));

        let (mut view_end, backend, handle) = start(backend, Settings::in_memory(), None);
        next_event(&mut view_end).await;

        view_end.send(InputEvent::Submit("first".to_string())).unwrap();
        view_end.send(InputEvent::Submit("second".to_string())).unwrap();
        assert_eq!(next_turn(&mut view_end).await, (Role::User, "first".to_string()));
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(true));
        assert_eq!(
            next_event(&mut view_end).await,
            Event::SubmitRejected("second".to_string())
        );

        gate.notify_one();
        assert_eq!(
            next_turn(&mut view_end).await,
            (Role::Assistant, "answer to first".to_string())
        );
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(false));

        // The returned question goes through once the first answer is in
        view_end.send(InputEvent::Submit("second".to_string())).unwrap();
        assert_eq!(next_turn(&mut view_end).await, (Role::User, "second".to_string()));
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(true));
        assert_eq!(
            next_turn(&mut view_end).await,
            (Role::Assistant, "answer to second".to_string())
        );
        assert_eq!(next_event(&mut view_end).await, Event::PendingChanged(false));

        assert!(stop(view_end, handle).await.is_empty());
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_new_chat_when_idle() {
        let (mut view_end, _backend, handle) = start(MockBackend::new(Reply::Echo), Settings::in_memory(), None);
        next_event(&mut view_end).await;

        view_end.send(InputEvent::NewChat).unwrap();
        assert_eq!(next_event(&mut view_end).await, Event::TranscriptCleared);
        assert!(stop(view_end, handle).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings::load(&path).await.unwrap();

        let (mut view_end, _backend, handle) = start(MockBackend::new(Reply::Echo), settings, None);
        next_event(&mut view_end).await;

        let preferences = Preferences {
            sound_effects: false,
            theme: ThemeName::Light,
            ..Preferences::default()
        };
        view_end
            .send(InputEvent::SavePreferences(preferences.clone()))
            .unwrap();
        assert_eq!(next_event(&mut view_end).await, Event::PreferencesSaved);
        stop(view_end, handle).await;

        assert_eq!(Settings::load(&path).await.unwrap().preferences(), preferences);
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the settings directory should be makes every write fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let settings = Settings::load(blocker.join("settings.json")).await.unwrap();

        let (mut view_end, _backend, handle) = start(MockBackend::new(Reply::Echo), settings, None);
        next_event(&mut view_end).await;

        view_end
            .send(InputEvent::SavePreferences(Preferences::default()))
            .unwrap();
        match next_event(&mut view_end).await {
            Event::Error(message) => assert!(message.starts_with("Failed to save settings")),
            other => panic!("expected an error, got {other:?}"),
        }
        stop(view_end, handle).await;
    }
}
