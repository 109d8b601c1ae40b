use std::process::ExitCode;
use std::sync::Arc;

use campus_chat_ui::conduit::get_conduit_pair;
use campus_chat_ui::{
    Page,
    get_app,
};
use clap::Args;
use eyre::{
    Context,
    Result,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

use crate::api_client::{
    ApiClient,
    Endpoint,
};
use crate::request::new_client;
use crate::session::SessionController;
use crate::settings::Settings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ChatArgs {
    /// Base url of the chatbot backend
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
    /// Open the chat screen directly instead of the welcome screen
    #[arg(long)]
    pub skip_landing: bool,
    /// A question to ask as soon as the chat opens
    pub prompt: Vec<String>,
}

impl ChatArgs {
    pub async fn execute(self) -> Result<ExitCode> {
        let settings = load_settings_or_default().await;
        let endpoint =
            Endpoint::resolve(self.endpoint.as_deref(), &settings).context("invalid chatbot endpoint")?;
        let client = new_client(settings.api_timeout()).context("failed to create the http client")?;
        info!(%endpoint, "starting chat");

        let initial_prompt = Some(self.prompt.join(" ")).filter(|prompt| !prompt.trim().is_empty());
        let page = match self.skip_landing || initial_prompt.is_some() {
            true => Page::Chat,
            false => Page::Landing,
        };

        let (view_end, control_end) = get_conduit_pair();
        let backend = Arc::new(ApiClient::new(client, endpoint));
        let controller = tokio::spawn(SessionController::new(backend, settings, control_end).run(initial_prompt));

        // Dropping the app closes the conduit, which stops the controller on every exit path
        let ui_result = {
            let mut app = get_app(view_end, page);
            app.run().await
        };

        match controller.await {
            Ok(Ok(())) => debug!("session stopped"),
            Ok(Err(err)) => debug!(%err, "session stopped early"),
            Err(err) => error!(%err, "session task failed"),
        }

        ui_result?;
        Ok(ExitCode::SUCCESS)
    }
}

/// A broken settings file should not keep the chat from opening.
///
/// The fallback is kept in memory so the broken file is left for the user to fix.
pub(super) async fn load_settings_or_default() -> Settings {
    match Settings::new().await {
        Ok(settings) => settings,
        Err(err) => {
            warn!(%err, "failed to load settings, using defaults");
            Settings::in_memory()
        },
    }
}
