mod ask;
mod chat;
mod settings;

use std::process::ExitCode;

pub use ask::AskArgs;
pub use chat::ChatArgs;
use clap::{
    ArgAction,
    Parser,
    Subcommand,
    ValueEnum,
};
use eyre::{
    Context,
    Result,
};
pub use settings::SettingsArgs;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{
    NonBlocking,
    WorkerGuard,
};
use tracing_appender::rolling::{
    RollingFileAppender,
    Rotation,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{
    EnvFilter,
    Registry,
};

use crate::util::directories;

const LOG_FILE_NAME: &str = "campus-chat.log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Outputs the results as markdown
    #[default]
    Plain,
    /// Outputs the results as JSON
    Json,
    /// Outputs the results as pretty print JSON
    JsonPretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(version, about = "Ask your university anything from the terminal")]
pub struct CliArgs {
    #[command(subcommand)]
    pub subcommand: Option<RootSubcommand>,
    /// Increase logging verbosity
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl CliArgs {
    pub async fn execute(self) -> Result<ExitCode> {
        let _guard = setup_logging(self.verbose).context("failed to initialize logging")?;

        let subcommand = self.subcommand.unwrap_or_default();

        subcommand.execute().await
    }
}

fn filter_for(verbose: u8) -> Option<EnvFilter> {
    if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        return Some(env_filter);
    }

    let level = match verbose {
        0 => return None,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    Some(EnvFilter::default().add_directive(level.into()))
}

/// Logs go to a file under the data directory since the terminal belongs to the ui.
fn setup_logging(verbose: u8) -> Result<WorkerGuard> {
    let env_filter = filter_for(verbose);

    // No logging configured, return dummy guard
    let max_level = env_filter.as_ref().and_then(|f| f.max_level_hint());
    let Some(env_filter) = env_filter.filter(|_| max_level.is_some() && max_level != Some(LevelFilter::OFF)) else {
        let (_, guard) = NonBlocking::new(std::io::sink());
        return Ok(guard);
    };

    let logs_dir = directories::logs_dir()?;
    std::fs::create_dir_all(&logs_dir).with_context(|| format!("failed to create {}", logs_dir.display()))?;

    let (non_blocking, file_guard) = NonBlocking::new(RollingFileAppender::new(Rotation::NEVER, logs_dir, LOG_FILE_NAME));
    let file_layer = tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false);

    Registry::default().with(env_filter).with(file_layer).init();

    Ok(file_guard)
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum RootSubcommand {
    /// Open the interactive chat (default)
    Chat(ChatArgs),
    /// Ask a single question and print the answer
    Ask(AskArgs),
    /// Customize appearance & behavior
    Settings(SettingsArgs),
}

impl RootSubcommand {
    pub async fn execute(self) -> Result<ExitCode> {
        match self {
            RootSubcommand::Chat(args) => args.execute().await,
            RootSubcommand::Ask(args) => args.execute().await,
            RootSubcommand::Settings(args) => args.execute().await,
        }
    }
}

impl Default for RootSubcommand {
    fn default() -> Self {
        Self::Chat(Default::default())
    }
}
