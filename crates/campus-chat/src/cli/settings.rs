use std::process::ExitCode;

use anstream::println;
use clap::{
    Args,
    Subcommand,
};
use eyre::{
    Result,
    WrapErr,
    bail,
    eyre,
};
use serde_json::Value;

use super::OutputFormat;
use crate::settings::{
    Setting,
    Settings,
};
use crate::util::consts::env_var::EDITOR;
use crate::util::directories;

#[derive(Clone, Debug, Subcommand, PartialEq, Eq)]
pub enum SettingsSubcommands {
    /// Open the settings file in $EDITOR
    Open,
    /// List every stored setting
    All {
        #[arg(long, short, value_enum, default_value_t)]
        format: OutputFormat,
    },
}

/// Read, change or remove a single setting, e.g. `settings chat.theme light`
#[derive(Clone, Debug, Args, PartialEq, Eq)]
#[command(args_conflicts_with_subcommands = true)]
pub struct SettingsArgs {
    #[command(subcommand)]
    cmd: Option<SettingsSubcommands>,
    /// Setting key, such as `api.endpoint`
    key: Option<String>,
    /// New value. Parsed as JSON when possible, stored as a string otherwise
    #[arg(requires = "key")]
    value: Option<String>,
    /// Remove the key instead of reading it
    #[arg(long, short, requires = "key", conflicts_with = "value")]
    delete: bool,
    #[arg(long, short, value_enum, default_value_t, requires = "key")]
    format: OutputFormat,
}

impl SettingsArgs {
    pub async fn execute(&self) -> Result<ExitCode> {
        match (&self.cmd, &self.key) {
            (Some(SettingsSubcommands::Open), _) => open_in_editor().await,
            (Some(SettingsSubcommands::All { format }), _) => {
                let settings = load().await?;
                for line in list_lines(settings.map(), *format)? {
                    println!("{line}");
                }
                Ok(ExitCode::SUCCESS)
            },
            (None, Some(key)) => self.apply(Setting::try_from(key.as_str())?).await,
            (None, None) => Ok(ExitCode::SUCCESS),
        }
    }

    async fn apply(&self, key: Setting) -> Result<ExitCode> {
        let mut settings = load().await?;

        if self.delete {
            if settings.get(key).is_none() {
                bail!("No value associated with {key}");
            }
            println!("Removing {:?}", key.as_ref());
            settings.remove(key).await?;
            return Ok(ExitCode::SUCCESS);
        }

        match &self.value {
            Some(raw) => {
                let value = parse_value(raw);
                key.validate(&value)?;
                settings.set(key, value).await?;
            },
            None => {
                let shown = show_value(settings.get(key), self.format)
                    .ok_or_else(|| eyre!("No value associated with {key}"))?;
                println!("{shown}");
            },
        }
        Ok(ExitCode::SUCCESS)
    }
}

async fn load() -> Result<Settings> {
    Settings::new().await.context("Could not load settings")
}

async fn open_in_editor() -> Result<ExitCode> {
    let path = directories::settings_path().context("Could not get settings path")?;
    let Ok(editor) = std::env::var(EDITOR) else {
        bail!("The EDITOR environment variable is not set");
    };
    let status = tokio::process::Command::new(editor).arg(path).status().await?;
    Ok(match status.success() {
        true => ExitCode::SUCCESS,
        false => ExitCode::FAILURE,
    })
}

/// `30` and `true` keep their JSON type; anything that is not JSON is a string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_err| Value::String(raw.to_string()))
}

/// Formats a stored value. A missing value has no plain rendering and shows as `null` in JSON.
fn show_value(value: Option<&Value>, format: OutputFormat) -> Option<String> {
    match (value, format) {
        (None, OutputFormat::Plain) => None,
        (None, _) => Some(Value::Null.to_string()),
        (Some(Value::String(text)), OutputFormat::Plain) => Some(text.clone()),
        (Some(value), OutputFormat::Plain | OutputFormat::JsonPretty) => Some(format!("{value:#}")),
        (Some(value), OutputFormat::Json) => Some(value.to_string()),
    }
}

fn list_lines(map: &serde_json::Map<String, Value>, format: OutputFormat) -> Result<Vec<String>> {
    Ok(match format {
        OutputFormat::Plain => map.iter().map(|(key, value)| format!("{key} = {value}")).collect(),
        OutputFormat::Json => vec![serde_json::to_string(map)?],
        OutputFormat::JsonPretty => vec![serde_json::to_string_pretty(map)?],
    })
}
