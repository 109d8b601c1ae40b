use std::fmt::Display;
use std::io::SeekFrom;
use std::path::{
    Path,
    PathBuf,
};
use std::str::FromStr as _;
use std::time::Duration;

use campus_chat_ui::protocol::Preferences;
use campus_chat_ui::ui::theme::ThemeName;
use fd_lock::RwLock;
use serde_json::{
    Map,
    Value,
};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{
    AsyncReadExt,
    AsyncSeekExt,
    AsyncWriteExt,
};
use tracing::warn;

use crate::util::consts::DEFAULT_TIMEOUT_SECS;
use crate::util::directories::{
    self,
    DirectoryError,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("{0} is not a valid setting")]
    InvalidSetting(String),
    #[error("invalid value for {key}: expected {expected}")]
    InvalidValue { key: Setting, expected: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIter)]
pub enum Setting {
    ApiEndpoint,
    ApiTimeout,
    ChatTheme,
    ChatEnableNotifications,
    ChatEnableSoundEffects,
    AccountDisplayName,
    AccountEmail,
}

impl AsRef<str> for Setting {
    fn as_ref(&self) -> &'static str {
        match self {
            Self::ApiEndpoint => "api.endpoint",
            Self::ApiTimeout => "api.timeout",
            Self::ChatTheme => "chat.theme",
            Self::ChatEnableNotifications => "chat.enableNotifications",
            Self::ChatEnableSoundEffects => "chat.enableSoundEffects",
            Self::AccountDisplayName => "account.displayName",
            Self::AccountEmail => "account.email",
        }
    }
}

impl Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl TryFrom<&str> for Setting {
    type Error = SettingsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "api.endpoint" => Ok(Self::ApiEndpoint),
            "api.timeout" => Ok(Self::ApiTimeout),
            "chat.theme" => Ok(Self::ChatTheme),
            "chat.enableNotifications" => Ok(Self::ChatEnableNotifications),
            "chat.enableSoundEffects" => Ok(Self::ChatEnableSoundEffects),
            "account.displayName" => Ok(Self::AccountDisplayName),
            "account.email" => Ok(Self::AccountEmail),
            _ => Err(SettingsError::InvalidSetting(value.to_string())),
        }
    }
}

impl Setting {
    /// Checks that `value` has the shape the client expects for this key.
    pub fn validate(self, value: &Value) -> Result<(), SettingsError> {
        let invalid = |expected| SettingsError::InvalidValue { key: self, expected };
        match self {
            Self::ApiEndpoint => {
                let s = value.as_str().ok_or(invalid("a url string"))?;
                url::Url::parse(s).map_err(|_err| invalid("a url string"))?;
            },
            Self::ApiTimeout => {
                value
                    .as_u64()
                    .filter(|secs| *secs > 0)
                    .ok_or(invalid("a positive number of seconds"))?;
            },
            Self::ChatTheme => {
                value
                    .as_str()
                    .and_then(|s| ThemeName::from_str(s).ok())
                    .ok_or(invalid("\"dark\" or \"light\""))?;
            },
            Self::ChatEnableNotifications | Self::ChatEnableSoundEffects => {
                value.as_bool().ok_or(invalid("true or false"))?;
            },
            Self::AccountDisplayName | Self::AccountEmail => {
                value.as_str().ok_or(invalid("a string"))?;
            },
        }
        Ok(())
    }
}

/// The JSON settings file.
///
/// Settings created with [Settings::in_memory] are never written anywhere.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    path: Option<PathBuf>,
    map: Map<String, Value>,
}

impl Settings {
    /// Loads the settings file from the data directory
    pub async fn new() -> Result<Self, SettingsError> {
        Self::load(directories::settings_path()?).await
    }

    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();

        let map = match path.exists() {
            true => {
                let mut file = RwLock::new(File::open(&path).await?);
                let mut buf = Vec::new();
                file.write()?.read_to_end(&mut buf).await?;
                if buf.iter().all(u8::is_ascii_whitespace) {
                    Map::new()
                } else {
                    serde_json::from_slice(&buf)?
                }
            },
            false => Map::new(),
        };

        Ok(Self { path: Some(path), map })
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn map(&self) -> &'_ Map<String, Value> {
        &self.map
    }

    pub fn get(&self, key: Setting) -> Option<&Value> {
        self.map.get(key.as_ref())
    }

    pub fn get_bool(&self, key: Setting) -> Option<bool> {
        self.get(key).and_then(|value| value.as_bool())
    }

    pub fn get_string(&self, key: Setting) -> Option<String> {
        self.get(key).and_then(|value| value.as_str().map(|s| s.into()))
    }

    pub fn get_int(&self, key: Setting) -> Option<i64> {
        self.get(key).and_then(|value| value.as_i64())
    }

    pub async fn set(&mut self, key: Setting, value: impl Into<Value>) -> Result<(), SettingsError> {
        self.map.insert(key.to_string(), value.into());
        self.save_to_file().await
    }

    /// Sets several keys with a single write
    pub async fn set_all(
        &mut self,
        entries: impl IntoIterator<Item = (Setting, Value)>,
    ) -> Result<(), SettingsError> {
        for (key, value) in entries {
            self.map.insert(key.to_string(), value);
        }
        self.save_to_file().await
    }

    pub async fn remove(&mut self, key: Setting) -> Result<Option<Value>, SettingsError> {
        let value = self.map.remove(key.as_ref());
        self.save_to_file().await?;
        Ok(value)
    }

    pub async fn save_to_file(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        // If the folder doesn't exist, create it.
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file_opts = File::options();
        file_opts.create(true).write(true).truncate(true);

        #[cfg(unix)]
        file_opts.mode(0o600);
        let mut file = RwLock::new(file_opts.open(path).await?);
        let mut lock = file.write()?;

        match serde_json::to_string_pretty(&self.map) {
            Ok(json) => lock.write_all(json.as_bytes()).await?,
            Err(_err) => {
                lock.seek(SeekFrom::Start(0)).await?;
                lock.set_len(0).await?;
                lock.write_all(b"{}").await?;
            },
        }
        lock.flush().await?;

        Ok(())
    }

    /// Request timeout, falling back to the default for missing or unusable values
    pub fn api_timeout(&self) -> Duration {
        match self.get_int(Setting::ApiTimeout) {
            Some(secs) if secs > 0 => Duration::from_secs(secs.unsigned_abs()),
            Some(secs) => {
                warn!(secs, "ignoring non-positive {}", Setting::ApiTimeout);
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn theme(&self) -> ThemeName {
        self.get_string(Setting::ChatTheme)
            .and_then(|s| ThemeName::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn preferences(&self) -> Preferences {
        let defaults = Preferences::default();
        Preferences {
            notifications: self
                .get_bool(Setting::ChatEnableNotifications)
                .unwrap_or(defaults.notifications),
            sound_effects: self
                .get_bool(Setting::ChatEnableSoundEffects)
                .unwrap_or(defaults.sound_effects),
            display_name: self
                .get_string(Setting::AccountDisplayName)
                .unwrap_or(defaults.display_name),
            email: self.get_string(Setting::AccountEmail).unwrap_or(defaults.email),
            theme: self.theme(),
        }
    }

    pub async fn save_preferences(&mut self, preferences: &Preferences) -> Result<(), SettingsError> {
        self.set_all([
            (
                Setting::ChatEnableNotifications,
                Value::Bool(preferences.notifications),
            ),
            (Setting::ChatEnableSoundEffects, Value::Bool(preferences.sound_effects)),
            (
                Setting::AccountDisplayName,
                Value::String(preferences.display_name.clone()),
            ),
            (Setting::AccountEmail, Value::String(preferences.email.clone())),
            (Setting::ChatTheme, Value::String(preferences.theme.to_string())),
        ])
        .await
    }
}
