use std::env;
use std::fmt;

use tracing::debug;
use url::Url;

use super::ApiClientError;
use crate::settings::{
    Setting,
    Settings,
};
use crate::util::consts::DEFAULT_ENDPOINT;
use crate::util::consts::env_var::ENDPOINT;

/// Base url of the chatbot backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn parse(input: &str) -> Result<Self, ApiClientError> {
        let mut url = Url::parse(input.trim())?;
        if url.cannot_be_a_base() {
            return Err(ApiClientError::InvalidEndpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        // Joining relative paths keeps any prefix only with a trailing slash
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn chat_url(&self) -> Result<Url, ApiClientError> {
        Ok(self.url.join("chat")?)
    }

    /// Resolves the endpoint from the flag, environment, settings, then the default
    pub fn resolve(flag: Option<&str>, settings: &Settings) -> Result<Self, ApiClientError> {
        Self::resolve_with(flag, env::var(ENDPOINT).ok(), settings)
    }

    fn resolve_with(
        flag: Option<&str>,
        env_value: Option<String>,
        settings: &Settings,
    ) -> Result<Self, ApiClientError> {
        let non_empty = |s: &&str| !s.trim().is_empty();
        let setting = settings.get_string(Setting::ApiEndpoint);

        let (origin, value) = if let Some(flag) = flag.filter(non_empty) {
            ("flag", flag)
        } else if let Some(value) = env_value.as_deref().filter(non_empty) {
            ("env", value)
        } else if let Some(value) = setting.as_deref().filter(non_empty) {
            ("settings", value)
        } else {
            ("default", DEFAULT_ENDPOINT)
        };

        debug!(origin, value, "resolved endpoint");
        Self::parse(value)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url() {
        let endpoint = Endpoint::parse("http://localhost:8000").unwrap();
        assert_eq!(endpoint.chat_url().unwrap().as_str(), "http://localhost:8000/chat");

        let endpoint = Endpoint::parse("https://uni.example.edu/bot").unwrap();
        assert_eq!(endpoint.chat_url().unwrap().as_str(), "https://uni.example.edu/bot/chat");

        let endpoint = Endpoint::parse("https://uni.example.edu/bot/").unwrap();
        assert_eq!(endpoint.chat_url().unwrap().as_str(), "https://uni.example.edu/bot/chat");
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            Endpoint::parse("not a url"),
            Err(ApiClientError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            Endpoint::parse("mailto:bot@example.edu"),
            Err(ApiClientError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_resolution_order() {
        let mut settings = Settings::in_memory();
        let resolve = |flag, env: Option<&str>, settings: &Settings| {
            Endpoint::resolve_with(flag, env.map(String::from), settings)
                .unwrap()
                .to_string()
        };

        assert_eq!(resolve(None, None, &settings), "http://localhost:8000/");

        settings.set(Setting::ApiEndpoint, "http://settings:1").await.unwrap();
        assert_eq!(resolve(None, None, &settings), "http://settings:1/");
        assert_eq!(resolve(None, Some("http://env:2"), &settings), "http://env:2/");
        assert_eq!(
            resolve(Some("http://flag:3"), Some("http://env:2"), &settings),
            "http://flag:3/"
        );
        assert_eq!(resolve(Some(""), Some("  "), &settings), "http://settings:1/");
    }
}
