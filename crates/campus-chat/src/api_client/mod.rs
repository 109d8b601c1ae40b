pub mod endpoints;
pub mod model;

use async_trait::async_trait;
pub use endpoints::Endpoint;
pub use model::{
    ChatRequest,
    ChatResponse,
    HistoryPair,
    Source,
};
use reqwest::{
    Client,
    StatusCode,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{
    debug,
    error,
};

/// Shown in place of an answer when a request fails without a server detail
pub const FALLBACK_ERROR_MESSAGE: &str =
    "Sorry, I encountered an error connecting to the server. Please try again later.";

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("server responded with {status}")]
    Status { status: StatusCode, detail: Option<String> },
}

impl ApiClientError {
    /// Human readable detail supplied by the server, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// The text shown to the user for this failure
    pub fn user_message(&self) -> String {
        self.detail().unwrap_or(FALLBACK_ERROR_MESSAGE).to_string()
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask(&self, request: ChatRequest) -> Result<ChatResponse, ApiClientError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: Endpoint,
}

impl ApiClient {
    pub fn new(client: Client, endpoint: Endpoint) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn ask(&self, request: ChatRequest) -> Result<ChatResponse, ApiClientError> {
        let url = self.endpoint.chat_url()?;
        debug!(%url, history = request.chat_history.len(), "sending question");

        let response = self.client.post(url).json(&request).send().await.map_err(|err| {
            error!(%err, "request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body);
            error!(%status, ?detail, "server returned an error");
            return Err(ApiClientError::Status { status, detail });
        }

        let answer = response.json::<ChatResponse>().await.map_err(|err| {
            error!(%err, "failed to decode response");
            err
        })?;
        debug!(sources = answer.sources.len(), "received answer");
        Ok(answer)
    }
}

/// Extracts `detail` from an error body, only when it is a JSON string
fn error_detail(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body).ok()?.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::request::new_client;

    async fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        let client = new_client(Duration::from_secs(5)).unwrap();
        ApiClient::new(client, Endpoint::parse(&server.url()).unwrap())
    }

    fn question(text: &str) -> ChatRequest {
        ChatRequest {
            question: text.to_string(),
            chat_history: vec![],
        }
    }

    #[tokio::test]
    async fn test_successful_answer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "question": "Where is the library?",
                "chat_history": [["Hi", "Hello"]],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"<think>look it up</think>North campus.","sources":[{"content":"Map","metadata":{}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let response = client
            .ask(ChatRequest {
                question: "Where is the library?".to_string(),
                chat_history: vec![HistoryPair("Hi".to_string(), "Hello".to_string())],
            })
            .await
            .unwrap();

        assert_eq!(response.answer, "<think>look it up</think>North campus.");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].content, "Map");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_and_null_sources() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"answer":"Yes.","sources":null}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let response = client.ask(question("Open today?")).await.unwrap();
        assert_eq!(response.answer, "Yes.");
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(503)
            .with_body(r#"{"detail":"Model is warming up"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.ask(question("Hi")).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.detail(), Some("Model is warming up"));
        assert_eq!(err.user_message(), "Model is warming up");
    }

    #[tokio::test]
    async fn test_non_string_detail_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(422)
            .with_body(r#"{"detail":[{"loc":["body","question"],"msg":"field required"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.ask(question("Hi")).await.unwrap_err();
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.ask(question("Hi")).await.unwrap_err();
        assert_eq!(err.detail(), None);
        assert_eq!(err.user_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"reply":"wrong shape"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let err = client.ask(question("Hi")).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Request(_)));
        assert_eq!(err.user_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop a listener to get a port nothing is serving on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = ApiClient::new(
            new_client(Duration::from_secs(5)).unwrap(),
            Endpoint::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
        );

        let err = client.ask(question("Hi")).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Request(_)));
        assert_eq!(err.user_message(), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail":"x"}"#), Some("x".to_string()));
        assert_eq!(error_detail(r#"{"detail":null}"#), None);
        assert_eq!(error_detail(r#"{"message":"x"}"#), None);
        assert_eq!(error_detail(r#"["detail"]"#), None);
        assert_eq!(error_detail(""), None);
    }
}
