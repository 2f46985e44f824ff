use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::domain::{
    ports::CompletionProvider, Completion, CompletionRequest, DomainError,
};
use crate::infrastructure::config::LlmConfig;

/// Client for an OpenRouter-compatible chat completions API.
pub struct OpenRouterProvider {
    client: Client,
    base_url: String,
    api_key: String,
    referer: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

impl OpenRouterProvider {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DomainError::configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            referer: config.referer.clone(),
        })
    }

    /// Returns `None` when no credential is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, DomainError> {
        config
            .api_key
            .as_deref()
            .map(|key| Self::new(config, key))
            .transpose()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header(header::CONTENT_TYPE, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, DomainError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Err(transport_error(e)),
            Err(_) => String::new(),
        };
        let message = provider_error_message(&body).unwrap_or_else(|| status_message(status));
        Err(DomainError::upstream(format!("AI response failed: {message}")))
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, DomainError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %request.model, max_tokens = request.max_tokens, "upstream completion");

        let response = self
            .send(self.authorized(self.client.post(&url)).json(request))
            .await?;

        let body: ChatCompletionResponse = read_json(response).await?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DomainError::upstream("AI response failed: no choices returned"))?;

        Ok(Completion {
            content,
            usage: body.usage,
        })
    }

    async fn list_models(&self) -> Result<Vec<serde_json::Value>, DomainError> {
        let url = format!("{}/models", self.base_url);
        let response = self.send(self.authorized(self.client.get(&url))).await?;
        let body: ModelsResponse = read_json(response).await?;
        Ok(body.data)
    }
}

/// A timeout while the body is still streaming is reported as a timeout,
/// not as a decode error.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DomainError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        DomainError::upstream(format!("AI response failed: invalid response body: {e}"))
    })
}

fn transport_error(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::timeout(format!("AI response failed: {e}"))
    } else {
        DomainError::upstream(format!("AI response failed: {e}"))
    }
}

fn status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Pulls `error.message` out of a provider error body, if there is one.
fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use axum::{
        http::HeaderMap,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Accepts connections, writes `head` and then never finishes the response.
    async fn serve_stalling(head: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 8192];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(head).await;
                    let _ = socket.flush().await;
                    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn provider(base_url: &str) -> OpenRouterProvider {
        let config = LlmConfig {
            base_url: base_url.to_string(),
            referer: "http://pdf-chat.test".to_string(),
            timeout_seconds: 1,
            ..LlmConfig::default()
        };
        OpenRouterProvider::new(&config, "sk-test").unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test/model".to_string(),
            messages: vec![Message::system("rules"), Message::user("hi")],
            max_tokens: 64,
            temperature: 0.2,
        }
    }

    async fn echo_completion(
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        let content = format!(
            "{}|{}|{}|{}",
            header("authorization"),
            header("http-referer"),
            body["model"].as_str().unwrap_or_default(),
            body["max_tokens"]
        );
        Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7 }
        }))
    }

    #[tokio::test]
    async fn test_complete_sends_credentials_and_returns_usage() {
        let url = serve(Router::new().route("/chat/completions", post(echo_completion))).await;

        let completion = provider(&url).complete(&request()).await.unwrap();

        assert_eq!(
            completion.content,
            "Bearer sk-test|http://pdf-chat.test|test/model|64"
        );
        assert_eq!(completion.usage.unwrap()["total_tokens"], 7);
    }

    #[tokio::test]
    async fn test_complete_passes_provider_error_message_through() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "message": "Invalid API key", "code": 401 } })),
                )
            }),
        );
        let url = serve(router).await;

        let err = provider(&url).complete(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Upstream(_)));
        assert_eq!(err.message(), "AI response failed: Invalid API key");
    }

    #[tokio::test]
    async fn test_complete_falls_back_to_status_text() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
        );
        let url = serve(router).await;

        let err = provider(&url).complete(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Upstream(_)));
        assert_eq!(err.message(), "AI response failed: HTTP 502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_upstream_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let url = serve(router).await;

        let err = provider(&url).complete(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Upstream(_)));
        assert_eq!(err.message(), "AI response failed: no choices returned");
    }

    #[tokio::test]
    async fn test_complete_with_malformed_body_is_upstream_error() {
        let router = Router::new().route("/chat/completions", post(|| async { "not json" }));
        let url = serve(router).await;

        let err = provider(&url).complete(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Upstream(_)));
        assert!(err.message().contains("invalid response body"));
    }

    #[tokio::test]
    async fn test_list_models_returns_data() {
        let router = Router::new().route(
            "/models",
            get(|| async { Json(json!({ "data": [{ "id": "a/one" }, { "id": "b/two" }] })) }),
        );
        let url = serve(router).await;

        let models = provider(&url).list_models().await.unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[1]["id"], "b/two");
    }

    #[tokio::test]
    async fn test_timeout_before_headers() {
        let url = serve_stalling(b"").await;

        let err = provider(&url).complete(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn test_timeout_while_reading_body() {
        let url = serve_stalling(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 200\r\n\r\n{\"choices\":",
        )
        .await;

        let err = provider(&url).complete(&request()).await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout(_)), "{err}");

        let err = provider(&url).list_models().await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout(_)), "{err}");
    }

    #[tokio::test]
    async fn test_timeout_while_reading_error_body() {
        let url = serve_stalling(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\n{\"error\"",
        )
        .await;

        let err = provider(&url).complete(&request()).await.unwrap_err();

        assert!(matches!(err, DomainError::Timeout(_)), "{err}");
    }

    #[test]
    fn test_provider_error_message() {
        let body = r#"{"error":{"message":"Invalid API key","code":401}}"#;
        assert_eq!(provider_error_message(body).as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn test_provider_error_message_missing() {
        assert!(provider_error_message("<html>bad gateway</html>").is_none());
        assert!(provider_error_message(r#"{"error":"flat"}"#).is_none());
        assert!(provider_error_message("").is_none());
    }

    #[test]
    fn test_status_message() {
        assert_eq!(status_message(StatusCode::BAD_GATEWAY), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn test_from_config_without_key() {
        let config = LlmConfig::default();
        assert!(OpenRouterProvider::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://localhost:1234/v1/".to_string(),
            ..LlmConfig::default()
        };
        let provider = OpenRouterProvider::from_config(&config).unwrap().unwrap();
        assert_eq!(provider.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn test_completion_response_parses_usage() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"See page 2"}}],
                "usage":{"prompt_tokens":10,"completion_tokens":3,"total_tokens":13}}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("See page 2"));
        assert_eq!(body.usage.unwrap()["total_tokens"], 13);
    }
}
