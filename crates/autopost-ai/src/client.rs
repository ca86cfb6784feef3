//! HTTP client for the AI generation gateway.
//!
//! All endpoints post to `/v1/generations`; a non-2xx response with a JSON
//! `{"error": {"code", "message"}}` body surfaces as [`AiError::Generation`].

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::AiError;
use crate::retry::retry_with_backoff;
use crate::types::{ErrorEnvelope, Generation, GenerationKind, GenerationRequest};

/// Client for the AI generation gateway.
///
/// Text generation uses `request_timeout`; image/video/html generation uses
/// `generation_timeout`, which is minutes-scale because media generation is
/// slow. Use [`AiClient::with_base_url`] to point at a mock server in tests.
pub struct AiClient {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
    request_timeout: Duration,
    generation_timeout: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl AiClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`AiError::Generation`] if `base_url` is invalid.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        request_timeout_secs: u64,
        generation_timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, AiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent("autopost/0.1 (content-generation)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AiError::Generation {
            code: "config".to_owned(),
            message: format!("invalid AI base URL: {e}"),
        })?;

        Ok(Self {
            client,
            api_key: api_key.map(ToOwned::to_owned),
            base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            generation_timeout: Duration::from_secs(generation_timeout_secs),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Creates a client with short timeouts and no retries, for tests.
    ///
    /// # Errors
    ///
    /// Same as [`AiClient::new`].
    pub fn with_base_url(base_url: &str) -> Result<Self, AiError> {
        Self::new(base_url, Some("test-key"), 10, 10, 0, 0)
    }

    /// Generate a plain text post body.
    ///
    /// # Errors
    ///
    /// - [`AiError::Generation`] if the gateway rejects the request.
    /// - [`AiError::Http`] on network failure or an unexpected status.
    /// - [`AiError::Deserialize`] if the response does not match the schema.
    pub async fn generate_text(&self, request: &GenerationRequest) -> Result<Generation, AiError> {
        self.post_generation(request, self.request_timeout).await
    }

    /// Generate a post body plus an image asset.
    ///
    /// # Errors
    ///
    /// Same as [`AiClient::generate_text`].
    pub async fn generate_image(&self, request: &GenerationRequest) -> Result<Generation, AiError> {
        self.post_generation(request, self.generation_timeout).await
    }

    /// Generate a post body plus a video asset.
    ///
    /// # Errors
    ///
    /// Same as [`AiClient::generate_text`].
    pub async fn generate_video(&self, request: &GenerationRequest) -> Result<Generation, AiError> {
        self.post_generation(request, self.generation_timeout).await
    }

    /// Generate an html carousel document.
    ///
    /// Retries transient failures with back-off before surfacing an error:
    /// html generation is the slowest kind and the sweep will not come back
    /// to this post until its next scheduled run.
    ///
    /// # Errors
    ///
    /// Same as [`AiClient::generate_text`].
    pub async fn generate_html(&self, request: &GenerationRequest) -> Result<Generation, AiError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.post_generation(request, self.generation_timeout)
        })
        .await
    }

    /// Dispatch by generation kind.
    ///
    /// # Errors
    ///
    /// Same as [`AiClient::generate_text`].
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, AiError> {
        match request.kind {
            GenerationKind::Text => self.generate_text(request).await,
            GenerationKind::Image => self.generate_image(request).await,
            GenerationKind::Video => self.generate_video(request).await,
            GenerationKind::Html => self.generate_html(request).await,
        }
    }

    async fn post_generation(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<Generation, AiError> {
        let url = self
            .base_url
            .join("v1/generations")
            .map_err(|e| AiError::Generation {
                code: "config".to_owned(),
                message: format!("invalid generation URL: {e}"),
            })?;

        let mut builder = self.client.post(url.clone()).timeout(timeout).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::error_from_body(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| AiError::Deserialize {
            context: format!("generations({})", request.kind.as_str()),
            source: e,
        })
    }

    /// Map a non-2xx body to a typed error, preferring the gateway's own
    /// envelope when it parses.
    fn error_from_body(status: StatusCode, body: &str) -> AiError {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => AiError::Generation {
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => AiError::Generation {
                code: format!("http_{}", status.as_u16()),
                message: "generation gateway returned an error".to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_request() -> GenerationRequest {
        GenerationRequest {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            kind: GenerationKind::Text,
            prompt: "Write a post".to_string(),
            template_html: None,
            page_count: None,
        }
    }

    #[tokio::test]
    async fn generate_text_parses_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generations"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "kind": "text",
                "model": "gpt-4o",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": "Here is your post."
            })))
            .mount(&server)
            .await;

        let client = AiClient::with_base_url(&server.uri()).expect("client");
        let generation = client.generate_text(&text_request()).await.expect("ok");
        assert_eq!(generation.content, "Here is your post.");
        assert!(generation.media_url.is_none());
    }

    #[tokio::test]
    async fn generate_image_surfaces_media_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": "Caption text",
                "media_url": "https://cdn.example.com/img.png",
                "mime_type": "image/png"
            })))
            .mount(&server)
            .await;

        let client = AiClient::with_base_url(&server.uri()).expect("client");
        let request = GenerationRequest {
            kind: GenerationKind::Image,
            ..text_request()
        };
        let generation = client.generate_image(&request).await.expect("ok");
        assert_eq!(
            generation.media_url.as_deref(),
            Some("https://cdn.example.com/img.png")
        );
        assert_eq!(generation.mime_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn error_envelope_becomes_typed_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generations"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "error": {"code": "content_policy", "message": "prompt rejected"}
            })))
            .mount(&server)
            .await;

        let client = AiClient::with_base_url(&server.uri()).expect("client");
        let result = client.generate_text(&text_request()).await;
        match result {
            Err(AiError::Generation { code, message }) => {
                assert_eq!(code, "content_policy");
                assert_eq!(message, "prompt rejected");
            }
            other => panic!("expected Generation error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unstructured_error_body_gets_a_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generations"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = AiClient::with_base_url(&server.uri()).expect("client");
        let result = client.generate_text(&text_request()).await;
        match result {
            Err(AiError::Generation { code, .. }) => assert_eq!(code, "http_503"),
            other => panic!("expected Generation error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_html_retry_budget_is_bounded() {
        // Connect errors are retriable; a dead port exercises the whole
        // retry loop without a mock server.
        let client = AiClient::new("http://127.0.0.1:1", Some("k"), 1, 1, 2, 0).expect("client");
        let request = GenerationRequest {
            kind: GenerationKind::Html,
            page_count: Some(3),
            ..text_request()
        };
        let started = std::time::Instant::now();
        let result = client.generate_html(&request).await;
        assert!(matches!(result, Err(AiError::Http(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
