use thiserror::Error;

/// Errors returned by the AI generation client.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway returned a structured error envelope. `code` is stable
    /// across providers; `message` contains no provider internals.
    #[error("generation failed ({code}): {message}")]
    Generation { code: String, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AiError {
    /// A short reason suitable for storing on a post's `failure_reason`.
    #[must_use]
    pub fn sanitized(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => "generation timed out".to_string(),
            Self::Http(_) => "generation request failed".to_string(),
            Self::Generation { code, message } => format!("{code}: {message}"),
            Self::Deserialize { .. } => "generation returned an unexpected response".to_string(),
        }
    }
}
