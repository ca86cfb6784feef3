use thiserror::Error;

/// Errors returned by the LinkedIn client.
#[derive(Debug, Error)]
pub enum LinkedinError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The access or refresh token was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API refused the request (4xx other than auth, or a structured
    /// error body).
    #[error("LinkedIn API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LinkedinError {
    /// A short reason suitable for storing on a post's `failure_reason`.
    #[must_use]
    pub fn sanitized(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => "LinkedIn request timed out".to_string(),
            Self::Http(_) => "LinkedIn request failed".to_string(),
            Self::Auth(msg) => format!("LinkedIn auth failed: {msg}"),
            Self::Api(msg) => format!("LinkedIn rejected the request: {msg}"),
            Self::Deserialize { .. } => "LinkedIn returned an unexpected response".to_string(),
        }
    }
}
