use serde::{Deserialize, Serialize};

/// What the gateway is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Text,
    Image,
    Video,
    Html,
}

impl GenerationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Html => "html",
        }
    }
}

/// One generation call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub provider: String,
    pub model: String,
    pub kind: GenerationKind,
    pub prompt: String,
    /// HTML skeleton supplying structural constraints, html kind only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_html: Option<String>,
    /// Number of carousel pages to produce, html kind only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// A successful generation. `content` is always the post body text; image
/// and video kinds additionally carry a download URL for the produced asset,
/// and the html kind carries the rendered carousel document.
#[derive(Debug, Clone, Deserialize)]
pub struct Generation {
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// Error envelope returned by the gateway on a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
}
