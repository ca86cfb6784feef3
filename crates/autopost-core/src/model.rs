//! Shared domain enums.
//!
//! Post status and media type are stored as snake_case text columns; both
//! round-trip through [`as_str`]/[`FromStr`] so an unrecognized value in the
//! database surfaces as a parse error instead of a panic.
//!
//! [`as_str`]: PostStatus::as_str
//! [`FromStr`]: std::str::FromStr

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a post.
///
/// Transitions are driven by the sweep jobs and user review actions:
///
/// ```text
/// scheduled -> pending_review -> {approved | rejected | skipped}
/// approved  -> {published | failed}
/// rejected/failed/skipped -> scheduled   (explicit regeneration)
/// failed    -> approved                  (retry without regeneration)
/// ```
///
/// `published` is terminal. Only a transition into `published` advances the
/// owning series queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Scheduled,
    PendingReview,
    Approved,
    Rejected,
    Skipped,
    Published,
    Failed,
}

impl PostStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Skipped => "skipped",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "pending_review" => Ok(Self::PendingReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "skipped" => Ok(Self::Skipped),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown post status: {other}")),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of content a post carries, and with it the publish-time media
/// contract: `text` posts upload nothing, `image`/`video` posts upload a
/// single asset from `media_url` (cached after first upload), `html` posts
/// upload one image asset per pre-captured page and publish a carousel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Text,
    Image,
    Video,
    Html,
}

impl MediaType {
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

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_status_round_trips_through_text() {
        for status in [
            PostStatus::Scheduled,
            PostStatus::PendingReview,
            PostStatus::Approved,
            PostStatus::Rejected,
            PostStatus::Skipped,
            PostStatus::Published,
            PostStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PostStatus>(), Ok(status));
        }
    }

    #[test]
    fn post_status_rejects_unknown_text() {
        assert!("draft".parse::<PostStatus>().is_err());
    }

    #[test]
    fn media_type_round_trips_through_text() {
        for media in [
            MediaType::Text,
            MediaType::Image,
            MediaType::Video,
            MediaType::Html,
        ] {
            assert_eq!(media.as_str().parse::<MediaType>(), Ok(media));
        }
    }

    #[test]
    fn media_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&MediaType::Html).expect("serialize");
        assert_eq!(json, "\"html\"");
        let parsed: MediaType = serde_json::from_str("\"image\"").expect("deserialize");
        assert_eq!(parsed, MediaType::Image);
    }
}
