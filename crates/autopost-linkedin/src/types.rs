use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Result of a successful token refresh.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: String,
    /// LinkedIn rotates refresh tokens on some grants and omits the field on
    /// others; `None` means keep using the stored one.
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl TokenResponse {
    pub(crate) fn into_refreshed(self, now: DateTime<Utc>) -> RefreshedToken {
        RefreshedToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + Duration::seconds(self.expires_in),
        }
    }
}

/// Response to an upload initialization call.
#[derive(Debug, Deserialize)]
pub(crate) struct InitializeUploadResponse {
    pub value: InitializeUploadValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeUploadValue {
    pub upload_url: String,
    /// The asset URN (`urn:li:image:...` / `urn:li:video:...`).
    #[serde(alias = "image", alias = "video")]
    pub asset: String,
}
