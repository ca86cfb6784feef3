//! HTTP client for the LinkedIn REST API.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde_json::json;

use crate::error::LinkedinError;
use crate::types::{InitializeUploadResponse, RefreshedToken, TokenResponse};

const DEFAULT_BASE_URL: &str = "https://api.linkedin.com";
const LINKEDIN_VERSION: &str = "202405";
const RESTLI_PROTOCOL: &str = "2.0.0";

/// Client for the LinkedIn REST API.
///
/// Holds the OAuth application credentials used for token refresh. Use
/// [`LinkedinClient::with_base_url`] to point at a mock server in tests.
pub struct LinkedinClient {
    client: Client,
    base_url: Url,
    client_id: String,
    client_secret: String,
}

impl LinkedinClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`LinkedinError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        timeout_secs: u64,
    ) -> Result<Self, LinkedinError> {
        Self::with_base_url(client_id, client_secret, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LinkedinError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`LinkedinError::Api`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        client_id: &str,
        client_secret: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, LinkedinError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("autopost/0.1 (publishing)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| LinkedinError::Api(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
        })
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// # Errors
    ///
    /// - [`LinkedinError::Auth`] if the refresh token was rejected.
    /// - [`LinkedinError::Http`] on network failure.
    /// - [`LinkedinError::Deserialize`] on an unexpected response shape.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedToken, LinkedinError> {
        let url = self.endpoint("oauth/v2/accessToken")?;

        let response = self
            .client
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(LinkedinError::Auth(format!(
                "token refresh rejected ({})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(LinkedinError::Api(format!(
                "token refresh returned {}",
                status.as_u16()
            )));
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| LinkedinError::Deserialize {
                context: "accessToken".to_owned(),
                source: e,
            })?;

        Ok(parsed.into_refreshed(chrono::Utc::now()))
    }

    /// Upload image bytes, returning the asset URN.
    ///
    /// Two steps: `initializeUpload` yields a one-shot upload URL and the
    /// URN; the bytes are then `PUT` to that URL.
    ///
    /// # Errors
    ///
    /// - [`LinkedinError::Auth`] if the access token was rejected.
    /// - [`LinkedinError::Api`] if either step fails.
    /// - [`LinkedinError::Http`] on network failure.
    pub async fn upload_image(
        &self,
        access_token: &str,
        author_urn: &str,
        bytes: Vec<u8>,
    ) -> Result<String, LinkedinError> {
        self.upload_asset("rest/images", access_token, author_urn, bytes)
            .await
    }

    /// Upload video bytes, returning the asset URN.
    ///
    /// # Errors
    ///
    /// Same as [`LinkedinClient::upload_image`].
    pub async fn upload_video(
        &self,
        access_token: &str,
        author_urn: &str,
        bytes: Vec<u8>,
    ) -> Result<String, LinkedinError> {
        self.upload_asset("rest/videos", access_token, author_urn, bytes)
            .await
    }

    /// Create a post with the final text and zero or more uploaded assets.
    ///
    /// One asset publishes as single media; several publish as an ordered
    /// multi-image carousel. Returns the remote post id.
    ///
    /// # Errors
    ///
    /// - [`LinkedinError::Auth`] if the access token was rejected.
    /// - [`LinkedinError::Api`] if the API refuses the post.
    /// - [`LinkedinError::Http`] on network failure.
    pub async fn create_post(
        &self,
        access_token: &str,
        author_urn: &str,
        text: &str,
        assets: &[String],
    ) -> Result<String, LinkedinError> {
        let url = self.endpoint("rest/posts")?;

        let mut body = json!({
            "author": author_urn,
            "commentary": text,
            "visibility": "PUBLIC",
            "distribution": {
                "feedDistribution": "MAIN_FEED",
                "targetEntities": [],
                "thirdPartyDistributionChannels": []
            },
            "lifecycleState": "PUBLISHED",
            "isReshareDisabledByAuthor": false
        });

        match assets {
            [] => {}
            [single] => {
                body["content"] = json!({"media": {"id": single}});
            }
            many => {
                let images: Vec<serde_json::Value> =
                    many.iter().map(|id| json!({"id": id})).collect();
                body["content"] = json!({"multiImage": {"images": images}});
            }
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .header("LinkedIn-Version", LINKEDIN_VERSION)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LinkedinError::Auth(format!(
                "post creation rejected ({})",
                status.as_u16()
            )));
        }

        // The created id arrives in the x-restli-id header on 201.
        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);

        let body_text = response.text().await?;
        if !status.is_success() {
            return Err(LinkedinError::Api(format!(
                "post creation returned {}",
                status.as_u16()
            )));
        }

        if let Some(id) = header_id {
            return Ok(id);
        }
        serde_json::from_str::<serde_json::Value>(&body_text)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(ToOwned::to_owned))
            .ok_or_else(|| LinkedinError::Api("post created but no id returned".to_owned()))
    }

    async fn upload_asset(
        &self,
        resource: &str,
        access_token: &str,
        author_urn: &str,
        bytes: Vec<u8>,
    ) -> Result<String, LinkedinError> {
        let mut url = self.endpoint(resource)?;
        url.query_pairs_mut().append_pair("action", "initializeUpload");

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .header("LinkedIn-Version", LINKEDIN_VERSION)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL)
            .json(&json!({"initializeUploadRequest": {"owner": author_urn}}))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LinkedinError::Auth(format!(
                "upload initialization rejected ({})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(LinkedinError::Api(format!(
                "upload initialization returned {}",
                status.as_u16()
            )));
        }

        let body = response.text().await?;
        let init: InitializeUploadResponse =
            serde_json::from_str(&body).map_err(|e| LinkedinError::Deserialize {
                context: format!("{resource}?action=initializeUpload"),
                source: e,
            })?;

        let put = self
            .client
            .put(init.value.upload_url.as_str())
            .bearer_auth(access_token)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        if !put.status().is_success() {
            return Err(LinkedinError::Api(format!(
                "media byte upload returned {}",
                put.status().as_u16()
            )));
        }

        Ok(init.value.asset)
    }

    fn endpoint(&self, path: &str) -> Result<Url, LinkedinError> {
        self.base_url
            .join(path)
            .map_err(|e| LinkedinError::Api(format!("invalid endpoint '{path}': {e}")))
    }
}
