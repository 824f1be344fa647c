//! Live LinkedIn client
//!
//! Talks to the v2 REST API: OAuth token exchange, the OpenID userinfo
//! endpoint, asset registration/upload, and UGC share creation. Non-success
//! responses surface the upstream status and body untouched; nothing here
//! retries.

use async_trait::async_trait;

use crate::config::LinkedInConfig;
use crate::error::{PlatformError, Result, Upstream};
use crate::platform::{Platform, Profile, TokenGrant, UploadSlot};
use crate::types::ImageMimeType;

const RESTLI_VERSION: &str = "2.0.0";

pub struct LinkedInClient {
    http: reqwest::Client,
    config: LinkedInConfig,
}

impl LinkedInClient {
    pub fn new(config: LinkedInConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn failure(response: reqwest::Response) -> Upstream {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Upstream::http(status, body)
    }
}

#[async_trait]
impl Platform for LinkedInClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let response = self
            .http
            .post(format!("{}/oauth/v2/accessToken", self.config.oauth_base))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PlatformError::Auth(Upstream::transport(e)))?;

        if !response.status().is_success() {
            return Err(PlatformError::Auth(Self::failure(response).await).into());
        }

        let status = response.status().as_u16();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PlatformError::Auth(Upstream::transport(e)))?;

        match body.get("access_token").and_then(|v| v.as_str()) {
            Some(token) => Ok(TokenGrant {
                access_token: token.to_string(),
            }),
            None => Err(PlatformError::Auth(Upstream::http(
                status,
                format!("no access token returned: {}", body),
            ))
            .into()),
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile> {
        let response = self
            .http
            .get(format!("{}/v2/userinfo", self.config.api_base))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PlatformError::Auth(Upstream::transport(e)))?;

        if !response.status().is_success() {
            return Err(PlatformError::Auth(Self::failure(response).await).into());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PlatformError::Auth(Upstream::transport(e)))?;

        let field = |name: &str| {
            body.get(name)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };
        Ok(Profile {
            sub: field("sub"),
            name: field("name"),
            picture: field("picture"),
        })
    }

    async fn register_upload(&self, access_token: &str, author_urn: &str) -> Result<UploadSlot> {
        let request = serde_json::json!({
            "registerUploadRequest": {
                "owner": author_urn,
                "recipes": ["urn:li:digitalmediaRecipe:feedshare-image"],
                "serviceRelationships": [{
                    "identifier": "urn:li:userGeneratedContent",
                    "relationshipType": "OWNER",
                }],
                "supportedUploadMechanism": ["SYNCHRONOUS_UPLOAD"],
            }
        });

        let response = self
            .http
            .post(format!(
                "{}/v2/assets?action=registerUpload",
                self.config.api_base
            ))
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| PlatformError::Registration(Upstream::transport(e)))?;

        if !response.status().is_success() {
            return Err(PlatformError::Registration(Self::failure(response).await).into());
        }

        let status = response.status().as_u16();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PlatformError::Registration(Upstream::transport(e)))?;

        let upload_url = body
            .pointer("/value/uploadMechanism/com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest/uploadUrl")
            .and_then(|v| v.as_str());
        let asset_urn = body.pointer("/value/asset").and_then(|v| v.as_str());

        match (upload_url, asset_urn) {
            (Some(upload_url), Some(asset_urn)) => Ok(UploadSlot {
                upload_url: upload_url.to_string(),
                asset_urn: asset_urn.to_string(),
            }),
            _ => Err(PlatformError::Registration(Upstream::http(
                status,
                format!("upload slot response missing uploadUrl or asset: {}", body),
            ))
            .into()),
        }
    }

    async fn upload_binary(
        &self,
        upload_url: &str,
        mime_type: ImageMimeType,
        data: &[u8],
    ) -> Result<()> {
        let response = self
            .http
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, mime_type.as_mime_str())
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| PlatformError::Upload(Upstream::transport(e)))?;

        if !response.status().is_success() {
            return Err(PlatformError::Upload(Self::failure(response).await).into());
        }
        Ok(())
    }

    async fn create_share(&self, access_token: &str, envelope: &serde_json::Value) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/v2/ugcPosts", self.config.api_base))
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .json(envelope)
            .send()
            .await
            .map_err(|e| PlatformError::Publish(Upstream::transport(e)))?;

        if !response.status().is_success() {
            return Err(PlatformError::Publish(Self::failure(response).await).into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "linkedin"
    }
}
