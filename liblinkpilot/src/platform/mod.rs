//! LinkedIn platform abstraction
//!
//! The workflow steps that touch LinkedIn are gathered behind one narrow
//! trait so the orchestrator and its tests can substitute a deterministic
//! fake for the live client. Each method maps to exactly one upstream call;
//! none of them retries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::types::ImageMimeType;

pub mod linkedin;

// The mock is available for all builds (not just tests) to support
// integration tests and the gateway's development mode.
pub mod mock;

/// Result of exchanging an authorization code for an access token.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
}

/// OpenID Connect profile of the authenticated member.
///
/// `sub` is the profile subject the author URN is derived from; the platform
/// can omit it, which callers must treat as an authentication failure.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub sub: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Upload slot issued by the registerUpload call.
///
/// The asset URN returned here is the durable handle; with synchronous
/// upload there is no separate commit step after the binary transfer.
#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub upload_url: String,
    pub asset_urn: String,
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Exchange an OAuth authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Auth` with the upstream status/body if the
    /// exchange fails or the response carries no token.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant>;

    /// Fetch the authenticated member's OpenID profile.
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile>;

    /// Request an upload slot for a feed-share image owned by `author_urn`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Registration` if the slot cannot be obtained.
    async fn register_upload(&self, access_token: &str, author_urn: &str) -> Result<UploadSlot>;

    /// Transmit the image binary to the slot's upload URL.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Upload` on any non-success response.
    async fn upload_binary(
        &self,
        upload_url: &str,
        mime_type: ImageMimeType,
        data: &[u8],
    ) -> Result<()>;

    /// Submit a UGC share envelope with the bearer token as authorization.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Publish` carrying the upstream status/body
    /// verbatim; the call is treated as atomic.
    async fn create_share(&self, access_token: &str, envelope: &serde_json::Value) -> Result<()>;

    /// Lowercase identifier for logging (e.g. "linkedin", "mock")
    fn name(&self) -> &str;
}

/// Build the platform client the configuration asks for.
///
/// Mock mode keeps the whole pipeline runnable without live credentials.
pub fn create_platform(config: &Config) -> Arc<dyn Platform> {
    if config.linkedin.mock {
        Arc::new(mock::MockPlatform::succeeding())
    } else {
        Arc::new(linkedin::LinkedInClient::new(config.linkedin.clone()))
    }
}
