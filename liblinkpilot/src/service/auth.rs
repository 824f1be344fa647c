//! Delegated authorization flow
//!
//! Builds the authorization redirect and completes the callback side:
//! code-for-token exchange, profile fetch, and author URN derivation.

use crate::config::LinkedInConfig;
use crate::error::{PlatformError, Result, Upstream};
use crate::platform::Platform;
use crate::types::Session;

/// Fixed scope set: profile read plus content publish.
pub const OAUTH_SCOPES: &str = "openid profile w_member_social";

/// Generate an opaque state token for the authorization redirect.
pub fn generate_state() -> String {
    format!("linkpilot_{}", uuid::Uuid::new_v4().simple())
}

/// Build the platform authorization URL the browser is redirected to.
pub fn authorization_url(config: &LinkedInConfig, state: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("scope", OAUTH_SCOPES)
        .append_pair("state", state)
        .finish();

    format!("{}/oauth/v2/authorization?{}", config.oauth_base, query)
}

/// Complete the authorization callback: exchange the code, fetch the
/// profile, and derive the author URN from the profile subject.
///
/// # Errors
///
/// Returns `PlatformError::Auth` if the token exchange or profile fetch
/// fails, or if the profile carries no subject to derive the URN from.
pub async fn complete_authorization(platform: &dyn Platform, code: &str) -> Result<Session> {
    let grant = platform.exchange_code(code).await?;
    let profile = platform.fetch_profile(&grant.access_token).await?;

    let sub = profile.sub.ok_or_else(|| {
        PlatformError::Auth(Upstream {
            status: None,
            body: "no author URN in profile".to_string(),
        })
    })?;

    tracing::info!(platform = platform.name(), "authorization completed");

    Ok(
        Session::restore(grant.access_token, format!("urn:li:person:{}", sub))
            .with_profile(profile.name, profile.picture),
    )
}
