//! Publish transform and UGC envelope construction

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::platform::Platform;
use crate::types::{PublishRequest, Session};

static BOLD_MARKERS: OnceLock<Regex> = OnceLock::new();

fn bold_markers() -> &'static Regex {
    BOLD_MARKERS.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold marker pattern"))
}

/// Strip bold markers to their inner text.
///
/// Deliberately partial: links, lists, dashes, line breaks, and emphasis all
/// pass through as written. Only the `**bold**` pattern is rewritten, and the
/// transform is idempotent.
pub fn strip_bold_markers(text: &str) -> String {
    bold_markers().replace_all(text, "$1").into_owned()
}

/// Build the UGC share envelope the platform requires.
///
/// Media category is "NONE" unless asset URNs are attached, in which case it
/// switches to "IMAGE" with one media entry per URN in input order.
pub fn build_envelope(request: &PublishRequest) -> serde_json::Value {
    let commentary = strip_bold_markers(&request.body);

    let mut share = serde_json::json!({
        "shareCommentary": { "text": commentary },
        "shareMediaCategory": "NONE",
    });
    if !request.asset_urns.is_empty() {
        share["shareMediaCategory"] = serde_json::json!("IMAGE");
        share["media"] = request
            .asset_urns
            .iter()
            .map(|urn| serde_json::json!({ "status": "READY", "media": urn }))
            .collect();
    }

    serde_json::json!({
        "author": request.author_urn,
        "lifecycleState": "PUBLISHED",
        "specificContent": { "com.linkedin.ugc.ShareContent": share },
        "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" },
    })
}

/// Transform the draft, build the envelope, and submit it.
///
/// # Errors
///
/// Returns `PlatformError::Publish` with the upstream status/body verbatim
/// on any non-success response. The call is atomic: no retry, no
/// partial-success handling.
pub async fn publish(
    platform: &dyn Platform,
    session: &Session,
    request: &PublishRequest,
) -> Result<()> {
    let envelope = build_envelope(request);
    debug!(
        platform = platform.name(),
        assets = request.asset_urns.len(),
        "submitting share"
    );
    platform.create_share(&session.access_token, &envelope).await
}
