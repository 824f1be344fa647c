//! Asset preparation: register and upload selected images
//!
//! Each image runs its own register/upload pipeline against a disjoint entry
//! in the asset list. Processing is strictly sequential: the first failure
//! marks that entry `Failed` and halts, leaving earlier `Ready` entries
//! intact so the batch is resumable after the user fixes the failing image.

use tracing::{info, warn};

use crate::error::Result;
use crate::platform::Platform;
use crate::types::{ImageAsset, Session};

/// Prepare every non-`Ready` asset in the list, in order.
///
/// Already-`Ready` entries are skipped, which is what makes a halted batch
/// resumable by calling this again.
///
/// # Errors
///
/// Returns the first `Registration` or `Upload` error encountered; the
/// failing entry is left in `Failed` state and later entries untouched.
pub async fn prepare_all(
    platform: &dyn Platform,
    session: &Session,
    assets: &mut [ImageAsset],
) -> Result<()> {
    for (index, asset) in assets.iter_mut().enumerate() {
        if asset.is_ready() {
            continue;
        }

        asset.mark_uploading();
        match prepare_one(platform, session, asset).await {
            Ok(asset_urn) => {
                info!(
                    file = %asset.file.name,
                    urn = %asset_urn,
                    "image upload complete"
                );
                asset.mark_ready(asset_urn);
            }
            Err(e) => {
                warn!(file = %asset.file.name, index, "image upload failed: {}", e);
                asset.mark_failed();
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Register an upload slot and transmit the binary.
///
/// The asset URN from registration is the durable handle; the platform's
/// synchronous upload mechanism needs no separate commit call.
async fn prepare_one(
    platform: &dyn Platform,
    session: &Session,
    asset: &ImageAsset,
) -> Result<String> {
    let slot = platform
        .register_upload(&session.access_token, &session.author_urn)
        .await?;

    platform
        .upload_binary(&slot.upload_url, asset.file.mime_type, &asset.file.data)
        .await?;

    Ok(slot.asset_urn)
}
