//! Mock platform implementation for testing and development mode
//!
//! Simulates the LinkedIn workflow steps deterministically: every call is
//! counted, submitted envelopes are recorded for verification, and any single
//! step can be scripted to fail at a given position in the batch.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{PlatformError, Result, Upstream};
use crate::platform::{Platform, Profile, TokenGrant, UploadSlot};
use crate::types::ImageMimeType;

/// Scripted behavior for the mock platform
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub name: String,

    /// Whether the OAuth code exchange succeeds
    pub exchange_succeeds: bool,

    /// Profile subject returned by fetch_profile (None simulates a profile
    /// the author URN cannot be derived from)
    pub profile_sub: Option<String>,
    pub profile_name: Option<String>,
    pub profile_picture: Option<String>,

    /// Fail the Nth register_upload call (0-based across the mock's lifetime)
    pub fail_register_at: Option<usize>,

    /// Fail the Nth upload_binary call (0-based)
    pub fail_upload_at: Option<usize>,

    /// Whether create_share succeeds
    pub publish_succeeds: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            exchange_succeeds: true,
            profile_sub: Some("mock-sub".to_string()),
            profile_name: Some("Mock Member".to_string()),
            profile_picture: None,
            fail_register_at: None,
            fail_upload_at: None,
            publish_succeeds: true,
        }
    }
}

#[derive(Default)]
struct Counters {
    exchange_calls: usize,
    profile_calls: usize,
    register_calls: usize,
    upload_calls: usize,
    share_calls: usize,
}

/// Mock platform for tests and the gateway's development mode
pub struct MockPlatform {
    behavior: MockBehavior,
    counters: Arc<Mutex<Counters>>,
    envelopes: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockPlatform {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            counters: Arc::new(Mutex::new(Counters::default())),
            envelopes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A mock where every step succeeds
    pub fn succeeding() -> Self {
        Self::new(MockBehavior::default())
    }

    /// A mock whose code exchange fails
    pub fn exchange_failure() -> Self {
        Self::new(MockBehavior {
            exchange_succeeds: false,
            ..Default::default()
        })
    }

    /// A mock whose profile carries no subject
    pub fn without_sub() -> Self {
        Self::new(MockBehavior {
            profile_sub: None,
            ..Default::default()
        })
    }

    /// A mock that fails the Nth upload registration (0-based)
    pub fn register_failure_at(index: usize) -> Self {
        Self::new(MockBehavior {
            fail_register_at: Some(index),
            ..Default::default()
        })
    }

    /// A mock that fails the Nth binary upload (0-based)
    pub fn upload_failure_at(index: usize) -> Self {
        Self::new(MockBehavior {
            fail_upload_at: Some(index),
            ..Default::default()
        })
    }

    /// A mock whose share creation fails
    pub fn publish_failure() -> Self {
        Self::new(MockBehavior {
            publish_succeeds: false,
            ..Default::default()
        })
    }

    pub fn register_count(&self) -> usize {
        self.counters.lock().unwrap().register_calls
    }

    pub fn upload_count(&self) -> usize {
        self.counters.lock().unwrap().upload_calls
    }

    pub fn share_count(&self) -> usize {
        self.counters.lock().unwrap().share_calls
    }

    /// Envelopes submitted through create_share, in order
    pub fn envelopes(&self) -> Vec<serde_json::Value> {
        self.envelopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        self.counters.lock().unwrap().exchange_calls += 1;

        if !self.behavior.exchange_succeeds {
            return Err(
                PlatformError::Auth(Upstream::http(400, "invalid authorization code")).into(),
            );
        }
        Ok(TokenGrant {
            access_token: format!("mock-token-{}", code),
        })
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<Profile> {
        self.counters.lock().unwrap().profile_calls += 1;

        Ok(Profile {
            sub: self.behavior.profile_sub.clone(),
            name: self.behavior.profile_name.clone(),
            picture: self.behavior.profile_picture.clone(),
        })
    }

    async fn register_upload(&self, _access_token: &str, _author_urn: &str) -> Result<UploadSlot> {
        let index = {
            let mut counters = self.counters.lock().unwrap();
            let index = counters.register_calls;
            counters.register_calls += 1;
            index
        };

        if self.behavior.fail_register_at == Some(index) {
            return Err(PlatformError::Registration(Upstream::http(
                500,
                "mock registration failure",
            ))
            .into());
        }
        Ok(UploadSlot {
            upload_url: format!("https://upload.mock/{}", index),
            asset_urn: format!("urn:li:digitalmediaAsset:mock-{}", index),
        })
    }

    async fn upload_binary(
        &self,
        _upload_url: &str,
        _mime_type: ImageMimeType,
        _data: &[u8],
    ) -> Result<()> {
        let index = {
            let mut counters = self.counters.lock().unwrap();
            let index = counters.upload_calls;
            counters.upload_calls += 1;
            index
        };

        if self.behavior.fail_upload_at == Some(index) {
            return Err(PlatformError::Upload(Upstream::http(503, "mock upload failure")).into());
        }
        Ok(())
    }

    async fn create_share(&self, _access_token: &str, envelope: &serde_json::Value) -> Result<()> {
        self.counters.lock().unwrap().share_calls += 1;

        if !self.behavior.publish_succeeds {
            return Err(PlatformError::Publish(Upstream::http(500, "mock publish failure")).into());
        }
        self.envelopes.lock().unwrap().push(envelope.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.behavior.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_succeeding_mock_issues_ordered_slots() {
        let platform = MockPlatform::succeeding();

        let first = platform.register_upload("t", "urn").await.unwrap();
        let second = platform.register_upload("t", "urn").await.unwrap();

        assert_eq!(first.asset_urn, "urn:li:digitalmediaAsset:mock-0");
        assert_eq!(second.asset_urn, "urn:li:digitalmediaAsset:mock-1");
        assert_eq!(platform.register_count(), 2);
    }

    #[tokio::test]
    async fn test_exchange_failure() {
        let platform = MockPlatform::exchange_failure();

        let result = platform.exchange_code("abc").await;
        assert!(matches!(
            result,
            Err(crate::LinkpilotError::Platform(PlatformError::Auth(_)))
        ));
    }

    #[tokio::test]
    async fn test_upload_failure_at_index() {
        let platform = MockPlatform::upload_failure_at(1);

        platform
            .upload_binary("u", ImageMimeType::Png, &[1])
            .await
            .unwrap();
        let result = platform.upload_binary("u", ImageMimeType::Png, &[2]).await;

        assert!(matches!(
            result,
            Err(crate::LinkpilotError::Platform(PlatformError::Upload(_)))
        ));
        assert_eq!(platform.upload_count(), 2);
    }

    #[tokio::test]
    async fn test_share_records_envelope() {
        let platform = MockPlatform::succeeding();
        let envelope = serde_json::json!({"author": "urn:li:person:x"});

        platform.create_share("t", &envelope).await.unwrap();

        assert_eq!(platform.share_count(), 1);
        assert_eq!(platform.envelopes(), vec![envelope]);
    }

    #[tokio::test]
    async fn test_publish_failure_records_nothing() {
        let platform = MockPlatform::publish_failure();

        let result = platform
            .create_share("t", &serde_json::json!({}))
            .await;

        assert!(result.is_err());
        assert!(platform.envelopes().is_empty());
    }
}
