//! Publishing session orchestrator
//!
//! The client-visible state machine that sequences authorization, drafting,
//! image preparation, and the final publish. It owns the Session, the Draft,
//! and the ImageAsset list; the presentation layer only renders its state and
//! invokes its commands.
//!
//! Commands are serialized: an explicit busy flag rejects a command arriving
//! while another is still in flight, instead of relying on disabled UI
//! controls. Guard violations fail with a `PreconditionError` naming the
//! violated guard and leave the machine unchanged; they never reach the
//! network.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, LinkedInConfig};
use crate::error::{PreconditionError, Result};
use crate::generator::{Generator, OpenRouterGenerator};
use crate::platform::{create_platform, Platform};
use crate::service::{assets, auth, publisher};
use crate::types::{Draft, ImageAsset, ImageFile, PublishRequest, Session, SessionState};

pub struct SessionOrchestrator {
    oauth: LinkedInConfig,
    platform: Arc<dyn Platform>,
    generator: Arc<dyn Generator>,
    state: SessionState,
    session: Option<Session>,
    draft: Draft,
    assets: Vec<ImageAsset>,
    busy: bool,
}

/// Holds the busy flag for the duration of one command.
///
/// Dropping the guard clears the flag, so a command future cancelled
/// mid-await cannot leave the orchestrator permanently busy.
struct BusyGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a mut bool, operation: &'static str) -> Result<Self> {
        if *flag {
            return Err(
                PreconditionError::new(operation, "another command is in flight").into(),
            );
        }
        *flag = true;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

impl SessionOrchestrator {
    pub fn new(
        oauth: LinkedInConfig,
        platform: Arc<dyn Platform>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            oauth,
            platform,
            generator,
            state: SessionState::Unauthenticated,
            session: None,
            draft: Draft::default(),
            assets: Vec::new(),
            busy: false,
        }
    }

    /// Wire up the live (or mock, per config) platform and generator.
    pub fn from_config(config: &Config) -> Self {
        let platform = create_platform(config);
        let generator = Arc::new(OpenRouterGenerator::new(config.generator.clone()));
        Self::new(config.linkedin.clone(), platform, generator)
    }

    // ------------------------------------------------------------------
    // Observable state
    // ------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Handle to the platform client this orchestrator talks to.
    pub fn platform(&self) -> Arc<dyn Platform> {
        Arc::clone(&self.platform)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Start delegated authorization: returns the redirect URL the browser
    /// must visit. The flow completes through `complete_authorization`.
    pub fn begin_authorization(&mut self) -> Result<String> {
        self.guard_state("begin_authorization", &[SessionState::Unauthenticated])?;

        let state_token = auth::generate_state();
        Ok(auth::authorization_url(&self.oauth, &state_token))
    }

    /// Finish the authorization callback: exchange the code, fetch the
    /// profile, and populate the Session. Transitions to `Authoring`.
    pub async fn complete_authorization(&mut self, code: &str) -> Result<()> {
        self.guard_state("complete_authorization", &[SessionState::Unauthenticated])?;
        let _busy = BusyGuard::acquire(&mut self.busy, "complete_authorization")?;

        let session = auth::complete_authorization(self.platform.as_ref(), code).await?;
        info!(author = %session.author_urn, "session established");
        self.session = Some(session);
        self.state = SessionState::Authoring;
        Ok(())
    }

    /// Restore a Session from previously persisted credentials.
    ///
    /// With `None` the state is left unchanged at `Unauthenticated`. With
    /// credentials the machine moves straight to `Authoring` without any
    /// network call. Idempotent: calling again once a session is live is a
    /// no-op success.
    pub fn resume_session(&mut self, stored: Option<Session>) -> Result<()> {
        if self.busy {
            return Err(
                PreconditionError::new("resume_session", "another command is in flight").into(),
            );
        }
        if self.state != SessionState::Unauthenticated {
            if self.session.is_some() {
                return Ok(());
            }
            return Err(PreconditionError::new(
                "resume_session",
                format!("not allowed in state {}", self.state),
            )
            .into());
        }

        match stored {
            None => Ok(()),
            Some(session) => {
                info!(author = %session.author_urn, "session resumed");
                self.session = Some(session);
                self.state = SessionState::Authoring;
                Ok(())
            }
        }
    }

    /// Generate a draft from `source`, or refine the current draft when in
    /// `Drafted` with blank input.
    ///
    /// A failed generation never overwrites a previously good draft.
    pub async fn generate(&mut self, source: &str) -> Result<()> {
        self.guard_state(
            "generate",
            &[SessionState::Authoring, SessionState::Drafted],
        )?;

        let input = if self.state == SessionState::Drafted && source.trim().is_empty() {
            self.draft.body.clone()
        } else {
            source.to_string()
        };
        if input.trim().is_empty() {
            return Err(PreconditionError::new("generate", "source text is empty").into());
        }

        let _busy = BusyGuard::acquire(&mut self.busy, "generate")?;
        let body = self.generator.generate(&input).await?;
        self.draft.body = body;
        self.draft.revision += 1;
        self.state = SessionState::Drafted;
        info!(revision = self.draft.revision, "draft generated");
        Ok(())
    }

    /// Directly replace the draft body. No transition, no revision bump.
    pub fn edit_draft(&mut self, new_body: &str) -> Result<()> {
        self.guard_state("edit_draft", &[SessionState::Drafted])?;
        self.draft.body = new_body.to_string();
        Ok(())
    }

    /// Replace the asset list with fresh `Selected` entries, discarding any
    /// prior upload results.
    pub fn select_images(&mut self, files: Vec<ImageFile>) -> Result<()> {
        self.guard_state(
            "select_images",
            &[SessionState::Authoring, SessionState::Drafted],
        )?;

        self.assets = files.into_iter().map(ImageAsset::selected).collect();
        Ok(())
    }

    /// Upload every selected image, sequentially. Resumable: a re-invocation
    /// after a failure skips entries that already reached `Ready`.
    pub async fn upload_images(&mut self) -> Result<()> {
        self.guard_state(
            "upload_images",
            &[SessionState::Authoring, SessionState::Drafted],
        )?;
        let session = self.session.clone().ok_or_else(|| {
            PreconditionError::new("upload_images", "no authenticated session")
        })?;
        if self.assets.is_empty() {
            return Err(PreconditionError::new("upload_images", "no images selected").into());
        }
        if self.assets.iter().all(|a| a.is_ready()) {
            return Err(
                PreconditionError::new("upload_images", "all images already uploaded").into(),
            );
        }

        let _busy = BusyGuard::acquire(&mut self.busy, "upload_images")?;
        let mut batch = std::mem::take(&mut self.assets);
        let result = assets::prepare_all(self.platform.as_ref(), &session, &mut batch).await;
        self.assets = batch;
        result
    }

    /// Submit the draft, attaching any prepared asset references.
    ///
    /// On failure the machine reverts to `Drafted` with draft and session
    /// untouched; the user may retry immediately. Publish is never retried
    /// automatically.
    pub async fn publish(&mut self) -> Result<()> {
        self.guard_state("publish", &[SessionState::Drafted])?;
        if self.draft.body.trim().is_empty() {
            return Err(PreconditionError::new("publish", "draft body is empty").into());
        }
        let session = match self.session.as_ref() {
            Some(session) if session.authenticated => session.clone(),
            _ => {
                return Err(
                    PreconditionError::new("publish", "no authenticated session").into(),
                )
            }
        };
        if !self.assets.is_empty() && !self.assets.iter().all(|a| a.is_ready()) {
            return Err(PreconditionError::new(
                "publish",
                "image uploads are not complete",
            )
            .into());
        }

        let request = PublishRequest {
            body: self.draft.body.clone(),
            author_urn: session.author_urn.clone(),
            asset_urns: self
                .assets
                .iter()
                .filter_map(|a| a.asset_urn.clone())
                .collect(),
        };

        let _busy = BusyGuard::acquire(&mut self.busy, "publish")?;
        self.state = SessionState::Publishing;
        let result = publisher::publish(self.platform.as_ref(), &session, &request).await;

        match result {
            Ok(()) => {
                info!(author = %request.author_urn, "post published");
                self.state = SessionState::Published;
                Ok(())
            }
            Err(e) => {
                warn!("publish failed: {}", e);
                self.state = SessionState::Drafted;
                Err(e)
            }
        }
    }

    /// Clear the draft and asset list after a successful publish and return
    /// to `Authoring`. The Session is retained.
    pub fn reset(&mut self) -> Result<()> {
        self.guard_state("reset", &[SessionState::Published])?;
        self.draft = Draft::default();
        self.assets.clear();
        self.state = SessionState::Authoring;
        Ok(())
    }

    /// Destroy the Session and return to `Unauthenticated`.
    pub fn logout(&mut self) {
        self.session = None;
        self.draft = Draft::default();
        self.assets.clear();
        self.busy = false;
        self.state = SessionState::Unauthenticated;
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    fn guard_state(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if self.busy {
            return Err(
                PreconditionError::new(operation, "another command is in flight").into(),
            );
        }
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(PreconditionError::new(
                operation,
                format!("not allowed in state {}", self.state),
            )
            .into())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkpilotError;
    use crate::generator::MockGenerator;
    use crate::platform::mock::MockPlatform;
    use crate::types::ImageMimeType;

    fn orchestrator_with(
        platform: MockPlatform,
        generator: MockGenerator,
    ) -> SessionOrchestrator {
        SessionOrchestrator::new(
            Config::default_config().linkedin,
            Arc::new(platform),
            Arc::new(generator),
        )
    }

    fn authed(platform: MockPlatform, generator: MockGenerator) -> SessionOrchestrator {
        let mut orchestrator = orchestrator_with(platform, generator);
        orchestrator
            .resume_session(Some(Session::restore("token", "urn:li:person:abc")))
            .unwrap();
        orchestrator
    }

    fn png(name: &str) -> ImageFile {
        ImageFile {
            name: name.to_string(),
            mime_type: ImageMimeType::Png,
            data: vec![1, 2, 3],
        }
    }

    fn assert_precondition(result: Result<()>, operation: &str) {
        match result {
            Err(LinkpilotError::Precondition(e)) => assert_eq!(e.operation, operation),
            other => panic!("expected precondition error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_initial_state() {
        let orchestrator =
            orchestrator_with(MockPlatform::succeeding(), MockGenerator::returning("x"));
        assert_eq!(orchestrator.state(), SessionState::Unauthenticated);
        assert!(orchestrator.session().is_none());
        assert!(orchestrator.draft().body.is_empty());
        assert!(!orchestrator.is_busy());
    }

    #[test]
    fn test_resume_without_credentials_stays_unauthenticated() {
        let mut orchestrator =
            orchestrator_with(MockPlatform::succeeding(), MockGenerator::returning("x"));

        orchestrator.resume_session(None).unwrap();
        assert_eq!(orchestrator.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_resume_with_credentials_enters_authoring() {
        let mut orchestrator =
            orchestrator_with(MockPlatform::succeeding(), MockGenerator::returning("x"));

        orchestrator
            .resume_session(Some(Session::restore("token", "urn:li:person:abc")))
            .unwrap();
        assert_eq!(orchestrator.state(), SessionState::Authoring);

        // Idempotent: a second resume is a no-op success
        orchestrator
            .resume_session(Some(Session::restore("token", "urn:li:person:abc")))
            .unwrap();
        assert_eq!(orchestrator.state(), SessionState::Authoring);
    }

    #[test]
    fn test_begin_authorization_only_when_unauthenticated() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("x"));

        let result = orchestrator.begin_authorization();
        match result {
            Err(LinkpilotError::Precondition(e)) => {
                assert_eq!(e.operation, "begin_authorization");
                assert!(e.guard.contains("authoring"));
            }
            other => panic!("expected precondition error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_complete_authorization_transitions_to_authoring() {
        let mut orchestrator =
            orchestrator_with(MockPlatform::succeeding(), MockGenerator::returning("x"));

        orchestrator.complete_authorization("code").await.unwrap();
        assert_eq!(orchestrator.state(), SessionState::Authoring);
        assert_eq!(
            orchestrator.session().unwrap().author_urn,
            "urn:li:person:mock-sub"
        );
    }

    #[tokio::test]
    async fn test_publish_from_unauthenticated_is_guarded() {
        let mut orchestrator =
            orchestrator_with(MockPlatform::succeeding(), MockGenerator::returning("x"));

        assert_precondition(orchestrator.publish().await, "publish");
        assert_eq!(orchestrator.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_generate_failure_preserves_previous_draft() {
        let generator =
            MockGenerator::sequence_then_fail(vec!["good draft".to_string()], "boom");
        let mut orchestrator = authed(MockPlatform::succeeding(), generator);

        orchestrator.generate("launch").await.unwrap();
        assert_eq!(orchestrator.draft().body, "good draft");
        assert_eq!(orchestrator.draft().revision, 1);

        let err = orchestrator.generate("another angle").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(orchestrator.state(), SessionState::Drafted);
        assert_eq!(orchestrator.draft().body, "good draft");
        assert_eq!(orchestrator.draft().revision, 1);
    }

    #[tokio::test]
    async fn test_refine_uses_current_draft_body() {
        let generator =
            MockGenerator::sequence(vec!["first".to_string(), "refined".to_string()]);
        let mut orchestrator = authed(MockPlatform::succeeding(), generator);

        orchestrator.generate("topic").await.unwrap();
        orchestrator.generate("").await.unwrap();

        assert_eq!(orchestrator.draft().body, "refined");
        assert_eq!(orchestrator.draft().revision, 2);
    }

    #[tokio::test]
    async fn test_generate_blank_input_while_authoring_is_guarded() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("x"));

        assert_precondition(orchestrator.generate("   ").await, "generate");
    }

    #[test]
    fn test_edit_draft_only_in_drafted() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("x"));

        assert_precondition(orchestrator.edit_draft("hello"), "edit_draft");
    }

    #[tokio::test]
    async fn test_edit_does_not_bump_revision() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("draft"));

        orchestrator.generate("topic").await.unwrap();
        orchestrator.edit_draft("Announcing our launch!").unwrap();

        assert_eq!(orchestrator.draft().body, "Announcing our launch!");
        assert_eq!(orchestrator.draft().revision, 1);
    }

    #[tokio::test]
    async fn test_upload_images_requires_selection() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("x"));

        assert_precondition(orchestrator.upload_images().await, "upload_images");
    }

    #[tokio::test]
    async fn test_upload_images_rejected_when_all_ready() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("x"));

        orchestrator.select_images(vec![png("a.png")]).unwrap();
        orchestrator.upload_images().await.unwrap();

        assert_precondition(orchestrator.upload_images().await, "upload_images");
    }

    #[tokio::test]
    async fn test_select_images_discards_prior_results() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("x"));

        orchestrator.select_images(vec![png("a.png")]).unwrap();
        orchestrator.upload_images().await.unwrap();
        assert!(orchestrator.assets()[0].is_ready());

        orchestrator
            .select_images(vec![png("b.png"), png("c.png")])
            .unwrap();
        assert_eq!(orchestrator.assets().len(), 2);
        assert!(orchestrator.assets().iter().all(|a| !a.is_ready()));
    }

    #[tokio::test]
    async fn test_publish_blocked_until_assets_ready() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("draft"));

        orchestrator.generate("topic").await.unwrap();
        orchestrator.select_images(vec![png("a.png")]).unwrap();

        assert_precondition(orchestrator.publish().await, "publish");
        assert_eq!(orchestrator.state(), SessionState::Drafted);
    }

    #[tokio::test]
    async fn test_publish_failure_reverts_to_drafted() {
        let mut orchestrator =
            authed(MockPlatform::publish_failure(), MockGenerator::returning("draft"));

        orchestrator.generate("topic").await.unwrap();
        let err = orchestrator.publish().await.unwrap_err();

        assert!(err.to_string().contains("mock publish failure"));
        assert_eq!(orchestrator.state(), SessionState::Drafted);
        assert_eq!(orchestrator.draft().body, "draft");
        assert!(orchestrator.session().is_some());
        assert!(!orchestrator.is_busy());
    }

    #[tokio::test]
    async fn test_reset_only_after_publish() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("draft"));

        assert_precondition(orchestrator.reset(), "reset");

        orchestrator.generate("topic").await.unwrap();
        orchestrator.publish().await.unwrap();
        assert_eq!(orchestrator.state(), SessionState::Published);

        orchestrator.reset().unwrap();
        assert_eq!(orchestrator.state(), SessionState::Authoring);
        assert!(orchestrator.draft().body.is_empty());
        assert!(orchestrator.assets().is_empty());
        // Session retained; re-authentication not required
        assert!(orchestrator.session().is_some());
    }

    #[test]
    fn test_commands_rejected_while_another_is_in_flight() {
        let mut orchestrator =
            orchestrator_with(MockPlatform::succeeding(), MockGenerator::returning("x"));
        orchestrator.busy = true;

        let stored = Session::restore("token", "urn:li:person:abc");
        assert_precondition(
            orchestrator.resume_session(Some(stored.clone())),
            "resume_session",
        );
        assert_precondition(
            orchestrator.begin_authorization().map(|_| ()),
            "begin_authorization",
        );
        // The machine is untouched by the rejected commands
        assert_eq!(orchestrator.state(), SessionState::Unauthenticated);
        assert!(orchestrator.session().is_none());

        orchestrator.busy = false;
        orchestrator.resume_session(Some(stored)).unwrap();
        assert_eq!(orchestrator.state(), SessionState::Authoring);
    }

    #[test]
    fn test_busy_guard_clears_flag_on_drop() {
        let mut flag = false;
        {
            let _guard = BusyGuard::acquire(&mut flag, "op").unwrap();
        }
        assert!(!flag);

        // A second acquisition while held fails and leaves the flag set
        let mut held = true;
        assert!(BusyGuard::acquire(&mut held, "op").is_err());
        assert!(held);
    }

    /// Generator whose call never completes, for cancellation tests.
    struct StalledGenerator;

    #[async_trait::async_trait]
    impl Generator for StalledGenerator {
        async fn generate(&self, _input: &str) -> crate::error::Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_cancelled_command_releases_the_busy_flag() {
        let mut orchestrator = SessionOrchestrator::new(
            Config::default_config().linkedin,
            Arc::new(MockPlatform::succeeding()),
            Arc::new(StalledGenerator),
        );
        orchestrator
            .resume_session(Some(Session::restore("token", "urn:li:person:abc")))
            .unwrap();

        // The timeout drops the command future while it is parked on the
        // generator call
        let cancelled = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            orchestrator.generate("topic"),
        )
        .await;
        assert!(cancelled.is_err());

        assert!(!orchestrator.is_busy());
        orchestrator.select_images(vec![png("a.png")]).unwrap();
    }

    #[test]
    fn test_platform_handle_is_shared() {
        let platform: Arc<dyn Platform> = Arc::new(MockPlatform::succeeding());
        let orchestrator = SessionOrchestrator::new(
            Config::default_config().linkedin,
            platform.clone(),
            Arc::new(MockGenerator::returning("x")),
        );

        assert!(Arc::ptr_eq(&platform, &orchestrator.platform()));
    }

    #[test]
    fn test_logout_destroys_session() {
        let mut orchestrator =
            authed(MockPlatform::succeeding(), MockGenerator::returning("x"));

        orchestrator.logout();
        assert_eq!(orchestrator.state(), SessionState::Unauthenticated);
        assert!(orchestrator.session().is_none());
    }
}
