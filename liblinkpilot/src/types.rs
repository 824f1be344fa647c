//! Core types for LinkPilot

use serde::{Deserialize, Serialize};

/// Authenticated context for one user's browsing session.
///
/// Exactly one `Session` exists per client context. It lives for the browser
/// session only and is destroyed on explicit logout; token expiry is treated
/// as the platform's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub author_urn: String,
    pub display_name: Option<String>,
    pub display_picture: Option<String>,
    pub authenticated: bool,
}

impl Session {
    /// Build a session from credentials obtained through the OAuth callback
    /// or restored from client-local storage.
    pub fn restore(access_token: impl Into<String>, author_urn: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            author_urn: author_urn.into(),
            display_name: None,
            display_picture: None,
            authenticated: true,
        }
    }

    pub fn with_profile(mut self, name: Option<String>, picture: Option<String>) -> Self {
        self.display_name = name.filter(|s| !s.is_empty());
        self.display_picture = picture.filter(|s| !s.is_empty());
        self
    }
}

/// The post text being authored, pre-publish.
///
/// Each successful generation or refinement replaces the body and bumps
/// `revision`; direct user edits replace the body without bumping it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub body: String,
    pub revision: u32,
}

/// Where a selected image sits in its upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadState {
    Selected,
    Uploading,
    Ready,
    Failed,
}

/// A locally selected image file, prior to upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: ImageMimeType,
    pub data: Vec<u8>,
}

/// One image moving through selection, upload, and readiness.
///
/// Invariant: `asset_urn` is present if and only if `state == Ready`.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub file: ImageFile,
    pub state: UploadState,
    pub asset_urn: Option<String>,
}

impl ImageAsset {
    pub fn selected(file: ImageFile) -> Self {
        Self {
            file,
            state: UploadState::Selected,
            asset_urn: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == UploadState::Ready
    }

    pub(crate) fn mark_uploading(&mut self) {
        self.state = UploadState::Uploading;
        self.asset_urn = None;
    }

    pub(crate) fn mark_ready(&mut self, asset_urn: String) {
        self.state = UploadState::Ready;
        self.asset_urn = Some(asset_urn);
    }

    pub(crate) fn mark_failed(&mut self) {
        self.state = UploadState::Failed;
        self.asset_urn = None;
    }
}

/// Ephemeral request constructed once per publish attempt and discarded
/// after the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub body: String,
    pub author_urn: String,
    /// Platform asset URNs in the order the images were selected
    pub asset_urns: Vec<String>,
}

/// Supported image MIME types for attachments
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Parse MIME type from a MIME string (e.g., "image/jpeg")
    pub fn from_mime_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn as_mime_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

/// Client-visible states of the publishing session.
///
/// Image upload is orthogonal to this chain: assets may upload while the
/// session sits in `Authoring` or `Drafted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Unauthenticated,
    Authoring,
    Drafted,
    Publishing,
    Published,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authoring => "authoring",
            SessionState::Drafted => "drafted",
            SessionState::Publishing => "publishing",
            SessionState::Published => "published",
        };
        write!(f, "{}", name)
    }
}
