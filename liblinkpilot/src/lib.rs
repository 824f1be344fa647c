//! LinkPilot - AI-assisted LinkedIn post authoring and publishing
//!
//! Core library behind the LinkPilot tools: the publishing session
//! orchestrator, AI draft generation, image asset preparation, and the final
//! publish against the LinkedIn REST API.

pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod platform;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{LinkpilotError, PlatformError, PreconditionError, Result};
pub use service::session::SessionOrchestrator;
pub use types::{
    Draft, ImageAsset, ImageFile, ImageMimeType, PublishRequest, Session, SessionState,
    UploadState,
};
