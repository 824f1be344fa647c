//! Error types for LinkPilot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkpilotError>;

#[derive(Error, Debug)]
pub enum LinkpilotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LinkpilotError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            LinkpilotError::InvalidInput(_) => 3,
            LinkpilotError::Precondition(_) => 3,
            LinkpilotError::Platform(PlatformError::Auth(_)) => 2,
            LinkpilotError::Platform(_) => 1,
            LinkpilotError::Config(_) => 1,
            LinkpilotError::Io(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// A command was invoked while its guard does not hold.
///
/// These never reach the network layer: the orchestrator rejects the command
/// before any external call is made, and the state machine is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} not allowed: {guard}")]
pub struct PreconditionError {
    /// The command that was rejected (e.g. "publish")
    pub operation: &'static str,
    /// The guard that was violated
    pub guard: String,
}

impl PreconditionError {
    pub fn new(operation: &'static str, guard: impl Into<String>) -> Self {
        Self {
            operation,
            guard: guard.into(),
        }
    }
}

/// What the upstream service reported when a call failed.
///
/// `status` is `None` when the request never produced an HTTP response
/// (connection refused, DNS failure, and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub status: Option<u16>,
    pub body: String,
}

impl Upstream {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: body.into(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self {
            status: None,
            body: err.to_string(),
        }
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "status {}: {}", status, self.body),
            None => write!(f, "{}", self.body),
        }
    }
}

/// Failures of calls against external services, one variant per workflow step.
///
/// Each variant carries the upstream status and body verbatim; nothing is
/// swallowed or retried automatically.
#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Auth(Upstream),

    #[error("Generation failed: {0}")]
    Generation(Upstream),

    #[error("Upload registration failed: {0}")]
    Registration(Upstream),

    #[error("Image upload failed: {0}")]
    Upload(Upstream),

    #[error("Publish failed: {0}")]
    Publish(Upstream),
}

impl PlatformError {
    /// Short machine-friendly label for the failing step
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformError::Auth(_) => "auth",
            PlatformError::Generation(_) => "generation",
            PlatformError::Registration(_) => "registration",
            PlatformError::Upload(_) => "upload",
            PlatformError::Publish(_) => "publish",
        }
    }

    pub fn upstream(&self) -> &Upstream {
        match self {
            PlatformError::Auth(u)
            | PlatformError::Generation(u)
            | PlatformError::Registration(u)
            | PlatformError::Upload(u)
            | PlatformError::Publish(u) => u,
        }
    }
}
