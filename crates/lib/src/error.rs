//! Failure categories of the gatekeeper. Every variant is fatal; the `Display`
//! text is the single-line diagnostic written to the SSH client's stderr.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("platform not supported")]
    UnsupportedPlatform,

    #[error("SSH_ORIGINAL_COMMAND not set")]
    MissingRequest,

    #[error("SSH_ORIGINAL_COMMAND is not valid UTF-8")]
    InvalidRequest,

    #[error("cannot expand configuration path")]
    PathResolution,

    #[error("cannot determine current user")]
    UnknownUser,

    /// Ownership/permission check failed. The reason is operator-facing and names the check.
    #[error("{0}")]
    Untrusted(TrustViolation),

    /// Read or decode failure. Deliberately generic so the client learns nothing about the file.
    #[error("configuration file not valid")]
    InvalidConfig,

    #[error("command not allowed: {0}")]
    NotAllowed(String),

    #[error("execution error: {0}")]
    Spawn(#[source] io::Error),
}

/// Which ownership/permission check rejected the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrustViolation {
    #[error("cannot stat configuration file")]
    CannotStat,
    #[error("file must not be accessible by others")]
    AccessibleByOthers,
    #[error("file must not be writable by group")]
    GroupWritable,
    #[error("file must not be writable by others")]
    WritableByOthers,
    #[error("user must be file owner")]
    NotOwner,
    #[error("user group must be file group")]
    WrongGroup,
}

impl From<TrustViolation> for GateError {
    fn from(v: TrustViolation) -> Self {
        GateError::Untrusted(v)
    }
}

impl GateError {
    /// Exit status for this failure. Every gatekeeper failure exits 1; only a child's own status differs.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
