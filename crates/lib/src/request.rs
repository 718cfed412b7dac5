//! The command line the SSH client asked for.
//!
//! Tokenization is plain whitespace splitting with no quoting or escaping:
//! `git-upload-pack '/repo.git'` yields the argument `'/repo.git'` with its quotes,
//! and a quoted argument containing spaces is split into several arguments.

use std::ffi::OsString;

use crate::error::GateError;

/// Environment variable sshd sets to the client's requested command.
pub const REQUEST_ENV_VAR: &str = "SSH_ORIGINAL_COMMAND";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedCommand {
    /// First token; matched against `CommandEntry::path`.
    pub program: String,
    /// Remaining tokens, passed to the child unchanged.
    pub arguments: Vec<String>,
}

impl RequestedCommand {
    /// Split `line` on whitespace. `None` when the line has no tokens.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace().map(str::to_string);
        let program = tokens.next()?;
        Some(Self {
            program,
            arguments: tokens.collect(),
        })
    }

    /// Read the request from [`REQUEST_ENV_VAR`] in this process's environment.
    pub fn from_env() -> Result<Self, GateError> {
        Self::from_env_value(std::env::var_os(REQUEST_ENV_VAR))
    }

    /// Absent, empty or whitespace-only values are all a missing request.
    pub fn from_env_value(value: Option<OsString>) -> Result<Self, GateError> {
        let value = value.ok_or(GateError::MissingRequest)?;
        let line = value.into_string().map_err(|_| GateError::InvalidRequest)?;
        Self::parse(&line).ok_or(GateError::MissingRequest)
    }
}
