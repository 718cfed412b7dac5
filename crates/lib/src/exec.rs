//! Execution of an allowlisted request. No shell is involved: the program is spawned
//! directly with the request's arguments as a list.
//!
//! The child writes straight to this process's stdout and stderr. Stdin is not
//! forwarded; the child reads from `/dev/null`.

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};

use crate::allowlist::CommandEntry;
use crate::error::GateError;
use crate::request::RequestedCommand;

/// Build the child process for a matched request.
///
/// The environment is inherited; the entry's `env` assignments are applied on top in
/// order, so a later assignment of the same key wins over both the inherited value and
/// earlier assignments.
pub fn command_for(entry: &CommandEntry, request: &RequestedCommand) -> Command {
    let mut cmd = Command::new(&request.program);
    cmd.args(&request.arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for (key, value) in entry.env_vars() {
        cmd.env(key, value);
    }
    cmd
}

/// Spawn the matched request, wait for it and return the exit code to propagate.
pub fn run(entry: &CommandEntry, request: &RequestedCommand) -> Result<i32, GateError> {
    log::debug!(
        "executing {} with {} argument(s)",
        request.program,
        request.arguments.len()
    );
    let status = command_for(entry, request)
        .status()
        .map_err(GateError::Spawn)?;
    Ok(exit_code(status))
}

/// Child's own exit code, or `128 + signal` when it was killed by a signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    if let Some(signal) = status.signal() {
        return 128 + signal;
    }
    128
}
