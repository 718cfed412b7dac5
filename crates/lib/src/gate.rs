//! The gatekeeper pipeline: resolve → verify → load → decide → dispatch.
//!
//! Every stage returns a value; nothing here prints or exits. The binary turns the final
//! `Result` into a diagnostic and an exit status.

use std::path::PathBuf;

use crate::allowlist::{self, CommandEntry, ConfigurationDocument};
use crate::config::GateOptions;
use crate::error::GateError;
use crate::exec;
use crate::guard::OwnershipGuard;
use crate::identity::Identity;
use crate::request::RequestedCommand;

/// Outcome of matching a request against the allowlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision<'a> {
    Matched { index: usize, entry: &'a CommandEntry },
    /// Carries the rejected program name.
    Denied(String),
}

/// A verified and decoded allowlist together with the file it came from.
#[derive(Debug, Clone)]
pub struct TrustedConfig {
    pub path: PathBuf,
    pub document: ConfigurationDocument,
}

/// Resolve the configuration path, open and verify it for `identity`, then read and
/// decode it from the same handle.
pub fn load_trusted(options: &GateOptions, identity: Identity) -> Result<TrustedConfig, GateError> {
    let path = options.config.resolve()?;
    let file = OwnershipGuard::new(options.policy).open(&path, identity)?;
    let document = allowlist::read(file)?;
    Ok(TrustedConfig { path, document })
}

/// Pure function of the request and the allowlist.
pub fn decide<'a>(request: &RequestedCommand, doc: &'a ConfigurationDocument) -> TrustDecision<'a> {
    match doc.find_entry(&request.program) {
        Some(index) => TrustDecision::Matched {
            index,
            entry: &doc.commands[index],
        },
        None => TrustDecision::Denied(request.program.clone()),
    }
}

/// Deny, or run the matched request and return the child's exit code.
pub fn dispatch(decision: TrustDecision<'_>, request: &RequestedCommand) -> Result<i32, GateError> {
    match decision {
        TrustDecision::Denied(program) => Err(GateError::NotAllowed(program)),
        TrustDecision::Matched { index, entry } => {
            log::debug!("request matched allowlist entry {}", index);
            exec::run(entry, request)
        }
    }
}

/// Full run for one already parsed request.
pub fn run(options: &GateOptions, request: &RequestedCommand, identity: Identity) -> Result<i32, GateError> {
    let trusted = load_trusted(options, identity)?;
    dispatch(decide(request, &trusted.document), request)
}
