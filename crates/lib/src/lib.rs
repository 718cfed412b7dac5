//! forcecmd core library: decides whether an SSH client's requested command may run.
//!
//! Used by the `forcecmd` ForceCommand binary and the `forcecmd-admin` operator tool.
//! Only Unix hosts are supported; the trust and exec modules do not exist elsewhere.

pub mod allowlist;
pub mod config;
pub mod error;
pub mod request;

#[cfg(unix)]
pub mod exec;
#[cfg(unix)]
pub mod gate;
#[cfg(unix)]
pub mod guard;
#[cfg(unix)]
pub mod identity;
#[cfg(unix)]
pub mod init;

pub use error::{GateError, TrustViolation};
