//! Identity of the invoking user, passed into the ownership guard as a value.

use nix::unistd::{getuid, User};

use crate::error::GateError;

/// Numeric user id and primary group id the configuration file must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
}

impl Identity {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Real uid of this process and the primary group from its passwd entry.
    pub fn current() -> Result<Self, GateError> {
        let uid = getuid();
        let user = User::from_uid(uid)
            .map_err(|e| {
                log::debug!("passwd lookup for uid {} failed: {}", uid, e);
                GateError::UnknownUser
            })?
            .ok_or(GateError::UnknownUser)?;
        Ok(Self {
            uid: uid.as_raw(),
            gid: user.gid.as_raw(),
        })
    }
}
