//! Ownership guard: decides whether the configuration file may be trusted at all.
//!
//! The file is opened once; the checks run on the metadata of that open handle and
//! the caller reads the content from the same handle, so the checked file is the
//! file that gets parsed. Checks run in a fixed order and stop at the first failure
//! so the reported reason is deterministic.

use std::fs::{File, Metadata};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::config::TrustPolicy;
use crate::error::TrustViolation;
use crate::identity::Identity;

const OTHER_READ: u32 = 0o004;
const OTHER_WRITE: u32 = 0o002;
const GROUP_WRITE: u32 = 0o020;

#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipGuard {
    policy: TrustPolicy,
}

impl OwnershipGuard {
    pub fn new(policy: TrustPolicy) -> Self {
        Self { policy }
    }

    /// Open `path` (following symlinks) and return the handle only if the opened file
    /// passes [`OwnershipGuard::check`]. Failing to open or stat it is `CannotStat`.
    pub fn open(&self, path: &Path, identity: Identity) -> Result<File, TrustViolation> {
        let file = File::open(path).map_err(|e| {
            log::debug!("open {} failed: {}", path.display(), e);
            TrustViolation::CannotStat
        })?;
        let metadata = file.metadata().map_err(|e| {
            log::debug!("stat {} failed: {}", path.display(), e);
            TrustViolation::CannotStat
        })?;
        self.check(&metadata, identity)?;
        Ok(file)
    }

    /// 1. the other-read bit is clear,
    /// 2. under the strict policy, the file is not group- or world-writable,
    /// 3. the file is owned by `identity.uid`,
    /// 4. the file's group is `identity.gid`.
    pub fn check(&self, metadata: &Metadata, identity: Identity) -> Result<(), TrustViolation> {
        let mode = metadata.mode();

        if mode & OTHER_READ != 0 {
            return Err(TrustViolation::AccessibleByOthers);
        }

        if self.policy.reject_group_writable {
            if mode & GROUP_WRITE != 0 {
                return Err(TrustViolation::GroupWritable);
            }
            if mode & OTHER_WRITE != 0 {
                return Err(TrustViolation::WritableByOthers);
            }
        } else if mode & (GROUP_WRITE | OTHER_WRITE) != 0 {
            log::warn!("configuration file is writable by group or others (mode {:o})", mode & 0o777);
        }

        if metadata.uid() != identity.uid {
            return Err(TrustViolation::NotOwner);
        }
        if metadata.gid() != identity.gid {
            return Err(TrustViolation::WrongGroup);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::NamedTempFile;

    fn fixture(mode: u32) -> (NamedTempFile, Identity) {
        let file = NamedTempFile::new().unwrap();
        fs::set_permissions(file.path(), fs::Permissions::from_mode(mode)).unwrap();
        let meta = fs::metadata(file.path()).unwrap();
        (file, Identity::new(meta.uid(), meta.gid()))
    }

    fn verify(guard: OwnershipGuard, path: &Path, id: Identity) -> Result<(), TrustViolation> {
        guard.open(path, id).map(drop)
    }

    fn lenient() -> OwnershipGuard {
        OwnershipGuard::default()
    }

    fn strict() -> OwnershipGuard {
        OwnershipGuard::new(TrustPolicy {
            reject_group_writable: true,
        })
    }

    #[test]
    fn owner_only_file_is_trusted() {
        let (file, id) = fixture(0o600);
        assert_eq!(verify(lenient(), file.path(), id), Ok(()));
        assert_eq!(verify(strict(), file.path(), id), Ok(()));
    }

    #[test]
    fn group_readable_file_is_trusted() {
        let (file, id) = fixture(0o640);
        assert_eq!(verify(strict(), file.path(), id), Ok(()));
    }

    #[test]
    fn other_readable_file_is_rejected_regardless_of_ownership() {
        for mode in [0o604, 0o644, 0o755, 0o777] {
            let (file, id) = fixture(mode);
            assert_eq!(
                verify(lenient(), file.path(), id),
                Err(TrustViolation::AccessibleByOthers),
                "mode {:o}",
                mode
            );
            let stranger = Identity::new(id.uid.wrapping_add(1), id.gid.wrapping_add(1));
            assert_eq!(
                verify(lenient(), file.path(), stranger),
                Err(TrustViolation::AccessibleByOthers)
            );
        }
    }

    #[test]
    fn foreign_owner_is_rejected() {
        let (file, id) = fixture(0o600);
        let other = Identity::new(id.uid.wrapping_add(1), id.gid);
        assert_eq!(verify(lenient(), file.path(), other), Err(TrustViolation::NotOwner));
    }

    #[test]
    fn foreign_group_is_rejected() {
        let (file, id) = fixture(0o600);
        let other = Identity::new(id.uid, id.gid.wrapping_add(1));
        assert_eq!(verify(lenient(), file.path(), other), Err(TrustViolation::WrongGroup));
    }

    #[test]
    fn missing_file_cannot_be_stated() {
        let dir = tempfile::tempdir().unwrap();
        let id = Identity::new(0, 0);
        assert_eq!(
            verify(lenient(), &dir.path().join("absent.yml"), id),
            Err(TrustViolation::CannotStat)
        );
    }

    #[test]
    fn group_writable_accepted_by_default_rejected_when_strict() {
        let (file, id) = fixture(0o660);
        assert_eq!(verify(lenient(), file.path(), id), Ok(()));
        assert_eq!(verify(strict(), file.path(), id), Err(TrustViolation::GroupWritable));
    }

    #[test]
    fn world_writable_without_read_only_fails_when_strict() {
        let (file, id) = fixture(0o602);
        assert_eq!(verify(lenient(), file.path(), id), Ok(()));
        assert_eq!(
            verify(strict(), file.path(), id),
            Err(TrustViolation::WritableByOthers)
        );
    }

    #[test]
    fn handle_keeps_reading_the_checked_file_after_a_swap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.yml");
        fs::write(&path, "checked").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        let meta = fs::metadata(&path).unwrap();
        let id = Identity::new(meta.uid(), meta.gid());

        let mut handle = lenient().open(&path, id).unwrap();

        let swapped = dir.path().join("swapped.yml");
        fs::write(&swapped, "swapped").unwrap();
        fs::set_permissions(&swapped, fs::Permissions::from_mode(0o644)).unwrap();
        fs::rename(&swapped, &path).unwrap();

        let mut content = String::new();
        handle.read_to_string(&mut content).unwrap();
        assert_eq!(content, "checked");
    }
}
