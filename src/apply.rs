//! The change executor: actuation of one planned change against the kernel.
//!
//! Mount targets (and bind sources) are inspected with `lstat` before any
//! mutation, and missing ones are created by [`secure_mkdir_all`], which
//! never follows a symlink: every path segment is made and opened relative
//! to a directory descriptor with `O_NOFOLLOW|O_CLOEXEC|O_DIRECTORY`, so a
//! link planted anywhere on the way is a hard failure, not a traversal.

use std::os::unix::io::RawFd;

use log::debug;

use crate::sys::{MountFlags, OpenFlags, SysError, SystemCalls, UnmountFlags};
use crate::types::{Action, Change, Error, Result};

const OPEN_DIR_FLAGS: OpenFlags = OpenFlags::NOFOLLOW
    .union(OpenFlags::CLOEXEC)
    .union(OpenFlags::DIRECTORY);

impl Change {
    /// Apply this change to the host. `Keep` is a no-op; `Unmount` detaches
    /// the mount point without following symlinks; `Mount` verifies (or
    /// safely creates) the mount point and, for bind mounts, the source,
    /// then calls `mount`. The first failing syscall aborts the change.
    pub fn perform(&self, sys: &dyn SystemCalls) -> Result<()> {
        debug!("performing mount change: {self}");
        match self.action {
            Action::Keep => Ok(()),
            Action::Unmount => Ok(sys.unmount(&self.entry.dir, UnmountFlags::NOFOLLOW)?),
            Action::Mount => {
                ensure_mount_point(sys, &self.entry.dir)?;
                let (flags, data) = self.entry.flags_and_data();
                if flags.contains(MountFlags::BIND) {
                    ensure_mount_point(sys, &self.entry.name)?;
                }
                Ok(sys.mount(
                    &self.entry.name,
                    &self.entry.dir,
                    &self.entry.fstype,
                    flags,
                    &data,
                )?)
            }
        }
    }
}

/// Verify that `path` is a directory, creating it if it does not exist.
fn ensure_mount_point(sys: &dyn SystemCalls, path: &str) -> Result<()> {
    match sys.lstat(path) {
        Ok(kind) if kind.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory {
            path: path.to_string(),
        }),
        Err(SysError::NotFound) => secure_mkdir_all(sys, path, 0o755, 0, 0),
        Err(err) => Err(Error::Inspect {
            path: path.to_string(),
            source: err,
        }),
    }
}

/// Create `path` and any missing ancestors without ever following a
/// symlink.
///
/// The walk descends one segment at a time through directory descriptors:
/// `mkdirat` under the current parent (an existing segment is fine), then
/// `openat` with `O_NOFOLLOW|O_CLOEXEC|O_DIRECTORY` to step into it.
/// Freshly created segments are chowned to `uid:gid`. At most two
/// descriptors are held at once; the old parent is closed as soon as the
/// walk advances, and every exit path closes whatever is still held,
/// child before parent.
fn secure_mkdir_all(sys: &dyn SystemCalls, path: &str, mode: u32, uid: u32, gid: u32) -> Result<()> {
    let mut parent = sys.open("/", OPEN_DIR_FLAGS, 0)?;
    let mut child: Option<RawFd> = None;

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if let Some(fd) = child.take() {
            if let Err(err) = sys.close(parent) {
                let _ = sys.close(fd);
                return Err(err.into());
            }
            parent = fd;
        }
        let made = match sys.mkdirat(parent, segment, mode) {
            Ok(()) => true,
            Err(SysError::AlreadyExists) => false,
            Err(err) => {
                let _ = sys.close(parent);
                return Err(Error::MkdirSegment {
                    segment: segment.to_string(),
                    source: err,
                });
            }
        };
        let fd = match sys.openat(parent, segment, OPEN_DIR_FLAGS, 0) {
            Ok(fd) => fd,
            Err(err) => {
                let _ = sys.close(parent);
                return Err(err.into());
            }
        };
        if made {
            if let Err(err) = sys.fchown(fd, uid, gid) {
                let _ = sys.close(fd);
                let _ = sys.close(parent);
                return Err(err.into());
            }
        }
        child = Some(fd);
    }

    if let Some(fd) = child {
        if let Err(err) = sys.close(fd) {
            let _ = sys.close(parent);
            return Err(err.into());
        }
    }
    Ok(sys.close(parent)?)
}
