//! The syscall boundary.
//!
//! Everything the core asks of the kernel goes through [`SystemCalls`]:
//! eight primitives, raw integer descriptors, and newtype flag sets that
//! render their recognized bits by name. The rendered call strings are
//! stable: [`SyscallRecorder`] keys fault injection on them, so they are
//! effectively the wire format of the test suite.

use std::fmt;
use std::os::unix::io::RawFd;

use thiserror::Error;

mod host;
mod recorder;

pub use host::HostSystem;
pub use recorder::SyscallRecorder;

/// What `lstat` found at a path. Only [`FileKind::Directory`] is usable as
/// a mount point or bind source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    File,
    Symlink,
}

impl FileKind {
    pub fn is_dir(self) -> bool {
        matches!(self, FileKind::Directory)
    }
}

/// Failure from a system primitive.
///
/// `NotFound` and `AlreadyExists` are the two conditions the executor
/// branches on; everything else travels as [`SysError::Other`] so injected
/// test faults and real errno renderings stay comparable by value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SysError {
    #[error("no such file or directory")]
    NotFound,
    #[error("file exists")]
    AlreadyExists,
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for SysError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SysError::NotFound,
            std::io::ErrorKind::AlreadyExists => SysError::AlreadyExists,
            _ => SysError::Other(err.to_string()),
        }
    }
}

fn fmt_flags(f: &mut fmt::Formatter<'_>, bits: u64, names: &[(u64, &str)]) -> fmt::Result {
    let mut rest = bits;
    let mut first = true;
    for &(bit, name) in names {
        if bits & bit != 0 {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
            rest &= !bit;
        }
    }
    if rest != 0 {
        if !first {
            f.write_str("|")?;
        }
        write!(f, "{rest:#x}")?;
        first = false;
    }
    if first {
        f.write_str("0")?;
    }
    Ok(())
}

/// Flags for `open`/`openat`. Displays as the recognized names joined with
/// `|` in a fixed order, or `0` for the empty set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags(libc::c_int);

impl OpenFlags {
    pub const NOFOLLOW: OpenFlags = OpenFlags(libc::O_NOFOLLOW);
    pub const CLOEXEC: OpenFlags = OpenFlags(libc::O_CLOEXEC);
    pub const DIRECTORY: OpenFlags = OpenFlags(libc::O_DIRECTORY);

    pub const fn empty() -> Self {
        OpenFlags(0)
    }

    pub const fn union(self, other: Self) -> Self {
        OpenFlags(self.0 | other.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> libc::c_int {
        self.0
    }
}

impl std::ops::BitOr for OpenFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_flags(
            f,
            self.0 as u64,
            &[
                (Self::NOFOLLOW.0 as u64, "O_NOFOLLOW"),
                (Self::CLOEXEC.0 as u64, "O_CLOEXEC"),
                (Self::DIRECTORY.0 as u64, "O_DIRECTORY"),
            ],
        )
    }
}

/// Flag bits for the `mount` syscall. Displays recognized names, or `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MountFlags(libc::c_ulong);

impl MountFlags {
    pub const BIND: MountFlags = MountFlags(libc::MS_BIND);

    pub const fn empty() -> Self {
        MountFlags(0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> libc::c_ulong {
        self.0
    }
}

impl std::ops::BitOr for MountFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        MountFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for MountFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MountFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_flags(f, self.0 as u64, &[(Self::BIND.0 as u64, "MS_BIND")])
    }
}

/// Flag bits for the `umount2` syscall. Displays recognized names, or `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnmountFlags(libc::c_int);

impl UnmountFlags {
    pub const NOFOLLOW: UnmountFlags = UnmountFlags(libc::UMOUNT_NOFOLLOW);

    pub const fn empty() -> Self {
        UnmountFlags(0)
    }

    pub fn bits(self) -> libc::c_int {
        self.0
    }
}

impl fmt::Display for UnmountFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_flags(
            f,
            self.0 as u64,
            &[(Self::NOFOLLOW.0 as u64, "UMOUNT_NOFOLLOW")],
        )
    }
}

/// The abstract system interface the executor talks to.
///
/// Descriptors are raw integers so a recording implementation can hand
/// them out deterministically (3, 4, …) and assert on exact call traces.
pub trait SystemCalls {
    fn lstat(&self, path: &str) -> Result<FileKind, SysError>;
    fn open(&self, path: &str, flags: OpenFlags, mode: u32) -> Result<RawFd, SysError>;
    fn openat(
        &self,
        dirfd: RawFd,
        name: &str,
        flags: OpenFlags,
        mode: u32,
    ) -> Result<RawFd, SysError>;
    fn mkdirat(&self, dirfd: RawFd, name: &str, mode: u32) -> Result<(), SysError>;
    fn fchown(&self, fd: RawFd, uid: u32, gid: u32) -> Result<(), SysError>;
    fn close(&self, fd: RawFd) -> Result<(), SysError>;
    fn mount(
        &self,
        source: &str,
        target: &str,
        fstype: &str,
        flags: MountFlags,
        data: &str,
    ) -> Result<(), SysError>;
    fn unmount(&self, target: &str, flags: UnmountFlags) -> Result<(), SysError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_predicates() {
        assert!(FileKind::Directory.is_dir());
        assert!(!FileKind::File.is_dir());
        assert!(!FileKind::Symlink.is_dir());
    }

    #[test]
    fn open_flags_render_in_fixed_order() {
        let flags = OpenFlags::DIRECTORY | OpenFlags::NOFOLLOW | OpenFlags::CLOEXEC;
        assert_eq!(flags.to_string(), "O_NOFOLLOW|O_CLOEXEC|O_DIRECTORY");
        assert_eq!(OpenFlags::empty().to_string(), "0");
    }

    #[test]
    fn mount_flags_render_bind_or_zero() {
        assert_eq!(MountFlags::BIND.to_string(), "MS_BIND");
        assert_eq!(MountFlags::empty().to_string(), "0");
    }

    #[test]
    fn unmount_flags_render_nofollow() {
        assert_eq!(UnmountFlags::NOFOLLOW.to_string(), "UMOUNT_NOFOLLOW");
        assert_eq!(UnmountFlags::NOFOLLOW.bits(), 8);
    }

    #[test]
    fn sys_error_renders_cause_text() {
        assert_eq!(SysError::NotFound.to_string(), "no such file or directory");
        assert_eq!(SysError::Other("testing".into()).to_string(), "testing");
    }
}
