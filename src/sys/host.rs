//! Production binding of [`SystemCalls`] to the kernel via `libc`.

use std::ffi::CString;
use std::os::unix::io::RawFd;

use super::{FileKind, MountFlags, OpenFlags, SysError, SystemCalls, UnmountFlags};

/// Talks to the running kernel. Stateless; construct freely.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostSystem;

fn cstring(s: &str) -> Result<CString, SysError> {
    CString::new(s).map_err(|_| SysError::Other(format!("embedded NUL in path {s:?}")))
}

fn last_errno() -> SysError {
    SysError::from(std::io::Error::last_os_error())
}

impl SystemCalls for HostSystem {
    fn lstat(&self, path: &str) -> Result<FileKind, SysError> {
        let c = cstring(path)?;
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::lstat(c.as_ptr(), &mut st) };
        if rc != 0 {
            return Err(last_errno());
        }
        Ok(match st.st_mode & libc::S_IFMT {
            libc::S_IFDIR => FileKind::Directory,
            libc::S_IFLNK => FileKind::Symlink,
            _ => FileKind::File,
        })
    }

    fn open(&self, path: &str, flags: OpenFlags, mode: u32) -> Result<RawFd, SysError> {
        let c = cstring(path)?;
        let fd = unsafe { libc::open(c.as_ptr(), flags.bits(), mode as libc::c_uint) };
        if fd < 0 {
            return Err(last_errno());
        }
        Ok(fd)
    }

    fn openat(
        &self,
        dirfd: RawFd,
        name: &str,
        flags: OpenFlags,
        mode: u32,
    ) -> Result<RawFd, SysError> {
        let c = cstring(name)?;
        let fd = unsafe { libc::openat(dirfd, c.as_ptr(), flags.bits(), mode as libc::c_uint) };
        if fd < 0 {
            return Err(last_errno());
        }
        Ok(fd)
    }

    fn mkdirat(&self, dirfd: RawFd, name: &str, mode: u32) -> Result<(), SysError> {
        let c = cstring(name)?;
        let rc = unsafe { libc::mkdirat(dirfd, c.as_ptr(), mode as libc::mode_t) };
        if rc != 0 {
            return Err(last_errno());
        }
        Ok(())
    }

    fn fchown(&self, fd: RawFd, uid: u32, gid: u32) -> Result<(), SysError> {
        let rc = unsafe { libc::fchown(fd, uid as libc::uid_t, gid as libc::gid_t) };
        if rc != 0 {
            return Err(last_errno());
        }
        Ok(())
    }

    fn close(&self, fd: RawFd) -> Result<(), SysError> {
        let rc = unsafe { libc::close(fd) };
        if rc != 0 {
            return Err(last_errno());
        }
        Ok(())
    }

    fn mount(
        &self,
        source: &str,
        target: &str,
        fstype: &str,
        flags: MountFlags,
        data: &str,
    ) -> Result<(), SysError> {
        let source = cstring(source)?;
        let target = cstring(target)?;
        let fstype = cstring(fstype)?;
        let data = cstring(data)?;
        let rc = unsafe {
            libc::mount(
                source.as_ptr(),
                target.as_ptr(),
                fstype.as_ptr(),
                flags.bits(),
                data.as_ptr() as *const libc::c_void,
            )
        };
        if rc != 0 {
            return Err(last_errno());
        }
        Ok(())
    }

    fn unmount(&self, target: &str, flags: UnmountFlags) -> Result<(), SysError> {
        let target = cstring(target)?;
        let rc = unsafe { libc::umount2(target.as_ptr(), flags.bits()) };
        if rc != 0 {
            return Err(last_errno());
        }
        Ok(())
    }
}
