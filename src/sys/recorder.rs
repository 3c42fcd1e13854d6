//! A recording implementation of [`SystemCalls`] for tests.
//!
//! Every call is rendered to a stable string and appended to the call log.
//! Faults and `lstat` results are injected keyed by that exact string, and
//! descriptors are handed out deterministically starting at 3, so suites
//! can assert on whole call traces including the numeric descriptors.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::os::unix::io::RawFd;

use super::{FileKind, MountFlags, OpenFlags, SysError, SystemCalls, UnmountFlags};

/// Records calls, injects faults. Not thread-safe; one per test.
#[derive(Debug)]
pub struct SyscallRecorder {
    calls: RefCell<Vec<String>>,
    faults: RefCell<HashMap<String, SysError>>,
    lstats: RefCell<HashMap<String, FileKind>>,
    open_fds: RefCell<BTreeSet<RawFd>>,
    next_fd: Cell<RawFd>,
}

impl Default for SyscallRecorder {
    fn default() -> Self {
        SyscallRecorder {
            calls: RefCell::default(),
            faults: RefCell::default(),
            lstats: RefCell::default(),
            open_fds: RefCell::default(),
            // 0-2 belong to stdio.
            next_fd: Cell::new(3),
        }
    }
}

/// Render a mode the way the kernel-facing tools print it: octal with a
/// leading zero, except plain `0`.
fn octal(mode: u32) -> String {
    if mode == 0 {
        "0".to_string()
    } else {
        format!("0{mode:o}")
    }
}

impl SyscallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange for the call rendered exactly as `call` to fail with `err`.
    pub fn insert_fault(&self, call: &str, err: SysError) {
        self.faults.borrow_mut().insert(call.to_string(), err);
    }

    /// Arrange for an `lstat` call rendered exactly as `call` to observe
    /// the given file kind.
    pub fn insert_lstat_result(&self, call: &str, kind: FileKind) {
        self.lstats.borrow_mut().insert(call.to_string(), kind);
    }

    /// Everything recorded so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Descriptors opened but not yet closed. Empty after a well-behaved
    /// executor run, whether it succeeded or failed.
    pub fn open_descriptors(&self) -> Vec<RawFd> {
        self.open_fds.borrow().iter().copied().collect()
    }

    fn record(&self, call: String) -> Result<(), SysError> {
        let fault = self.faults.borrow().get(&call).cloned();
        self.calls.borrow_mut().push(call);
        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn allocate_fd(&self) -> RawFd {
        let fd = self.next_fd.get();
        self.next_fd.set(fd + 1);
        self.open_fds.borrow_mut().insert(fd);
        fd
    }
}

impl SystemCalls for SyscallRecorder {
    fn lstat(&self, path: &str) -> Result<FileKind, SysError> {
        let call = format!("lstat {path:?}");
        let kind = self.lstats.borrow().get(&call).copied();
        self.record(call.clone())?;
        match kind {
            Some(kind) => Ok(kind),
            None => panic!("one of insert_lstat_result or insert_fault must be used for {call}"),
        }
    }

    fn open(&self, path: &str, flags: OpenFlags, mode: u32) -> Result<RawFd, SysError> {
        self.record(format!("open {path:?} {flags} {}", octal(mode)))?;
        Ok(self.allocate_fd())
    }

    fn openat(
        &self,
        dirfd: RawFd,
        name: &str,
        flags: OpenFlags,
        mode: u32,
    ) -> Result<RawFd, SysError> {
        self.record(format!("openat {dirfd} {name:?} {flags} {}", octal(mode)))?;
        Ok(self.allocate_fd())
    }

    fn mkdirat(&self, dirfd: RawFd, name: &str, mode: u32) -> Result<(), SysError> {
        self.record(format!("mkdirat {dirfd} {name:?} {}", octal(mode)))
    }

    fn fchown(&self, fd: RawFd, uid: u32, gid: u32) -> Result<(), SysError> {
        self.record(format!("fchown {fd} {uid} {gid}"))
    }

    fn close(&self, fd: RawFd) -> Result<(), SysError> {
        self.record(format!("close {fd}"))?;
        if !self.open_fds.borrow_mut().remove(&fd) {
            panic!("attempting to close a file descriptor that is not open: {fd}");
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
        self.record(format!(
            "mount {source:?} {target:?} {fstype:?} {flags} {data:?}"
        ))
    }

    fn unmount(&self, target: &str, flags: UnmountFlags) -> Result<(), SysError> {
        self.record(format!("unmount {target:?} {flags}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_start_at_three_and_increment() {
        let sys = SyscallRecorder::new();
        let flags = OpenFlags::NOFOLLOW | OpenFlags::CLOEXEC | OpenFlags::DIRECTORY;
        assert_eq!(sys.open("/", flags, 0).unwrap(), 3);
        assert_eq!(sys.openat(3, "a", flags, 0).unwrap(), 4);
        assert_eq!(
            sys.calls(),
            vec![
                r#"open "/" O_NOFOLLOW|O_CLOEXEC|O_DIRECTORY 0"#,
                r#"openat 3 "a" O_NOFOLLOW|O_CLOEXEC|O_DIRECTORY 0"#,
            ]
        );
        assert_eq!(sys.open_descriptors(), vec![3, 4]);
    }

    #[test]
    fn faults_are_returned_for_matching_calls() {
        let sys = SyscallRecorder::new();
        sys.insert_fault(r#"unmount "/x" UMOUNT_NOFOLLOW"#, SysError::Other("testing".into()));
        let err = sys.unmount("/x", UnmountFlags::NOFOLLOW).unwrap_err();
        assert_eq!(err, SysError::Other("testing".into()));
        assert_eq!(sys.calls(), vec![r#"unmount "/x" UMOUNT_NOFOLLOW"#]);
    }

    #[test]
    fn modes_render_in_octal() {
        let sys = SyscallRecorder::new();
        sys.mkdirat(3, "target", 0o755).unwrap();
        assert_eq!(sys.calls(), vec![r#"mkdirat 3 "target" 0755"#]);
    }

    #[test]
    #[should_panic(expected = "not open")]
    fn closing_an_unopened_descriptor_panics() {
        let sys = SyscallRecorder::new();
        let _ = sys.close(7);
    }

    #[test]
    fn faulted_open_allocates_no_descriptor() {
        let sys = SyscallRecorder::new();
        sys.insert_fault(
            r#"open "/" O_NOFOLLOW|O_CLOEXEC|O_DIRECTORY 0"#,
            SysError::Other("testing".into()),
        );
        let flags = OpenFlags::NOFOLLOW | OpenFlags::CLOEXEC | OpenFlags::DIRECTORY;
        assert!(sys.open("/", flags, 0).is_err());
        assert!(sys.open_descriptors().is_empty());
        // The next successful open still starts at 3.
        assert_eq!(sys.openat(9, "x", flags, 0).unwrap(), 3);
    }
}
