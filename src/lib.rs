//! Mountyard: declarative reconciliation of mount namespaces.
//!
//! Given the profile of what is currently mounted and the profile of what
//! ought to be mounted, [`needed_changes`] computes a minimal, correctly
//! ordered sequence of [`Change`]s: children are unmounted before their
//! parents, parents are mounted before their children, and entries whose
//! parent changed are remounted around the new parent. Each change is then
//! applied with [`Change::perform`], which creates missing mount points one
//! path segment at a time through directory descriptors opened with
//! `O_NOFOLLOW`, so a symlink anywhere on the path is a hard failure rather
//! than a traversal.
//!
//! All kernel interaction goes through the [`sys::SystemCalls`] trait.
//! Production code binds [`sys::HostSystem`]; tests bind
//! [`sys::SyscallRecorder`], which records every call in a stable string
//! form and injects faults by that same string.

mod apply;
mod plan;
pub mod sys;
pub mod types;

pub use plan::needed_changes;
pub use types::{Action, Change, Error, MountEntry, Profile, Result};
