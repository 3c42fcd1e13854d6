//! The change planner: a deterministic diff over two mount profiles.
//!
//! Ordering is everything here. Mount points nest, so the plan must
//! unmount children before their parents, mount parents before their
//! children, and remount any entry whose parent is being replaced. The
//! hierarchy is decided by real path containment, not byte prefixes:
//! `/a/b` contains `/a/b/c` but has nothing to do with `/a/b-1`.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use crate::types::{Action, Change, MountEntry, Profile};

/// True when `ancestor` properly contains `path` in the filesystem
/// hierarchy. `/` contains every path; otherwise containment means `path`
/// continues past `ancestor` with a separator, so `/a/b-1` is unrelated to
/// `/a/b`.
fn is_path_ancestor(ancestor: &str, path: &str) -> bool {
    let ancestor = ancestor.trim_end_matches('/');
    if ancestor.is_empty() {
        return true;
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Compare two mount directories as if each carried a trailing slash.
///
/// This keeps every path immediately ahead of its own descendants and
/// nothing else: `/a/b-1` sorts before `/a/b` because `-` precedes `/`,
/// so the run of `/a/b`'s children is contiguous.
fn compare_dirs(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let n = a.len().min(b.len());
    match a[..n].cmp(&b[..n]) {
        Ordering::Equal => {}
        other => return other,
    }
    if a.len() == b.len() {
        Ordering::Equal
    } else if a.len() == n {
        // `a` ends where `b` continues; weigh `a`'s virtual trailing slash
        // against `b`'s next byte.
        b'/'.cmp(&b[n]).then(Ordering::Less)
    } else {
        a[n].cmp(&b'/').then(Ordering::Greater)
    }
}

/// Compute the ordered list of changes that transforms `current` into
/// `desired`.
///
/// Reused entries (equal by the full tuple, with no replaced ancestor)
/// come out first as `Keep` in `current`'s input order, followed by
/// `Unmount` changes with descendants ahead of their ancestors, followed
/// by `Mount` changes with ancestors ahead of their descendants. Entries
/// at the same directory keep their input order within a phase. An entry
/// below a replaced parent appears in both the unmount and the mount
/// phase, bracketing the new parent. Pure; never fails.
pub fn needed_changes(current: &Profile, desired: &Profile) -> Vec<Change> {
    let current: &[MountEntry] = &current.entries;
    let desired: &[MountEntry] = &desired.entries;

    let mut desired_at_dir: HashMap<&str, Vec<usize>> = HashMap::new();
    for (j, entry) in desired.iter().enumerate() {
        desired_at_dir.entry(entry.dir.as_str()).or_default().push(j);
    }

    // Pair current and desired entries one to one by full-tuple equality.
    // Profiles may legally repeat a directory, so each desired entry can
    // satisfy only a single current entry; pairing proceeds in input order
    // on both sides. Whatever stays unpaired is dropped (current side) or
    // added (desired side).
    let mut paired_with: Vec<Option<usize>> = vec![None; current.len()];
    let mut desired_taken: Vec<bool> = vec![false; desired.len()];
    for (i, entry) in current.iter().enumerate() {
        if let Some(candidates) = desired_at_dir.get(entry.dir.as_str()) {
            if let Some(&j) = candidates
                .iter()
                .find(|&&j| !desired_taken[j] && desired[j] == *entry)
            {
                paired_with[i] = Some(j);
                desired_taken[j] = true;
            }
        }
    }

    // A paired entry below a dropped mount point cannot survive: it has to
    // be unmounted with the old parent and remounted around the new one.
    // Unpairing can expose further ancestors, so iterate to a fixpoint.
    loop {
        let dropped: Vec<&str> = current
            .iter()
            .enumerate()
            .filter(|&(i, _)| paired_with[i].is_none())
            .map(|(_, entry)| entry.dir.as_str())
            .collect();
        let mut moved = false;
        for (i, entry) in current.iter().enumerate() {
            if let Some(j) = paired_with[i] {
                if dropped.iter().any(|&d| is_path_ancestor(d, &entry.dir)) {
                    paired_with[i] = None;
                    desired_taken[j] = false;
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }

    let mut changes = Vec::with_capacity(current.len() + desired.len());
    let mut kept = 0;
    for (i, entry) in current.iter().enumerate() {
        if paired_with[i].is_some() {
            changes.push(Change::new(entry.clone(), Action::Keep));
            kept += 1;
        }
    }

    // Descendants first; stable sort keeps tied directories in input order.
    let mut drop_order: Vec<usize> = (0..current.len())
        .filter(|&i| paired_with[i].is_none())
        .collect();
    drop_order.sort_by(|&a, &b| compare_dirs(&current[b].dir, &current[a].dir));
    for i in drop_order {
        changes.push(Change::new(current[i].clone(), Action::Unmount));
    }

    // Ancestors first, same tie rule.
    let mut add_order: Vec<usize> = (0..desired.len())
        .filter(|&j| !desired_taken[j])
        .collect();
    add_order.sort_by(|&a, &b| compare_dirs(&desired[a].dir, &desired[b].dir));
    for j in add_order {
        changes.push(Change::new(desired[j].clone(), Action::Mount));
    }

    debug!("needed changes: {} kept, {} total", kept, changes.len());
    changes
}
