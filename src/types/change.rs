//! Planned changes: an action applied to one mount entry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::entry::MountEntry;
use crate::types::errors::Error;

/// What to do with an entry when reconciling profiles.
///
/// The set is closed; numeric tags are stable for serialized plans and
/// anything outside the set is rejected at the [`TryFrom<u32>`] boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum Action {
    Keep = 0,
    Mount = 1,
    Unmount = 2,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Keep => "keep",
            Action::Mount => "mount",
            Action::Unmount => "unmount",
        }
    }

    /// The stable numeric tag of this action.
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u32> for Action {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Error> {
        match value {
            0 => Ok(Action::Keep),
            1 => Ok(Action::Mount),
            2 => Ok(Action::Unmount),
            other => Err(Error::UnknownAction(other)),
        }
    }
}

/// A single planned mount change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub entry: MountEntry,
    pub action: Action,
}

impl Change {
    pub fn new(entry: MountEntry, action: Action) -> Self {
        Change { entry, action }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.action, self.entry)
    }
}
