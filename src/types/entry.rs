//! Mount entries in canonical fstab form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sys::MountFlags;
use crate::types::errors::Error;

/// One row of a mount table.
///
/// The identity-carrying attribute for hierarchical reasoning is `dir`;
/// two entries are the *same* entry only when the full tuple is equal.
/// Empty `name`/`dir`/`fstype` render as `none` and an empty option list
/// renders as `defaults`, matching the fstab conventions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MountEntry {
    /// Source: a device, a bind-mount source path, or a label like `none`.
    #[serde(default)]
    pub name: String,
    /// Target mount point, as an absolute path.
    #[serde(default)]
    pub dir: String,
    /// Filesystem type.
    #[serde(default, rename = "type")]
    pub fstype: String,
    /// Mount options, in order. `bind` is recognized and becomes a mount
    /// flag; everything else is passed to the kernel as data.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub dump_freq: u32,
    #[serde(default)]
    pub pass_num: u32,
}

impl MountEntry {
    /// Split the options into kernel mount flag bits and the comma-joined
    /// data string for everything the flag table does not recognize.
    pub fn flags_and_data(&self) -> (MountFlags, String) {
        let mut flags = MountFlags::empty();
        let mut data: Vec<&str> = Vec::new();
        for opt in &self.options {
            match opt.as_str() {
                "bind" => flags |= MountFlags::BIND,
                other => data.push(other),
            }
        }
        (flags, data.join(","))
    }
}

fn or_none(s: &str) -> &str {
    if s.is_empty() {
        "none"
    } else {
        s
    }
}

impl fmt::Display for MountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = if self.options.is_empty() {
            "defaults".to_string()
        } else {
            self.options.join(",")
        };
        write!(
            f,
            "{} {} {} {} {} {}",
            or_none(&self.name),
            or_none(&self.dir),
            or_none(&self.fstype),
            options,
            self.dump_freq,
            self.pass_num
        )
    }
}

impl FromStr for MountEntry {
    type Err = Error;

    /// Parse a single fstab-style line. Three to six whitespace-separated
    /// fields; the trailing fields default to `none`, `defaults`, `0`, `0`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() < 3 || fields.len() > 6 {
            return Err(Error::Parse(format!(
                "expected 3 to 6 fields, found {}",
                fields.len()
            )));
        }
        let options = match fields.get(3) {
            None => Vec::new(),
            // The canonical spelling of "no options".
            Some(&"defaults") => Vec::new(),
            Some(joined) => joined.split(',').map(str::to_string).collect(),
        };
        let dump_freq = match fields.get(4) {
            None => 0,
            Some(n) => n
                .parse()
                .map_err(|_| Error::Parse(format!("invalid dump frequency {n:?}")))?,
        };
        let pass_num = match fields.get(5) {
            None => 0,
            Some(n) => n
                .parse()
                .map_err(|_| Error::Parse(format!("invalid pass number {n:?}")))?,
        };
        Ok(MountEntry {
            name: fields[0].to_string(),
            dir: fields[1].to_string(),
            fstype: fields[2].to_string(),
            options,
            dump_freq,
            pass_num,
        })
    }
}
