//! Mount profiles: ordered lists of entries describing a mount namespace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::entry::MountEntry;
use crate::types::errors::Error;

/// An ordered collection of mount entries.
///
/// Order is preserved exactly as provided; the planner derives its own
/// total order on the changes it emits. Nothing here enforces uniqueness
/// of `dir` across entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub entries: Vec<MountEntry>,
}

impl Profile {
    pub fn new(entries: Vec<MountEntry>) -> Self {
        Profile { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

impl FromStr for Profile {
    type Err = Error;

    /// Parse the multi-line text form: one entry per line, blank lines and
    /// `#` comments ignored.
    fn from_str(s: &str) -> Result<Self, Error> {
        let mut entries = Vec::new();
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            entries.push(line.parse()?);
        }
        Ok(Profile { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_skipping_comments_and_blanks() {
        let text = "# current mounts\n\n/dev/sda1 /a ext4 defaults 0 0\nnone /b tmpfs bind 0 0\n";
        let profile: Profile = text.parse().unwrap();
        assert_eq!(profile.entries.len(), 2);
        assert_eq!(profile.entries[0].dir, "/a");
        assert_eq!(profile.entries[1].options, vec!["bind"]);
    }

    #[test]
    fn round_trips_through_text() {
        let profile = Profile::new(vec![
            MountEntry {
                name: "/dev/sda1".into(),
                dir: "/a".into(),
                fstype: "ext4".into(),
                ..Default::default()
            },
            MountEntry {
                dir: "/b".into(),
                options: vec!["bind".into()],
                ..Default::default()
            },
        ]);
        let reparsed: Profile = profile.to_string().parse().unwrap();
        // Display substitutes `none` for empty fields, so compare the text.
        assert_eq!(reparsed.to_string(), profile.to_string());
    }

    #[test]
    fn empty_text_is_an_empty_profile() {
        let profile: Profile = "".parse().unwrap();
        assert!(profile.is_empty());
    }
}
