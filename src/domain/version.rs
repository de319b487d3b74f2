use crate::error::{GardenerError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn release_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("static regex"))
}

/// Semantic version representation
///
/// Ordering is numeric per component, so `1.2.10 > 1.2.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse a strict `major.minor.patch` string (no prefix, no pre-release suffix)
    pub fn parse(input: &str) -> Result<Self> {
        let captures = release_version_regex()
            .captures(input)
            .ok_or_else(|| GardenerError::invalid_version(input))?;

        let component = |idx: usize| -> Result<u64> {
            captures[idx]
                .parse::<u64>()
                .map_err(|_| GardenerError::invalid_version(input))
        };

        Ok(SemanticVersion {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Lenient parse used for tag scanning: malformed input yields `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::parse(tag).ok()
    }

    /// Next minor line, patch reset to zero. `None` when the minor is
    /// already `u64::MAX`.
    pub fn increment_minor(&self) -> Option<Self> {
        Some(SemanticVersion {
            major: self.major,
            minor: self.minor.checked_add(1)?,
            patch: 0,
        })
    }

    /// Next patch on the same minor line. `None` when the patch is already
    /// `u64::MAX`.
    pub fn increment_patch(&self) -> Option<Self> {
        Some(SemanticVersion {
            major: self.major,
            minor: self.minor,
            patch: self.patch.checked_add(1)?,
        })
    }

    /// The `major.minor` part, e.g. `"1.2"` for `1.2.3`
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl FromStr for SemanticVersion {
    type Err = GardenerError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
