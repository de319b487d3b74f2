use crate::error::{GardenerError, Result};
use regex::Regex;

/// Release branch naming convention: `<prefix><major>.<minor>`
#[derive(Debug, Clone)]
pub struct ReleaseBranchPattern {
    prefix: String,
    regex: Regex,
}

impl ReleaseBranchPattern {
    /// Build the pattern for a configured branch prefix (e.g. `"release/"`)
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let regex = Regex::new(&format!(r"^{}(\d+)\.(\d+)$", regex::escape(&prefix)))
            .expect("escaped prefix always forms a valid regex");

        ReleaseBranchPattern { prefix, regex }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Human readable form used in diagnostics, e.g. `release/(\d+)\.(\d+)`
    pub fn describe(&self) -> String {
        format!(r"{}(\d+)\.(\d+)", self.prefix)
    }

    /// Whether the full branch name conforms to the pattern
    pub fn matches(&self, branch: &str) -> bool {
        self.regex.is_match(branch)
    }

    /// Fail with a naming convention violation unless the branch matches
    pub fn check(&self, branch: &str) -> Result<()> {
        if self.matches(branch) {
            Ok(())
        } else {
            Err(GardenerError::BranchNamingConventionViolation {
                branch: branch.to_string(),
                pattern: self.describe(),
            })
        }
    }

    /// Compose the branch name for a `major.minor` line
    pub fn branch_for(&self, major_minor: &str) -> String {
        format!("{}{}", self.prefix, major_minor)
    }
}
