//! Version derivation from existing release tags.
//!
//! All functions are pure: they see tags as plain strings and never touch
//! the repository. Only tags of the strict `major.minor.patch` shape take
//! part in any computation; anything else (`v1.2.3`, `1.2.3-rc1`, `latest`)
//! is silently ignored. So is a tag whose bumped component would not fit
//! in a `u64`.

use crate::domain::SemanticVersion;
use crate::error::{GardenerError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Version suggested for the very first release branch.
pub const INITIAL_BRANCH_VERSION: &str = "1.0";

fn major_minor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("static regex"))
}

fn trailing_major_minor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.\d+)$").expect("static regex"))
}

/// Parses every well-formed tag, skipping the rest.
fn released_versions<S: AsRef<str>>(tags: &[S]) -> impl Iterator<Item = SemanticVersion> + '_ {
    tags.iter()
        .filter_map(|tag| SemanticVersion::from_tag(tag.as_ref()))
}

/// Suggests the `major.minor` of the next release branch.
///
/// Takes the greatest released version and bumps its minor component.
/// Falls back to `"1.0"` when no tag is a valid release version.
///
/// # Example
/// ```
/// use branch_gardener::version::next_branch_version;
/// assert_eq!(next_branch_version(&["1.2.1", "1.1.0"]), "1.3");
/// assert_eq!(next_branch_version::<&str>(&[]), "1.0");
/// ```
pub fn next_branch_version<S: AsRef<str>>(tags: &[S]) -> String {
    match released_versions(tags)
        .filter_map(|version| version.increment_minor())
        .max()
    {
        Some(next) => next.major_minor(),
        None => INITIAL_BRANCH_VERSION.to_string(),
    }
}

/// Next release on a given `major.minor` line.
///
/// Returns `<major_minor>.0` when nothing on that line was released yet,
/// otherwise the greatest released patch plus one.
pub fn next_release_version_for<S: AsRef<str>>(major_minor: &str, tags: &[S]) -> String {
    let line_prefix = format!("{}.", major_minor);

    let next_on_line = tags
        .iter()
        .map(|tag| -> &str { tag.as_ref() })
        .filter(|tag| tag.starts_with(&line_prefix))
        .filter_map(SemanticVersion::from_tag)
        .filter_map(|version| version.increment_patch())
        .max();

    match next_on_line {
        Some(next) => next.to_string(),
        None => format!("{}.0", major_minor),
    }
}

/// Next release derived from the single greatest tag in the repository,
/// regardless of its minor line. Returns `"1.0.0"` when no valid tag exists.
pub fn next_release_version<S: AsRef<str>>(tags: &[S]) -> String {
    match released_versions(tags)
        .filter_map(|version| version.increment_patch())
        .max()
    {
        Some(next) => next.to_string(),
        None => SemanticVersion::new(1, 0, 0).to_string(),
    }
}

/// Whether `input` is exactly `<digits>.<digits>`.
pub fn is_valid_major_minor(input: &str) -> bool {
    major_minor_regex().is_match(input)
}

/// Fails with [`GardenerError::InvalidVersionFormat`] unless `input` is `x.y`.
pub fn validate_major_minor(input: &str) -> Result<()> {
    if is_valid_major_minor(input) {
        Ok(())
    } else {
        Err(GardenerError::invalid_version(input))
    }
}

/// Extracts the trailing `major.minor` from a release branch name.
///
/// The configured prefix is stripped first when present; whatever remains
/// must end in `\d+\.\d+`.
pub fn extract_major_minor(branch: &str, prefix: &str) -> Result<String> {
    let rest = branch.strip_prefix(prefix).unwrap_or(branch);

    trailing_major_minor_regex()
        .captures(rest)
        .map(|captures| captures[1].to_string())
        .ok_or_else(|| GardenerError::invalid_version(branch))
}

/// True iff any tag starts with `<major_minor>.`.
pub fn branch_version_already_exists<S: AsRef<str>>(major_minor: &str, tags: &[S]) -> bool {
    let line_prefix = format!("{}.", major_minor);
    tags.iter().any(|tag| tag.as_ref().starts_with(&line_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_TAGS: [&str; 0] = [];

    #[test]
    fn test_next_branch_version_without_tags() {
        assert_eq!(next_branch_version(&NO_TAGS), "1.0");
    }

    #[test]
    fn test_next_branch_version_ignores_malformed_tags() {
        assert_eq!(next_branch_version(&["v1.2.3", "latest", "1.2"]), "1.0");
    }

    #[test]
    fn test_next_branch_version_bumps_greatest_minor() {
        let tags = ["1.2.0", "1.2.1", "1.1.0", "1.0.0"];
        assert_eq!(next_branch_version(&tags), "1.3");
    }

    #[test]
    fn test_next_branch_version_uses_numeric_order() {
        let tags = ["1.9.4", "1.10.0"];
        assert_eq!(next_branch_version(&tags), "1.11");
    }

    #[test]
    fn test_next_release_version_for_new_line() {
        assert_eq!(next_release_version_for("1.3", &["1.2.3"]), "1.3.0");
        assert_eq!(next_release_version_for("2.0", &NO_TAGS), "2.0.0");
    }

    #[test]
    fn test_next_release_version_for_existing_line() {
        assert_eq!(next_release_version_for("1.2", &["1.2.3"]), "1.2.4");
        assert_eq!(
            next_release_version_for("1.2", &["1.2.9", "1.2.10", "1.3.0", "1.1.20"]),
            "1.2.11"
        );
    }

    #[test]
    fn test_next_release_version_for_does_not_confuse_lines() {
        // "1.20.5" starts with "1.2" but not with "1.2."
        assert_eq!(next_release_version_for("1.2", &["1.20.5"]), "1.2.0");
    }

    #[test]
    fn test_next_release_version_for_skips_malformed_on_line() {
        assert_eq!(
            next_release_version_for("1.2", &["1.2.3", "1.2.x", "1.2.4-rc1"]),
            "1.2.4"
        );
    }

    #[test]
    fn test_next_release_version_across_repository() {
        assert_eq!(next_release_version(&["1.1.7", "1.2.3"]), "1.2.4");
        assert_eq!(next_release_version(&["2.0.0", "1.9.9"]), "2.0.1");
    }

    #[test]
    fn test_next_release_version_without_valid_tags() {
        assert_eq!(next_release_version(&NO_TAGS), "1.0.0");
        assert_eq!(next_release_version(&["nightly"]), "1.0.0");
    }

    #[test]
    fn test_tags_at_the_u64_limit_are_skipped() {
        let max = u64::MAX;
        assert_eq!(next_release_version(&[format!("1.0.{max}")]), "1.0.0");
        assert_eq!(
            next_release_version(&["1.0.3".to_string(), format!("1.0.{max}")]),
            "1.0.4"
        );
        assert_eq!(
            next_release_version_for("1.0", &[format!("1.0.{max}")]),
            "1.0.0"
        );
        assert_eq!(
            next_release_version_for("1.0", &["1.0.7".to_string(), format!("1.0.{max}")]),
            "1.0.8"
        );
        assert_eq!(next_branch_version(&[format!("1.{max}.0")]), "1.0");
        assert_eq!(
            next_branch_version(&["1.2.0".to_string(), format!("1.{max}.0")]),
            "1.3"
        );
    }

    #[test]
    fn test_validate_major_minor() {
        for valid in ["1.2", "0.0", "10.200"] {
            assert!(validate_major_minor(valid).is_ok(), "{valid}");
        }
        for invalid in ["", "1", "1.2.3", "a.b", "1.2 ", " 1.2", "v1.2", "1.2-rc", "1..2"] {
            assert!(
                matches!(
                    validate_major_minor(invalid),
                    Err(GardenerError::InvalidVersionFormat(_))
                ),
                "{invalid:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_extract_major_minor() {
        assert_eq!(extract_major_minor("release/1.2", "release/").unwrap(), "1.2");
        assert_eq!(extract_major_minor("release/11.22", "release/").unwrap(), "11.22");
        assert_eq!(extract_major_minor("hotfix-3.4", "release/").unwrap(), "3.4");
        assert!(extract_major_minor("release/next", "release/").is_err());
        assert!(extract_major_minor("production", "release/").is_err());
    }

    #[test]
    fn test_branch_version_already_exists() {
        let tags = ["1.2.0", "1.2.1"];
        assert!(branch_version_already_exists("1.2", &tags));
        assert!(!branch_version_already_exists("1.3", &tags));
        assert!(!branch_version_already_exists("1", &["10.0.0"]));
    }

    #[test]
    fn test_works_with_owned_strings() {
        let tags: Vec<String> = vec!["1.2.3".to_string()];
        assert_eq!(next_release_version(&tags), "1.2.4");
        assert_eq!(next_branch_version(&tags), "1.3");
    }
}
