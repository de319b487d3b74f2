use std::fmt;
use std::path::PathBuf;

/// Non-fatal issues hit while releasing. The release itself still completes
/// and these are reported to the user afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// The tag exists locally but could not be pushed
    TagPushFailed {
        tag: String,
        remote: String,
        reason: String,
    },
    /// The properties file has no `version` key, so nothing was rewritten
    VersionKeyMissing { path: PathBuf },
    /// Uncommitted changes were ignored because of dry-run mode
    DirtyTreeTolerated,
}

impl ReleaseWarning {
    /// Command the user can run to finish what the tool could not
    pub fn remediation(&self) -> Option<String> {
        match self {
            ReleaseWarning::TagPushFailed { remote, .. } => {
                Some(format!("git push {} --tags", remote))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::TagPushFailed {
                tag,
                remote,
                reason,
            } => {
                write!(
                    f,
                    "Tag '{}' was created locally but could not be pushed to '{}': {}",
                    tag, remote, reason
                )
            }
            ReleaseWarning::VersionKeyMissing { path } => {
                write!(
                    f,
                    "No 'version' property in '{}', file left unchanged",
                    path.display()
                )
            }
            ReleaseWarning::DirtyTreeTolerated => {
                write!(f, "Uncommitted changes ignored because dry-run is enabled")
            }
        }
    }
}
