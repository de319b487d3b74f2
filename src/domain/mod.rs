//! Domain logic - pure naming and version rules independent of git operations

pub mod branch;
pub mod tag;
pub mod version;

pub use branch::ReleaseBranchPattern;
pub use tag::VersionTemplate;
pub use version::SemanticVersion;
