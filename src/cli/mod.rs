//! Workflow layer between argument parsing and the git gateway.
//!
//! - `orchestration` - The release and release branch workflows
//! - `strategy` - Version determination policies

pub mod orchestration;
pub mod strategy;

pub use orchestration::{BranchOutcome, ReleaseOrchestrator, ReleaseOutcome};
pub use strategy::{strategy_for, BranchNameStrategy, LatestTagStrategy, VersionStrategy};
