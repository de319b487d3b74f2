//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Functions here have no side effects beyond printing.

use console::style;

use crate::boundary::ReleaseWarning;
use crate::cli::orchestration::{BranchOutcome, ReleaseOutcome};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a release warning and, when there is one, the command that fixes it.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
    if let Some(command) = warning.remediation() {
        eprintln!("  Run manually: {}", style(command).cyan());
    }
}

/// Summarize a finished release.
pub fn display_release_outcome(outcome: &ReleaseOutcome) {
    for warning in &outcome.warnings {
        display_warning(warning);
    }

    println!("\n{}", style("Release created:").bold());
    println!("  Version: {}", style(&outcome.version).green());
    println!("  Tag:     {}", style(&outcome.tag).green());
    println!("  Commit:  {}", outcome.commit_message);

    if outcome.checked_out_tag {
        display_status(&format!("Working tree is on tag {}", outcome.tag));
    } else {
        display_status(&format!("Back on branch {}", outcome.release_branch));
    }

    if outcome.pushed {
        display_success(&format!("Tag {} pushed", outcome.tag));
    }
}

/// Report the result of a release branch request.
pub fn display_branch_outcome(outcome: &BranchOutcome) {
    match outcome {
        BranchOutcome::Created { branch, based_on } => display_success(&format!(
            "Branch {} was successfully created based on {}",
            branch, based_on
        )),
        BranchOutcome::VersionAlreadyReleased { version } => {
            display_status(&format!("Version {} already exists", version))
        }
        BranchOutcome::BranchAlreadyExists { branch } => {
            display_status(&format!("Branch {} already exists", branch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_release_outcome_with_warning() {
        let outcome = ReleaseOutcome {
            version: "1.2.4".to_string(),
            tag: "1.2.4".to_string(),
            commit_message: "Release v1.2.4".to_string(),
            temp_branch: "temp_gradle_release_plugin/1.2.4".to_string(),
            release_branch: "release/1.2".to_string(),
            checked_out_tag: false,
            pushed: false,
            warnings: vec![ReleaseWarning::TagPushFailed {
                tag: "1.2.4".to_string(),
                remote: "origin".to_string(),
                reason: "offline".to_string(),
            }],
        };
        display_release_outcome(&outcome);
    }

    #[test]
    fn test_display_branch_outcome() {
        display_branch_outcome(&BranchOutcome::VersionAlreadyReleased {
            version: "1.2".to_string(),
        });
    }
}
