mod support;

use branch_gardener::boundary::ReleaseWarning;
use branch_gardener::cli::{BranchOutcome, ReleaseOrchestrator};
use branch_gardener::config::{ReleaseConfiguration, Settings, VersionDeterminationSchema};
use branch_gardener::git::Git2Repository;
use branch_gardener::ui::{NonInteractive, ScriptedInteractor};
use branch_gardener::GardenerError;
use std::path::Path;
use support::Fixture;

#[test]
fn test_release_on_real_repository() {
    let fixture = Fixture::new("release/1.2", "group=ru.fix\nversion=1.2.3-SNAPSHOT\n");
    fixture.tag_in_origin("1.2.3", "release/1.2");

    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings::default();
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    let outcome = orchestrator.create_release(&fixture.work).unwrap();

    assert_eq!(outcome.version, "1.2.4");
    assert_eq!(outcome.commit_message, "Release v1.2.4");
    assert!(outcome.pushed);
    assert!(outcome.warnings.is_empty());

    // Working tree is back on the release branch with its own content
    assert_eq!(fixture.head_branch().as_deref(), Some("release/1.2"));
    assert_eq!(
        fixture.read("gradle.properties"),
        "group=ru.fix\nversion=1.2.3-SNAPSHOT\n"
    );
    assert!(!fixture.local_branch_exists("temp_gradle_release_plugin/1.2.4"));

    // The tag carries the version bump and reached origin
    assert_eq!(
        fixture.file_at_tag("1.2.4", "gradle.properties"),
        "group=ru.fix\nversion=1.2.4\n"
    );
    assert!(fixture.origin_has_tag("1.2.4"));
    let mut tags = fixture.local_tags();
    tags.sort();
    assert_eq!(tags, vec!["1.2.3", "1.2.4"]);
}

#[test]
fn test_release_with_checkout_tag_leaves_detached_head() {
    let fixture = Fixture::new("release/2.0", "version=2.0.0-SNAPSHOT\n");
    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings {
        checkout_tag: true,
        ..Settings::default()
    };
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    let outcome = orchestrator.create_release(&fixture.work).unwrap();

    assert_eq!(outcome.version, "2.0.0");
    assert!(outcome.checked_out_tag);
    assert_eq!(fixture.head_branch(), None);
    assert_eq!(fixture.read("gradle.properties"), "version=2.0.0\n");
}

#[test]
fn test_release_fails_when_origin_is_gone() {
    let fixture = Fixture::new("production", "version=0.0.0\n");
    fixture.tag_locally("1.1.7");
    fixture.tag_locally("1.2.3");
    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration {
        version_determination_schema: VersionDeterminationSchema::MajorMinorPatchFromTag,
        ..ReleaseConfiguration::default()
    };
    let settings = Settings::default();

    std::fs::remove_dir_all(&fixture.origin).unwrap();
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    // A failed fetch is fatal, unlike a failed push
    assert!(matches!(
        orchestrator.create_release(&fixture.work),
        Err(GardenerError::Fetch { .. })
    ));
    assert_eq!(fixture.head_branch().as_deref(), Some("production"));
}

#[test]
fn test_release_refuses_dirty_tree() {
    let fixture = Fixture::new("release/1.0", "version=1.0.0-SNAPSHOT\n");
    fixture.write("gradle.properties", "version=local-edit\n");

    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings::default();
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    assert!(matches!(
        orchestrator.create_release(&fixture.work),
        Err(GardenerError::UncommittedChanges { .. })
    ));
    assert_eq!(fixture.read("gradle.properties"), "version=local-edit\n");
    assert!(fixture.local_tags().is_empty());
}

#[test]
fn test_dry_run_keeps_uncommitted_edits_out_of_release() {
    let fixture = Fixture::new("release/1.2", "version=1.2.0-SNAPSHOT\n");
    fixture.commit_file("README.md", "original\n", "Add readme");
    fixture.commit_file("NOTES.md", "original notes\n", "Add notes");
    fixture.write("README.md", "my uncommitted edit\n");
    fixture.write("NOTES.md", "staged notes\n");
    fixture.stage("NOTES.md");
    fixture.write("scratch.txt", "untracked\n");

    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings {
        dry_run: true,
        ..Settings::default()
    };
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    let outcome = orchestrator.create_release(&fixture.work).unwrap();
    assert_eq!(outcome.version, "1.2.0");
    assert_eq!(outcome.warnings, vec![ReleaseWarning::DirtyTreeTolerated]);
    assert!(outcome.pushed);

    // The published tag holds the version bump and nothing else
    assert!(fixture.origin_has_tag("1.2.0"));
    assert_eq!(
        fixture.file_at_tag("1.2.0", "gradle.properties"),
        "version=1.2.0\n"
    );
    assert_eq!(fixture.file_at_tag("1.2.0", "README.md"), "original\n");
    assert_eq!(fixture.file_at_tag("1.2.0", "NOTES.md"), "original notes\n");

    // Local work is still where it was
    assert_eq!(fixture.head_branch().as_deref(), Some("release/1.2"));
    assert_eq!(fixture.read("README.md"), "my uncommitted edit\n");
    assert_eq!(fixture.read("NOTES.md"), "staged notes\n");
    assert_eq!(fixture.read("scratch.txt"), "untracked\n");
    assert_eq!(fixture.read("gradle.properties"), "version=1.2.0-SNAPSHOT\n");
}

#[test]
fn test_dry_run_refuses_edited_properties_file() {
    let fixture = Fixture::new("release/1.2", "version=1.2.0-SNAPSHOT\n");
    fixture.write("gradle.properties", "version=local-edit\n");

    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings {
        dry_run: true,
        ..Settings::default()
    };
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    assert!(matches!(
        orchestrator.create_release(&fixture.work),
        Err(GardenerError::UncommittedChanges { .. })
    ));
    assert_eq!(fixture.read("gradle.properties"), "version=local-edit\n");
    assert!(!fixture.local_branch_exists("temp_gradle_release_plugin/1.2.0"));
}

#[test]
fn test_release_leaves_untracked_files_alone() {
    let fixture = Fixture::new("release/1.2", "version=1.2.0-SNAPSHOT\n");
    fixture.write("scratch.txt", "untracked\n");

    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings::default();
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    let outcome = orchestrator.create_release(&fixture.work).unwrap();
    assert!(outcome.warnings.is_empty());

    let fixture_repo = fixture.repo();
    let tree = fixture_repo
        .find_reference("refs/tags/1.2.0")
        .unwrap()
        .peel_to_tree()
        .unwrap();
    assert!(tree.get_path(Path::new("scratch.txt")).is_err());
    assert_eq!(fixture.read("scratch.txt"), "untracked\n");
}

#[test]
fn test_release_from_nested_project_directory() {
    let fixture = Fixture::new("release/1.4", "version=root\n");
    let module = fixture.work.join("module");
    std::fs::create_dir(&module).unwrap();
    fixture.commit_file(
        "module/gradle.properties",
        "version=1.4.0-SNAPSHOT\n",
        "Add module",
    );
    // An unrelated edit at the root keeps the dry-run path busy
    fixture.write("gradle.properties", "version=root-edit\n");

    let repo = Git2Repository::open(&module).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings {
        dry_run: true,
        ..Settings::default()
    };
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    let outcome = orchestrator.create_release(&module).unwrap();
    assert_eq!(outcome.version, "1.4.0");
    assert_eq!(
        fixture.file_at_tag("1.4.0", "module/gradle.properties"),
        "version=1.4.0\n"
    );
    assert_eq!(fixture.file_at_tag("1.4.0", "gradle.properties"), "version=root\n");
    assert_eq!(fixture.read("gradle.properties"), "version=root-edit\n");
    assert_eq!(
        fixture.read("module/gradle.properties"),
        "version=1.4.0-SNAPSHOT\n"
    );
}

#[test]
fn test_release_branch_on_real_repository() {
    let fixture = Fixture::new("master", "version=1.0.0\n");
    fixture.tag_locally("1.0.0");
    fixture.tag_locally("1.1.0");

    let repo = Git2Repository::open(&fixture.work).unwrap();
    let interactor = ScriptedInteractor::new([""]);
    let config = ReleaseConfiguration::default();
    let settings = Settings::default();
    let orchestrator = ReleaseOrchestrator::new(&repo, &interactor, &config, &settings);

    let outcome = orchestrator.create_release_branch().unwrap();
    assert_eq!(
        outcome,
        BranchOutcome::Created {
            branch: "release/1.2".to_string(),
            based_on: "master".to_string(),
        }
    );
    assert_eq!(fixture.head_branch().as_deref(), Some("release/1.2"));
}

#[test]
fn test_release_warning_for_missing_version_key() {
    let fixture = Fixture::new("release/3.1", "description=service\n");
    let repo = Git2Repository::open(&fixture.work).unwrap();
    let config = ReleaseConfiguration::default();
    let settings = Settings::default();
    let orchestrator = ReleaseOrchestrator::new(&repo, &NonInteractive, &config, &settings);

    let outcome = orchestrator.create_release(&fixture.work).unwrap();
    assert_eq!(outcome.version, "3.1.0");
    assert!(matches!(
        outcome.warnings.as_slice(),
        [ReleaseWarning::VersionKeyMissing { .. }]
    ));
    assert!(fixture.origin_has_tag("3.1.0"));
}
