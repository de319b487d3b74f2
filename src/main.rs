use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use branch_gardener::cli::ReleaseOrchestrator;
use branch_gardener::config::{self, Settings};
use branch_gardener::git::Git2Repository;
use branch_gardener::ui::{self, ConsoleInteractor, Interactor};

#[derive(Parser)]
#[command(
    name = "branch-gardener",
    version,
    about = "Cut release branches and tag patch releases derived from existing git tags"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Project directory inside the git repository"
    )]
    repo: PathBuf,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tag the next patch release of the current release branch
    Release(ReleaseArgs),
    /// Create the next release branch from the current branch
    ReleaseBranch(ReleaseBranchArgs),
}

#[derive(clap::Args)]
struct ReleaseArgs {
    #[arg(
        long,
        env = "GARDENER_CHECKOUT_TAG",
        help = "Leave the working tree on the new tag"
    )]
    checkout_tag: bool,

    #[arg(
        long,
        env = "GARDENER_RELEASE_MAJOR_MINOR_VERSION",
        value_name = "X.Y",
        help = "Release this major.minor line instead of the current branch"
    )]
    release_major_minor_version: Option<String>,

    #[arg(long, env = "GARDENER_LOGIN", help = "Login for the git remote")]
    login: Option<String>,

    #[arg(
        long,
        env = "GARDENER_PASSWORD",
        hide_env_values = true,
        help = "Password for the git remote"
    )]
    password: Option<String>,

    #[arg(
        long,
        env = "GARDENER_DRY_RUN",
        help = "Continue despite uncommitted changes"
    )]
    dry_run: bool,
}

#[derive(clap::Args)]
struct ReleaseBranchArgs {
    #[arg(
        long,
        env = "GARDENER_CREATE_DEFAULT_RELEASE_BRANCH",
        help = "Use the suggested version without prompting"
    )]
    create_default_release_branch: bool,

    #[arg(
        long,
        env = "GARDENER_DRY_RUN",
        help = "Continue despite uncommitted changes"
    )]
    dry_run: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let Args {
        config: config_path,
        repo: project_dir,
        command,
        ..
    } = args;

    let config = config::load_config(config_path.as_deref())
        .context("Failed to load configuration")?;
    let interactor = ConsoleInteractor::new();

    match command {
        Command::Release(release) => {
            let settings = Settings {
                login: release.login,
                password: release.password,
                checkout_tag: release.checkout_tag,
                release_major_minor_version: release.release_major_minor_version,
                dry_run: release.dry_run,
                ..Settings::default()
            }
            .normalized();
            let settings = ask_missing_password(settings, &interactor)?;

            let repo = Git2Repository::open(&project_dir)?
                .with_remote(config.remote.name.clone())
                .with_credentials(settings.credentials())
                .with_timeout(config.remote.timeout());

            let orchestrator =
                ReleaseOrchestrator::new(&repo, &interactor, &config.release, &settings);
            let outcome = orchestrator.create_release(&project_dir)?;
            ui::display_release_outcome(&outcome);
        }
        Command::ReleaseBranch(branch) => {
            let settings = Settings {
                create_default_release_branch: branch.create_default_release_branch,
                dry_run: branch.dry_run,
                ..Settings::default()
            };

            let repo = Git2Repository::open(&project_dir)?;
            let orchestrator =
                ReleaseOrchestrator::new(&repo, &interactor, &config.release, &settings);
            let outcome = orchestrator.create_release_branch()?;
            ui::display_branch_outcome(&outcome);
        }
    }

    Ok(())
}

/// A login without a password is completed interactively.
fn ask_missing_password(mut settings: Settings, interactor: &dyn Interactor) -> Result<Settings> {
    if settings.password.is_none() {
        if let Some(login) = settings.login.as_deref() {
            let password = interactor.ask_secret(&format!("Password for {}", login))?;
            settings.password = Some(password).filter(|p| !p.is_empty());
        }
    }
    Ok(settings)
}
