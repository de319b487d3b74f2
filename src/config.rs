use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::{ReleaseBranchPattern, VersionTemplate};
use crate::error::{GardenerError, Result};
use crate::git::GitCredentials;

/// Name of the configuration file looked up in the working directory and
/// in the user config directory.
pub const CONFIG_FILE_NAME: &str = "gardener.toml";

/// Represents the complete configuration for branch-gardener.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub release: ReleaseConfiguration,

    #[serde(default)]
    pub remote: RemoteConfig,
}

/// How the next release version is derived.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VersionDeterminationSchema {
    /// `major.minor` from the current release branch, patch from existing tags
    #[default]
    MajorMinorFromBranchNamePatchFromTag,
    /// Whole version from the greatest existing tag, branch name ignored
    MajorMinorPatchFromTag,
}

fn default_release_branch_prefix() -> String {
    "release/".to_string()
}

fn default_commit_message_template() -> String {
    "Release v{VERSION}".to_string()
}

fn default_tag_name_template() -> String {
    "{VERSION}".to_string()
}

fn default_version_placeholder() -> String {
    "{VERSION}".to_string()
}

fn default_temp_branch_prefix() -> String {
    "temp_gradle_release_plugin/".to_string()
}

fn default_properties_file() -> String {
    "gradle.properties".to_string()
}

fn default_remote_name() -> String {
    "origin".to_string()
}

/// Declarative release policy: branch naming, templates and version schema.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReleaseConfiguration {
    #[serde(default = "default_release_branch_prefix")]
    pub release_branch_prefix: String,

    #[serde(default = "default_commit_message_template")]
    pub commit_message_template: String,

    #[serde(default = "default_tag_name_template")]
    pub tag_name_template: String,

    #[serde(default = "default_version_placeholder")]
    pub version_placeholder: String,

    #[serde(default)]
    pub version_determination_schema: VersionDeterminationSchema,

    #[serde(default = "default_temp_branch_prefix")]
    pub temp_branch_prefix: String,

    #[serde(default = "default_properties_file")]
    pub properties_file: String,
}

impl Default for ReleaseConfiguration {
    fn default() -> Self {
        ReleaseConfiguration {
            release_branch_prefix: default_release_branch_prefix(),
            commit_message_template: default_commit_message_template(),
            tag_name_template: default_tag_name_template(),
            version_placeholder: default_version_placeholder(),
            version_determination_schema: VersionDeterminationSchema::default(),
            temp_branch_prefix: default_temp_branch_prefix(),
            properties_file: default_properties_file(),
        }
    }
}

impl ReleaseConfiguration {
    pub fn commit_message(&self, version: &str) -> String {
        VersionTemplate::new(&self.commit_message_template, &self.version_placeholder)
            .render(version)
    }

    pub fn tag_name(&self, version: &str) -> String {
        VersionTemplate::new(&self.tag_name_template, &self.version_placeholder).render(version)
    }

    /// Name of the throwaway branch that stages the version bump commit
    pub fn temp_branch(&self, version: &str) -> String {
        format!("{}{}", self.temp_branch_prefix, version)
    }

    pub fn branch_pattern(&self) -> ReleaseBranchPattern {
        ReleaseBranchPattern::new(&self.release_branch_prefix)
    }
}

/// Remote used for tag fetch and push.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_name")]
    pub name: String,

    /// Abort network transfers running longer than this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            name: default_remote_name(),
            timeout_secs: None,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Rejects configurations that would produce colliding or unnamed refs.
    pub fn validate(&self) -> Result<()> {
        let release = &self.release;

        if release.version_placeholder.is_empty() {
            return Err(GardenerError::config("version_placeholder must not be empty"));
        }

        let tag = VersionTemplate::new(&release.tag_name_template, &release.version_placeholder);
        if !tag.has_placeholder() {
            return Err(GardenerError::config(format!(
                "tag_name_template '{}' must contain the placeholder '{}'",
                release.tag_name_template, release.version_placeholder
            )));
        }

        let commit = VersionTemplate::new(
            &release.commit_message_template,
            &release.version_placeholder,
        );
        if !commit.has_placeholder() {
            warn!(
                template = %release.commit_message_template,
                placeholder = %release.version_placeholder,
                "commit message template does not contain the version placeholder"
            );
        }

        if release.temp_branch_prefix.is_empty() {
            return Err(GardenerError::config("temp_branch_prefix must not be empty"));
        }

        if self.remote.name.is_empty() {
            return Err(GardenerError::config("remote name must not be empty"));
        }

        if self.remote.timeout_secs == Some(0) {
            return Err(GardenerError::config("remote timeout_secs must be positive"));
        }

        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gardener.toml` in current directory
/// 3. `gardener.toml` in user config directory
/// 4. Default configuration if no file found
///
/// The result is validated before it is returned.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        read_config_file(path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        read_config_file(Path::new(CONFIG_FILE_NAME))?
    } else if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join(CONFIG_FILE_NAME);
        if user_config.exists() {
            read_config_file(&user_config)?
        } else {
            debug!("no configuration file found, using defaults");
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| GardenerError::config(format!("Invalid configuration: {}", e)))?;
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading configuration");
    fs::read_to_string(path).map_err(|e| {
        GardenerError::config(format!("Cannot read '{}': {}", path.display(), e))
    })
}

/// Invocation-time settings, resolved once at the entry point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub login: Option<String>,
    pub password: Option<String>,
    /// Leave the working tree on the new tag instead of the original branch
    pub checkout_tag: bool,
    /// Explicit `x.y` overriding automatic branch/version selection
    pub release_major_minor_version: Option<String>,
    /// Accept the suggested release branch version without prompting
    pub create_default_release_branch: bool,
    /// Tolerate uncommitted changes instead of aborting
    pub dry_run: bool,
}

impl Settings {
    /// Treats empty strings as absent, the way unset properties behave.
    pub fn normalized(mut self) -> Self {
        self.login = self.login.filter(|s| !s.is_empty());
        self.password = self.password.filter(|s| !s.is_empty());
        self.release_major_minor_version = self
            .release_major_minor_version
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Credentials are only used when both login and password are known.
    pub fn credentials(&self) -> Option<GitCredentials> {
        match (&self.login, &self.password) {
            (Some(login), Some(password)) => Some(GitCredentials::new(login, password)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_release_configuration() {
        let config = ReleaseConfiguration::default();
        assert_eq!(config.release_branch_prefix, "release/");
        assert_eq!(config.commit_message("1.2.4"), "Release v1.2.4");
        assert_eq!(config.tag_name("1.2.4"), "1.2.4");
        assert_eq!(config.temp_branch("1.2.4"), "temp_gradle_release_plugin/1.2.4");
        assert_eq!(
            config.version_determination_schema,
            VersionDeterminationSchema::MajorMinorFromBranchNamePatchFromTag
        );
    }

    #[test]
    fn test_parse_schema_names() {
        let config: Config = toml::from_str(
            r#"
[release]
version_determination_schema = "major-minor-patch-from-tag"
"#,
        )
        .unwrap();
        assert_eq!(
            config.release.version_determination_schema,
            VersionDeterminationSchema::MajorMinorPatchFromTag
        );
        assert_eq!(config.release.release_branch_prefix, "release/");
        assert_eq!(config.remote.name, "origin");
    }

    #[test]
    fn test_unknown_schema_is_rejected() {
        let parsed: std::result::Result<Config, _> = toml::from_str(
            r#"
[release]
version_determination_schema = "from-the-moon"
"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_requires_placeholder_in_tag_template() {
        let mut config = Config::default();
        config.release.tag_name_template = "release".to_string();
        assert!(matches!(config.validate(), Err(GardenerError::Config(_))));
    }

    #[test]
    fn test_validate_allows_commit_message_without_placeholder() {
        let mut config = Config::default();
        config.release.commit_message_template = "Release".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_placeholder_and_zero_timeout() {
        let mut config = Config::default();
        config.release.version_placeholder = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.remote.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_normalized_drops_empty_values() {
        let settings = Settings {
            login: Some(String::new()),
            password: Some("secret".to_string()),
            release_major_minor_version: Some("  ".to_string()),
            ..Settings::default()
        }
        .normalized();

        assert_eq!(settings.login, None);
        assert_eq!(settings.release_major_minor_version, None);
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_settings_credentials_need_login_and_password() {
        let settings = Settings {
            login: Some("bob".to_string()),
            password: Some("secret".to_string()),
            ..Settings::default()
        };
        let credentials = settings.credentials().unwrap();
        assert_eq!(credentials.login, "bob");
    }

    #[test]
    fn test_remote_timeout() {
        let remote = RemoteConfig {
            name: "origin".to_string(),
            timeout_secs: Some(30),
        };
        assert_eq!(remote.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(RemoteConfig::default().timeout(), None);
    }
}
