//! Runtime configuration.
//!
//! Configuration is read from an optional JSON file and then overridden by
//! `ATELIER_*` environment variables. Every field has a default so an empty
//! file, or no file at all, is valid apart from the repository, which must
//! always be named.

use crate::telemetry::{LogFormat, TelemetryConfig};
use crate::workspace::domain::{
    BranchName, RepositoryFullName, ReviewerLogin, WorkspaceDomainError, WorkspaceNaming,
};
use crate::workspace::services::{CatalogTtls, WorkflowSettings};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "ATELIER_";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that failed to read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// The configuration file is not valid JSON for [`AtelierConfig`].
    #[error("failed to parse configuration file {path}: {message}")]
    Parse {
        /// File that failed to parse.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },

    /// An environment override could not be converted.
    #[error("invalid value '{value}' for {variable}: {reason}")]
    InvalidOverride {
        /// Environment variable name.
        variable: String,
        /// Raw value.
        value: String,
        /// What was expected instead.
        reason: &'static str,
    },

    /// No repository was configured.
    #[error("orchestrator.repository must be set")]
    MissingRepository,

    /// No reviewer login was configured.
    #[error("orchestrator.reviewer must be set")]
    MissingReviewer,

    /// The launch command is blank.
    #[error("orchestrator.launch_command must not be empty")]
    EmptyLaunchCommand,

    /// The guidelines file is not a plain file name.
    #[error("orchestrator.guidelines_file '{0}' must be a file name inside the clone")]
    InvalidGuidelinesFile(String),

    /// A cache freshness window of zero was configured.
    #[error("cache.{0} must be greater than zero")]
    ZeroTtl(&'static str),

    /// A configured identifier is malformed.
    #[error(transparent)]
    Domain(#[from] WorkspaceDomainError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Orchestrator and review-system settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Prefix of orchestrated session names.
    pub session_prefix: String,
    /// Directory holding every clone.
    pub clones_root: Utf8PathBuf,
    /// Repository new work is opened against, as `owner/repo`.
    pub repository: String,
    /// URL clones are made from; derived from the repository when unset.
    pub clone_url: Option<String>,
    /// Branch new work starts from.
    pub base_branch: String,
    /// Command that starts the assistant inside a session.
    pub launch_command: String,
    /// File name of project guidelines inside a clone.
    pub guidelines_file: String,
    /// Login whose review requests are listed.
    pub reviewer: String,
    /// Keeps review-system writes in memory instead of sending them.
    pub simulate_writes: bool,
    /// First number handed out to simulated review requests.
    pub simulated_number_base: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            session_prefix: "pr-".to_owned(),
            clones_root: Utf8PathBuf::from("clones"),
            repository: String::new(),
            clone_url: None,
            base_branch: "main".to_owned(),
            launch_command: "claude".to_owned(),
            guidelines_file: "CLAUDE.md".to_owned(),
            reviewer: String::new(),
            simulate_writes: false,
            simulated_number_base: 90_000,
        }
    }
}

/// Freshness windows of the read-model caches, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Freshness of the workspace listing.
    pub workspace_ttl_secs: u64,
    /// Freshness of per-reviewer review request listings.
    pub review_listing_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            workspace_ttl_secs: 30,
            review_listing_ttl_secs: 3_600,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtelierConfig {
    /// Workflow settings.
    pub orchestrator: OrchestratorConfig,
    /// Cache settings.
    pub cache: CacheConfig,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

/// Configuration checked and converted into service settings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// Settings handed to the workflow orchestrator.
    pub workflow: WorkflowSettings,
    /// Catalog cache freshness.
    pub ttls: CatalogTtls,
    /// Reviewer whose review requests are listed.
    pub reviewer: ReviewerLogin,
    /// Whether review-system writes are simulated.
    pub simulate_writes: bool,
    /// First simulated review request number.
    pub simulated_number_base: u64,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

impl AtelierConfig {
    /// Parses configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid
    /// configuration; `origin` names the source in the error.
    pub fn from_json(origin: &Utf8Path, text: &str) -> ConfigResult<Self> {
        serde_json::from_str(text).map_err(|err| ConfigError::Parse {
            path: origin.to_owned(),
            message: err.to_string(),
        })
    }

    /// Reads the configuration file, falling back to defaults when it does
    /// not exist, then applies process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or an
    /// override is malformed.
    pub fn load(path: &Utf8Path) -> ConfigResult<Self> {
        let mut config = match read_optional(path)? {
            Some(text) => Self::from_json(path, &text)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies `ATELIER_*` overrides returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when a numeric, boolean or
    /// format override does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));
        let orchestrator = &mut self.orchestrator;

        if let Some(value) = env("SESSION_PREFIX") {
            orchestrator.session_prefix = value;
        }
        if let Some(value) = env("CLONES_ROOT") {
            orchestrator.clones_root = Utf8PathBuf::from(value);
        }
        if let Some(value) = env("REPOSITORY") {
            orchestrator.repository = value;
        }
        if let Some(value) = env("CLONE_URL") {
            orchestrator.clone_url = Some(value);
        }
        if let Some(value) = env("BASE_BRANCH") {
            orchestrator.base_branch = value;
        }
        if let Some(value) = env("LAUNCH_COMMAND") {
            orchestrator.launch_command = value;
        }
        if let Some(value) = env("GUIDELINES_FILE") {
            orchestrator.guidelines_file = value;
        }
        if let Some(value) = env("REVIEWER") {
            orchestrator.reviewer = value;
        }
        if let Some(value) = env("SIMULATE_WRITES") {
            orchestrator.simulate_writes = parse_bool("SIMULATE_WRITES", &value)?;
        }
        if let Some(value) = env("SIMULATED_NUMBER_BASE") {
            orchestrator.simulated_number_base = parse_u64("SIMULATED_NUMBER_BASE", &value)?;
        }
        if let Some(value) = env("WORKSPACE_TTL_SECS") {
            self.cache.workspace_ttl_secs = parse_u64("WORKSPACE_TTL_SECS", &value)?;
        }
        if let Some(value) = env("REVIEW_LISTING_TTL_SECS") {
            self.cache.review_listing_ttl_secs = parse_u64("REVIEW_LISTING_TTL_SECS", &value)?;
        }
        if let Some(value) = env("LOG_LEVEL") {
            self.telemetry.level = value;
        }
        if let Some(value) = env("LOG_FORMAT") {
            self.telemetry.format = LogFormat::parse(&value)
                .ok_or_else(|| invalid("LOG_FORMAT", &value, "human or json"))?;
        }
        Ok(())
    }

    /// Checks the configuration and converts it into service settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> ConfigResult<ValidatedConfig> {
        let orchestrator = &self.orchestrator;
        if orchestrator.repository.trim().is_empty() {
            return Err(ConfigError::MissingRepository);
        }
        if orchestrator.reviewer.trim().is_empty() {
            return Err(ConfigError::MissingReviewer);
        }
        if orchestrator.launch_command.trim().is_empty() {
            return Err(ConfigError::EmptyLaunchCommand);
        }
        if !is_plain_file_name(&orchestrator.guidelines_file) {
            return Err(ConfigError::InvalidGuidelinesFile(
                orchestrator.guidelines_file.clone(),
            ));
        }
        if self.cache.workspace_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl("workspace_ttl_secs"));
        }
        if self.cache.review_listing_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl("review_listing_ttl_secs"));
        }

        let repository = RepositoryFullName::new(orchestrator.repository.trim())?;
        let clone_url = orchestrator
            .clone_url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{repository}.git"));
        let workflow = WorkflowSettings {
            clone_url,
            base_branch: BranchName::new(orchestrator.base_branch.as_str())?,
            guidelines_file: orchestrator.guidelines_file.clone(),
            naming: WorkspaceNaming::new(
                orchestrator.session_prefix.as_str(),
                orchestrator.clones_root.clone(),
            )?,
            launch_command: orchestrator.launch_command.clone(),
            repository,
        };

        Ok(ValidatedConfig {
            workflow,
            ttls: CatalogTtls {
                workspaces: Duration::from_secs(self.cache.workspace_ttl_secs),
                review_listings: Duration::from_secs(self.cache.review_listing_ttl_secs),
            },
            reviewer: ReviewerLogin::new(orchestrator.reviewer.trim())?,
            simulate_writes: orchestrator.simulate_writes,
            simulated_number_base: orchestrator.simulated_number_base,
            telemetry: self.telemetry.clone(),
        })
    }
}

fn read_optional(path: &Utf8Path) -> ConfigResult<Option<String>> {
    let read_error = |err: std::io::Error| ConfigError::Read {
        path: path.to_owned(),
        source: Arc::new(err),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error(std::io::Error::other("path must include a file name")))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(read_error(err)),
    };
    match dir.read_to_string(file_name) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(read_error(err)),
    }
}

fn invalid(key: &str, value: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidOverride {
        variable: format!("{ENV_PREFIX}{key}"),
        value: value.to_owned(),
        reason,
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "a boolean")),
    }
}

fn parse_u64(key: &str, value: &str) -> ConfigResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value, "a non-negative integer"))
}

fn is_plain_file_name(name: &str) -> bool {
    let path = Utf8Path::new(name);
    !name.is_empty() && path.file_name() == Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[fixture]
    fn configured() -> AtelierConfig {
        let mut config = AtelierConfig::default();
        config.orchestrator.repository = "acme/widgets".to_owned();
        config.orchestrator.reviewer = "octocat".to_owned();
        config
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[rstest]
    fn defaults_validate_once_repository_and_reviewer_are_set(configured: AtelierConfig) {
        let validated = configured.validate().expect("valid configuration");

        assert_eq!(validated.workflow.repository.as_str(), "acme/widgets");
        assert_eq!(
            validated.workflow.clone_url,
            "https://github.com/acme/widgets.git"
        );
        assert_eq!(validated.workflow.base_branch.as_str(), "main");
        assert_eq!(validated.workflow.guidelines_file, "CLAUDE.md");
        assert_eq!(validated.workflow.launch_command, "claude");
        assert_eq!(validated.ttls.workspaces, Duration::from_secs(30));
        assert_eq!(validated.ttls.review_listings, Duration::from_secs(3_600));
        assert!(!validated.simulate_writes);
        assert_eq!(validated.simulated_number_base, 90_000);
    }

    #[test]
    fn repository_is_required() {
        let result = AtelierConfig::default().validate();

        assert!(matches!(result, Err(ConfigError::MissingRepository)));
    }

    #[rstest]
    #[case("../CLAUDE.md")]
    #[case("docs/CLAUDE.md")]
    #[case("")]
    fn guidelines_file_must_be_a_plain_name(mut configured: AtelierConfig, #[case] name: &str) {
        configured.orchestrator.guidelines_file = name.to_owned();

        let result = configured.validate();

        assert!(matches!(result, Err(ConfigError::InvalidGuidelinesFile(_))));
    }

    #[rstest]
    fn zero_ttl_is_rejected(mut configured: AtelierConfig) {
        configured.cache.workspace_ttl_secs = 0;

        let result = configured.validate();

        assert!(matches!(
            result,
            Err(ConfigError::ZeroTtl("workspace_ttl_secs"))
        ));
    }

    #[rstest]
    fn environment_overrides_replace_file_values(mut configured: AtelierConfig) {
        configured
            .apply_overrides(lookup(&[
                ("ATELIER_REPOSITORY", "acme/gadgets"),
                ("ATELIER_SIMULATE_WRITES", "yes"),
                ("ATELIER_SIMULATED_NUMBER_BASE", "500"),
                ("ATELIER_WORKSPACE_TTL_SECS", "5"),
                ("ATELIER_LOG_FORMAT", "json"),
            ]))
            .expect("overrides apply");

        assert_eq!(configured.orchestrator.repository, "acme/gadgets");
        assert!(configured.orchestrator.simulate_writes);
        assert_eq!(configured.orchestrator.simulated_number_base, 500);
        assert_eq!(configured.cache.workspace_ttl_secs, 5);
        assert_eq!(configured.telemetry.format, LogFormat::Json);
    }

    #[rstest]
    #[case("ATELIER_SIMULATE_WRITES", "maybe")]
    #[case("ATELIER_REVIEW_LISTING_TTL_SECS", "-1")]
    #[case("ATELIER_LOG_FORMAT", "xml")]
    fn malformed_overrides_name_the_variable(
        mut configured: AtelierConfig,
        #[case] variable: &str,
        #[case] value: &str,
    ) {
        let result = configured.apply_overrides(lookup(&[(variable, value)]));

        match result {
            Err(ConfigError::InvalidOverride {
                variable: reported, ..
            }) => assert_eq!(reported, variable),
            other => panic!("expected invalid override, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = AtelierConfig::from_json(
            Utf8Path::new("atelier.json"),
            r#"{"orchestrator": {"repo": "acme/widgets"}}"#,
        );

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_reads_the_file_and_tolerates_absence() {
        let temp = TempDir::new().expect("temporary directory");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .expect("temporary directory path should be UTF-8");
        let path = root.join("atelier.json");

        let absent = read_optional(&path).expect("absent file reads");
        assert_eq!(absent, None);

        std::fs::write(
            &path,
            r#"{"orchestrator": {"repository": "acme/widgets", "base_branch": "trunk"}}"#,
        )
        .expect("write configuration");
        let text = read_optional(&path)
            .expect("present file reads")
            .expect("file contents");
        let config = AtelierConfig::from_json(&path, &text).expect("parse configuration");

        assert_eq!(config.orchestrator.repository, "acme/widgets");
        assert_eq!(config.orchestrator.base_branch, "trunk");
        assert_eq!(config.cache, CacheConfig::default());
    }
}
