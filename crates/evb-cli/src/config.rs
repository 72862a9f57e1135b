//! Repository, identity and output settings shared by every subcommand.

use std::path::PathBuf;

use clap::Args;
use evb_core::reconcile::{DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME, DEFAULT_BRANCH_PREFIX};
use evb_core::BumpSettings;
use git_data::{CommitAuthor, GitDataError, GitHubConfig, RepositoryId, DEFAULT_API_URL};
use release_feed::FeedError;

/// Invalid or missing configuration. Reported with exit code 2.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API token: pass --github-token or set GITHUB_TOKEN")]
    MissingToken,

    #[error("no repository: pass --repository or set GITHUB_REPOSITORY")]
    MissingRepository,

    #[error("invalid repository: {0}")]
    Repository(#[source] GitDataError),

    #[error("invalid release streams: {0}")]
    ReleaseStreams(#[source] FeedError),

    #[error("invalid branch prefix '{0}': expected a non-empty git ref path")]
    BranchPrefix(String),

    #[error("HTTP client could not be configured: {0}")]
    Client(String),
}

#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// API token with contents and pull request write access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,

    /// Repository to open pull requests against, as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY", global = true)]
    pub repository: Option<String>,

    /// REST API root
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Local checkout of the repository
    #[arg(long, default_value = ".", global = true)]
    pub repository_root: PathBuf,

    /// Unity project directory relative to the repository root
    #[arg(long, default_value = "", global = true)]
    pub project_path: String,

    /// First path segment of every branch the bot creates
    #[arg(long, default_value = DEFAULT_BRANCH_PREFIX, global = true)]
    pub pr_prefix: String,

    /// Comma-separated labels for new pull requests
    #[arg(long, value_delimiter = ',', global = true)]
    pub labels: Vec<String>,

    /// Commit author name
    #[arg(long, default_value = DEFAULT_AUTHOR_NAME, global = true)]
    pub bot_name: String,

    /// Commit author email
    #[arg(long, default_value = DEFAULT_AUTHOR_EMAIL, global = true)]
    pub bot_email: String,

    /// File that receives key/value outputs; printed to stdout when unset
    #[arg(long, env = "GITHUB_OUTPUT", global = true)]
    pub github_output: Option<PathBuf>,
}

impl RepoArgs {
    /// Parse the repository identifier.
    pub fn repository_id(&self) -> Result<RepositoryId, ConfigError> {
        let repository = self
            .repository
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or(ConfigError::MissingRepository)?;
        RepositoryId::parse(repository.trim()).map_err(ConfigError::Repository)
    }

    pub fn github_config(&self) -> Result<GitHubConfig, ConfigError> {
        let repository = self.repository_id()?;
        let token = self
            .github_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;
        Ok(GitHubConfig::new(repository, token.trim()).with_api_url(&self.api_url))
    }

    /// Branch prefix with surrounding slashes removed. Rejects prefixes
    /// that would not form a valid branch name under `refs/heads/`.
    pub fn branch_prefix(&self) -> Result<String, ConfigError> {
        let prefix = self.pr_prefix.trim().trim_matches('/');
        let invalid = prefix.is_empty()
            || prefix.contains("..")
            || prefix.contains("//")
            || prefix.contains("@{")
            || prefix.ends_with(".lock")
            || prefix
                .split('/')
                .any(|segment| segment.starts_with('.') || segment.ends_with('.'))
            || prefix.chars().any(|c| {
                c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c)
            });
        if invalid {
            return Err(ConfigError::BranchPrefix(self.pr_prefix.clone()));
        }
        Ok(prefix.to_string())
    }

    pub fn bump_settings(&self) -> Result<BumpSettings, ConfigError> {
        let prefix = self.branch_prefix()?;
        let labels = self
            .labels
            .iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Ok(BumpSettings::default()
            .with_branch_prefix(&prefix)
            .with_author(CommitAuthor::new(&self.bot_name, &self.bot_email))
            .with_labels(labels)
            .with_project_path(&self.project_path))
    }

    /// Local directory holding `ProjectSettings/` and `Packages/`.
    pub fn project_dir(&self) -> PathBuf {
        let relative = self.project_path.trim_matches('/');
        if relative.is_empty() {
            self.repository_root.clone()
        } else {
            self.repository_root.join(relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RepoArgs {
        RepoArgs {
            github_token: Some("t0ken".into()),
            repository: Some("octo/game".into()),
            api_url: DEFAULT_API_URL.into(),
            repository_root: PathBuf::from("/work"),
            project_path: "/game/".into(),
            pr_prefix: "bump/".into(),
            labels: vec!["deps".into(), " ".into(), " unity ".into()],
            bot_name: "bot".into(),
            bot_email: "bot@example.com".into(),
            github_output: None,
        }
    }

    #[test]
    fn test_settings_from_args() {
        let settings = args().bump_settings().unwrap();
        assert_eq!(settings.branch_prefix, "bump");
        assert_eq!(settings.labels, vec!["deps", "unity"]);
        assert_eq!(settings.project_path, "game");
        assert_eq!(settings.author.email, "bot@example.com");
        assert_eq!(args().project_dir(), PathBuf::from("/work/game"));
    }

    #[test]
    fn test_missing_values_are_config_errors() {
        let mut no_token = args();
        no_token.github_token = None;
        assert!(matches!(
            no_token.github_config(),
            Err(ConfigError::MissingToken)
        ));

        let mut no_repo = args();
        no_repo.repository = Some(" ".into());
        assert!(matches!(
            no_repo.github_config(),
            Err(ConfigError::MissingRepository)
        ));

        let mut bad_repo = args();
        bad_repo.repository = Some("octo".into());
        assert!(matches!(
            bad_repo.github_config(),
            Err(ConfigError::Repository(_))
        ));
    }

    #[test]
    fn test_branch_prefix_must_form_a_ref() {
        for bad in ["", "  ", "/", "//", "my bot", "bump..x", "a:b", ".hidden", "x.lock", "a//b"] {
            let mut with_prefix = args();
            with_prefix.pr_prefix = bad.into();
            assert!(
                matches!(with_prefix.bump_settings(), Err(ConfigError::BranchPrefix(_))),
                "{bad:?} should be rejected"
            );
        }

        let mut nested = args();
        nested.pr_prefix = " deps/unity/ ".into();
        assert_eq!(nested.branch_prefix().unwrap(), "deps/unity");
    }

    #[test]
    fn test_github_config_trims_api_url() {
        let mut enterprise = args();
        enterprise.api_url = "https://ghe.example.com/api/v3/".into();
        let config = enterprise.github_config().unwrap();
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.repository.to_string(), "octo/game");
    }
}
