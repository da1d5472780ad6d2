use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::join::StatusConflictPolicy;

pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// GitHub caps `first:` on connections at 100.
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub github: GitHubConfig,
  /// Organization used when none is given on the command line
  pub default_org: Option<String>,
  pub cache: CacheConfig,
  pub limits: LimitsConfig,
  /// How to pick a status when an issue sits on several boards
  pub status_conflict: StatusConflictMode,
  /// Board ids or titles, highest priority first (used with `status_conflict: priority`)
  pub status_priority: Vec<String>,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
  /// GraphQL endpoint (GitHub Enterprise Server uses https://HOST/api/graphql)
  pub url: String,
}

impl Default for GitHubConfig {
  fn default() -> Self {
    Self {
      url: DEFAULT_GRAPHQL_URL.to_string(),
    }
  }
}

impl GitHubConfig {
  pub fn endpoint(&self) -> Result<Url> {
    Url::parse(&self.url).map_err(|e| eyre!("Invalid GitHub GraphQL URL {}: {}", self.url, e))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  /// Cache database path (default: $XDG_DATA_HOME/orgdash/cache.db)
  pub path: Option<PathBuf>,
  /// Lifetime of low-volatility data: issue types, single-issue timelines
  pub long_ttl_secs: u64,
  /// Lifetime of organization-wide snapshots
  pub short_ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
      long_ttl_secs: 24 * 60 * 60,
      short_ttl_secs: 10 * 60,
    }
  }
}

impl CacheConfig {
  pub fn long_ttl(&self) -> Duration {
    Duration::from_secs(self.long_ttl_secs)
  }

  pub fn short_ttl(&self) -> Duration {
    Duration::from_secs(self.short_ttl_secs)
  }
}

/// Request-volume bounds for the organization walks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
  pub repository_page_size: u32,
  /// Stop the repository walk after this many pages (`null` walks everything)
  pub max_repository_pages: Option<usize>,
  /// Issues read per repository; repositories with more are reported as truncated
  pub issues_per_repository: u32,
  pub project_page_size: u32,
  pub item_page_size: u32,
}

impl Default for LimitsConfig {
  fn default() -> Self {
    Self {
      repository_page_size: 30,
      max_repository_pages: Some(4),
      issues_per_repository: 100,
      project_page_size: 20,
      item_page_size: 100,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusConflictMode {
  /// The board processed last decides
  #[default]
  Last,
  /// The board processed first decides
  First,
  /// The board listed earliest in `status_priority` decides
  Priority,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Default filter when ORGDASH_LOG is unset
  pub level: String,
  /// Log directory (default: $XDG_DATA_HOME/orgdash/logs)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./orgdash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/orgdash/config.yaml
  ///
  /// Without any file, defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("orgdash.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("orgdash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is valid and means "all defaults".
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  pub fn validate(&self) -> Result<()> {
    self.github.endpoint()?;

    let limits = &self.limits;
    for (name, value) in [
      ("repository_page_size", limits.repository_page_size),
      ("issues_per_repository", limits.issues_per_repository),
      ("project_page_size", limits.project_page_size),
      ("item_page_size", limits.item_page_size),
    ] {
      if value == 0 || value > MAX_PAGE_SIZE {
        return Err(eyre!(
          "limits.{} must be between 1 and {}, got {}",
          name,
          MAX_PAGE_SIZE,
          value
        ));
      }
    }

    if limits.max_repository_pages == Some(0) {
      return Err(eyre!("limits.max_repository_pages must be at least 1"));
    }

    if self.status_conflict == StatusConflictMode::Priority && self.status_priority.is_empty() {
      return Err(eyre!(
        "status_conflict is 'priority' but status_priority lists no boards"
      ));
    }

    Ok(())
  }

  pub fn status_policy(&self) -> StatusConflictPolicy {
    match self.status_conflict {
      StatusConflictMode::Last => StatusConflictPolicy::LastBoardWins,
      StatusConflictMode::First => StatusConflictPolicy::FirstBoardWins,
      StatusConflictMode::Priority => {
        StatusConflictPolicy::BoardPriority(self.status_priority.clone())
      }
    }
  }

  /// Get the GitHub token from environment variables.
  ///
  /// Checks ORGDASH_GITHUB_TOKEN first, then GITHUB_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("ORGDASH_GITHUB_TOKEN")
      .or_else(|_| std::env::var("GITHUB_TOKEN"))
      .map_err(|_| {
        eyre!("GitHub token not found. Set ORGDASH_GITHUB_TOKEN or GITHUB_TOKEN environment variable.")
      })
  }
}
