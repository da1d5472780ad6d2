//! Cache keys for GitHub resources.

use std::fmt;

/// Deterministic cache key for each cached resource.
///
/// Keys render as `<kind>:<org>` or `<kind>:<owner>/<repo>#<number>`. Owner and
/// organization logins are case-insensitive on GitHub, so they are normalized
/// to lowercase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceKey {
  RepositoryIssues { org: String },
  ProjectBoards { org: String },
  IssueTypes { org: String },
  IssueTimeline { owner: String, repo: String, number: u64 },
  /// Joined view last computed for an organization
  Snapshot { org: String },
}

impl ResourceKey {
  pub fn repository_issues(org: &str) -> Self {
    Self::RepositoryIssues {
      org: normalize_login(org),
    }
  }

  pub fn project_boards(org: &str) -> Self {
    Self::ProjectBoards {
      org: normalize_login(org),
    }
  }

  pub fn issue_types(org: &str) -> Self {
    Self::IssueTypes {
      org: normalize_login(org),
    }
  }

  pub fn issue_timeline(owner: &str, repo: &str, number: u64) -> Self {
    Self::IssueTimeline {
      owner: normalize_login(owner),
      repo: normalize_login(repo),
      number,
    }
  }

  pub fn snapshot(org: &str) -> Self {
    Self::Snapshot {
      org: normalize_login(org),
    }
  }

  /// Every organization-scoped key.
  pub fn for_org(org: &str) -> Vec<Self> {
    vec![
      Self::repository_issues(org),
      Self::project_boards(org),
      Self::issue_types(org),
      Self::snapshot(org),
    ]
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Self::RepositoryIssues { .. } => "repository-issues",
      Self::ProjectBoards { .. } => "project-boards",
      Self::IssueTypes { .. } => "issue-types",
      Self::IssueTimeline { .. } => "issue-timeline",
      Self::Snapshot { .. } => "snapshot",
    }
  }
}

impl fmt::Display for ResourceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::RepositoryIssues { org }
      | Self::ProjectBoards { org }
      | Self::IssueTypes { org }
      | Self::Snapshot { org } => write!(f, "{}:{}", self.kind(), org),
      Self::IssueTimeline {
        owner,
        repo,
        number,
      } => write!(f, "{}:{}/{}#{}", self.kind(), owner, repo, number),
    }
  }
}

/// Normalize a GitHub login or repository name for key construction.
fn normalize_login(login: &str) -> String {
  login.trim().to_lowercase()
}
