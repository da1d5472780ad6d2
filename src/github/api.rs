//! Remote query executor interface consumed by the aggregators.

use async_trait::async_trait;

use super::types::{IssueDetail, IssueType, ProjectItemNode, ProjectSummary, RepositoryNode};
use crate::error::DashResult;
use crate::pagination::Page;

/// Read-only queries against the GitHub API.
///
/// Paged methods take the cursor from the previous page (`None` for the first)
/// and return one page. Writes (issue creation, status changes) are not part
/// of this interface.
#[async_trait]
pub trait GitHubApi: Send + Sync {
  /// One page of an organization's repositories, each with up to
  /// `issues_per_repository` of its issues.
  async fn organization_repositories(
    &self,
    org: &str,
    page_size: u32,
    issues_per_repository: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<RepositoryNode>>;

  /// One page of an organization's project boards.
  async fn organization_projects(
    &self,
    org: &str,
    page_size: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<ProjectSummary>>;

  /// One page of a project board's items.
  async fn project_items(
    &self,
    project_id: &str,
    page_size: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<ProjectItemNode>>;

  /// The organization's issue-type taxonomy.
  async fn issue_types(&self, org: &str) -> DashResult<Vec<IssueType>>;

  /// A single issue with its timeline.
  async fn issue_with_timeline(&self, owner: &str, repo: &str, number: u64)
    -> DashResult<IssueDetail>;
}
