//! Scripted in-memory [`GitHubApi`] for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::api::GitHubApi;
use super::types::{IssueDetail, IssueType, ProjectItemNode, ProjectSummary, RepositoryNode};
use crate::error::{DashError, DashResult};
use crate::pagination::Page;

#[derive(Default)]
struct MockData {
  repository_pages: Vec<Vec<RepositoryNode>>,
  project_pages: Vec<Vec<ProjectSummary>>,
  item_pages: HashMap<String, Vec<Vec<ProjectItemNode>>>,
  issue_types: Vec<IssueType>,
  timelines: HashMap<String, IssueDetail>,
}

/// Serves pre-built pages. Cursors are `cursor-<index>` of the next page.
#[derive(Default)]
pub struct MockGitHubApi {
  data: Mutex<MockData>,
  calls: Mutex<Vec<String>>,
  failing: AtomicBool,
}

impl MockGitHubApi {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_repository_pages(self, pages: Vec<Vec<RepositoryNode>>) -> Self {
    self.data.lock().unwrap().repository_pages = pages;
    self
  }

  pub fn with_project_pages(self, pages: Vec<Vec<ProjectSummary>>) -> Self {
    self.data.lock().unwrap().project_pages = pages;
    self
  }

  pub fn with_item_pages(self, project_id: &str, pages: Vec<Vec<ProjectItemNode>>) -> Self {
    self
      .data
      .lock()
      .unwrap()
      .item_pages
      .insert(project_id.to_string(), pages);
    self
  }

  pub fn with_issue_types(self, types: Vec<IssueType>) -> Self {
    self.set_issue_types(types);
    self
  }

  pub fn with_timeline(self, owner: &str, repo: &str, number: u64, detail: IssueDetail) -> Self {
    self
      .data
      .lock()
      .unwrap()
      .timelines
      .insert(format!("{}/{}#{}", owner, repo, number), detail);
    self
  }

  pub fn set_issue_types(&self, types: Vec<IssueType>) {
    self.data.lock().unwrap().issue_types = types;
  }

  pub fn set_repository_pages(&self, pages: Vec<Vec<RepositoryNode>>) {
    self.data.lock().unwrap().repository_pages = pages;
  }

  /// Make every subsequent call fail with a transport error.
  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  /// Number of calls made to `method`.
  pub fn calls(&self, method: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.as_str() == method)
      .count()
  }

  fn record(&self, method: &str) -> DashResult<()> {
    self.calls.lock().unwrap().push(method.to_string());
    if self.failing.load(Ordering::SeqCst) {
      return Err(DashError::Transport(format!("{} unavailable", method)));
    }
    Ok(())
  }
}

fn page_at<T: Clone>(pages: &[Vec<T>], cursor: Option<String>) -> DashResult<Page<T>> {
  let index = match cursor {
    None => 0,
    Some(c) => c
      .strip_prefix("cursor-")
      .and_then(|i| i.parse::<usize>().ok())
      .ok_or_else(|| DashError::RemoteQuery(format!("bad cursor {}", c)))?,
  };

  let nodes = pages.get(index).cloned().unwrap_or_default();
  let has_next_page = index + 1 < pages.len();
  Ok(Page {
    nodes,
    has_next_page,
    end_cursor: has_next_page.then(|| format!("cursor-{}", index + 1)),
  })
}

#[async_trait]
impl GitHubApi for MockGitHubApi {
  async fn organization_repositories(
    &self,
    _org: &str,
    _page_size: u32,
    _issues_per_repository: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<RepositoryNode>> {
    self.record("organization_repositories")?;
    page_at(&self.data.lock().unwrap().repository_pages, cursor)
  }

  async fn organization_projects(
    &self,
    _org: &str,
    _page_size: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<ProjectSummary>> {
    self.record("organization_projects")?;
    page_at(&self.data.lock().unwrap().project_pages, cursor)
  }

  async fn project_items(
    &self,
    project_id: &str,
    _page_size: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<ProjectItemNode>> {
    self.record("project_items")?;
    let data = self.data.lock().unwrap();
    let pages = data
      .item_pages
      .get(project_id)
      .ok_or_else(|| DashError::RemoteQuery(format!("project {} not found", project_id)))?;
    page_at(pages, cursor)
  }

  async fn issue_types(&self, _org: &str) -> DashResult<Vec<IssueType>> {
    self.record("issue_types")?;
    Ok(self.data.lock().unwrap().issue_types.clone())
  }

  async fn issue_with_timeline(
    &self,
    owner: &str,
    repo: &str,
    number: u64,
  ) -> DashResult<IssueDetail> {
    self.record("issue_with_timeline")?;
    self
      .data
      .lock()
      .unwrap()
      .timelines
      .get(&format!("{}/{}#{}", owner, repo, number))
      .cloned()
      .ok_or_else(|| DashError::RemoteQuery(format!("issue {}/{}#{} not found", owner, repo, number)))
  }
}
