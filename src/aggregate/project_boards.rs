//! Project boards of an organization, with the issues placed on them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::{CacheLayer, CacheResult, FetchOptions};
use crate::config::LimitsConfig;
use crate::error::DashResult;
use crate::github::types::{
  ItemContent, ProjectBoard, ProjectBoardItem, ProjectField, ProjectSummary, StatusField,
};
use crate::github::{GitHubApi, ResourceKey};
use crate::pagination::paginate;

const STATUS_FIELD_NAME: &str = "Status";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBoards {
  pub boards: Vec<ProjectBoard>,
}

impl ProjectBoards {
  pub fn item_count(&self) -> usize {
    self.boards.iter().map(|b| b.items.len()).sum()
  }
}

#[derive(Clone)]
pub struct ProjectBoardAggregator {
  api: Arc<dyn GitHubApi>,
  layer: CacheLayer,
  limits: LimitsConfig,
  ttl: Duration,
}

impl ProjectBoardAggregator {
  pub fn new(api: Arc<dyn GitHubApi>, layer: CacheLayer, limits: LimitsConfig, ttl: Duration) -> Self {
    Self {
      api,
      layer,
      limits,
      ttl,
    }
  }

  pub async fn fetch(
    &self,
    org: &str,
    options: FetchOptions<ProjectBoards>,
  ) -> DashResult<CacheResult<ProjectBoards>> {
    let key = ResourceKey::project_boards(org).to_string();
    let api = Arc::clone(&self.api);
    let org = org.to_string();
    let limits = self.limits.clone();

    self
      .layer
      .fetch(&key, self.ttl, options, move || {
        collect_project_boards(api, org, limits)
      })
      .await
  }
}

async fn collect_project_boards(
  api: Arc<dyn GitHubApi>,
  org: String,
  limits: LimitsConfig,
) -> DashResult<ProjectBoards> {
  let page_size = limits.project_page_size;
  let projects = paginate(None, |cursor| {
    let api = Arc::clone(&api);
    let org = org.clone();
    async move { api.organization_projects(&org, page_size, cursor).await }
  })
  .await?;

  // Boards are walked one after another so at most one request is in flight.
  let mut boards = Vec::with_capacity(projects.nodes.len());
  for project in projects.nodes {
    boards.push(collect_board(api.as_ref(), project, limits.item_page_size).await?);
  }

  let collected = ProjectBoards { boards };
  info!(
    org = %org,
    boards = collected.boards.len(),
    items = collected.item_count(),
    "project boards collected"
  );
  Ok(collected)
}

async fn collect_board(
  api: &dyn GitHubApi,
  project: ProjectSummary,
  page_size: u32,
) -> DashResult<ProjectBoard> {
  let project_id = project.id.as_str();
  let walk = paginate(None, move |cursor| {
    api.project_items(project_id, page_size, cursor)
  })
  .await?;

  let status_field = discover_status_field(&project.fields);
  if status_field.is_none() {
    debug!(project = %project.title, "board has no Status field");
  }

  let total = walk.nodes.len();
  let items: Vec<ProjectBoardItem> = walk
    .nodes
    .into_iter()
    .filter_map(|node| match node.content {
      ItemContent::Issue(issue) => Some(ProjectBoardItem {
        issue_id: issue.id.clone(),
        project_id: project.id.clone(),
        project_item_id: node.item_id,
        status_name: node.status_name,
        issue,
      }),
      ItemContent::PullRequest | ItemContent::DraftIssue | ItemContent::Redacted => None,
    })
    .collect();

  debug!(
    project = %project.title,
    items = items.len(),
    skipped = total - items.len(),
    "board items collected"
  );

  Ok(ProjectBoard {
    id: project.id,
    number: project.number,
    title: project.title,
    url: project.url,
    closed: project.closed,
    status_field,
    items,
  })
}

/// First single-select field named "Status", with its option name -> id map.
fn discover_status_field(fields: &[ProjectField]) -> Option<StatusField> {
  fields
    .iter()
    .find(|f| f.name.eq_ignore_ascii_case(STATUS_FIELD_NAME))
    .map(|f| StatusField {
      field_id: f.id.clone(),
      options: f
        .options
        .iter()
        .map(|o| (o.name.clone(), o.id.clone()))
        .collect(),
    })
}
