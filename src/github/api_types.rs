//! Serde-deserializable types matching GitHub GraphQL responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{
  BoardIssue, FieldOption, Issue, IssueDetail, IssueState, IssueType, IssueTypeRef,
  ItemContent, Label, Milestone, ProjectField, ProjectItemNode, ProjectSummary, RepositoryNode,
  TimelineEvent,
};
use crate::pagination::Page;

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
  pub data: Option<T>,
  #[serde(default)]
  pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
  pub message: String,
  #[serde(rename = "type")]
  pub kind: Option<String>,
}

impl GraphQlError {
  pub fn describe(&self) -> String {
    match &self.kind {
      Some(kind) => format!("{} ({})", self.message, kind),
      None => self.message.clone(),
    }
  }
}

// ============================================================================
// Connections
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageInfo {
  pub has_next_page: bool,
  pub end_cursor: Option<String>,
}

/// A paged connection. Nodes can be null when the token lacks access to them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConnection<T> {
  pub page_info: ApiPageInfo,
  #[serde(default = "Vec::new")]
  pub nodes: Vec<Option<T>>,
}

impl<T> ApiConnection<T> {
  pub fn into_page<U>(self, convert: impl FnMut(T) -> U) -> Page<U> {
    Page {
      nodes: self.nodes.into_iter().flatten().map(convert).collect(),
      has_next_page: self.page_info.has_next_page,
      end_cursor: self.page_info.end_cursor,
    }
  }
}

/// An unpaged `{ nodes }` list.
#[derive(Debug, Deserialize)]
pub struct ApiNodes<T> {
  #[serde(default = "Vec::new")]
  pub nodes: Vec<Option<T>>,
}

impl<T> ApiNodes<T> {
  pub fn into_vec(self) -> Vec<T> {
    self.nodes.into_iter().flatten().collect()
  }
}

impl<T> Default for ApiNodes<T> {
  fn default() -> Self {
    Self { nodes: Vec::new() }
  }
}

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiLogin {
  pub login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRepositoryRef {
  pub name_with_owner: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiLabel {
  pub name: String,
  pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMilestone {
  pub title: String,
  pub number: Option<u64>,
  pub due_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssueTypeRef {
  pub id: String,
  pub name: String,
}

impl From<ApiIssueTypeRef> for IssueTypeRef {
  fn from(t: ApiIssueTypeRef) -> Self {
    Self { id: t.id, name: t.name }
  }
}

// ============================================================================
// Issue fields - shared by the repository walk and the timeline query
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIssue {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub body: Option<String>,
  pub url: String,
  pub state: IssueState,
  pub created_at: DateTime<Utc>,
  pub closed_at: Option<DateTime<Utc>>,
  pub repository: ApiRepositoryRef,
  #[serde(default)]
  pub assignees: Option<ApiNodes<ApiLogin>>,
  #[serde(default)]
  pub labels: Option<ApiNodes<ApiLabel>>,
  pub milestone: Option<ApiMilestone>,
  pub issue_type: Option<ApiIssueTypeRef>,
}

impl ApiIssue {
  pub fn into_issue(self) -> Issue {
    Issue {
      id: self.id,
      number: self.number,
      title: self.title,
      body: self.body.filter(|b| !b.is_empty()),
      url: self.url,
      state: self.state,
      created_at: self.created_at,
      closed_at: self.closed_at,
      repository: self.repository.name_with_owner,
      assignees: self
        .assignees
        .unwrap_or_default()
        .into_vec()
        .into_iter()
        .map(|a| a.login)
        .collect(),
      labels: self
        .labels
        .unwrap_or_default()
        .into_vec()
        .into_iter()
        .map(|l| Label {
          name: l.name,
          color: l.color,
        })
        .collect(),
      milestone: self.milestone.map(|m| Milestone {
        title: m.title,
        number: m.number,
        due_on: m.due_on,
      }),
      issue_type: self.issue_type.map(IssueTypeRef::from),
      project_status: None,
      completeness: Default::default(),
    }
  }
}

// ============================================================================
// Organization repositories
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OrganizationRepositoriesData {
  pub organization: Option<ApiOrganizationRepositories>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOrganizationRepositories {
  pub repositories: ApiConnection<ApiRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRepository {
  pub name_with_owner: String,
  pub issues: ApiIssueConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIssueConnection {
  pub total_count: u64,
  #[serde(default = "Vec::new")]
  pub nodes: Vec<Option<ApiIssue>>,
}

impl ApiRepository {
  pub fn into_node(self) -> RepositoryNode {
    RepositoryNode {
      name_with_owner: self.name_with_owner,
      issues: self
        .issues
        .nodes
        .into_iter()
        .flatten()
        .map(ApiIssue::into_issue)
        .collect(),
      total_issue_count: self.issues.total_count,
    }
  }
}

// ============================================================================
// Organization projects
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OrganizationProjectsData {
  pub organization: Option<ApiOrganizationProjects>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOrganizationProjects {
  #[serde(rename = "projectsV2")]
  pub projects: ApiConnection<ApiProject>,
}

#[derive(Debug, Deserialize)]
pub struct ApiProject {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub url: String,
  pub closed: bool,
  #[serde(default)]
  pub fields: ApiNodes<ApiProjectField>,
}

/// Fields that are not single-select come back as empty objects.
#[derive(Debug, Deserialize)]
pub struct ApiProjectField {
  pub id: Option<String>,
  pub name: Option<String>,
  pub options: Option<Vec<ApiFieldOption>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiFieldOption {
  pub id: String,
  pub name: String,
}

impl ApiProject {
  pub fn into_summary(self) -> ProjectSummary {
    let fields = self
      .fields
      .into_vec()
      .into_iter()
      .filter_map(|f| match (f.id, f.name, f.options) {
        (Some(id), Some(name), Some(options)) => Some(ProjectField {
          id,
          name,
          options: options
            .into_iter()
            .map(|o| FieldOption {
              id: o.id,
              name: o.name,
            })
            .collect(),
        }),
        _ => None,
      })
      .collect();

    ProjectSummary {
      id: self.id,
      number: self.number,
      title: self.title,
      url: self.url,
      closed: self.closed,
      fields,
    }
  }
}

// ============================================================================
// Project items
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProjectItemsData {
  pub node: Option<ApiProjectItems>,
}

/// `items` is absent when the node id does not refer to a project.
#[derive(Debug, Deserialize)]
pub struct ApiProjectItems {
  pub items: Option<ApiConnection<ApiProjectItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProjectItem {
  pub id: String,
  pub field_value_by_name: Option<ApiStatusValue>,
  pub content: Option<ApiItemContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatusValue {
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum ApiItemContent {
  Issue(ApiBoardIssue),
  PullRequest,
  DraftIssue,
  #[serde(other)]
  Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBoardIssue {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub url: String,
  pub state: IssueState,
  pub created_at: DateTime<Utc>,
  pub repository: ApiRepositoryRef,
  pub issue_type: Option<ApiIssueTypeRef>,
}

impl ApiProjectItem {
  pub fn into_node(self) -> ProjectItemNode {
    let content = match self.content {
      Some(ApiItemContent::Issue(issue)) => ItemContent::Issue(BoardIssue {
        id: issue.id,
        number: issue.number,
        title: issue.title,
        url: issue.url,
        state: issue.state,
        repository: issue.repository.name_with_owner,
        created_at: issue.created_at,
        issue_type: issue.issue_type.map(IssueTypeRef::from),
      }),
      Some(ApiItemContent::PullRequest) => ItemContent::PullRequest,
      Some(ApiItemContent::DraftIssue) => ItemContent::DraftIssue,
      Some(ApiItemContent::Other) | None => ItemContent::Redacted,
    };

    ProjectItemNode {
      item_id: self.id,
      status_name: self.field_value_by_name.and_then(|v| v.name),
      content,
    }
  }
}

// ============================================================================
// Issue types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IssueTypesData {
  pub organization: Option<ApiOrganizationIssueTypes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrganizationIssueTypes {
  pub issue_types: Option<ApiNodes<ApiIssueType>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIssueType {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub color: Option<String>,
  #[serde(default = "enabled_by_default")]
  pub is_enabled: bool,
}

fn enabled_by_default() -> bool {
  true
}

impl From<ApiIssueType> for IssueType {
  fn from(t: ApiIssueType) -> Self {
    IssueType {
      id: t.id,
      name: t.name,
      description: t.description.filter(|d| !d.is_empty()),
      color: t.color,
      is_enabled: t.is_enabled,
    }
  }
}

// ============================================================================
// Issue with timeline
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IssueWithTimelineData {
  pub repository: Option<ApiRepositoryIssue>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRepositoryIssue {
  pub issue: Option<ApiIssueWithTimeline>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIssueWithTimeline {
  #[serde(flatten)]
  pub issue: ApiIssue,
  #[serde(default)]
  pub timeline_items: ApiNodes<ApiTimelineItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLabelName {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiAssignee {
  pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiReferenceSource {
  #[serde(rename = "__typename")]
  pub typename: String,
  pub number: Option<u64>,
  pub title: Option<String>,
}

/// Union of the timeline item shapes requested; unrequested kinds carry only
/// their type name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTimelineItem {
  #[serde(rename = "__typename")]
  pub typename: String,
  pub created_at: Option<DateTime<Utc>>,
  pub author: Option<ApiLogin>,
  pub actor: Option<ApiLogin>,
  pub body: Option<String>,
  pub label: Option<ApiLabelName>,
  pub assignee: Option<ApiAssignee>,
  pub previous_title: Option<String>,
  pub current_title: Option<String>,
  pub source: Option<ApiReferenceSource>,
}

impl ApiTimelineItem {
  pub fn into_event(self) -> TimelineEvent {
    let summary = match self.typename.as_str() {
      "IssueComment" => first_line(self.body.as_deref().unwrap_or_default()),
      "LabeledEvent" => format!("added label {}", label_name(&self.label)),
      "UnlabeledEvent" => format!("removed label {}", label_name(&self.label)),
      "AssignedEvent" => format!("assigned {}", assignee_login(&self.assignee)),
      "UnassignedEvent" => format!("unassigned {}", assignee_login(&self.assignee)),
      "ClosedEvent" => "closed".to_string(),
      "ReopenedEvent" => "reopened".to_string(),
      "RenamedTitleEvent" => format!(
        "renamed from \"{}\" to \"{}\"",
        self.previous_title.as_deref().unwrap_or_default(),
        self.current_title.as_deref().unwrap_or_default()
      ),
      "CrossReferencedEvent" => match &self.source {
        Some(source) => format!(
          "referenced from {} #{} {}",
          source.typename,
          source.number.unwrap_or_default(),
          source.title.as_deref().unwrap_or_default()
        ),
        None => "referenced".to_string(),
      },
      other => other.to_string(),
    };

    TimelineEvent {
      kind: self.typename,
      actor: self.author.or(self.actor).map(|a| a.login),
      created_at: self.created_at,
      summary,
    }
  }
}

impl ApiIssueWithTimeline {
  pub fn into_detail(self) -> IssueDetail {
    IssueDetail {
      issue: self.issue.into_issue(),
      timeline: self
        .timeline_items
        .into_vec()
        .into_iter()
        .map(ApiTimelineItem::into_event)
        .collect(),
    }
  }
}

fn label_name(label: &Option<ApiLabelName>) -> &str {
  label.as_ref().map(|l| l.name.as_str()).unwrap_or("?")
}

fn assignee_login(assignee: &Option<ApiAssignee>) -> &str {
  assignee
    .as_ref()
    .and_then(|a| a.login.as_deref())
    .unwrap_or("?")
}

fn first_line(text: &str) -> String {
  text.lines().next().unwrap_or_default().trim().to_string()
}
