use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueState {
  Open,
  Closed,
}

/// Whether an issue record was read in full from its repository, or pieced
/// together from the partial fields a project board exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
  #[default]
  Full,
  BoardOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
  pub name: String,
  pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
  pub title: String,
  pub number: Option<u64>,
  pub due_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTypeRef {
  pub id: String,
  pub name: String,
}

/// An issue as the dashboard shows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
  /// Global node id, stable across renames and transfers
  pub id: String,
  pub number: u64,
  pub title: String,
  pub body: Option<String>,
  pub url: String,
  pub state: IssueState,
  pub created_at: DateTime<Utc>,
  pub closed_at: Option<DateTime<Utc>>,
  /// `owner/name` of the repository
  pub repository: String,
  pub assignees: Vec<String>,
  pub labels: Vec<Label>,
  pub milestone: Option<Milestone>,
  pub issue_type: Option<IssueTypeRef>,
  /// Project board status, filled in by the join
  #[serde(default)]
  pub project_status: Option<String>,
  #[serde(default)]
  pub completeness: Completeness,
}

/// A repository together with the first page of its issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryNode {
  pub name_with_owner: String,
  pub issues: Vec<Issue>,
  /// Total issues in the repository, which may exceed `issues.len()`
  pub total_issue_count: u64,
}

/// Single-select field definition on a project board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectField {
  pub id: String,
  pub name: String,
  pub options: Vec<FieldOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
  pub id: String,
  pub name: String,
}

/// A project board as listed on its organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub url: String,
  pub closed: bool,
  pub fields: Vec<ProjectField>,
}

/// Issue fields visible through a board item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardIssue {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub url: String,
  pub state: IssueState,
  pub repository: String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub issue_type: Option<IssueTypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemContent {
  Issue(BoardIssue),
  PullRequest,
  DraftIssue,
  /// Content the token is not allowed to see
  Redacted,
}

/// One raw row of a project board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItemNode {
  pub item_id: String,
  pub status_name: Option<String>,
  pub content: ItemContent,
}

/// The "Status" field of a board and its option name -> option id map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusField {
  pub field_id: String,
  pub options: BTreeMap<String, String>,
}

/// An issue placed on a project board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBoardItem {
  pub issue_id: String,
  pub project_id: String,
  pub project_item_id: String,
  pub status_name: Option<String>,
  pub issue: BoardIssue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBoard {
  pub id: String,
  pub number: u64,
  pub title: String,
  pub url: String,
  pub closed: bool,
  pub status_field: Option<StatusField>,
  pub items: Vec<ProjectBoardItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub color: Option<String>,
  pub is_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
  /// GraphQL type name, e.g. "IssueComment" or "LabeledEvent"
  pub kind: String,
  pub actor: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
  pub summary: String,
}

/// Full issue with its activity timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetail {
  pub issue: Issue,
  pub timeline: Vec<TimelineEvent>,
}
