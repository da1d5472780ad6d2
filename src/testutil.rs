//! Shared fixtures for unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;
use std::time::Duration;

use crate::cache::{Clock, KvStore};
use crate::error::StoreError;
use crate::github::types::{
  BoardIssue, FieldOption, Issue, IssueState, ItemContent, ProjectField, ProjectItemNode,
  ProjectSummary, RepositoryNode,
};

/// Clock that only moves when told to.
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
  fn default() -> Self {
    Self {
      now: Mutex::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
    }
  }
}

impl ManualClock {
  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock().unwrap();
    *now += chrono::Duration::from_std(by).unwrap();
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap()
  }
}

/// Store whose every operation fails, like a disabled or full disk.
pub struct FailingStore;

#[async_trait]
impl KvStore for FailingStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Err(StoreError::Read {
      key: key.to_string(),
      message: "disk I/O error".to_string(),
    })
  }

  async fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
    Err(StoreError::Write {
      key: key.to_string(),
      message: "quota exceeded".to_string(),
    })
  }

  async fn delete(&self, _key: &str) -> Result<(), StoreError> {
    Err(StoreError::Unavailable("storage disabled".to_string()))
  }
}

fn created_at() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

pub fn issue(id: &str) -> Issue {
  Issue {
    id: id.to_string(),
    number: 1,
    title: format!("Issue {}", id),
    body: None,
    url: format!("https://github.com/acme/widgets/issues/{}", id),
    state: IssueState::Open,
    created_at: created_at(),
    closed_at: None,
    repository: "acme/widgets".to_string(),
    assignees: vec!["octocat".to_string()],
    labels: Vec::new(),
    milestone: None,
    issue_type: None,
    project_status: None,
    completeness: Default::default(),
  }
}

pub fn repository(name: &str, issues: Vec<Issue>, total_issue_count: u64) -> RepositoryNode {
  RepositoryNode {
    name_with_owner: format!("acme/{}", name),
    issues,
    total_issue_count,
  }
}

pub fn board_issue(id: &str) -> BoardIssue {
  BoardIssue {
    id: id.to_string(),
    number: 99,
    title: format!("Board issue {}", id),
    url: format!("https://github.com/acme/elsewhere/issues/{}", id),
    state: IssueState::Open,
    repository: "acme/elsewhere".to_string(),
    created_at: created_at(),
    issue_type: None,
  }
}

/// A board with a "Status" field offering `statuses`.
pub fn project(id: &str, title: &str, statuses: &[&str]) -> ProjectSummary {
  ProjectSummary {
    id: id.to_string(),
    number: 1,
    title: title.to_string(),
    url: format!("https://github.com/orgs/acme/projects/{}", id),
    closed: false,
    fields: vec![ProjectField {
      id: format!("{}-status", id),
      name: "Status".to_string(),
      options: statuses
        .iter()
        .enumerate()
        .map(|(i, name)| FieldOption {
          id: format!("{}-opt-{}", id, i),
          name: name.to_string(),
        })
        .collect(),
    }],
  }
}

pub fn item(item_id: &str, issue_id: &str, status: Option<&str>) -> ProjectItemNode {
  ProjectItemNode {
    item_id: item_id.to_string(),
    status_name: status.map(String::from),
    content: ItemContent::Issue(board_issue(issue_id)),
  }
}
