//! Attaches project-board status to repository issues.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::aggregate::{ProjectBoards, RepositoryIssues, Truncation};
use crate::github::types::{Completeness, Issue, ProjectBoard, ProjectBoardItem};

/// Which board decides an issue's status when it sits on more than one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusConflictPolicy {
  /// Boards are processed in listing order; the last one seen wins
  #[default]
  LastBoardWins,
  /// The first board that lists the issue wins
  FirstBoardWins,
  /// Boards matched (by id or title) earlier in the list win; unlisted boards
  /// rank below all listed ones and fall back to last-wins among themselves
  BoardPriority(Vec<String>),
}

impl StatusConflictPolicy {
  fn rank(&self, board: &ProjectBoard) -> usize {
    match self {
      Self::BoardPriority(order) => order
        .iter()
        .position(|key| key == &board.id || key.eq_ignore_ascii_case(&board.title))
        .unwrap_or(usize::MAX),
      Self::LastBoardWins | Self::FirstBoardWins => 0,
    }
  }

  fn replaces(&self, current_rank: usize, candidate_rank: usize) -> bool {
    match self {
      Self::LastBoardWins => true,
      Self::FirstBoardWins => false,
      Self::BoardPriority(_) => candidate_rank <= current_rank,
    }
  }
}

/// An issue whose boards disagree about its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConflict {
  pub issue_id: String,
  /// `(board title, status)` in board order
  pub candidates: Vec<(String, Option<String>)>,
  pub chosen: Option<String>,
}

/// The merged, display-ready issue list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedView {
  /// Repository issues in their original order, then board-only issues in
  /// order of first appearance on a board
  pub issues: Vec<Issue>,
  pub board_only_count: usize,
  pub conflicts: Vec<StatusConflict>,
  pub truncation: Truncation,
}

struct StatusChoice<'a> {
  status: Option<String>,
  rank: usize,
  item: &'a ProjectBoardItem,
}

/// Merge board status into repository issues and synthesize records for
/// issues that only appear on boards. Always recomputes from scratch.
pub fn join(
  repository: &RepositoryIssues,
  boards: &ProjectBoards,
  policy: &StatusConflictPolicy,
) -> JoinedView {
  let mut chosen: HashMap<&str, StatusChoice<'_>> = HashMap::new();
  let mut seen: HashMap<&str, Vec<(String, Option<String>)>> = HashMap::new();
  let mut board_order: Vec<&str> = Vec::new();

  for board in &boards.boards {
    let rank = policy.rank(board);

    for item in &board.items {
      let id = item.issue_id.as_str();
      seen
        .entry(id)
        .or_default()
        .push((board.title.clone(), item.status_name.clone()));

      match chosen.get_mut(id) {
        Some(current) => {
          if policy.replaces(current.rank, rank) {
            *current = StatusChoice {
              status: item.status_name.clone(),
              rank,
              item,
            };
          }
        }
        None => {
          board_order.push(id);
          chosen.insert(
            id,
            StatusChoice {
              status: item.status_name.clone(),
              rank,
              item,
            },
          );
        }
      }
    }
  }

  let mut issues: Vec<Issue> = repository
    .issues
    .iter()
    .map(|issue| Issue {
      project_status: chosen.get(issue.id.as_str()).and_then(|c| c.status.clone()),
      ..issue.clone()
    })
    .collect();

  let known: HashSet<&str> = repository.issues.iter().map(|i| i.id.as_str()).collect();
  let mut board_only_count = 0;
  for id in &board_order {
    if known.contains(id) {
      continue;
    }
    if let Some(choice) = chosen.get(id) {
      issues.push(synthesize(choice.item, choice.status.clone()));
      board_only_count += 1;
    }
  }

  let mut conflicts: Vec<StatusConflict> = board_order
    .iter()
    .filter_map(|id| {
      let candidates = seen.get(id)?;
      let first = &candidates.first()?.1;
      if candidates.iter().all(|(_, status)| status == first) {
        return None;
      }
      Some(StatusConflict {
        issue_id: id.to_string(),
        candidates: candidates.clone(),
        chosen: chosen.get(id).and_then(|c| c.status.clone()),
      })
    })
    .collect();
  conflicts.sort_by(|a, b| a.issue_id.cmp(&b.issue_id));

  JoinedView {
    issues,
    board_only_count,
    conflicts,
    truncation: repository.truncation.clone(),
  }
}

/// Minimal issue built from what a board item exposes.
fn synthesize(item: &ProjectBoardItem, status: Option<String>) -> Issue {
  let issue = &item.issue;
  Issue {
    id: issue.id.clone(),
    number: issue.number,
    title: issue.title.clone(),
    body: None,
    url: issue.url.clone(),
    state: issue.state,
    created_at: issue.created_at,
    closed_at: None,
    repository: issue.repository.clone(),
    assignees: Vec::new(),
    labels: Vec::new(),
    milestone: None,
    issue_type: issue.issue_type.clone(),
    project_status: status,
    completeness: Completeness::BoardOnly,
  }
}
