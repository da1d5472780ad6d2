//! Plain-text rendering for command output.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::aggregate::ProjectBoards;
use crate::cache::CacheSource;
use crate::github::types::{Completeness, IssueDetail, IssueState, IssueType};
use crate::join::JoinedView;

const TITLE_WIDTH: usize = 60;

/// Truncate a string to `max_len` characters, ending in "..." when cut.
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

fn state_label(state: IssueState) -> &'static str {
  match state {
    IssueState::Open => "open",
    IssueState::Closed => "closed",
  }
}

/// One-line note on where the data came from.
pub fn source_line(source: CacheSource, cached_at: Option<DateTime<Utc>>) -> String {
  match (source, cached_at) {
    (CacheSource::Network, _) | (_, None) => "fetched from GitHub".to_string(),
    (CacheSource::CacheFresh, Some(at)) => format!("cached at {}", at.format("%Y-%m-%d %H:%M UTC")),
    (CacheSource::CacheStale, Some(at)) => format!(
      "cached at {} (stale, refreshing)",
      at.format("%Y-%m-%d %H:%M UTC")
    ),
  }
}

pub fn render_view(view: &JoinedView) -> String {
  let mut out = String::new();

  for issue in &view.issues {
    let status = issue.project_status.as_deref().unwrap_or("-");
    let marker = match issue.completeness {
      Completeness::Full => "",
      Completeness::BoardOnly => " [board only]",
    };
    let _ = writeln!(
      out,
      "{:<30} #{:<6} {:<7} {:<14} {}{}",
      truncate(&issue.repository, 30),
      issue.number,
      state_label(issue.state),
      truncate(status, 14),
      truncate(&issue.title, TITLE_WIDTH),
      marker
    );
  }

  let _ = writeln!(
    out,
    "\n{} issues ({} only on boards)",
    view.issues.len(),
    view.board_only_count
  );

  for conflict in &view.conflicts {
    let candidates: Vec<String> = conflict
      .candidates
      .iter()
      .map(|(board, status)| format!("{}={}", board, status.as_deref().unwrap_or("-")))
      .collect();
    let _ = writeln!(
      out,
      "status conflict on {}: {} -> {}",
      conflict.issue_id,
      candidates.join(", "),
      conflict.chosen.as_deref().unwrap_or("-")
    );
  }

  let truncation = &view.truncation;
  if !truncation.is_truncated() {
    return out;
  }
  if truncation.repositories_capped {
    let _ = writeln!(out, "warning: repository page cap reached, some repositories are missing");
  }
  if !truncation.truncated_repositories.is_empty() {
    let _ = writeln!(
      out,
      "warning: only the first issues were read from: {}",
      truncation.truncated_repositories.join(", ")
    );
  }

  out
}

pub fn render_boards(boards: &ProjectBoards) -> String {
  let mut out = String::new();
  for board in &boards.boards {
    let _ = writeln!(
      out,
      "#{} {}{} ({} issues)",
      board.number,
      board.title,
      if board.closed { " [closed]" } else { "" },
      board.items.len()
    );
    match &board.status_field {
      Some(field) => {
        let names: Vec<&str> = field.options.keys().map(String::as_str).collect();
        let _ = writeln!(out, "  statuses: {}", names.join(", "));
      }
      None => {
        let _ = writeln!(out, "  no Status field");
      }
    }
    for item in &board.items {
      let _ = writeln!(
        out,
        "  {:<14} {}#{} {}",
        truncate(item.status_name.as_deref().unwrap_or("-"), 14),
        item.issue.repository,
        item.issue.number,
        truncate(&item.issue.title, TITLE_WIDTH)
      );
    }
  }
  out
}

pub fn render_issue_types(types: &[IssueType]) -> String {
  let mut out = String::new();
  for issue_type in types {
    let _ = writeln!(
      out,
      "{:<20} {:<8} {}{}",
      issue_type.name,
      issue_type.color.as_deref().unwrap_or("-"),
      issue_type.description.as_deref().unwrap_or(""),
      if issue_type.is_enabled { "" } else { " (disabled)" }
    );
  }
  out
}

pub fn render_issue(detail: &IssueDetail) -> String {
  let issue = &detail.issue;
  let mut out = String::new();

  let _ = writeln!(out, "{}#{} {}", issue.repository, issue.number, issue.title);
  let _ = writeln!(out, "{} | {}", state_label(issue.state), issue.url);
  if !issue.assignees.is_empty() {
    let _ = writeln!(out, "assignees: {}", issue.assignees.join(", "));
  }
  if !issue.labels.is_empty() {
    let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
    let _ = writeln!(out, "labels: {}", labels.join(", "));
  }
  if let Some(issue_type) = &issue.issue_type {
    let _ = writeln!(out, "type: {}", issue_type.name);
  }
  if let Some(body) = issue.body.as_deref().filter(|b| !b.trim().is_empty()) {
    let _ = writeln!(out, "\n{}", body.trim());
  }

  if !detail.timeline.is_empty() {
    let _ = writeln!(out, "\ntimeline:");
  }
  for event in &detail.timeline {
    let when = event
      .created_at
      .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
      .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
      out,
      "  {} {:<12} {}",
      when,
      truncate(event.actor.as_deref().unwrap_or("ghost"), 12),
      event.summary
    );
  }

  out
}
