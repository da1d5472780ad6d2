//! Single issue with its timeline.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheLayer, CacheResult, FetchOptions};
use crate::error::DashResult;
use crate::github::types::IssueDetail;
use crate::github::{GitHubApi, ResourceKey};

/// `owner/repo#number`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
  pub owner: String,
  pub repo: String,
  pub number: u64,
}

impl FromStr for IssueRef {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || format!("expected owner/repo#number, got '{}'", s);

    let (path, number) = s.trim().split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = path.split_once('/').ok_or_else(invalid)?;
    let number = number.parse::<u64>().map_err(|_| invalid())?;

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
      return Err(invalid());
    }

    Ok(Self {
      owner: owner.to_string(),
      repo: repo.to_string(),
      number,
    })
  }
}

impl fmt::Display for IssueRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
  }
}

#[derive(Clone)]
pub struct IssueTimelineAggregator {
  api: Arc<dyn GitHubApi>,
  layer: CacheLayer,
  ttl: Duration,
}

impl IssueTimelineAggregator {
  pub fn new(api: Arc<dyn GitHubApi>, layer: CacheLayer, ttl: Duration) -> Self {
    Self { api, layer, ttl }
  }

  pub async fn fetch(
    &self,
    issue: &IssueRef,
    options: FetchOptions<IssueDetail>,
  ) -> DashResult<CacheResult<IssueDetail>> {
    let key = ResourceKey::issue_timeline(&issue.owner, &issue.repo, issue.number).to_string();
    let api = Arc::clone(&self.api);
    let issue = issue.clone();

    self
      .layer
      .fetch(&key, self.ttl, options, move || async move {
        api
          .issue_with_timeline(&issue.owner, &issue.repo, issue.number)
          .await
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryStore, TtlCache};
  use crate::github::mock::MockGitHubApi;
  use crate::github::types::TimelineEvent;
  use crate::testutil::{issue, ManualClock};
  use tokio::sync::mpsc;

  #[test]
  fn test_parse_issue_ref() {
    let parsed: IssueRef = "acme/widgets#42".parse().unwrap();
    assert_eq!(parsed.owner, "acme");
    assert_eq!(parsed.repo, "widgets");
    assert_eq!(parsed.number, 42);
    assert_eq!(parsed.to_string(), "acme/widgets#42");

    assert!("acme/widgets".parse::<IssueRef>().is_err());
    assert!("acme#1".parse::<IssueRef>().is_err());
    assert!("acme/widgets#x".parse::<IssueRef>().is_err());
    assert!("a/b/c#1".parse::<IssueRef>().is_err());
  }

  #[tokio::test]
  async fn test_timeline_swr_refresh() {
    let detail = IssueDetail {
      issue: issue("I_42"),
      timeline: vec![TimelineEvent {
        kind: "ClosedEvent".into(),
        actor: Some("octocat".into()),
        created_at: None,
        summary: "closed".into(),
      }],
    };
    let api = Arc::new(MockGitHubApi::new().with_timeline("acme", "widgets", 42, detail.clone()));
    let layer = CacheLayer::new(TtlCache::new(
      Arc::new(MemoryStore::new()),
      Arc::new(ManualClock::default()),
    ));
    let aggregator = IssueTimelineAggregator::new(api.clone(), layer, Duration::from_secs(86_400));
    let issue_ref: IssueRef = "acme/widgets#42".parse().unwrap();

    let cold = aggregator.fetch(&issue_ref, FetchOptions::swr()).await.unwrap();
    assert_eq!(cold.source, CacheSource::Network);
    assert_eq!(cold.data, detail);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let warm = aggregator
      .fetch(
        &issue_ref,
        FetchOptions::swr().on_update(move |d: IssueDetail| {
          let _ = tx.send(d);
        }),
      )
      .await
      .unwrap();
    assert_eq!(warm.source, CacheSource::CacheFresh);

    assert_eq!(rx.recv().await, Some(detail));
    assert_eq!(api.calls("issue_with_timeline"), 2);
  }
}
