//! Issues across every repository of an organization.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayer, CacheResult, FetchOptions};
use crate::config::LimitsConfig;
use crate::error::DashResult;
use crate::github::types::Issue;
use crate::github::{GitHubApi, ResourceKey};
use crate::pagination::paginate;

/// What the collected data is missing because of the configured limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
  /// The repository walk hit `max_repository_pages` with more repositories left
  pub repositories_capped: bool,
  /// Repositories holding more issues than `issues_per_repository`
  pub truncated_repositories: Vec<String>,
}

impl Truncation {
  pub fn is_truncated(&self) -> bool {
    self.repositories_capped || !self.truncated_repositories.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIssues {
  pub issues: Vec<Issue>,
  pub repository_count: usize,
  pub truncation: Truncation,
}

#[derive(Clone)]
pub struct RepositoryIssuesAggregator {
  api: Arc<dyn GitHubApi>,
  layer: CacheLayer,
  limits: LimitsConfig,
  ttl: Duration,
}

impl RepositoryIssuesAggregator {
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
    options: FetchOptions<RepositoryIssues>,
  ) -> DashResult<CacheResult<RepositoryIssues>> {
    let key = ResourceKey::repository_issues(org).to_string();
    let api = Arc::clone(&self.api);
    let org = org.to_string();
    let limits = self.limits.clone();

    self
      .layer
      .fetch(&key, self.ttl, options, move || {
        collect_repository_issues(api, org, limits)
      })
      .await
  }
}

async fn collect_repository_issues(
  api: Arc<dyn GitHubApi>,
  org: String,
  limits: LimitsConfig,
) -> DashResult<RepositoryIssues> {
  let page_size = limits.repository_page_size;
  let issues_per_repository = limits.issues_per_repository;

  let walk = paginate(limits.max_repository_pages, |cursor| {
    let api = Arc::clone(&api);
    let org = org.clone();
    async move {
      api
        .organization_repositories(&org, page_size, issues_per_repository, cursor)
        .await
    }
  })
  .await?;

  let mut truncation = Truncation {
    repositories_capped: walk.truncated,
    truncated_repositories: Vec::new(),
  };
  if walk.truncated {
    warn!(
      org = %org,
      pages = walk.pages,
      "repository walk stopped at the page cap, later repositories are not included"
    );
  }

  let repository_count = walk.nodes.len();
  let mut issues = Vec::new();
  for repo in walk.nodes {
    if repo.total_issue_count > repo.issues.len() as u64 {
      debug!(
        repository = %repo.name_with_owner,
        total = repo.total_issue_count,
        read = repo.issues.len(),
        "repository has more issues than were read"
      );
      truncation.truncated_repositories.push(repo.name_with_owner);
    }
    issues.extend(repo.issues);
  }

  info!(
    org = %org,
    repositories = repository_count,
    issues = issues.len(),
    "repository issues collected"
  );

  Ok(RepositoryIssues {
    issues,
    repository_count,
    truncation,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryStore, TtlCache};
  use crate::github::mock::MockGitHubApi;
  use crate::testutil::{issue, repository, ManualClock};
  use tokio::sync::mpsc;

  const TTL: Duration = Duration::from_secs(600);

  fn aggregator(api: Arc<MockGitHubApi>, limits: LimitsConfig) -> (RepositoryIssuesAggregator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let layer = CacheLayer::new(TtlCache::new(Arc::new(MemoryStore::new()), clock.clone()));
    (RepositoryIssuesAggregator::new(api, layer, limits, TTL), clock)
  }

  fn repository_pages(pages: usize, per_page: usize) -> Vec<Vec<crate::github::types::RepositoryNode>> {
    (0..pages)
      .map(|p| {
        (0..per_page)
          .map(|r| {
            let id = format!("{}-{}", p, r);
            repository(&format!("repo-{}", id), vec![issue(&format!("I_{}", id))], 1)
          })
          .collect()
      })
      .collect()
  }

  #[tokio::test]
  async fn test_repository_walk_stops_at_page_cap() {
    let api = Arc::new(MockGitHubApi::new().with_repository_pages(repository_pages(5, 30)));
    let (aggregator, _clock) = aggregator(api.clone(), LimitsConfig::default());

    let result = aggregator
      .fetch("acme", FetchOptions::read_through())
      .await
      .unwrap();

    assert_eq!(api.calls("organization_repositories"), 4);
    assert_eq!(result.data.repository_count, 120);
    assert_eq!(result.data.issues.len(), 120);
    assert!(result.data.truncation.repositories_capped);
    assert!(result.data.truncation.is_truncated());
  }

  #[tokio::test]
  async fn test_uncapped_walk_reads_everything() {
    let api = Arc::new(MockGitHubApi::new().with_repository_pages(repository_pages(5, 30)));
    let limits = LimitsConfig {
      max_repository_pages: None,
      ..LimitsConfig::default()
    };
    let (aggregator, _clock) = aggregator(api.clone(), limits);

    let result = aggregator
      .fetch("acme", FetchOptions::read_through())
      .await
      .unwrap();

    assert_eq!(api.calls("organization_repositories"), 5);
    assert_eq!(result.data.repository_count, 150);
    assert!(!result.data.truncation.is_truncated());
  }

  #[tokio::test]
  async fn test_repositories_with_more_issues_are_reported() {
    let api = Arc::new(MockGitHubApi::new().with_repository_pages(vec![vec![
      repository("small", vec![issue("A")], 1),
      repository("huge", vec![issue("B"), issue("C")], 340),
    ]]));
    let (aggregator, _clock) = aggregator(api, LimitsConfig::default());

    let result = aggregator
      .fetch("acme", FetchOptions::read_through())
      .await
      .unwrap()
      .data;

    let ids: Vec<_> = result.issues.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert!(!result.truncation.repositories_capped);
    assert_eq!(result.truncation.truncated_repositories, vec!["acme/huge".to_string()]);
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_network() {
    let api = Arc::new(MockGitHubApi::new().with_repository_pages(repository_pages(1, 2)));
    let (aggregator, _clock) = aggregator(api.clone(), LimitsConfig::default());

    aggregator.fetch("acme", FetchOptions::read_through()).await.unwrap();
    let second = aggregator.fetch("ACME", FetchOptions::read_through()).await.unwrap();

    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(api.calls("organization_repositories"), 1);
  }

  #[tokio::test]
  async fn test_swr_serves_stale_and_reports_refresh() {
    let api = Arc::new(MockGitHubApi::new().with_repository_pages(vec![vec![repository(
      "widgets",
      vec![issue("A")],
      1,
    )]]));
    let (aggregator, clock) = aggregator(api.clone(), LimitsConfig::default());
    aggregator.fetch("acme", FetchOptions::read_through()).await.unwrap();

    clock.advance(TTL * 2);
    api.set_repository_pages(vec![vec![repository(
      "widgets",
      vec![issue("A"), issue("B")],
      2,
    )]]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let options = FetchOptions::swr().on_update(move |fresh: RepositoryIssues| {
      let _ = tx.send(fresh);
    });
    let stale = aggregator.fetch("acme", options).await.unwrap();

    assert_eq!(stale.source, CacheSource::CacheStale);
    assert_eq!(stale.data.issues.len(), 1);

    let refreshed = rx.recv().await.unwrap();
    assert_eq!(refreshed.issues.len(), 2);
    assert_eq!(api.calls("organization_repositories"), 2);
  }

  #[tokio::test]
  async fn test_foreground_failure_propagates() {
    let api = Arc::new(MockGitHubApi::new().with_repository_pages(repository_pages(1, 1)));
    api.set_failing(true);
    let (aggregator, _clock) = aggregator(api, LimitsConfig::default());

    let result = aggregator.fetch("acme", FetchOptions::swr()).await;
    assert!(result.is_err());
  }
}
