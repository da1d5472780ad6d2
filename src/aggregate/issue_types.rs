//! Organization issue-type taxonomy.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheLayer, CacheResult, FetchOptions};
use crate::error::DashResult;
use crate::github::types::IssueType;
use crate::github::{GitHubApi, ResourceKey};

/// Issue types change rarely, so this normally runs with the long TTL.
#[derive(Clone)]
pub struct IssueTypeAggregator {
  api: Arc<dyn GitHubApi>,
  layer: CacheLayer,
  ttl: Duration,
}

impl IssueTypeAggregator {
  pub fn new(api: Arc<dyn GitHubApi>, layer: CacheLayer, ttl: Duration) -> Self {
    Self { api, layer, ttl }
  }

  pub async fn fetch(
    &self,
    org: &str,
    options: FetchOptions<Vec<IssueType>>,
  ) -> DashResult<CacheResult<Vec<IssueType>>> {
    let key = ResourceKey::issue_types(org).to_string();
    let api = Arc::clone(&self.api);
    let org = org.to_string();

    self
      .layer
      .fetch(&key, self.ttl, options, move || async move {
        api.issue_types(&org).await
      })
      .await
  }
}
