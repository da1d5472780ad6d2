//! Organization dashboard: the three collections, joined and kept current.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aggregate::{
  IssueRef, IssueTimelineAggregator, IssueTypeAggregator, ProjectBoardAggregator, ProjectBoards,
  RepositoryIssues, RepositoryIssuesAggregator,
};
use crate::cache::{
  CacheEntry, CacheLayer, CacheResult, CacheSource, FetchOptions, TtlCache, UpdateCallback,
};
use crate::config::Config;
use crate::error::DashResult;
use crate::github::types::{IssueDetail, IssueType};
use crate::github::{GitHubApi, ResourceKey};
use crate::join::{join, JoinedView, StatusConflictPolicy};

/// Receives every joined view recomputed after a background refresh. Called
/// with the live state locked, so it must not block.
pub type ViewCallback = UpdateCallback<JoinedView>;

/// Where each collection behind a view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sources {
  pub repository_issues: CacheSource,
  pub project_boards: CacheSource,
  pub issue_types: CacheSource,
}

impl Sources {
  /// True if any collection was served past its TTL.
  pub fn any_stale(&self) -> bool {
    [self.repository_issues, self.project_boards, self.issue_types].contains(&CacheSource::CacheStale)
  }
}

#[derive(Debug)]
pub struct DashboardView {
  pub view: JoinedView,
  pub boards: ProjectBoards,
  pub issue_types: Vec<IssueType>,
  pub sources: Sources,
  /// Persists the views recomputed by this load's background refreshes
  pub snapshot: SnapshotWriter,
}

struct SnapshotWrite {
  view: JoinedView,
  written: Option<oneshot::Sender<()>>,
}

/// Single task that owns every `snapshot:<org>` write of one load. Views are
/// written in the order they were joined, so an older join never lands last.
#[derive(Debug)]
pub struct SnapshotWriter {
  handle: JoinHandle<()>,
}

impl SnapshotWriter {
  fn spawn(cache: TtlCache, key: String, ttl: Duration) -> (Self, mpsc::UnboundedSender<SnapshotWrite>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<SnapshotWrite>();
    let handle = tokio::spawn(async move {
      while let Some(write) = rx.recv().await {
        cache.set_with_ttl(&key, &write.view, ttl).await;
        if let Some(written) = write.written {
          let _ = written.send(());
        }
      }
      debug!(key = %key, "snapshot writer finished");
    });
    (Self { handle }, tx)
  }

  /// Wait until every view joined so far is persisted. Resolves once no
  /// background refresh of the load can report anymore.
  pub async fn finished(self) {
    if let Err(e) = self.handle.await {
      warn!(error = %e, "snapshot writer stopped unexpectedly");
    }
  }
}

#[derive(Clone)]
pub struct Dashboard {
  repositories: RepositoryIssuesAggregator,
  boards: ProjectBoardAggregator,
  issue_types: IssueTypeAggregator,
  timelines: IssueTimelineAggregator,
  cache: TtlCache,
  policy: StatusConflictPolicy,
  snapshot_ttl: Duration,
}

impl Dashboard {
  pub fn new(api: Arc<dyn GitHubApi>, cache: TtlCache, config: &Config) -> Self {
    let layer = CacheLayer::new(cache.clone());
    let short = config.cache.short_ttl();
    let long = config.cache.long_ttl();

    Self {
      repositories: RepositoryIssuesAggregator::new(
        Arc::clone(&api),
        layer.clone(),
        config.limits.clone(),
        short,
      ),
      boards: ProjectBoardAggregator::new(Arc::clone(&api), layer.clone(), config.limits.clone(), short),
      issue_types: IssueTypeAggregator::new(Arc::clone(&api), layer.clone(), long),
      timelines: IssueTimelineAggregator::new(api, layer, long),
      cache,
      policy: config.status_policy(),
      snapshot_ttl: short,
    }
  }

  pub fn boards(&self) -> &ProjectBoardAggregator {
    &self.boards
  }

  pub fn issue_types(&self) -> &IssueTypeAggregator {
    &self.issue_types
  }

  /// Load all three collections for `org` concurrently and join them.
  ///
  /// With `swr`, cached collections are returned at once and each background
  /// refresh that lands recomputes the join from the latest collections,
  /// re-persists the snapshot and hands the new view to `on_view`. Await
  /// `DashboardView::snapshot` before exiting to keep the last of those writes.
  pub async fn load(
    &self,
    org: &str,
    swr: bool,
    on_view: Option<ViewCallback>,
  ) -> DashResult<DashboardView> {
    let (snapshot, writes) = SnapshotWriter::spawn(
      self.cache.clone(),
      ResourceKey::snapshot(org).to_string(),
      self.snapshot_ttl,
    );
    let live = Arc::new(LiveView {
      policy: self.policy.clone(),
      collections: Mutex::new(Collections::default()),
      writes,
      on_view,
    });

    let (repository_options, board_options, type_options) = if swr {
      let on_repository = Arc::clone(&live);
      let on_boards = Arc::clone(&live);
      (
        FetchOptions::swr().on_update(move |fresh: RepositoryIssues| {
          on_repository.apply(|c| c.repository = Some(fresh))
        }),
        FetchOptions::swr().on_update(move |fresh: ProjectBoards| {
          on_boards.apply(|c| c.boards = Some(fresh))
        }),
        // Issue types do not feed the join.
        FetchOptions::swr(),
      )
    } else {
      (
        FetchOptions::read_through(),
        FetchOptions::read_through(),
        FetchOptions::read_through(),
      )
    };

    let (repository, boards, issue_types) = futures::try_join!(
      self.repositories.fetch(org, repository_options),
      self.boards.fetch(org, board_options),
      self.issue_types.fetch(org, type_options),
    )?;

    let sources = Sources {
      repository_issues: repository.source,
      project_boards: boards.source,
      issue_types: issue_types.source,
    };

    // A refresh may already have landed; never overwrite it with the older value.
    let (written_tx, written) = oneshot::channel();
    let (view, boards) = {
      let mut collections = live.lock();
      let repository = collections.repository.get_or_insert(repository.data).clone();
      let boards = collections.boards.get_or_insert(boards.data).clone();
      let view = join(&repository, &boards, &self.policy);
      live.persist(view.clone(), Some(written_tx));
      (view, boards)
    };
    let _ = written.await;

    info!(
      org,
      issues = view.issues.len(),
      board_only = view.board_only_count,
      conflicts = view.conflicts.len(),
      stale = sources.any_stale(),
      "dashboard loaded"
    );

    Ok(DashboardView {
      view,
      boards,
      issue_types: issue_types.data,
      sources,
      snapshot,
    })
  }

  /// Single issue with its timeline.
  pub async fn issue(
    &self,
    issue: &IssueRef,
    options: FetchOptions<IssueDetail>,
  ) -> DashResult<CacheResult<IssueDetail>> {
    self.timelines.fetch(issue, options).await
  }

  /// The joined view last persisted for `org`, fresh or not.
  pub async fn last_snapshot(&self, org: &str) -> Option<CacheEntry<JoinedView>> {
    self
      .cache
      .get_entry(&ResourceKey::snapshot(org).to_string())
      .await
  }

  pub async fn invalidate(&self, key: &str) {
    self.cache.invalidate(key).await;
  }

  /// Drop every organization-scoped entry, e.g. after a remote write.
  pub async fn invalidate_org(&self, org: &str) {
    for key in ResourceKey::for_org(org) {
      self.cache.invalidate(&key.to_string()).await;
    }
    debug!(org, "organization cache invalidated");
  }
}

#[derive(Default)]
struct Collections {
  repository: Option<RepositoryIssues>,
  boards: Option<ProjectBoards>,
}

/// State shared between a `load` call and the refreshes it spawned.
struct LiveView {
  policy: StatusConflictPolicy,
  collections: Mutex<Collections>,
  writes: mpsc::UnboundedSender<SnapshotWrite>,
  on_view: Option<ViewCallback>,
}

impl LiveView {
  fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
    self.collections.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Queue `view` for the snapshot writer. Callers hold the collections lock,
  /// so the queue follows join order.
  fn persist(&self, view: JoinedView, written: Option<oneshot::Sender<()>>) {
    if self.writes.send(SnapshotWrite { view, written }).is_err() {
      warn!("snapshot writer is gone, view not persisted");
    }
  }

  /// Replace one collection and, once both are known, rejoin.
  fn apply(&self, update: impl FnOnce(&mut Collections)) {
    let mut collections = self.lock();
    update(&mut collections);
    let view = match (&collections.repository, &collections.boards) {
      (Some(repository), Some(boards)) => join(repository, boards, &self.policy),
      _ => return,
    };

    debug!(issues = view.issues.len(), "view recomputed");
    self.persist(view.clone(), None);

    // Still under the lock so views reach the callback in join order too.
    if let Some(on_view) = &self.on_view {
      on_view(view);
    }
  }
}
