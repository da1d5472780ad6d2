//! Cursor pagination walker.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::trace;

use crate::error::{DashError, DashResult};

/// One page of a cursor-paginated connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
  pub nodes: Vec<T>,
  pub has_next_page: bool,
  pub end_cursor: Option<String>,
}

/// Everything a walk collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
  pub nodes: Vec<T>,
  /// Number of page requests made
  pub pages: usize,
  /// The walk stopped at `max_pages` while the remote still had more
  pub truncated: bool,
}

/// Walk a paged query until it reports no further pages, or `max_pages` have
/// been read.
///
/// Pages are requested one at a time in cursor order. Any failed page aborts the
/// walk and the nodes read so far are dropped.
pub async fn paginate<T, F, Fut>(max_pages: Option<usize>, mut fetch_page: F) -> DashResult<Paginated<T>>
where
  F: FnMut(Option<String>) -> Fut,
  Fut: Future<Output = DashResult<Page<T>>>,
{
  let mut nodes = Vec::new();
  let mut cursor: Option<String> = None;
  let mut pages = 0usize;

  loop {
    if max_pages.is_some_and(|max| pages >= max) {
      return Ok(Paginated {
        nodes,
        pages,
        truncated: true,
      });
    }

    let page = fetch_page(cursor.take()).await?;
    pages += 1;
    trace!(page = pages, nodes = page.nodes.len(), "page fetched");
    nodes.extend(page.nodes);

    if !page.has_next_page {
      break;
    }

    match page.end_cursor {
      Some(next) => cursor = Some(next),
      None => {
        return Err(DashError::RemoteQuery(
          "page reported more results but no end cursor".to_string(),
        ))
      }
    }
  }

  Ok(Paginated {
    nodes,
    pages,
    truncated: false,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  fn page(range: std::ops::Range<u32>, next: Option<&str>) -> Page<u32> {
    Page {
      nodes: range.collect(),
      has_next_page: next.is_some(),
      end_cursor: next.map(String::from),
    }
  }

  #[tokio::test]
  async fn test_pages_concatenate_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cursors = Arc::new(Mutex::new(Vec::new()));

    let result = paginate(None, |cursor| {
      let calls = calls.clone();
      let cursors = cursors.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        cursors.lock().unwrap().push(cursor.clone());
        match cursor.as_deref() {
          None => Ok(page(0..20, Some("c1"))),
          Some("c1") => Ok(page(20..35, None)),
          other => panic!("unexpected cursor {:?}", other),
        }
      }
    })
    .await
    .unwrap();

    assert_eq!(result.nodes, (0..35).collect::<Vec<_>>());
    assert_eq!(result.pages, 2);
    assert!(!result.truncated);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
      *cursors.lock().unwrap(),
      vec![None, Some("c1".to_string())]
    );
  }

  #[tokio::test]
  async fn test_failure_discards_earlier_pages() {
    let result = paginate(None, |cursor| async move {
      match cursor {
        None => Ok(page(0..20, Some("c1"))),
        Some(_) => Err(DashError::Transport("timed out".into())),
      }
    })
    .await;

    assert!(matches!(result, Err(DashError::Transport(_))));
  }

  #[tokio::test]
  async fn test_max_pages_caps_the_walk() {
    let calls = Arc::new(AtomicUsize::new(0));

    let result = paginate(Some(4), |cursor| {
      let calls = calls.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        let index: u32 = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let next = (index + 1).to_string();
        Ok(page(
          index * 30..(index + 1) * 30,
          (index < 4).then_some(next.as_str()),
        ))
      }
    })
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(result.nodes.len(), 120);
    assert!(result.truncated);
  }

  #[tokio::test]
  async fn test_cap_not_reported_when_remote_is_exhausted() {
    let result = paginate(Some(1), |_| async { Ok(page(0..3, None)) })
      .await
      .unwrap();

    assert_eq!(result.nodes.len(), 3);
    assert!(!result.truncated);
  }

  #[tokio::test]
  async fn test_missing_cursor_is_an_error() {
    let result = paginate(None, |_| async {
      Ok(Page {
        nodes: vec![1u32],
        has_next_page: true,
        end_cursor: None,
      })
    })
    .await;

    assert!(matches!(result, Err(DashError::RemoteQuery(_))));
  }
}
