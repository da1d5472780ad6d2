//! Resource aggregators: each turns paged remote queries into one cached
//! collection under the SWR protocol of [`CacheLayer`](crate::cache::CacheLayer).

mod issue_types;
mod project_boards;
mod repository_issues;
mod timeline;

pub use issue_types::IssueTypeAggregator;
pub use project_boards::{ProjectBoardAggregator, ProjectBoards};
pub use repository_issues::{RepositoryIssues, RepositoryIssuesAggregator, Truncation};
pub use timeline::{IssueRef, IssueTimelineAggregator};
