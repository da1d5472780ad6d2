use async_trait::async_trait;
use serde::de::DeserializeOwned;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::api::GitHubApi;
use super::api_types::{
  ApiProject, ApiProjectItem, ApiRepository, GraphQlError, GraphQlResponse, IssueTypesData,
  IssueWithTimelineData, OrganizationProjectsData, OrganizationRepositoriesData, ProjectItemsData,
};
use super::queries;
use super::types::{IssueDetail, IssueType, ProjectItemNode, ProjectSummary, RepositoryNode};
use crate::error::{DashError, DashResult};
use crate::pagination::Page;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub GraphQL client wrapper
#[derive(Clone)]
pub struct GraphQlClient {
  http: reqwest::Client,
  endpoint: Url,
  token: String,
}

impl GraphQlClient {
  pub fn new(endpoint: Url, token: String) -> DashResult<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("orgdash/", env!("CARGO_PKG_VERSION")))
      .connect_timeout(CONNECT_TIMEOUT)
      .build()
      .map_err(|e| DashError::Transport(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Self {
      http,
      endpoint,
      token,
    })
  }

  /// Run one GraphQL document and decode its `data`.
  async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> DashResult<T> {
    let response = self
      .http
      .post(self.endpoint.clone())
      .bearer_auth(&self.token)
      .json(&json!({ "query": query, "variables": variables }))
      .send()
      .await?;

    let status = response.status();
    let body = response.text().await?;
    classify_response(status, &body)
  }
}

/// Map an HTTP status and body onto `data` or the matching error kind.
fn classify_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> DashResult<T> {
  if !status.is_success() {
    return Err(DashError::Transport(format!(
      "GitHub returned HTTP {}: {}",
      status,
      body.trim()
    )));
  }

  let response: GraphQlResponse<T> =
    serde_json::from_str(body).map_err(|e| DashError::Decode(e.to_string()))?;

  if !response.errors.is_empty() {
    return Err(DashError::RemoteQuery(join_errors(&response.errors)));
  }

  response
    .data
    .ok_or_else(|| DashError::Decode("response carried neither data nor errors".to_string()))
}

fn join_errors(errors: &[GraphQlError]) -> String {
  errors
    .iter()
    .map(GraphQlError::describe)
    .collect::<Vec<_>>()
    .join("; ")
}

fn require_organization<T>(organization: Option<T>, org: &str) -> DashResult<T> {
  organization.ok_or_else(|| DashError::RemoteQuery(format!("organization {} not found", org)))
}

#[async_trait]
impl GitHubApi for GraphQlClient {
  #[instrument(skip(self), level = "debug")]
  async fn organization_repositories(
    &self,
    org: &str,
    page_size: u32,
    issues_per_repository: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<RepositoryNode>> {
    let data: OrganizationRepositoriesData = self
      .execute(
        queries::ORGANIZATION_REPOSITORIES,
        json!({
          "org": org,
          "pageSize": page_size,
          "issueCount": issues_per_repository,
          "cursor": cursor,
        }),
      )
      .await?;

    let organization = require_organization(data.organization, org)?;
    let page = organization.repositories.into_page(ApiRepository::into_node);
    debug!(repositories = page.nodes.len(), "repository page received");
    Ok(page)
  }

  #[instrument(skip(self), level = "debug")]
  async fn organization_projects(
    &self,
    org: &str,
    page_size: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<ProjectSummary>> {
    let data: OrganizationProjectsData = self
      .execute(
        queries::ORGANIZATION_PROJECTS,
        json!({ "org": org, "pageSize": page_size, "cursor": cursor }),
      )
      .await?;

    let organization = require_organization(data.organization, org)?;
    Ok(organization.projects.into_page(ApiProject::into_summary))
  }

  #[instrument(skip(self), level = "debug")]
  async fn project_items(
    &self,
    project_id: &str,
    page_size: u32,
    cursor: Option<String>,
  ) -> DashResult<Page<ProjectItemNode>> {
    let data: ProjectItemsData = self
      .execute(
        queries::PROJECT_ITEMS,
        json!({ "projectId": project_id, "pageSize": page_size, "cursor": cursor }),
      )
      .await?;

    let items = data
      .node
      .and_then(|node| node.items)
      .ok_or_else(|| DashError::RemoteQuery(format!("project {} not found", project_id)))?;
    Ok(items.into_page(ApiProjectItem::into_node))
  }

  #[instrument(skip(self), level = "debug")]
  async fn issue_types(&self, org: &str) -> DashResult<Vec<IssueType>> {
    let data: IssueTypesData = self
      .execute(queries::ISSUE_TYPES, json!({ "org": org }))
      .await?;

    let organization = require_organization(data.organization, org)?;
    Ok(
      organization
        .issue_types
        .map(|types| types.into_vec().into_iter().map(IssueType::from).collect())
        .unwrap_or_default(),
    )
  }

  #[instrument(skip(self), level = "debug")]
  async fn issue_with_timeline(
    &self,
    owner: &str,
    repo: &str,
    number: u64,
  ) -> DashResult<IssueDetail> {
    let data: IssueWithTimelineData = self
      .execute(
        queries::ISSUE_WITH_TIMELINE,
        json!({ "owner": owner, "repo": repo, "number": number }),
      )
      .await?;

    let issue = data
      .repository
      .and_then(|r| r.issue)
      .ok_or_else(|| {
        DashError::RemoteQuery(format!("issue {}/{}#{} not found", owner, repo, number))
      })?;
    Ok(issue.into_detail())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn issue_types_response(status: StatusCode, body: &str) -> DashResult<IssueTypesData> {
    classify_response(status, body)
  }

  #[test]
  fn test_http_failure_is_transport() {
    let result = issue_types_response(StatusCode::BAD_GATEWAY, "upstream timed out\n");
    match result {
      Err(DashError::Transport(message)) => {
        assert!(message.contains("502"));
        assert!(message.ends_with("upstream timed out"));
      }
      other => panic!("expected transport error, got {:?}", other),
    }

    let unauthorized = issue_types_response(StatusCode::UNAUTHORIZED, r#"{"message":"Bad credentials"}"#);
    assert!(matches!(unauthorized, Err(DashError::Transport(_))));
  }

  #[test]
  fn test_graphql_errors_are_remote_query() {
    let body = r#"{
      "data": null,
      "errors": [
        { "type": "NOT_FOUND", "message": "Could not resolve to an Organization" },
        { "message": "second problem" }
      ]
    }"#;

    match issue_types_response(StatusCode::OK, body) {
      Err(DashError::RemoteQuery(message)) => assert_eq!(
        message,
        "Could not resolve to an Organization (NOT_FOUND); second problem"
      ),
      other => panic!("expected remote query error, got {:?}", other),
    }
  }

  #[test]
  fn test_errors_win_over_partial_data() {
    let body = r#"{
      "data": { "organization": null },
      "errors": [{ "message": "rate limited" }]
    }"#;

    assert!(matches!(
      issue_types_response(StatusCode::OK, body),
      Err(DashError::RemoteQuery(_))
    ));
  }

  #[test]
  fn test_missing_data_is_decode() {
    assert!(matches!(
      issue_types_response(StatusCode::OK, r#"{ "data": null }"#),
      Err(DashError::Decode(_))
    ));
    assert!(matches!(
      issue_types_response(StatusCode::OK, "<html>maintenance</html>"),
      Err(DashError::Decode(_))
    ));
    assert!(matches!(
      issue_types_response(StatusCode::OK, r#"{ "data": { "organization": 5 } }"#),
      Err(DashError::Decode(_))
    ));
  }

  #[test]
  fn test_null_organization_is_not_found() {
    let data = issue_types_response(StatusCode::OK, r#"{ "data": { "organization": null } }"#).unwrap();

    match require_organization(data.organization, "ghost-org") {
      Err(DashError::RemoteQuery(message)) => assert_eq!(message, "organization ghost-org not found"),
      other => panic!("expected remote query error, got {:?}", other),
    }
  }

  #[test]
  fn test_success_returns_data() {
    let body = r#"{ "data": { "organization": { "issueTypes": { "nodes": [
      { "id": "IT_1", "name": "Bug", "description": null, "color": "RED", "isEnabled": true }
    ] } } } }"#;

    let data = issue_types_response(StatusCode::OK, body).unwrap();
    let organization = require_organization(data.organization, "acme").unwrap();
    let types: Vec<IssueType> = organization
      .issue_types
      .map(|t| t.into_vec().into_iter().map(IssueType::from).collect())
      .unwrap_or_default();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name, "Bug");
  }
}
