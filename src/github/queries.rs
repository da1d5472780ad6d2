//! GraphQL documents sent by [`GraphQlClient`](super::client::GraphQlClient).

macro_rules! issue_fields {
  () => {
    r#"
fragment IssueFields on Issue {
  id
  number
  title
  body
  url
  state
  createdAt
  closedAt
  repository { nameWithOwner }
  assignees(first: 10) { nodes { login } }
  labels(first: 20) { nodes { name color } }
  milestone { title number dueOn }
  issueType { id name }
}
"#
  };
}

pub const ORGANIZATION_REPOSITORIES: &str = concat!(
  r#"
query OrganizationRepositories($org: String!, $pageSize: Int!, $issueCount: Int!, $cursor: String) {
  organization(login: $org) {
    repositories(first: $pageSize, after: $cursor, orderBy: {field: UPDATED_AT, direction: DESC}) {
      pageInfo { hasNextPage endCursor }
      nodes {
        nameWithOwner
        issues(first: $issueCount, orderBy: {field: CREATED_AT, direction: DESC}) {
          totalCount
          nodes { ...IssueFields }
        }
      }
    }
  }
}
"#,
  issue_fields!()
);

pub const ORGANIZATION_PROJECTS: &str = r#"
query OrganizationProjects($org: String!, $pageSize: Int!, $cursor: String) {
  organization(login: $org) {
    projectsV2(first: $pageSize, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        id
        number
        title
        url
        closed
        fields(first: 50) {
          nodes {
            ... on ProjectV2SingleSelectField { id name options { id name } }
          }
        }
      }
    }
  }
}
"#;

pub const PROJECT_ITEMS: &str = r#"
query ProjectItems($projectId: ID!, $pageSize: Int!, $cursor: String) {
  node(id: $projectId) {
    ... on ProjectV2 {
      items(first: $pageSize, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          fieldValueByName(name: "Status") {
            ... on ProjectV2ItemFieldSingleSelectValue { name }
          }
          content {
            __typename
            ... on Issue {
              id
              number
              title
              url
              state
              createdAt
              repository { nameWithOwner }
              issueType { id name }
            }
          }
        }
      }
    }
  }
}
"#;

pub const ISSUE_TYPES: &str = r#"
query IssueTypes($org: String!) {
  organization(login: $org) {
    issueTypes(first: 100) {
      nodes { id name description color isEnabled }
    }
  }
}
"#;

pub const ISSUE_WITH_TIMELINE: &str = concat!(
  r#"
query IssueWithTimeline($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    issue(number: $number) {
      ...IssueFields
      timelineItems(first: 100) {
        nodes {
          __typename
          ... on IssueComment { createdAt author { login } body }
          ... on LabeledEvent { createdAt actor { login } label { name } }
          ... on UnlabeledEvent { createdAt actor { login } label { name } }
          ... on AssignedEvent { createdAt actor { login } assignee { ... on User { login } } }
          ... on UnassignedEvent { createdAt actor { login } assignee { ... on User { login } } }
          ... on ClosedEvent { createdAt actor { login } }
          ... on ReopenedEvent { createdAt actor { login } }
          ... on RenamedTitleEvent { createdAt actor { login } previousTitle currentTitle }
          ... on CrossReferencedEvent {
            createdAt
            actor { login }
            source {
              __typename
              ... on Issue { number title }
              ... on PullRequest { number title }
            }
          }
        }
      }
    }
  }
}
"#,
  issue_fields!()
);
