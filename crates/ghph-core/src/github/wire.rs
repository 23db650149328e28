//! GraphQL documents and the REST/GraphQL payload shapes they return.

use serde::Deserialize;

pub const REPOSITORY_ID: &str = r"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) { id }
}";

pub const USER_PROJECTS: &str = r"
query($owner: String!) {
  user(login: $owner) { projectsV2(first: 100) { nodes { id title } } }
}";

pub const ORGANIZATION_PROJECTS: &str = r"
query($owner: String!) {
  organization(login: $owner) { projectsV2(first: 100) { nodes { id title } } }
}";

pub const PROJECT_FIELDS: &str = r"
query($projectId: ID!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      fields(first: 20) {
        nodes { ... on ProjectV2SingleSelectField { id name options { id name } } }
      }
    }
  }
}";

pub const USER_ID: &str = r"
query($login: String!) {
  user(login: $login) { id }
}";

pub const CREATE_ISSUE: &str = r"
mutation($input: CreateIssueInput!) {
  createIssue(input: $input) { issue { id number url } }
}";

pub const ADD_PROJECT_ITEM: &str = r"
mutation($input: AddProjectV2ItemByIdInput!) {
  addProjectV2ItemById(input: $input) { item { id } }
}";

pub const UPDATE_ITEM_FIELD: &str = r"
mutation($input: UpdateProjectV2ItemFieldValueInput!) {
  updateProjectV2ItemFieldValue(input: $input) { clientMutationId }
}";

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl GraphQlError {
    pub fn is_not_found(&self) -> bool {
        self.kind.as_deref() == Some("NOT_FOUND")
    }
}

#[derive(Debug, Deserialize)]
pub struct IdNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Nodes<T> {
    #[serde(default)]
    pub nodes: Vec<Option<T>>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryData {
    pub repository: Option<IdNode>,
}

#[derive(Debug, Deserialize)]
pub struct UserData {
    pub user: Option<IdNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectNode {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectsOwner {
    #[serde(rename = "projectsV2")]
    pub projects: Nodes<ProjectNode>,
}

#[derive(Debug, Deserialize)]
pub struct UserProjectsData {
    pub user: Option<ProjectsOwner>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationProjectsData {
    pub organization: Option<ProjectsOwner>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFieldsData {
    pub node: Option<ProjectFields>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFields {
    pub fields: Option<Nodes<FieldNode>>,
}

/// A board field; only single-select fields carry data, other field kinds
/// deserialize as empty objects.
#[derive(Debug, Deserialize)]
pub struct FieldNode {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

#[derive(Debug, Deserialize)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueData {
    pub create_issue: CreateIssuePayload,
}

#[derive(Debug, Deserialize)]
pub struct CreateIssuePayload {
    pub issue: CreatedIssueNode,
}

#[derive(Debug, Deserialize)]
pub struct CreatedIssueNode {
    pub id: String,
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProjectItemData {
    pub add_project_v2_item_by_id: AddProjectItemPayload,
}

#[derive(Debug, Deserialize)]
pub struct AddProjectItemPayload {
    pub item: IdNode,
}

#[derive(Debug, Deserialize)]
pub struct RestMilestone {
    pub title: String,
    pub node_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RestLabel {
    pub node_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchIssues {
    #[serde(default)]
    pub items: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
pub struct SearchIssue {
    pub number: u64,
    pub title: String,
    pub node_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RestError {
    pub message: String,
}
