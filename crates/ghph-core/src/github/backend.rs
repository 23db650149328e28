use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use serde_json::json;

use super::{wire::*, GitHubClient};
use crate::{
    error::{ProjectError, Result},
    models::RepoRef,
    remote::{
        CreatedIssue, IssueRef, MilestoneSpec, NewIssue, NodeId, RemoteBackend, StatusField,
        StatusUpdate,
    },
};

const STATUS_FIELD_NAME: &str = "Status";

#[async_trait]
impl RemoteBackend for GitHubClient {
    async fn resolve_repository(&self, repo: &RepoRef) -> Result<NodeId> {
        let data: RepositoryData = self
            .graphql(
                REPOSITORY_ID,
                json!({ "owner": repo.owner, "name": repo.name }),
            )
            .await?;

        data.repository
            .map(|r| NodeId::new(r.id))
            .ok_or_else(|| ProjectError::not_found("repository", repo.to_string()))
    }

    async fn resolve_board(&self, owner: &str, title: &str) -> Result<NodeId> {
        let variables = json!({ "owner": owner });

        // Either scope may fail for the wrong kind of account; only the
        // absence of a match in both is an error.
        match self
            .graphql::<UserProjectsData>(USER_PROJECTS, variables.clone())
            .await
        {
            Ok(data) => {
                if let Some(id) = find_project(data.user, title) {
                    return Ok(id);
                }
            }
            Err(e) => debug!("User project lookup for {owner} failed: {e}"),
        }

        match self
            .graphql::<OrganizationProjectsData>(ORGANIZATION_PROJECTS, variables)
            .await
        {
            Ok(data) => {
                if let Some(id) = find_project(data.organization, title) {
                    return Ok(id);
                }
            }
            Err(e) => debug!("Organization project lookup for {owner} failed: {e}"),
        }

        Err(ProjectError::not_found(
            "project",
            format!("{title} (owner {owner})"),
        ))
    }

    async fn resolve_status_field(&self, board_id: &NodeId) -> Result<StatusField> {
        let data: ProjectFieldsData = self
            .graphql(PROJECT_FIELDS, json!({ "projectId": board_id }))
            .await?;

        let field = data
            .node
            .and_then(|project| project.fields)
            .into_iter()
            .flat_map(|fields| fields.nodes)
            .flatten()
            .find(|field| field.name.as_deref() == Some(STATUS_FIELD_NAME));

        match field {
            Some(FieldNode {
                id: Some(id),
                options,
                ..
            }) => Ok(StatusField {
                field_id: NodeId::new(id),
                options: options
                    .into_iter()
                    .map(|option| (option.name, option.id))
                    .collect::<HashMap<_, _>>(),
            }),
            _ => Err(ProjectError::not_found(
                "status field",
                format!("{STATUS_FIELD_NAME} on project {board_id}"),
            )),
        }
    }

    async fn get_or_create_milestone(
        &self,
        repo: &RepoRef,
        milestone: &MilestoneSpec<'_>,
    ) -> Result<NodeId> {
        let url = self.rest_url(&["repos", &repo.owner, &repo.name, "milestones"])?;
        let existing: Vec<RestMilestone> = self
            .rest(
                self.http
                    .get(url.clone())
                    .query(&[("state", "all"), ("per_page", "100")]),
            )
            .await?;

        if let Some(found) = existing.into_iter().find(|m| m.title == milestone.title) {
            return Ok(NodeId::new(found.node_id));
        }

        let mut body = json!({ "title": milestone.title });
        if let Some(description) = milestone.description {
            body["description"] = json!(description);
        }
        if let Some(due_on) = milestone.due_on {
            body["due_on"] = json!(format!("{due_on}T00:00:00Z"));
        }

        debug!("Creating milestone {:?} in {repo}", milestone.title);
        let created: RestMilestone = self.rest(self.http.post(url).json(&body)).await?;
        Ok(NodeId::new(created.node_id))
    }

    async fn find_issue_by_title(&self, repo: &RepoRef, title: &str) -> Result<Option<IssueRef>> {
        let url = self.rest_url(&["search", "issues"])?;
        let query = format!("repo:{repo} is:issue is:open in:title {title:?}");
        let results: SearchIssues = self
            .rest(
                self.http
                    .get(url)
                    .query(&[("q", query.as_str()), ("per_page", "10")]),
            )
            .await?;

        Ok(results
            .items
            .into_iter()
            .find(|issue| issue.title == title)
            .map(|issue| IssueRef {
                number: issue.number,
                node_id: NodeId::new(issue.node_id),
            }))
    }

    async fn get_or_create_label(&self, repo: &RepoRef, name: &str) -> Result<NodeId> {
        let url = self.rest_url(&["repos", &repo.owner, &repo.name, "labels", name])?;
        match self.rest::<RestLabel>(self.http.get(url)).await {
            Ok(label) => Ok(NodeId::new(label.node_id)),
            Err(ProjectError::Api { status: 404, .. }) => {
                debug!("Creating label {name:?} in {repo}");
                let url = self.rest_url(&["repos", &repo.owner, &repo.name, "labels"])?;
                let created: RestLabel = self
                    .rest(self.http.post(url).json(&json!({ "name": name })))
                    .await?;
                Ok(NodeId::new(created.node_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn resolve_user(&self, login: &str) -> Result<NodeId> {
        let data: UserData = self.graphql(USER_ID, json!({ "login": login })).await?;
        data.user
            .map(|user| NodeId::new(user.id))
            .ok_or_else(|| ProjectError::not_found("user", login))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let mut input = json!({
            "repositoryId": issue.repository_id,
            "title": issue.title,
            "body": issue.body,
            "labelIds": issue.label_ids,
            "assigneeIds": issue.assignee_ids,
        });
        if let Some(milestone_id) = &issue.milestone_id {
            input["milestoneId"] = json!(milestone_id);
        }

        let data: CreateIssueData = self
            .graphql(CREATE_ISSUE, json!({ "input": input }))
            .await?;
        let created = data.create_issue.issue;
        Ok(CreatedIssue {
            id: NodeId::new(created.id),
            number: created.number,
            url: created.url,
        })
    }

    async fn add_to_board(&self, board_id: &NodeId, content_id: &NodeId) -> Result<NodeId> {
        let data: AddProjectItemData = self
            .graphql(
                ADD_PROJECT_ITEM,
                json!({ "input": { "projectId": board_id, "contentId": content_id } }),
            )
            .await?;
        Ok(NodeId::new(data.add_project_v2_item_by_id.item.id))
    }

    async fn set_status(&self, update: &StatusUpdate<'_>) -> Result<()> {
        let _: serde_json::Value = self
            .graphql(
                UPDATE_ITEM_FIELD,
                json!({
                    "input": {
                        "projectId": update.board_id,
                        "itemId": update.item_id,
                        "fieldId": update.field_id,
                        "value": { "singleSelectOptionId": update.option_id },
                    }
                }),
            )
            .await?;
        Ok(())
    }
}

fn find_project(owner: Option<ProjectsOwner>, title: &str) -> Option<NodeId> {
    owner?
        .projects
        .nodes
        .into_iter()
        .flatten()
        .find(|project| project.title == title)
        .map(|project| NodeId::new(project.id))
}
