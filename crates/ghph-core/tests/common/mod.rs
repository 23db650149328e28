#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ghph_core::{
    error::{ProjectError, Result},
    models::{Epic, Issue, Milestone, Plan, RepoRef},
    remote::{
        CreatedIssue, IssueRef, MilestoneSpec, NewIssue, NodeId, RemoteBackend, StatusField,
        StatusUpdate,
    },
};
use tokio_util::sync::CancellationToken;

/// A remote call as seen by the scripted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ResolveRepository(String),
    ResolveBoard { owner: String, title: String },
    ResolveStatusField,
    Milestone { title: String, due_on: Option<String> },
    FindIssue(String),
    Label(String),
    ResolveUser(String),
    CreateIssue(NewIssue),
    AddToBoard(NodeId),
    SetStatus { item: NodeId, option: String },
}

impl Call {
    /// Calls that change remote state when the real backend runs them.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Milestone { .. }
                | Self::Label(_)
                | Self::CreateIssue(_)
                | Self::AddToBoard(_)
                | Self::SetStatus { .. }
        )
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    issues: HashMap<String, u64>,
    next_number: u64,
}

/// In-memory tracker that records every call and remembers created issues,
/// so a second run sees the first run's output.
#[derive(Debug)]
pub struct ScriptedBackend {
    state: Mutex<State>,
    status_options: HashMap<String, String>,
    fail_set_status: bool,
    cancel_after_creates: Option<(usize, CancellationToken)>,
    cancel_on_board_lookup: Option<CancellationToken>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_number: 100,
                ..State::default()
            }),
            status_options: HashMap::from([
                ("Todo".to_string(), "opt-todo".to_string()),
                ("In Progress".to_string(), "opt-progress".to_string()),
            ]),
            fail_set_status: false,
            cancel_after_creates: None,
            cancel_on_board_lookup: None,
        }
    }

    /// Seeds an open issue that already exists remotely.
    pub fn with_existing_issue(self, title: &str, number: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .issues
            .insert(title.to_string(), number);
        self
    }

    pub fn failing_set_status(mut self) -> Self {
        self.fail_set_status = true;
        self
    }

    /// Cancels `token` once `creates` issues have been created.
    pub fn cancelling_after_creates(mut self, creates: usize, token: CancellationToken) -> Self {
        self.cancel_after_creates = Some((creates, token));
        self
    }

    /// Cancels `token` while the board is being resolved.
    pub fn cancelling_on_board_lookup(mut self, token: CancellationToken) -> Self {
        self.cancel_on_board_lookup = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn created_issues(&self) -> Vec<NewIssue> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateIssue(issue) => Some(issue),
                _ => None,
            })
            .collect()
    }

    pub fn created_titles(&self) -> Vec<String> {
        self.created_issues()
            .into_iter()
            .map(|issue| issue.title)
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl RemoteBackend for ScriptedBackend {
    async fn resolve_repository(&self, repo: &RepoRef) -> Result<NodeId> {
        self.record(Call::ResolveRepository(repo.to_string()));
        Ok(NodeId::new("R_repo"))
    }

    async fn resolve_board(&self, owner: &str, title: &str) -> Result<NodeId> {
        self.record(Call::ResolveBoard {
            owner: owner.to_string(),
            title: title.to_string(),
        });
        if let Some(token) = &self.cancel_on_board_lookup {
            token.cancel();
            std::future::pending::<()>().await;
        }
        Ok(NodeId::new("PVT_board"))
    }

    async fn resolve_status_field(&self, _board_id: &NodeId) -> Result<StatusField> {
        self.record(Call::ResolveStatusField);
        Ok(StatusField {
            field_id: NodeId::new("F_status"),
            options: self.status_options.clone(),
        })
    }

    async fn get_or_create_milestone(
        &self,
        _repo: &RepoRef,
        milestone: &MilestoneSpec<'_>,
    ) -> Result<NodeId> {
        self.record(Call::Milestone {
            title: milestone.title.to_string(),
            due_on: milestone.due_on.map(|d| d.to_string()),
        });
        Ok(NodeId::new(format!("M_{}", milestone.title)))
    }

    async fn find_issue_by_title(&self, _repo: &RepoRef, title: &str) -> Result<Option<IssueRef>> {
        self.record(Call::FindIssue(title.to_string()));
        let state = self.state.lock().unwrap();
        Ok(state.issues.get(title).map(|&number| IssueRef {
            number,
            node_id: NodeId::new(format!("I_{number}")),
        }))
    }

    async fn get_or_create_label(&self, _repo: &RepoRef, name: &str) -> Result<NodeId> {
        self.record(Call::Label(name.to_string()));
        Ok(NodeId::new(format!("L_{name}")))
    }

    async fn resolve_user(&self, login: &str) -> Result<NodeId> {
        self.record(Call::ResolveUser(login.to_string()));
        Ok(NodeId::new(format!("U_{login}")))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let (number, creates) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::CreateIssue(issue.clone()));
            let number = state.next_number;
            state.next_number += 1;
            state.issues.insert(issue.title.clone(), number);
            let creates = state
                .calls
                .iter()
                .filter(|call| matches!(call, Call::CreateIssue(_)))
                .count();
            (number, creates)
        };

        if let Some((after, token)) = &self.cancel_after_creates {
            if creates >= *after {
                token.cancel();
            }
        }

        Ok(CreatedIssue {
            id: NodeId::new(format!("I_{number}")),
            number,
            url: format!("https://github.com/acme/widgets/issues/{number}"),
        })
    }

    async fn add_to_board(&self, _board_id: &NodeId, content_id: &NodeId) -> Result<NodeId> {
        self.record(Call::AddToBoard(content_id.clone()));
        Ok(NodeId::new(format!("PVTI_{content_id}")))
    }

    async fn set_status(&self, update: &StatusUpdate<'_>) -> Result<()> {
        self.record(Call::SetStatus {
            item: update.item_id.clone(),
            option: update.option_id.to_string(),
        });
        if self.fail_set_status {
            return Err(ProjectError::Api {
                status: 502,
                message: "status field update rejected".to_string(),
            });
        }
        Ok(())
    }
}

pub fn issue(title: &str) -> Issue {
    Issue {
        title: title.to_string(),
        body: format!("{title} body"),
        labels: Vec::new(),
    }
}

/// The "Phase 1 / Epic 1 / Child 1, Child 2" plan.
pub fn phase_one_plan() -> Plan {
    Plan {
        project: "Roadmap".to_string(),
        repository: "acme/widgets".to_string(),
        milestones: vec![Milestone {
            title: "Phase 1".to_string(),
            due_on: Some("2025-03-01".to_string()),
            description: None,
        }],
        epics: vec![Epic {
            title: "Epic 1".to_string(),
            body: "Deliver phase one.".to_string(),
            milestone: Some("Phase 1".to_string()),
            status: Some("Todo".to_string()),
            labels: vec!["backend".to_string()],
            assignees: Vec::new(),
            children: vec![issue("Child 1"), issue("Child 2")],
        }],
    }
}
