//! Reconciliation engine.
//!
//! [`apply`] converges a [`Plan`] onto a remote tracker through a
//! [`RemoteBackend`]:
//!
//! ```text
//! parse repository ─▶ resolve repo / board / status field
//!                  ─▶ sync milestones (title → id)
//!                  ─▶ for each epic: children ─▶ epic ─▶ board + status
//! ```
//!
//! Titles are the idempotency key: an open issue whose title matches exactly
//! is reused instead of created. Children are always processed before their
//! epic because the epic body embeds a `- [ ] #N` tasklist line per child.
//!
//! Every phase is sequential and every remote call is attempted once. The
//! first fatal error aborts the run and no report is returned, even though
//! earlier mutations already happened remotely. Status updates on items that
//! already existed are best-effort and land in [`Report::warnings`].

mod context;


use std::collections::HashMap;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use self::context::{BoardContext, CallGuard};
use crate::{
    error::{ProjectError, Result, ResultExt},
    models::{Epic, Issue, Milestone, Plan},
    remote::{MilestoneSpec, NewIssue, NodeId, RemoteBackend, StatusUpdate},
    report::Report,
};

/// How a run treats the remote side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Preview only: no mutating remote call is made and every counter in
    /// the returned report stays at zero.
    pub dry_run: bool,
}

/// Applies a plan through `backend`.
///
/// # Errors
///
/// Returns `ProjectError::InvalidInput` before any remote call if the plan's
/// repository is not `owner/name`; otherwise the first remote or input error
/// encountered, or `ProjectError::Cancelled` if `cancel` fires.
pub async fn apply<B>(
    cancel: &CancellationToken,
    backend: &B,
    plan: &Plan,
    options: ApplyOptions,
) -> Result<Report>
where
    B: RemoteBackend + ?Sized,
{
    let repo = plan.repo_ref()?;
    let guard = CallGuard::new(cancel.clone());

    if options.dry_run {
        info!("[dry-run] Validating plan...");
        info!("[dry-run] Repository: {repo}");
        info!("[dry-run] Project: {}", plan.project);
    }

    let ctx = match BoardContext::resolve(backend, &guard, repo, &plan.project).await {
        Ok(ctx) => ctx,
        Err(e) if e.is_cancelled() => return Err(ProjectError::Cancelled),
        Err(e) => return Err(e),
    };
    let mut reconciler = Reconciler::new(backend, guard, ctx, options);

    match reconciler.run(plan).await {
        Ok(()) => Ok(reconciler.report),
        Err(e) => {
            warn!(
                "Plan aborted after partial progress ({}): {e}",
                reconciler.report
            );
            if e.is_cancelled() {
                Err(ProjectError::Cancelled)
            } else {
                Err(e)
            }
        }
    }
}

/// Builds an epic body: the declared body, a blank line, then one tasklist
/// line per child.
pub fn compose_epic_body(body: &str, tasklist: &[String]) -> String {
    format!("{body}\n\n{}", tasklist.join("\n"))
}

fn tasklist_line(number: u64) -> String {
    format!("- [ ] #{number}")
}

struct Reconciler<'a, B: ?Sized> {
    backend: &'a B,
    guard: CallGuard,
    ctx: BoardContext,
    options: ApplyOptions,
    report: Report,
    milestones: HashMap<String, NodeId>,
    labels: HashMap<String, NodeId>,
}

impl<'a, B> Reconciler<'a, B>
where
    B: RemoteBackend + ?Sized,
{
    fn new(backend: &'a B, guard: CallGuard, ctx: BoardContext, options: ApplyOptions) -> Self {
        Self {
            backend,
            guard,
            ctx,
            options,
            report: Report::new(options.dry_run),
            milestones: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    async fn run(&mut self, plan: &Plan) -> Result<()> {
        for milestone in &plan.milestones {
            if self.options.dry_run {
                self.preview_milestone(milestone);
            } else {
                self.sync_milestone(milestone).await?;
            }
        }

        for epic in &plan.epics {
            if self.options.dry_run {
                self.preview_epic(epic);
            } else {
                self.converge_epic(epic).await?;
            }
        }

        Ok(())
    }

    fn plan_action(&mut self, action: String) {
        info!("[dry-run] {action}");
        self.report.planned.push(action);
    }

    fn preview_milestone(&mut self, milestone: &Milestone) {
        let due = milestone
            .due_on
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("none");
        self.plan_action(format!(
            "Would create/sync milestone: {} (due: {due})",
            milestone.title
        ));
    }

    fn preview_epic(&mut self, epic: &Epic) {
        self.plan_action(format!("Would create epic: {}", epic.title));
        if let Some(milestone) = epic.milestone() {
            self.plan_action(format!("  Milestone: {milestone}"));
        }
        if let Some(status) = epic.status() {
            if self.ctx.status.option_id(status).is_some() {
                self.plan_action(format!("  Status: {status}"));
            } else {
                self.plan_action(format!("  WARNING: Status {status:?} not found in project"));
            }
        }
        for label in &epic.labels {
            self.plan_action(format!("  Label: {label}"));
        }
        for child in &epic.children {
            self.plan_action(format!("  Would create child issue: {}", child.title));
            for label in &child.labels {
                self.plan_action(format!("    Label: {label}"));
            }
        }
    }

    async fn sync_milestone(&mut self, milestone: &Milestone) -> Result<()> {
        let spec = MilestoneSpec {
            title: &milestone.title,
            description: milestone.description(),
            due_on: milestone.due_date()?,
        };

        let id = self
            .guard
            .call(self.backend.get_or_create_milestone(&self.ctx.repo, &spec))
            .await
            .with_context_lazy(|| {
                format!("failed to get or create milestone {:?}", milestone.title)
            })?;

        info!("Synced milestone: {}", milestone.title);
        self.milestones.insert(milestone.title.clone(), id);
        self.report.milestones_synced += 1;
        Ok(())
    }

    /// Option id for the epic's declared status, when the board knows it.
    fn status_option(&mut self, epic: &Epic) -> Option<String> {
        let status = epic.status()?;
        match self.ctx.status.option_id(status) {
            Some(option_id) => Some(option_id.to_string()),
            None => {
                let warning = format!(
                    "status {status:?} is not an option on the board; status left unset for epic {:?}",
                    epic.title
                );
                warn!("{warning}");
                self.report.warnings.push(warning);
                None
            }
        }
    }

    async fn converge_epic(&mut self, epic: &Epic) -> Result<()> {
        let status = self.status_option(epic);

        let mut tasklist = Vec::with_capacity(epic.children.len());
        for child in &epic.children {
            let number = self.converge_child(child, status.as_deref()).await?;
            tasklist.push(tasklist_line(number));
        }

        let existing = self
            .guard
            .call(self.backend.find_issue_by_title(&self.ctx.repo, &epic.title))
            .await
            .with_context_lazy(|| format!("failed to check for existing epic {:?}", epic.title))?;

        if let Some(existing) = existing {
            info!(
                "Skipping epic (already exists): #{} {}",
                existing.number, epic.title
            );
            self.report.epics_skipped += 1;

            let item_id = self
                .add_to_board(&existing.node_id)
                .await
                .with_context("failed to add existing epic to project")?;
            let subject = format!("existing epic #{} {:?}", existing.number, epic.title);
            self.set_status_best_effort(&item_id, status.as_deref(), &subject)
                .await?;
            return Ok(());
        }

        let body = compose_epic_body(&epic.body, &tasklist);
        let milestone_id = epic
            .milestone()
            .and_then(|title| self.milestones.get(title).cloned());
        let label_ids = self.resolve_labels(&epic.labels).await?;

        let mut assignee_ids = Vec::with_capacity(epic.assignees.len());
        for login in &epic.assignees {
            let user_id = self
                .guard
                .call(self.backend.resolve_user(login))
                .await
                .with_context_lazy(|| format!("failed to get user id for {login}"))?;
            assignee_ids.push(user_id);
        }

        let issue = NewIssue {
            repository_id: self.ctx.repository_id.clone(),
            title: epic.title.clone(),
            body,
            milestone_id,
            label_ids,
            assignee_ids,
        };
        let created = self
            .guard
            .call(self.backend.create_issue(&issue))
            .await
            .with_context("failed to create epic issue")?;

        let item_id = self
            .add_to_board(&created.id)
            .await
            .with_context("failed to add epic issue to project")?;
        if let Some(option_id) = status.as_deref() {
            self.set_status(&item_id, option_id)
                .await
                .with_context("failed to update status for epic issue")?;
        }

        info!("Created epic: {} ({})", epic.title, created.url);
        self.report.epics_created += 1;
        self.report.epic_urls.push(created.url);
        Ok(())
    }

    /// Ensures a child issue exists and sits on the board; returns its number.
    async fn converge_child(&mut self, child: &Issue, status: Option<&str>) -> Result<u64> {
        let existing = self
            .guard
            .call(self.backend.find_issue_by_title(&self.ctx.repo, &child.title))
            .await
            .with_context_lazy(|| format!("failed to check for existing issue {:?}", child.title))?;

        if let Some(existing) = existing {
            info!(
                "  Skipping child issue (already exists): #{} {}",
                existing.number, child.title
            );
            self.report.issues_skipped += 1;

            let item_id = self
                .add_to_board(&existing.node_id)
                .await
                .with_context("failed to add existing child issue to project")?;
            let subject = format!("existing child issue #{} {:?}", existing.number, child.title);
            self.set_status_best_effort(&item_id, status, &subject)
                .await?;
            return Ok(existing.number);
        }

        let label_ids = self.resolve_labels(&child.labels).await?;
        let issue = NewIssue {
            repository_id: self.ctx.repository_id.clone(),
            title: child.title.clone(),
            body: child.body.clone(),
            milestone_id: None,
            label_ids,
            assignee_ids: Vec::new(),
        };
        let created = self
            .guard
            .call(self.backend.create_issue(&issue))
            .await
            .with_context("failed to create child issue")?;
        info!("  Created child issue: #{} {}", created.number, child.title);
        self.report.issues_created += 1;

        let item_id = self
            .add_to_board(&created.id)
            .await
            .with_context("failed to add child issue to project")?;
        if let Some(option_id) = status {
            self.set_status(&item_id, option_id)
                .await
                .with_context("failed to update status for child issue")?;
        }

        Ok(created.number)
    }

    /// Resolves label names to ids, creating missing labels. Ids are cached
    /// for the rest of the run.
    async fn resolve_labels(&mut self, names: &[String]) -> Result<Vec<NodeId>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            if let Some(id) = self.labels.get(name) {
                ids.push(id.clone());
                continue;
            }
            let id = self
                .guard
                .call(self.backend.get_or_create_label(&self.ctx.repo, name))
                .await
                .with_context_lazy(|| format!("failed to get or create label {name}"))?;
            self.labels.insert(name.clone(), id.clone());
            ids.push(id);
        }
        Ok(ids)
    }

    async fn add_to_board(&self, content_id: &NodeId) -> Result<NodeId> {
        self.guard
            .call(self.backend.add_to_board(&self.ctx.board_id, content_id))
            .await
    }

    async fn set_status(&self, item_id: &NodeId, option_id: &str) -> Result<()> {
        let update = StatusUpdate {
            board_id: &self.ctx.board_id,
            item_id,
            field_id: &self.ctx.status.field_id,
            option_id,
        };
        self.guard.call(self.backend.set_status(&update)).await
    }

    /// Sets status on an item that already existed. Failures are recorded as
    /// warnings; only cancellation propagates.
    async fn set_status_best_effort(
        &mut self,
        item_id: &NodeId,
        option_id: Option<&str>,
        subject: &str,
    ) -> Result<()> {
        let Some(option_id) = option_id else {
            return Ok(());
        };

        match self.set_status(item_id, option_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                let warning = format!("failed to update status for {subject}: {e}");
                warn!("{warning}");
                self.report.warnings.push(warning);
                Ok(())
            }
        }
    }
}
