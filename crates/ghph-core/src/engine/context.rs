//! Per-run state shared by every reconciliation phase.

use std::future::Future;

use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ProjectError, Result, ResultExt},
    models::RepoRef,
    remote::{NodeId, RemoteBackend, StatusField},
};

/// Ids resolved once at the start of a run and reused for every item.
#[derive(Debug, Clone)]
pub(crate) struct BoardContext {
    pub repo: RepoRef,
    pub repository_id: NodeId,
    pub board_id: NodeId,
    pub status: StatusField,
}

impl BoardContext {
    /// Resolves repository, board and status field, in that order.
    pub async fn resolve<B>(
        backend: &B,
        guard: &CallGuard,
        repo: RepoRef,
        project: &str,
    ) -> Result<Self>
    where
        B: RemoteBackend + ?Sized,
    {
        let repository_id = guard
            .call(backend.resolve_repository(&repo))
            .await
            .with_context("failed to get repository id")?;

        let board_id = guard
            .call(backend.resolve_board(&repo.owner, project))
            .await
            .with_context("failed to get project id")?;

        let status = guard
            .call(backend.resolve_status_field(&board_id))
            .await
            .with_context("failed to get project status field options")?;

        debug!(
            "Resolved repository {repo} ({repository_id}), board {project:?} ({board_id}), {} status options",
            status.options.len()
        );

        Ok(Self {
            repo,
            repository_id,
            board_id,
            status,
        })
    }
}

/// Races every remote call against the run's cancellation token.
#[derive(Debug, Clone)]
pub(crate) struct CallGuard {
    cancel: CancellationToken,
}

impl CallGuard {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Awaits `call`, abandoning it with `ProjectError::Cancelled` if the
    /// token fires first. A token that is already cancelled prevents the call
    /// from being polled at all.
    pub async fn call<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ProjectError::Cancelled);
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ProjectError::Cancelled),
            result = call => result,
        }
    }
}
