mod common;

use common::{issue, phase_one_plan, Call, ScriptedBackend};
use ghph_core::{
    apply,
    models::{Epic, Milestone},
    remote::NodeId,
    ApplyOptions, ProjectError,
};
use tokio_util::sync::CancellationToken;

const LIVE: ApplyOptions = ApplyOptions { dry_run: false };
const DRY_RUN: ApplyOptions = ApplyOptions { dry_run: true };

#[tokio::test]
async fn test_phase_one_scenario() {
    let backend = ScriptedBackend::new();
    let report = apply(&CancellationToken::new(), &backend, &phase_one_plan(), LIVE)
        .await
        .expect("Failed to apply plan");

    assert_eq!(report.milestones_synced, 1);
    assert_eq!(report.epics_created, 1);
    assert_eq!(report.epics_skipped, 0);
    assert_eq!(report.issues_created, 2);
    assert_eq!(report.issues_skipped, 0);
    assert!(report.warnings.is_empty());
    assert_eq!(
        report.epic_urls,
        vec!["https://github.com/acme/widgets/issues/102".to_string()]
    );

    let created = backend.created_issues();
    assert_eq!(created.len(), 3);

    let epic = &created[2];
    assert_eq!(epic.title, "Epic 1");
    assert_eq!(epic.body, "Deliver phase one.\n\n- [ ] #100\n- [ ] #101");
    assert_eq!(epic.milestone_id, Some(NodeId::new("M_Phase 1")));
    assert_eq!(epic.label_ids, vec![NodeId::new("L_backend")]);

    // Children inherit neither milestone nor labels from the epic.
    for child in &created[..2] {
        assert_eq!(child.milestone_id, None);
        assert!(child.label_ids.is_empty());
    }

    assert_eq!(backend.count(|c| matches!(c, Call::AddToBoard(_))), 3);
    let statuses: Vec<Call> = backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::SetStatus { .. }))
        .collect();
    assert_eq!(statuses.len(), 3);
    assert!(statuses
        .iter()
        .all(|c| matches!(c, Call::SetStatus { option, .. } if option == "opt-todo")));

    assert_eq!(
        backend.calls()[..3],
        [
            Call::ResolveRepository("acme/widgets".to_string()),
            Call::ResolveBoard {
                owner: "acme".to_string(),
                title: "Roadmap".to_string(),
            },
            Call::ResolveStatusField,
        ]
    );
    assert!(backend.calls().contains(&Call::Milestone {
        title: "Phase 1".to_string(),
        due_on: Some("2025-03-01".to_string()),
    }));
}

#[tokio::test]
async fn test_second_run_creates_nothing() {
    let backend = ScriptedBackend::new();
    let cancel = CancellationToken::new();
    let plan = phase_one_plan();

    apply(&cancel, &backend, &plan, LIVE)
        .await
        .expect("Failed to apply plan");
    backend.clear_calls();

    let report = apply(&cancel, &backend, &plan, LIVE)
        .await
        .expect("Failed to re-apply plan");

    assert_eq!(report.epics_created, 0);
    assert_eq!(report.issues_created, 0);
    assert_eq!(report.epics_skipped, 1);
    assert_eq!(report.issues_skipped, 2);
    assert_eq!(report.milestones_synced, 1);
    assert!(report.epic_urls.is_empty());
    assert!(backend.created_issues().is_empty());

    // Existing items are still linked and given the epic's status.
    assert_eq!(backend.count(|c| matches!(c, Call::AddToBoard(_))), 3);
    assert_eq!(backend.count(|c| matches!(c, Call::SetStatus { .. })), 3);
}

#[tokio::test]
async fn test_children_created_before_epic_in_declared_order() {
    let backend = ScriptedBackend::new().with_existing_issue("Child 1", 7);
    let mut plan = phase_one_plan();
    plan.epics[0].children.push(issue("Child 3"));

    let report = apply(&CancellationToken::new(), &backend, &plan, LIVE)
        .await
        .expect("Failed to apply plan");

    assert_eq!(report.issues_skipped, 1);
    assert_eq!(report.issues_created, 2);
    assert_eq!(backend.created_titles(), vec!["Child 2", "Child 3", "Epic 1"]);

    let epic = backend.created_issues().pop().unwrap();
    assert_eq!(
        epic.body,
        "Deliver phase one.\n\n- [ ] #7\n- [ ] #100\n- [ ] #101"
    );
}

#[tokio::test]
async fn test_epic_without_children_keeps_trailing_separator() {
    let backend = ScriptedBackend::new();
    let mut plan = phase_one_plan();
    plan.epics[0].children.clear();

    apply(&CancellationToken::new(), &backend, &plan, LIVE)
        .await
        .expect("Failed to apply plan");

    let epic = backend.created_issues().pop().unwrap();
    assert_eq!(epic.body, "Deliver phase one.\n\n");
}

#[tokio::test]
async fn test_dry_run_makes_no_mutating_calls() {
    let backend = ScriptedBackend::new();
    let report = apply(
        &CancellationToken::new(),
        &backend,
        &phase_one_plan(),
        DRY_RUN,
    )
    .await
    .expect("Failed to preview plan");

    assert!(report.dry_run);
    assert_eq!(report.milestones_synced, 0);
    assert_eq!(report.epics_created, 0);
    assert_eq!(report.issues_created, 0);
    assert!(!backend.calls().iter().any(Call::is_mutation));
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, Call::FindIssue(_))));

    assert_eq!(
        report.planned,
        vec![
            "Would create/sync milestone: Phase 1 (due: 2025-03-01)",
            "Would create epic: Epic 1",
            "  Milestone: Phase 1",
            "  Status: Todo",
            "  Label: backend",
            "  Would create child issue: Child 1",
            "  Would create child issue: Child 2",
        ]
    );
}

#[tokio::test]
async fn test_dry_run_flags_unknown_status() {
    let backend = ScriptedBackend::new();
    let mut plan = phase_one_plan();
    plan.epics[0].status = Some("Blocked".to_string());

    let report = apply(&CancellationToken::new(), &backend, &plan, DRY_RUN)
        .await
        .expect("Failed to preview plan");

    assert!(report
        .planned
        .contains(&"  WARNING: Status \"Blocked\" not found in project".to_string()));
}

#[tokio::test]
async fn test_milestone_id_only_for_synced_titles() {
    let backend = ScriptedBackend::new();
    let mut plan = phase_one_plan();
    plan.epics.push(Epic {
        title: "Epic 2".to_string(),
        milestone: Some("Phase 9".to_string()),
        ..Epic::default()
    });
    plan.epics.push(Epic {
        title: "Epic 3".to_string(),
        milestone: Some("  ".to_string()),
        ..Epic::default()
    });

    apply(&CancellationToken::new(), &backend, &plan, LIVE)
        .await
        .expect("Failed to apply plan");

    let created = backend.created_issues();
    let milestone_of = |title: &str| {
        created
            .iter()
            .find(|issue| issue.title == title)
            .unwrap()
            .milestone_id
            .clone()
    };
    assert_eq!(milestone_of("Epic 1"), Some(NodeId::new("M_Phase 1")));
    assert_eq!(milestone_of("Epic 2"), None);
    assert_eq!(milestone_of("Epic 3"), None);
}

#[tokio::test]
async fn test_status_failure_on_existing_items_is_a_warning() {
    let backend = ScriptedBackend::new()
        .with_existing_issue("Child 1", 11)
        .with_existing_issue("Child 2", 12)
        .with_existing_issue("Epic 1", 13)
        .failing_set_status();

    let report = apply(
        &CancellationToken::new(),
        &backend,
        &phase_one_plan(),
        LIVE,
    )
    .await
    .expect("Status failures on existing items must not abort the run");

    assert_eq!(report.issues_skipped, 2);
    assert_eq!(report.epics_skipped, 1);
    assert_eq!(report.warnings.len(), 3);
    assert!(report.warnings[0].contains("existing child issue #11"));
    assert!(report.warnings[2].contains("existing epic #13"));
}

#[tokio::test]
async fn test_status_failure_on_created_items_is_fatal() {
    let backend = ScriptedBackend::new().failing_set_status();

    let err = apply(
        &CancellationToken::new(),
        &backend,
        &phase_one_plan(),
        LIVE,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ProjectError::Operation { .. }));
    assert!(err
        .to_string()
        .starts_with("failed to update status for child issue"));
    assert_eq!(backend.created_titles(), vec!["Child 1"]);
}

#[tokio::test]
async fn test_invalid_repository_fails_before_any_call() {
    let backend = ScriptedBackend::new();
    let mut plan = phase_one_plan();
    plan.repository = "widgets".to_string();

    let err = apply(&CancellationToken::new(), &backend, &plan, LIVE)
        .await
        .unwrap_err();

    assert!(matches!(err, ProjectError::InvalidInput { .. }));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let backend = ScriptedBackend::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = apply(&cancel, &backend, &phase_one_plan(), LIVE)
        .await
        .unwrap_err();

    assert!(matches!(err, ProjectError::Cancelled));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_cancelled_while_resolving_board() {
    let cancel = CancellationToken::new();
    let backend = ScriptedBackend::new().cancelling_on_board_lookup(cancel.clone());

    let err = apply(&cancel, &backend, &phase_one_plan(), LIVE)
        .await
        .unwrap_err();

    assert!(matches!(err, ProjectError::Cancelled));
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ResolveStatusField)));
}

#[tokio::test]
async fn test_cancelled_mid_run_stops_further_calls() {
    let cancel = CancellationToken::new();
    let backend = ScriptedBackend::new().cancelling_after_creates(1, cancel.clone());

    let err = apply(&cancel, &backend, &phase_one_plan(), LIVE)
        .await
        .unwrap_err();

    assert!(matches!(err, ProjectError::Cancelled));
    assert_eq!(backend.created_titles(), vec!["Child 1"]);
    assert!(matches!(
        backend.calls().last(),
        Some(Call::CreateIssue(_))
    ));
}

#[tokio::test]
async fn test_invalid_due_date_fails_after_earlier_milestones() {
    let backend = ScriptedBackend::new();
    let mut plan = phase_one_plan();
    plan.milestones.push(Milestone {
        title: "Phase 2".to_string(),
        due_on: Some("2025-13-40".to_string()),
        description: None,
    });

    let err = apply(&CancellationToken::new(), &backend, &plan, LIVE)
        .await
        .unwrap_err();

    assert!(matches!(err, ProjectError::InvalidInput { .. }));
    assert_eq!(backend.count(|c| matches!(c, Call::Milestone { .. })), 1);
    assert!(backend.created_issues().is_empty());
}

#[tokio::test]
async fn test_unknown_status_skips_status_updates() {
    let backend = ScriptedBackend::new();
    let mut plan = phase_one_plan();
    plan.epics[0].status = Some("Blocked".to_string());

    let report = apply(&CancellationToken::new(), &backend, &plan, LIVE)
        .await
        .expect("Failed to apply plan");

    assert_eq!(report.epics_created, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("\"Blocked\""));
    assert_eq!(backend.count(|c| matches!(c, Call::SetStatus { .. })), 0);
    assert_eq!(backend.count(|c| matches!(c, Call::AddToBoard(_))), 3);
}

#[tokio::test]
async fn test_labels_resolved_once_per_run_and_assignees_attached() {
    let backend = ScriptedBackend::new();
    let mut plan = phase_one_plan();
    plan.epics[0].assignees = vec!["octocat".to_string()];
    for child in &mut plan.epics[0].children {
        child.labels = vec!["backend".to_string(), "good first issue".to_string()];
    }

    apply(&CancellationToken::new(), &backend, &plan, LIVE)
        .await
        .expect("Failed to apply plan");

    assert_eq!(backend.count(|c| matches!(c, Call::Label(_))), 2);

    let created = backend.created_issues();
    assert_eq!(
        created[0].label_ids,
        vec![NodeId::new("L_backend"), NodeId::new("L_good first issue")]
    );
    assert_eq!(created[2].assignee_ids, vec![NodeId::new("U_octocat")]);
    assert!(created[0].assignee_ids.is_empty());
}
