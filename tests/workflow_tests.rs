use hris_be::AppError;
use hris_be::database::models::{EmploymentStatus, OvertimeStatus, RevisionAction};
use pretty_assertions::assert_eq;
use serial_test::serial;
use uuid::Uuid;

mod common;

use common::{TestContext, date, entry};

#[actix_web::test]
#[serial]
async fn test_submit_derives_total_hours_and_registers_pending() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;

    // Act
    let outcome = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0), entry(2, 3.0)])
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome.request.request.status, OvertimeStatus::Pending);
    assert_eq!(outcome.request.request.total_hours, 7.0);
    assert_eq!(outcome.request.entries.len(), 2);
    assert_eq!(
        outcome.revision.as_ref().unwrap().action,
        RevisionAction::Submitted
    );

    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.pending_hours, 7.0);
    assert_eq!(balance.current_balance, 0.0);
}

#[actix_web::test]
#[serial]
async fn test_submit_rejects_invalid_entries() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;

    // Act + Assert: empty entry list
    let err = ctx.workflow.submit(employee.id, None, vec![]).await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Zero hours
    let err = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 0.0)])
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Above the per-day cap
    let err = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 12.5)])
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Duplicate dates
    let err = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 2.0), entry(1, 3.0)])
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Future date
    let err = ctx
        .workflow
        .submit(employee.id, None, vec![entry(-1, 2.0)])
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Nothing slipped through to the balance ledger
    let balance = ctx.balances.get_overtime_balance(employee.id).await.unwrap();
    assert!(balance.is_none());
}

#[actix_web::test]
#[serial]
async fn test_submit_rejects_entries_outside_window() {
    // Arrange
    let ctx = TestContext::with_window(30).await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;

    // Act
    let inside = ctx
        .workflow
        .submit(employee.id, None, vec![entry(29, 2.0)])
        .await;
    let outside = ctx
        .workflow
        .submit(employee.id, None, vec![entry(45, 2.0)])
        .await;

    // Assert
    assert!(inside.is_ok());
    assert!(matches!(outside, Err(AppError::Validation(_))));
}

#[actix_web::test]
#[serial]
async fn test_submit_for_unknown_employee_is_not_found() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();

    // Act
    let err = ctx
        .workflow
        .submit(Uuid::new_v4(), None, vec![entry(1, 2.0)])
        .await;

    // Assert
    assert!(matches!(err, Err(AppError::NotFound(_))));
}

#[actix_web::test]
#[serial]
async fn test_edit_recomputes_total_and_keeps_status() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let approver = Uuid::new_v4();
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0), entry(2, 3.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .request_revision(request_id, approver, Some("split the Saturday entry"))
        .await
        .unwrap();

    // Act
    let edited = ctx
        .workflow
        .edit(request_id, employee.id, vec![entry(1, 5.0)])
        .await
        .unwrap();

    // Assert: editing alone does not resubmit
    assert_eq!(
        edited.request.request.status,
        OvertimeStatus::RevisionRequested
    );
    assert_eq!(edited.request.request.total_hours, 5.0);
    assert_eq!(edited.request.entries.len(), 1);

    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.pending_hours, 5.0);
}

#[actix_web::test]
#[serial]
async fn test_edit_by_non_owner_is_forbidden() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();

    // Act
    let err = ctx
        .workflow
        .edit(
            submitted.request.request.id,
            Uuid::new_v4(),
            vec![entry(1, 2.0)],
        )
        .await;

    // Assert
    assert!(matches!(err, Err(AppError::Forbidden(_))));
}

#[actix_web::test]
#[serial]
async fn test_edit_after_terminal_decision_is_a_conflict() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .final_approve(request_id, Uuid::new_v4(), Some("ok"))
        .await
        .unwrap();

    // Act
    let err = ctx
        .workflow
        .edit(request_id, employee.id, vec![entry(1, 2.0)])
        .await;

    // Assert
    assert!(matches!(err, Err(AppError::Conflict(_))));
}

#[actix_web::test]
#[serial]
async fn test_resubmit_returns_request_to_pending() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .request_revision(request_id, Uuid::new_v4(), Some("wrong project code"))
        .await
        .unwrap();

    // Act
    let outcome = ctx.workflow.resubmit(request_id, employee.id).await.unwrap();

    // Assert
    assert_eq!(outcome.request.request.status, OvertimeStatus::Pending);
    assert_eq!(
        outcome.revision.as_ref().unwrap().action,
        RevisionAction::Resubmitted
    );

    // Resubmitting a Pending request is stale
    let err = ctx.workflow.resubmit(request_id, employee.id).await;
    assert!(matches!(err, Err(AppError::Conflict(_))));
}

#[actix_web::test]
#[serial]
async fn test_two_tier_approval_credits_balance_only_at_the_end() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let supervisor = Uuid::new_v4();
    let division_head = Uuid::new_v4();
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0), entry(2, 3.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;

    // Act: supervisor tier
    let mid = ctx
        .workflow
        .approve_as_supervisor(request_id, supervisor, Some("looks right"))
        .await
        .unwrap();

    // Assert: locked but not yet credited
    assert_eq!(
        mid.request.request.status,
        OvertimeStatus::SupervisorApproved
    );
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.current_balance, 0.0);
    assert_eq!(balance.pending_hours, 7.0);

    // Act: division head tier
    let done = ctx
        .workflow
        .approve_as_division_head(request_id, division_head, None)
        .await
        .unwrap();

    // Assert: credited, pending cleared, approver recorded
    assert_eq!(done.request.request.status, OvertimeStatus::Approved);
    assert_eq!(done.request.request.approved_by, Some(division_head));
    assert!(done.request.request.approved_at.is_some());
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.current_balance, 7.0);
    assert_eq!(balance.pending_hours, 0.0);
}

#[actix_web::test]
#[serial]
async fn test_second_approval_of_same_request_is_a_conflict() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .final_approve(request_id, Uuid::new_v4(), None)
        .await
        .unwrap();

    // Act
    let err = ctx
        .workflow
        .final_approve(request_id, Uuid::new_v4(), None)
        .await;

    // Assert: exactly one approval credited the hours
    assert!(matches!(err, Err(AppError::Conflict(_))));
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.current_balance, 4.0);
}

#[actix_web::test]
#[serial]
async fn test_concurrent_approvals_have_one_winner_and_one_conflict() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;

    // Act: two approvers race on the same request
    let first = ctx.workflow.clone();
    let second = ctx.workflow.clone();
    let (a, b) = tokio::join!(
        first.final_approve(request_id, Uuid::new_v4(), None),
        second.final_approve(request_id, Uuid::new_v4(), None),
    );

    // Assert: exactly one wins, the loser gets a clean conflict
    let (winner, loser) = match (a, b) {
        (Ok(outcome), Err(err)) | (Err(err), Ok(outcome)) => (outcome, err),
        (Ok(_), Ok(_)) => panic!("both approvals succeeded"),
        (Err(a), Err(b)) => panic!("both approvals failed: {:?} / {:?}", a, b),
    };
    assert_eq!(winner.request.request.status, OvertimeStatus::Approved);
    assert!(matches!(loser, AppError::Conflict(_)));

    // The hours were credited exactly once
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.current_balance, 4.0);
    assert_eq!(balance.pending_hours, 0.0);
}

#[actix_web::test]
#[serial]
async fn test_reject_requires_a_comment() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;

    // Act: missing and whitespace-only comments both fail
    let err = ctx
        .workflow
        .final_reject(request_id, Uuid::new_v4(), None)
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));
    let err = ctx
        .workflow
        .final_reject(request_id, Uuid::new_v4(), Some("   "))
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Assert: nothing moved, nothing was recorded
    let detail = ctx.workflow.get_detail(request_id).await.unwrap();
    assert_eq!(detail.request.status, OvertimeStatus::Pending);
    let history = ctx.workflow.history(request_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, RevisionAction::Submitted);
}

#[actix_web::test]
#[serial]
async fn test_reject_clears_pending_hours() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 6.0)])
        .await
        .unwrap();

    // Act
    let outcome = ctx
        .workflow
        .final_reject(
            submitted.request.request.id,
            Uuid::new_v4(),
            Some("not pre-approved"),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome.request.request.status, OvertimeStatus::Rejected);
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.pending_hours, 0.0);
    assert_eq!(balance.current_balance, 0.0);
}

#[actix_web::test]
#[serial]
async fn test_request_revision_without_comment_changes_nothing() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;

    // Act
    let err = ctx
        .workflow
        .request_revision(request_id, Uuid::new_v4(), Some(""))
        .await;

    // Assert
    assert!(matches!(err, Err(AppError::Validation(_))));
    let detail = ctx.workflow.get_detail(request_id).await.unwrap();
    assert_eq!(detail.request.status, OvertimeStatus::Pending);
    let history = ctx.workflow.history(request_id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[actix_web::test]
#[serial]
async fn test_admin_reject_reverses_credit_and_preserves_original_approval() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let approver = Uuid::new_v4();
    let admin = Uuid::new_v4();
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0), entry(2, 3.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .final_approve(request_id, approver, Some("ok"))
        .await
        .unwrap();
    let approved = ctx.workflow.get_detail(request_id).await.unwrap();
    assert_eq!(
        ctx.balances
            .get_overtime_balance(employee.id)
            .await
            .unwrap()
            .unwrap()
            .current_balance,
        7.0
    );

    // Act
    let outcome = ctx
        .workflow
        .admin_reject(request_id, admin, Some("approved by mistake"))
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome.request.request.status, OvertimeStatus::Rejected);
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.current_balance, 0.0);

    let history = ctx.workflow.history(request_id).await.unwrap();
    let actions: Vec<_> = history.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            RevisionAction::Submitted,
            RevisionAction::FinalApproved,
            RevisionAction::AdminRejected,
        ]
    );

    // The override entry keeps the overturned approval auditable
    use hris_be::database::models::RevisionChanges;
    match history[2].parsed_changes().unwrap() {
        RevisionChanges::AdminRejected {
            original_approver,
            original_approved_at,
            hours_deducted,
            ..
        } => {
            assert_eq!(original_approver, Some(approver));
            assert_eq!(original_approved_at, approved.request.approved_at);
            assert_eq!(hours_deducted, 7.0);
        }
        other => panic!("unexpected changes payload: {:?}", other),
    }
}

#[actix_web::test]
#[serial]
async fn test_admin_reject_clamps_balance_at_zero() {
    // Arrange: approve 7h, pay out 5h, then overturn the approval
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0), entry(2, 3.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .final_approve(request_id, Uuid::new_v4(), None)
        .await
        .unwrap();
    ctx.balances.mark_paid(employee.id, 5.0).await.unwrap();

    // Act
    let outcome = ctx
        .workflow
        .admin_reject(request_id, Uuid::new_v4(), Some("payroll dispute"))
        .await
        .unwrap();

    // Assert: 2 - 7 clamps to 0, the override itself still succeeds
    assert_eq!(outcome.request.request.status, OvertimeStatus::Rejected);
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.current_balance, 0.0);
    assert_eq!(balance.total_paid, 5.0);
}

#[actix_web::test]
#[serial]
async fn test_admin_reject_only_applies_to_approved_requests() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0)])
        .await
        .unwrap();

    // Act
    let err = ctx
        .workflow
        .admin_reject(submitted.request.request.id, Uuid::new_v4(), Some("nope"))
        .await;

    // Assert
    assert!(matches!(err, Err(AppError::Conflict(_))));
}

#[actix_web::test]
#[serial]
async fn test_delete_clears_pending_and_respects_transitions() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 6.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;

    // Act
    let outcome = ctx
        .workflow
        .delete(request_id, employee.id, Some("entered twice"))
        .await
        .unwrap();

    // Assert: soft-deleted, pending released, row still readable
    assert_eq!(outcome.request.request.status, OvertimeStatus::Deleted);
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.pending_hours, 0.0);
    let history = ctx.workflow.history(request_id).await.unwrap();
    assert_eq!(history.last().unwrap().action, RevisionAction::Deleted);
}

#[actix_web::test]
#[serial]
async fn test_delete_of_approved_request_is_a_conflict() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 6.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .final_approve(request_id, Uuid::new_v4(), None)
        .await
        .unwrap();

    // Act
    let err = ctx.workflow.delete(request_id, employee.id, None).await;

    // Assert: a granted balance is never clawed back by a delete
    assert!(matches!(err, Err(AppError::Conflict(_))));
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.current_balance, 6.0);
}

#[actix_web::test]
#[serial]
async fn test_rejected_request_can_be_cleaned_up_by_owner() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 6.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    ctx.workflow
        .final_reject(request_id, Uuid::new_v4(), Some("duplicate"))
        .await
        .unwrap();

    // Act
    let outcome = ctx.workflow.delete(request_id, employee.id, None).await.unwrap();

    // Assert: pending was already released by the rejection, not double-debited
    assert_eq!(outcome.request.request.status, OvertimeStatus::Deleted);
    let balance = ctx
        .balances
        .get_overtime_balance(employee.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(balance.pending_hours, 0.0);
}

#[actix_web::test]
#[serial]
async fn test_list_for_employee_filters_by_status() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let first = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 2.0)])
        .await
        .unwrap();
    ctx.workflow
        .submit(employee.id, None, vec![entry(2, 3.0)])
        .await
        .unwrap();
    ctx.workflow
        .final_approve(first.request.request.id, Uuid::new_v4(), None)
        .await
        .unwrap();

    // Act
    let all = ctx
        .workflow
        .list_for_employee(employee.id, None)
        .await
        .unwrap();
    let approved = ctx
        .workflow
        .list_for_employee(employee.id, Some(OvertimeStatus::Approved))
        .await
        .unwrap();

    // Assert
    assert_eq!(all.len(), 2);
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, first.request.request.id);
}

#[actix_web::test]
#[serial]
async fn test_history_for_unknown_request_is_not_found() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();

    // Act
    let err = ctx.workflow.history(Uuid::new_v4()).await;

    // Assert
    assert!(matches!(err, Err(AppError::NotFound(_))));
}
