use hris_be::database::models::{
    ApprovalTier, EmploymentStatus, RevisionAction, RevisionChanges,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use uuid::Uuid;

mod common;

use common::{TestContext, date, entry};

#[actix_web::test]
#[serial]
async fn test_ledger_lists_entries_in_creation_order() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 3.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    let actor = Uuid::new_v4();

    // Act
    ctx.revisions
        .append(
            request_id,
            actor,
            RevisionAction::RevisionRequested,
            &RevisionChanges::RevisionRequested,
            Some("first"),
        )
        .await
        .unwrap();
    ctx.revisions
        .append(
            request_id,
            actor,
            RevisionAction::Resubmitted,
            &RevisionChanges::Resubmitted { total_hours: 3.0 },
            Some("second"),
        )
        .await
        .unwrap();
    let history = ctx.revisions.list_for_request(request_id).await.unwrap();

    // Assert
    let actions: Vec<_> = history.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            RevisionAction::Submitted,
            RevisionAction::RevisionRequested,
            RevisionAction::Resubmitted,
        ]
    );
    assert_eq!(history[1].comment.as_deref(), Some("first"));
}

#[actix_web::test]
#[serial]
async fn test_changes_payload_survives_the_round_trip() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 3.0)])
        .await
        .unwrap();
    let request_id = submitted.request.request.id;
    let changes = RevisionChanges::Approved {
        tier: ApprovalTier::DivisionHead,
        hours_credited: 3.0,
    };

    // Act
    let written = ctx
        .revisions
        .append(
            request_id,
            Uuid::new_v4(),
            RevisionAction::DivisionHeadApproved,
            &changes,
            None,
        )
        .await
        .unwrap();
    let read_back = ctx
        .revisions
        .list_for_request(request_id)
        .await
        .unwrap()
        .pop()
        .unwrap();

    // Assert
    assert_eq!(read_back.id, written.id);
    assert_eq!(read_back.parsed_changes().unwrap(), changes);
}

#[actix_web::test]
#[serial]
async fn test_submission_itself_is_the_first_ledger_entry() {
    // Arrange
    let ctx = TestContext::new().await.unwrap();
    let employee = ctx
        .seed_employee(EmploymentStatus::Pkwtt, date(2020, 1, 1))
        .await;

    // Act
    let submitted = ctx
        .workflow
        .submit(employee.id, None, vec![entry(1, 4.0), entry(2, 3.0)])
        .await
        .unwrap();
    let history = ctx
        .revisions
        .list_for_request(submitted.request.request.id)
        .await
        .unwrap();

    // Assert
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].revised_by, employee.id);
    assert_eq!(
        history[0].parsed_changes().unwrap(),
        RevisionChanges::Submitted {
            total_hours: 7.0,
            entry_count: 2,
        }
    );
}
