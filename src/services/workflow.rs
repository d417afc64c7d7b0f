use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{
    ApprovalTier, OvertimeEntryInput, OvertimeRequest, OvertimeRequestDetail, OvertimeRevision,
    OvertimeStatus, RevisionAction, RevisionChanges,
};
use crate::database::repositories::{
    BalanceRepository, EmployeeRepository, OvertimeRepository, RevisionRepository,
};
use crate::error::AppError;

/// What every state-machine operation hands back: the request as it now
/// stands, and the ledger entry recorded for the action. `revision` is None
/// only when the audit write failed; the transition itself has committed
/// either way (losing an audit line is less harmful than losing an approval),
/// and the failure is visible in the logs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutcome {
    pub request: OvertimeRequestDetail,
    pub revision: Option<OvertimeRevision>,
}

/// The overtime request lifecycle. Each operation validates its inputs, opens
/// a transaction, re-checks the stored status under that transaction, applies
/// the transition together with its balance effect, commits, and only then
/// appends the ledger entry (so the ledger never records an action that did
/// not happen).
#[derive(Clone)]
pub struct OvertimeWorkflow {
    pool: SqlitePool,
    overtime: OvertimeRepository,
    revisions: RevisionRepository,
    balances: BalanceRepository,
    employees: EmployeeRepository,
    entry_window_days: i64,
}

impl OvertimeWorkflow {
    pub fn new(pool: SqlitePool, entry_window_days: i64) -> Self {
        Self {
            overtime: OvertimeRepository::new(pool.clone()),
            revisions: RevisionRepository::new(pool.clone()),
            balances: BalanceRepository::new(pool.clone()),
            employees: EmployeeRepository::new(pool.clone()),
            pool,
            entry_window_days,
        }
    }

    /// Create a new request in Pending and register its hours as pending.
    pub async fn submit(
        &self,
        employee_id: Uuid,
        current_approver_id: Option<Uuid>,
        entries: Vec<OvertimeEntryInput>,
    ) -> Result<WorkflowOutcome, AppError> {
        let total_hours = self.validate_entries(&entries)?;

        if self.employees.get_by_id(employee_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "employee {} not found",
                employee_id
            )));
        }

        let entry_count = entries.len();
        let mut tx = self.begin_write().await?;
        let request = self
            .overtime
            .create(&mut tx, employee_id, current_approver_id, &entries, total_hours)
            .await?;
        self.balances
            .bump_pending(&mut tx, employee_id, total_hours)
            .await?;
        tx.commit().await?;

        let revision = self
            .record(
                request.id,
                employee_id,
                RevisionAction::Submitted,
                &RevisionChanges::Submitted {
                    total_hours,
                    entry_count,
                },
                None,
            )
            .await;

        self.outcome(request.id, revision).await
    }

    /// Replace the entries of an editable request. Editing does NOT move the
    /// request back to Pending; a requested re-review is only cleared by an
    /// explicit resubmit.
    pub async fn edit(
        &self,
        request_id: Uuid,
        actor: Uuid,
        entries: Vec<OvertimeEntryInput>,
    ) -> Result<WorkflowOutcome, AppError> {
        let total_after = self.validate_entries(&entries)?;
        let entries_before = self.overtime.get_entries(request_id).await?.len();
        let entries_after = entries.len();

        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        Self::require_owner(&before, actor, "edit")?;
        if !before.status.is_editable() {
            return Err(Self::stale("edit", before.status));
        }

        let updated = self
            .overtime
            .replace_entries(&mut tx, request_id, &entries, total_after)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        self.balances
            .bump_pending(&mut tx, before.employee_id, total_after - before.total_hours)
            .await?;
        tx.commit().await?;

        let revision = self
            .record(
                updated.id,
                actor,
                RevisionAction::Edited,
                &RevisionChanges::Edited {
                    hours_before: before.total_hours,
                    hours_after: total_after,
                    entries_before,
                    entries_after,
                },
                None,
            )
            .await;

        self.outcome(request_id, revision).await
    }

    /// Send an edited request back into the approval queue.
    pub async fn resubmit(
        &self,
        request_id: Uuid,
        actor: Uuid,
    ) -> Result<WorkflowOutcome, AppError> {
        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        Self::require_owner(&before, actor, "resubmit")?;
        if before.status != OvertimeStatus::RevisionRequested {
            return Err(Self::stale("resubmit", before.status));
        }

        self.overtime
            .resubmit(&mut tx, request_id)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                actor,
                RevisionAction::Resubmitted,
                &RevisionChanges::Resubmitted {
                    total_hours: before.total_hours,
                },
                None,
            )
            .await;

        self.outcome(request_id, revision).await
    }

    /// First-tier sign-off; the request moves to the intermediate state and
    /// its entries lock, but no hours are credited yet.
    pub async fn approve_as_supervisor(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        if !before.status.can_transition_to(OvertimeStatus::SupervisorApproved) {
            return Err(Self::stale("approve", before.status));
        }

        self.overtime
            .supervisor_approve(&mut tx, request_id, comment)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                approver,
                RevisionAction::SupervisorApproved,
                &RevisionChanges::Approved {
                    tier: ApprovalTier::Supervisor,
                    hours_credited: 0.0,
                },
                comment,
            )
            .await;

        self.outcome(request_id, revision).await
    }

    pub async fn reject_as_supervisor(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        let comment = Self::require_comment(comment)?;

        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        if !before.status.is_editable() {
            return Err(Self::stale("reject", before.status));
        }

        self.overtime
            .supervisor_reject(&mut tx, request_id, &comment)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        self.balances
            .bump_pending(&mut tx, before.employee_id, -before.total_hours)
            .await?;
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                approver,
                RevisionAction::SupervisorRejected,
                &RevisionChanges::Rejected {
                    tier: ApprovalTier::Supervisor,
                },
                Some(&comment),
            )
            .await;

        self.outcome(request_id, revision).await
    }

    /// Final tier of the two-step chain: credits the hour balance.
    pub async fn approve_as_division_head(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        self.approve_terminal(
            request_id,
            approver,
            comment,
            &[OvertimeStatus::SupervisorApproved],
            ApprovalTier::DivisionHead,
            RevisionAction::DivisionHeadApproved,
        )
        .await
    }

    pub async fn reject_as_division_head(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        self.reject_terminal(
            request_id,
            approver,
            comment,
            &[OvertimeStatus::SupervisorApproved],
            ApprovalTier::DivisionHead,
            RevisionAction::DivisionHeadRejected,
        )
        .await
    }

    /// Single-authority terminal decision (no supervisor tier in the chain).
    pub async fn final_approve(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        self.approve_terminal(
            request_id,
            approver,
            comment,
            &[OvertimeStatus::Pending, OvertimeStatus::RevisionRequested],
            ApprovalTier::Final,
            RevisionAction::FinalApproved,
        )
        .await
    }

    pub async fn final_reject(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        self.reject_terminal(
            request_id,
            approver,
            comment,
            &[OvertimeStatus::Pending, OvertimeStatus::RevisionRequested],
            ApprovalTier::Final,
            RevisionAction::FinalRejected,
        )
        .await
    }

    /// Ask the employee to rework the request. The ledger entry is the only
    /// durable record of this transition, so it is validated before anything
    /// is touched.
    pub async fn request_revision(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        let comment = Self::require_comment(comment)?;

        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        if before.status != OvertimeStatus::Pending {
            return Err(Self::stale("request revision of", before.status));
        }

        self.overtime
            .request_revision(&mut tx, request_id, &comment)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                approver,
                RevisionAction::RevisionRequested,
                &RevisionChanges::RevisionRequested,
                Some(&comment),
            )
            .await;

        self.outcome(request_id, revision).await
    }

    /// Admin override of a finished approval: Approved -> Rejected, reversing
    /// the credit (clamped at zero). The original approval metadata is folded
    /// into the ledger entry so the approval stays auditable after reversal.
    pub async fn admin_reject(
        &self,
        request_id: Uuid,
        admin: Uuid,
        comment: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        let comment = Self::require_comment(comment)?;

        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        if before.status != OvertimeStatus::Approved {
            return Err(Self::stale("override", before.status));
        }

        self.overtime
            .admin_reject(&mut tx, request_id)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        self.balances
            .debit_overtime_clamped(&mut tx, before.employee_id, before.total_hours)
            .await?;
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                admin,
                RevisionAction::AdminRejected,
                &RevisionChanges::AdminRejected {
                    original_approver: before.approved_by,
                    original_approved_at: before.approved_at,
                    original_comment: before.division_head_comment.clone(),
                    hours_deducted: before.total_hours,
                },
                Some(&comment),
            )
            .await;

        self.outcome(request_id, revision).await
    }

    /// Owner delete: any non-terminal state, or Rejected for cleanup. Never
    /// claws back a granted balance.
    pub async fn delete(
        &self,
        request_id: Uuid,
        actor: Uuid,
        reason: Option<&str>,
    ) -> Result<WorkflowOutcome, AppError> {
        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        Self::require_owner(&before, actor, "delete")?;
        if !before.status.can_transition_to(OvertimeStatus::Deleted) {
            return Err(Self::stale("delete", before.status));
        }

        self.overtime
            .mark_deleted(&mut tx, request_id)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        if before.status.is_undecided() {
            self.balances
                .bump_pending(&mut tx, before.employee_id, -before.total_hours)
                .await?;
        }
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                actor,
                RevisionAction::Deleted,
                &RevisionChanges::Deleted {
                    reason: reason.map(str::to_string),
                },
                reason,
            )
            .await;

        self.outcome(request_id, revision).await
    }

    pub async fn get_detail(&self, request_id: Uuid) -> Result<OvertimeRequestDetail, AppError> {
        let request = self
            .overtime
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| Self::not_found(request_id))?;
        let entries = self.overtime.get_entries(request_id).await?;
        Ok(OvertimeRequestDetail { request, entries })
    }

    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
        status: Option<OvertimeStatus>,
    ) -> Result<Vec<OvertimeRequest>, AppError> {
        Ok(self.overtime.list_for_employee(employee_id, status).await?)
    }

    /// Ordered ledger history for a request.
    pub async fn history(&self, request_id: Uuid) -> Result<Vec<OvertimeRevision>, AppError> {
        if self.overtime.get_by_id(request_id).await?.is_none() {
            return Err(Self::not_found(request_id));
        }
        Ok(self.revisions.list_for_request(request_id).await?)
    }

    // ---- terminal-decision plumbing ----

    async fn approve_terminal(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
        expected: &[OvertimeStatus],
        tier: ApprovalTier,
        action: RevisionAction,
    ) -> Result<WorkflowOutcome, AppError> {
        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        if !expected.contains(&before.status) {
            return Err(Self::stale("approve", before.status));
        }

        self.overtime
            .approve_terminal(&mut tx, request_id, expected, approver, comment)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        self.balances
            .credit_overtime(&mut tx, before.employee_id, before.total_hours)
            .await?;
        self.balances
            .bump_pending(&mut tx, before.employee_id, -before.total_hours)
            .await?;
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                approver,
                action,
                &RevisionChanges::Approved {
                    tier,
                    hours_credited: before.total_hours,
                },
                comment,
            )
            .await;

        self.outcome(request_id, revision).await
    }

    async fn reject_terminal(
        &self,
        request_id: Uuid,
        approver: Uuid,
        comment: Option<&str>,
        expected: &[OvertimeStatus],
        tier: ApprovalTier,
        action: RevisionAction,
    ) -> Result<WorkflowOutcome, AppError> {
        let comment = Self::require_comment(comment)?;

        let mut tx = self.begin_write().await?;
        let before = self.load(&mut tx, request_id).await?;
        if !expected.contains(&before.status) {
            return Err(Self::stale("reject", before.status));
        }

        self.overtime
            .reject_terminal(&mut tx, request_id, expected, &comment)
            .await?
            .ok_or_else(Self::concurrent_conflict)?;
        self.balances
            .bump_pending(&mut tx, before.employee_id, -before.total_hours)
            .await?;
        tx.commit().await?;

        let revision = self
            .record(
                request_id,
                approver,
                action,
                &RevisionChanges::Rejected { tier },
                Some(&comment),
            )
            .await;

        self.outcome(request_id, revision).await
    }

    // ---- helpers ----

    /// Transitions read the request and then write it. Starting the
    /// transaction with the write lock already held (IMMEDIATE) serializes
    /// concurrent transitions on one database, so the loser re-reads the
    /// winner's committed status and fails the guard with a conflict instead
    /// of hitting a lock upgrade error mid-transaction.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    fn validate_entries(&self, entries: &[OvertimeEntryInput]) -> Result<f64, AppError> {
        if entries.is_empty() {
            return Err(AppError::validation("at least one entry is required"));
        }

        let today = Utc::now().date_naive();
        let oldest_allowed = today - chrono::Duration::days(self.entry_window_days);
        let mut seen = std::collections::HashSet::new();
        let mut total = 0.0;

        for entry in entries {
            if entry.hours <= 0.0 || entry.hours > 12.0 {
                return Err(AppError::validation(format!(
                    "entry hours must be within (0, 12], got {}",
                    entry.hours
                )));
            }
            if !seen.insert(entry.work_date) {
                return Err(AppError::validation(format!(
                    "duplicate entry date {}",
                    entry.work_date
                )));
            }
            if entry.work_date > today {
                return Err(AppError::validation(format!(
                    "entry date {} is in the future",
                    entry.work_date
                )));
            }
            if entry.work_date < oldest_allowed {
                return Err(AppError::validation(format!(
                    "entry date {} is outside the {}-day window",
                    entry.work_date, self.entry_window_days
                )));
            }
            total += entry.hours;
        }

        Ok(total)
    }

    fn require_comment(comment: Option<&str>) -> Result<String, AppError> {
        match comment.map(str::trim) {
            Some(c) if !c.is_empty() => Ok(c.to_string()),
            _ => Err(AppError::validation("a comment is required")),
        }
    }

    fn require_owner(
        request: &OvertimeRequest,
        actor: Uuid,
        verb: &str,
    ) -> Result<(), AppError> {
        if request.employee_id != actor {
            return Err(AppError::Forbidden(format!(
                "only the owner may {} this request",
                verb
            )));
        }
        Ok(())
    }

    async fn load(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        request_id: Uuid,
    ) -> Result<OvertimeRequest, AppError> {
        self.overtime
            .get_by_id_tx(tx, request_id)
            .await?
            .ok_or_else(|| Self::not_found(request_id))
    }

    fn not_found(request_id: Uuid) -> AppError {
        AppError::NotFound(format!("overtime request {} not found", request_id))
    }

    fn stale(verb: &str, status: OvertimeStatus) -> AppError {
        AppError::conflict(format!(
            "cannot {} an overtime request in status {}",
            verb, status
        ))
    }

    fn concurrent_conflict() -> AppError {
        AppError::conflict("overtime request was modified concurrently")
    }

    /// Best-effort ledger append, issued only after the transition committed.
    /// A failure here is logged for operators and surfaced as `revision: None`,
    /// never as an error to the caller.
    async fn record(
        &self,
        request_id: Uuid,
        actor: Uuid,
        action: RevisionAction,
        changes: &RevisionChanges,
        comment: Option<&str>,
    ) -> Option<OvertimeRevision> {
        match self
            .revisions
            .append(request_id, actor, action, changes, comment)
            .await
        {
            Ok(revision) => Some(revision),
            Err(err) => {
                log::error!(
                    "ledger write failed for overtime request {} (action {}): {}",
                    request_id,
                    action,
                    err
                );
                None
            }
        }
    }

    async fn outcome(
        &self,
        request_id: Uuid,
        revision: Option<OvertimeRevision>,
    ) -> Result<WorkflowOutcome, AppError> {
        let request = self.get_detail(request_id).await?;
        Ok(WorkflowOutcome { request, revision })
    }
}
