use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

/// One immutable audit record of a single action taken on an overtime request.
/// The ledger, not the mutable request row, is the source of truth for
/// "who did what when".
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRevision {
    pub id: Uuid,
    pub overtime_request_id: Uuid,
    pub revised_by: Uuid,
    pub action: RevisionAction,
    pub changes: String, // JSON as String in SQLite
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OvertimeRevision {
    pub fn parsed_changes(&self) -> serde_json::Result<RevisionChanges> {
        serde_json::from_str(&self.changes)
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum RevisionAction {
        Submitted => "submitted",
        Edited => "edited",
        Resubmitted => "resubmitted",
        SupervisorApproved => "supervisor_approved",
        SupervisorRejected => "supervisor_rejected",
        DivisionHeadApproved => "division_head_approved",
        DivisionHeadRejected => "division_head_rejected",
        RevisionRequested => "revision_requested",
        FinalApproved => "final_approved",
        FinalRejected => "final_rejected",
        AdminRejected => "admin_rejected",
        Deleted => "deleted",
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalTier {
    Supervisor,
    DivisionHead,
    Final,
}

/// What a ledger entry captured, keyed by the action that produced it. Each
/// variant carries enough to reconstruct the change without consulting the
/// (mutable) request row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RevisionChanges {
    Submitted {
        total_hours: f64,
        entry_count: usize,
    },
    Edited {
        hours_before: f64,
        hours_after: f64,
        entries_before: usize,
        entries_after: usize,
    },
    Resubmitted {
        total_hours: f64,
    },
    Approved {
        tier: ApprovalTier,
        hours_credited: f64,
    },
    Rejected {
        tier: ApprovalTier,
    },
    RevisionRequested,
    /// Preserves the original approval metadata so it survives the override.
    AdminRejected {
        original_approver: Option<Uuid>,
        original_approved_at: Option<DateTime<Utc>>,
        original_comment: Option<String>,
        hours_deducted: f64,
    },
    Deleted {
        reason: Option<String>,
    },
}
