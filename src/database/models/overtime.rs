use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub status: OvertimeStatus,
    /// Derived: always the sum of the current entries, recomputed on every edit.
    pub total_hours: f64,
    pub submitted_at: DateTime<Utc>,
    pub current_approver_id: Option<Uuid>,
    pub supervisor_comment: Option<String>,
    pub division_head_comment: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeEntry {
    pub id: Uuid,
    pub overtime_request_id: Uuid,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub description: String,
}

/// A request together with its entry rows, the shape returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeRequestDetail {
    #[serde(flatten)]
    pub request: OvertimeRequest,
    pub entries: Vec<OvertimeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeEntryInput {
    pub work_date: NaiveDate,
    pub hours: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOvertimeInput {
    pub employee_id: Uuid,
    pub entries: Vec<OvertimeEntryInput>,
    pub current_approver_id: Option<Uuid>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum OvertimeStatus {
        Pending => "pending",
        SupervisorApproved => "supervisor_approved",
        RevisionRequested => "revision_requested",
        Approved => "approved",
        Rejected => "rejected",
        Deleted => "deleted",
    }
}

impl OvertimeStatus {
    /// Entries may only be replaced while the request sits in these states.
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Pending | Self::RevisionRequested)
    }

    /// States in which the request still counts toward pending_hours.
    pub fn is_undecided(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::RevisionRequested | Self::SupervisorApproved
        )
    }

    /// The full transition table. Anything not listed here is illegal.
    pub fn can_transition_to(self, to: OvertimeStatus) -> bool {
        use OvertimeStatus::*;
        match (self, to) {
            (Pending, SupervisorApproved)
            | (Pending, RevisionRequested)
            | (Pending, Approved)
            | (Pending, Rejected)
            | (Pending, Deleted) => true,
            (RevisionRequested, Pending)
            | (RevisionRequested, SupervisorApproved)
            | (RevisionRequested, Approved)
            | (RevisionRequested, Rejected)
            | (RevisionRequested, Deleted) => true,
            (SupervisorApproved, Approved)
            | (SupervisorApproved, Rejected)
            | (SupervisorApproved, Deleted) => true,
            // Admin override and owner cleanup.
            (Approved, Rejected) => true,
            (Rejected, Deleted) => true,
            _ => false,
        }
    }
}
