use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{
    OvertimeEntry, OvertimeEntryInput, OvertimeRequest, OvertimeStatus,
};

const REQUEST_COLUMNS: &str = r#"
    id,
    employee_id,
    status,
    total_hours,
    submitted_at,
    current_approver_id,
    supervisor_comment,
    division_head_comment,
    approved_by,
    approved_at,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct OvertimeRepository {
    pool: SqlitePool,
}

impl OvertimeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new request with its entry rows, status Pending.
    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        employee_id: Uuid,
        current_approver_id: Option<Uuid>,
        entries: &[OvertimeEntryInput],
        total_hours: f64,
    ) -> Result<OvertimeRequest, sqlx::Error> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        let request = sqlx::query_as::<_, OvertimeRequest>(&format!(
            r#"
            INSERT INTO
                overtime_requests (
                    id,
                    employee_id,
                    status,
                    total_hours,
                    submitted_at,
                    current_approver_id,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(employee_id)
        .bind(OvertimeStatus::Pending)
        .bind(total_hours)
        .bind(now)
        .bind(current_approver_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        self.insert_entries(tx, id, entries).await?;

        Ok(request)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        sqlx::query_as::<_, OvertimeRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM overtime_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Same lookup, but inside the caller's transaction so a transition reads
    /// the row it is about to guard against.
    pub async fn get_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        sqlx::query_as::<_, OvertimeRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM overtime_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn get_entries(&self, request_id: Uuid) -> Result<Vec<OvertimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, OvertimeEntry>(
            r#"
            SELECT
                id,
                overtime_request_id,
                work_date,
                hours,
                description
            FROM
                overtime_entries
            WHERE
                overtime_request_id = ?
            ORDER BY
                work_date ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
        status: Option<OvertimeStatus>,
    ) -> Result<Vec<OvertimeRequest>, sqlx::Error> {
        let mut query = format!(
            "SELECT {REQUEST_COLUMNS} FROM overtime_requests WHERE employee_id = ?"
        );
        if status.is_some() {
            query.push_str(" AND status = ?");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut prepared = sqlx::query_as::<_, OvertimeRequest>(&query).bind(employee_id);
        if let Some(s) = status {
            prepared = prepared.bind(s);
        }

        prepared.fetch_all(&self.pool).await
    }

    /// Replace a request's entries and recompute total_hours. The status guard
    /// keeps the derivation invariant: entries are immutable once the request
    /// leaves the editable states. Returns None when the guard loses.
    pub async fn replace_entries(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        entries: &[OvertimeEntryInput],
        total_hours: f64,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        let now = Utc::now();

        let updated = sqlx::query_as::<_, OvertimeRequest>(&format!(
            r#"
            UPDATE overtime_requests
            SET
                total_hours = ?,
                updated_at = ?
            WHERE
                id = ?
                AND status IN (?, ?)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(total_hours)
        .bind(now)
        .bind(id)
        .bind(OvertimeStatus::Pending)
        .bind(OvertimeStatus::RevisionRequested)
        .fetch_optional(&mut **tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        sqlx::query("DELETE FROM overtime_entries WHERE overtime_request_id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        self.insert_entries(tx, id, entries).await?;

        Ok(updated)
    }

    /// Supervisor sign-off: first approval tier, no balance effect yet.
    pub async fn supervisor_approve(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        comment: Option<&str>,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(
            tx,
            id,
            &[OvertimeStatus::Pending, OvertimeStatus::RevisionRequested],
            GuardedSet::SupervisorApprove { comment },
        )
        .await
    }

    pub async fn supervisor_reject(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        comment: &str,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(
            tx,
            id,
            &[OvertimeStatus::Pending, OvertimeStatus::RevisionRequested],
            GuardedSet::RejectSupervisorTier { comment },
        )
        .await
    }

    /// Final-tier approval (division head, or the single terminal authority).
    pub async fn approve_terminal(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected: &[OvertimeStatus],
        approver: Uuid,
        comment: Option<&str>,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(tx, id, expected, GuardedSet::Approve { approver, comment })
            .await
    }

    pub async fn reject_terminal(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected: &[OvertimeStatus],
        comment: &str,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(tx, id, expected, GuardedSet::RejectFinalTier { comment })
            .await
    }

    pub async fn request_revision(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        comment: &str,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(
            tx,
            id,
            &[OvertimeStatus::Pending],
            GuardedSet::RequestRevision { comment },
        )
        .await
    }

    pub async fn resubmit(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(
            tx,
            id,
            &[OvertimeStatus::RevisionRequested],
            GuardedSet::Resubmit,
        )
        .await
    }

    /// Admin override: the one legal exit from Approved.
    pub async fn admin_reject(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(tx, id, &[OvertimeStatus::Approved], GuardedSet::AdminReject)
            .await
    }

    pub async fn mark_deleted(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        self.guarded_update(
            tx,
            id,
            &[
                OvertimeStatus::Pending,
                OvertimeStatus::RevisionRequested,
                OvertimeStatus::SupervisorApproved,
                OvertimeStatus::Rejected,
            ],
            GuardedSet::Delete,
        )
        .await
    }

    async fn insert_entries(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        request_id: Uuid,
        entries: &[OvertimeEntryInput],
    ) -> Result<(), sqlx::Error> {
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO
                    overtime_entries (id, overtime_request_id, work_date, hours, description)
                VALUES
                    (?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(request_id)
            .bind(entry.work_date)
            .bind(entry.hours)
            .bind(&entry.description)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Status-guarded transition: the UPDATE only fires while the stored status
    /// is still one of `expected`, read and written under the caller's
    /// transaction. A concurrent transition that committed first makes this
    /// return None, which the workflow surfaces as a conflict.
    async fn guarded_update(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        expected: &[OvertimeStatus],
        set: GuardedSet<'_>,
    ) -> Result<Option<OvertimeRequest>, sqlx::Error> {
        let now = Utc::now();
        let placeholders = vec!["?"; expected.len()].join(", ");
        let query = format!(
            r#"
            UPDATE overtime_requests
            SET {}
            WHERE
                id = ?
                AND status IN ({placeholders})
            RETURNING {REQUEST_COLUMNS}
            "#,
            set.set_clause()
        );

        let mut prepared = sqlx::query_as::<_, OvertimeRequest>(&query);
        prepared = set.bind_values(prepared, now);
        prepared = prepared.bind(now).bind(id);
        for status in expected {
            prepared = prepared.bind(*status);
        }

        prepared.fetch_optional(&mut **tx).await
    }
}

/// The column updates each transition applies alongside the status change.
enum GuardedSet<'a> {
    SupervisorApprove { comment: Option<&'a str> },
    RejectSupervisorTier { comment: &'a str },
    Approve { approver: Uuid, comment: Option<&'a str> },
    RejectFinalTier { comment: &'a str },
    RequestRevision { comment: &'a str },
    Resubmit,
    AdminReject,
    Delete,
}

impl GuardedSet<'_> {
    fn set_clause(&self) -> &'static str {
        match self {
            GuardedSet::SupervisorApprove { .. } => {
                "status = ?, supervisor_comment = ?, updated_at = ?"
            }
            GuardedSet::RejectSupervisorTier { .. } => {
                "status = ?, supervisor_comment = ?, current_approver_id = NULL, updated_at = ?"
            }
            GuardedSet::Approve { .. } => {
                "status = ?, division_head_comment = ?, approved_by = ?, approved_at = ?, current_approver_id = NULL, updated_at = ?"
            }
            GuardedSet::RejectFinalTier { .. } => {
                "status = ?, division_head_comment = ?, current_approver_id = NULL, updated_at = ?"
            }
            GuardedSet::RequestRevision { .. } => {
                "status = ?, supervisor_comment = ?, updated_at = ?"
            }
            GuardedSet::Resubmit => "status = ?, updated_at = ?",
            GuardedSet::AdminReject => {
                "status = ?, current_approver_id = NULL, updated_at = ?"
            }
            GuardedSet::Delete => "status = ?, current_approver_id = NULL, updated_at = ?",
        }
    }

    fn bind_values<'q>(
        &'q self,
        query: sqlx::query::QueryAs<'q, Sqlite, OvertimeRequest, sqlx::sqlite::SqliteArguments<'q>>,
        now: DateTime<Utc>,
    ) -> sqlx::query::QueryAs<'q, Sqlite, OvertimeRequest, sqlx::sqlite::SqliteArguments<'q>> {
        match self {
            GuardedSet::SupervisorApprove { comment } => query
                .bind(OvertimeStatus::SupervisorApproved)
                .bind(comment.map(str::to_string)),
            GuardedSet::RejectSupervisorTier { comment } => query
                .bind(OvertimeStatus::Rejected)
                .bind(comment.to_string()),
            GuardedSet::Approve { approver, comment } => query
                .bind(OvertimeStatus::Approved)
                .bind(comment.map(str::to_string))
                .bind(*approver)
                .bind(now),
            GuardedSet::RejectFinalTier { comment } => query
                .bind(OvertimeStatus::Rejected)
                .bind(comment.to_string()),
            GuardedSet::RequestRevision { comment } => query
                .bind(OvertimeStatus::RevisionRequested)
                .bind(comment.to_string()),
            GuardedSet::Resubmit => query.bind(OvertimeStatus::Pending),
            GuardedSet::AdminReject => query.bind(OvertimeStatus::Rejected),
            GuardedSet::Delete => query.bind(OvertimeStatus::Deleted),
        }
    }
}
