use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::models::{OvertimeRevision, RevisionAction, RevisionChanges};

/// Append-only ledger of request actions. There is deliberately no update or
/// delete here; rows written once are history.
#[derive(Clone)]
pub struct RevisionRepository {
    pool: SqlitePool,
}

impl RevisionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        request_id: Uuid,
        revised_by: Uuid,
        action: RevisionAction,
        changes: &RevisionChanges,
        comment: Option<&str>,
    ) -> Result<OvertimeRevision, sqlx::Error> {
        let now = chrono::Utc::now();
        let changes_json =
            serde_json::to_string(changes).unwrap_or_else(|_| "{}".to_string());

        sqlx::query_as::<_, OvertimeRevision>(
            r#"
            INSERT INTO
                overtime_revisions (
                    id,
                    overtime_request_id,
                    revised_by,
                    action,
                    changes,
                    comment,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                overtime_request_id,
                revised_by,
                action,
                changes,
                comment,
                created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request_id)
        .bind(revised_by)
        .bind(action)
        .bind(changes_json)
        .bind(comment.map(str::to_string))
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Ascending creation time is the canonical history of a request.
    pub async fn list_for_request(
        &self,
        request_id: Uuid,
    ) -> Result<Vec<OvertimeRevision>, sqlx::Error> {
        sqlx::query_as::<_, OvertimeRevision>(
            r#"
            SELECT
                id,
                overtime_request_id,
                revised_by,
                action,
                changes,
                comment,
                created_at
            FROM
                overtime_revisions
            WHERE
                overtime_request_id = ?
            ORDER BY
                created_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
    }
}
