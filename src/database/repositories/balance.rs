use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::database::models::{BalanceAdjustment, LeaveBalance, OvertimeBalance};
use crate::error::AppError;

const LEAVE_COLUMNS: &str = r#"
    id,
    employee_id,
    year,
    annual_quota,
    annual_used,
    annual_remaining,
    sick_used,
    menstrual_used,
    unpaid_used,
    toil_balance,
    toil_used,
    toil_expired,
    created_at,
    updated_at
"#;

/// Hour and leave-day ledgers. Every mutation is a single atomic SQL statement
/// (upsert or arithmetic UPDATE) so concurrent approvals for one employee
/// cannot lose an update.
#[derive(Clone)]
pub struct BalanceRepository {
    pool: SqlitePool,
}

impl BalanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_overtime_balance(
        &self,
        employee_id: Uuid,
    ) -> Result<Option<OvertimeBalance>, sqlx::Error> {
        sqlx::query_as::<_, OvertimeBalance>(
            r#"
            SELECT
                employee_id,
                current_balance,
                pending_hours,
                total_paid,
                updated_at
            FROM
                overtime_balances
            WHERE
                employee_id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Additive credit; creates a zero-initialized record on first use.
    pub async fn credit_overtime(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        employee_id: Uuid,
        hours: f64,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO
                overtime_balances (employee_id, current_balance, pending_hours, total_paid, updated_at)
            VALUES
                (?, ?, 0, 0, ?)
            ON CONFLICT (employee_id) DO UPDATE SET
                current_balance = current_balance + ?,
                updated_at = ?
            "#,
        )
        .bind(employee_id)
        .bind(hours)
        .bind(now)
        .bind(hours)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Deduction clamped at zero. Never errors on insufficient balance: the
    /// triggering event (an admin correcting a mistaken approval) must succeed.
    pub async fn debit_overtime_clamped(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        employee_id: Uuid,
        hours: f64,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO
                overtime_balances (employee_id, current_balance, pending_hours, total_paid, updated_at)
            VALUES
                (?, 0, 0, 0, ?)
            ON CONFLICT (employee_id) DO UPDATE SET
                current_balance = MAX(0, current_balance - ?),
                updated_at = ?
            "#,
        )
        .bind(employee_id)
        .bind(now)
        .bind(hours)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Shift pending_hours by a (possibly negative) delta, clamped at zero.
    pub async fn bump_pending(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        employee_id: Uuid,
        delta: f64,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO
                overtime_balances (employee_id, current_balance, pending_hours, total_paid, updated_at)
            VALUES
                (?, 0, MAX(0, ?), 0, ?)
            ON CONFLICT (employee_id) DO UPDATE SET
                pending_hours = MAX(0, pending_hours + ?),
                updated_at = ?
            "#,
        )
        .bind(employee_id)
        .bind(delta)
        .bind(now)
        .bind(delta)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Admin-only correction; the only path allowed to drive a balance
    /// negative. Writes the adjustment audit row in the same transaction.
    pub async fn adjust_overtime(
        &self,
        employee_id: Uuid,
        delta: f64,
        reason: &str,
        adjusted_by: Uuid,
    ) -> Result<BalanceAdjustment, AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::validation(
                "a reason is required for manual balance adjustments",
            ));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO
                overtime_balances (employee_id, current_balance, pending_hours, total_paid, updated_at)
            VALUES
                (?, 0, 0, 0, ?)
            "#,
        )
        .bind(employee_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let previous: f64 = sqlx::query_scalar(
            "SELECT current_balance FROM overtime_balances WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_one(&mut *tx)
        .await?;

        let new_balance = previous + delta;
        sqlx::query(
            r#"
            UPDATE overtime_balances
            SET
                current_balance = ?,
                updated_at = ?
            WHERE
                employee_id = ?
            "#,
        )
        .bind(new_balance)
        .bind(now)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

        let adjustment = sqlx::query_as::<_, BalanceAdjustment>(
            r#"
            INSERT INTO
                balance_adjustments (
                    id,
                    employee_id,
                    delta,
                    previous_balance,
                    new_balance,
                    reason,
                    adjusted_by,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                employee_id,
                delta,
                previous_balance,
                new_balance,
                reason,
                adjusted_by,
                created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(delta)
        .bind(previous)
        .bind(new_balance)
        .bind(reason)
        .bind(adjusted_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(adjustment)
    }

    /// Move paid-out hours from current_balance to total_paid. Unlike the
    /// clamped debit this one refuses to overdraw: paying out hours the
    /// employee does not have is a caller mistake, not a correction.
    pub async fn mark_paid(
        &self,
        employee_id: Uuid,
        hours: f64,
    ) -> Result<OvertimeBalance, AppError> {
        if hours <= 0.0 {
            return Err(AppError::validation("paid hours must be positive"));
        }

        let now = Utc::now();
        let updated = sqlx::query_as::<_, OvertimeBalance>(
            r#"
            UPDATE overtime_balances
            SET
                current_balance = current_balance - ?,
                total_paid = total_paid + ?,
                updated_at = ?
            WHERE
                employee_id = ?
                AND current_balance >= ?
            RETURNING
                employee_id,
                current_balance,
                pending_hours,
                total_paid,
                updated_at
            "#,
        )
        .bind(hours)
        .bind(hours)
        .bind(now)
        .bind(employee_id)
        .bind(hours)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(balance) => Ok(balance),
            None => match self.get_overtime_balance(employee_id).await? {
                Some(balance) => Err(AppError::validation(format!(
                    "insufficient balance: {} hours requested, {} available",
                    hours, balance.current_balance
                ))),
                None => Err(AppError::NotFound(format!(
                    "no overtime balance for employee {}",
                    employee_id
                ))),
            },
        }
    }

    pub async fn list_adjustments(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<BalanceAdjustment>, sqlx::Error> {
        sqlx::query_as::<_, BalanceAdjustment>(
            r#"
            SELECT
                id,
                employee_id,
                delta,
                previous_balance,
                new_balance,
                reason,
                adjusted_by,
                created_at
            FROM
                balance_adjustments
            WHERE
                employee_id = ?
            ORDER BY
                created_at DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Idempotent create of the yearly leave record. Returns whether a row was
    /// actually created; an existing (employee, year) row is left untouched so
    /// usage counters survive re-runs.
    pub async fn materialize_leave_balance(
        &self,
        employee_id: Uuid,
        year: i32,
        quota: f64,
    ) -> Result<bool, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO
                leave_balances (
                    id,
                    employee_id,
                    year,
                    annual_quota,
                    annual_used,
                    annual_remaining,
                    sick_used,
                    menstrual_used,
                    unpaid_used,
                    toil_balance,
                    toil_used,
                    toil_expired,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, 0, ?, 0, 0, 0, 0, 0, 0, ?, ?)
            ON CONFLICT (employee_id, year) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(employee_id)
        .bind(year)
        .bind(quota)
        .bind(quota)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_leave_balance(
        &self,
        employee_id: Uuid,
        year: i32,
    ) -> Result<Option<LeaveBalance>, sqlx::Error> {
        sqlx::query_as::<_, LeaveBalance>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_balances WHERE employee_id = ? AND year = ?"
        ))
        .bind(employee_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
    }

    /// Admin correction of a year's quota; annual_remaining is recomputed from
    /// the stored usage so the remaining = quota - used invariant holds.
    pub async fn adjust_leave_quota(
        &self,
        employee_id: Uuid,
        year: i32,
        new_quota: f64,
        reason: &str,
    ) -> Result<LeaveBalance, AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::validation(
                "a reason is required for quota corrections",
            ));
        }

        let now = Utc::now();
        let updated = sqlx::query_as::<_, LeaveBalance>(&format!(
            r#"
            UPDATE leave_balances
            SET
                annual_quota = ?,
                annual_remaining = ? - annual_used,
                updated_at = ?
            WHERE
                employee_id = ?
                AND year = ?
            RETURNING {LEAVE_COLUMNS}
            "#
        ))
        .bind(new_quota)
        .bind(new_quota)
        .bind(now)
        .bind(employee_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;

        let balance = updated.ok_or_else(|| {
            AppError::NotFound(format!(
                "no leave balance for employee {} in {}",
                employee_id, year
            ))
        })?;

        log::info!(
            "leave quota for employee {} year {} set to {} ({})",
            employee_id,
            year,
            new_quota,
            reason
        );

        Ok(balance)
    }
}
