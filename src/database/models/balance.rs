use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeBalance {
    pub employee_id: Uuid,
    pub current_balance: f64,
    pub pending_hours: f64,
    pub total_paid: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAdjustment {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub delta: f64,
    pub previous_balance: f64,
    pub new_balance: f64,
    pub reason: String,
    pub adjusted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub year: i32,
    pub annual_quota: f64,
    pub annual_used: f64,
    pub annual_remaining: f64,
    pub sick_used: f64,
    pub menstrual_used: f64,
    pub unpaid_used: f64,
    pub toil_balance: f64,
    pub toil_used: f64,
    pub toil_expired: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAdjustmentInput {
    pub delta: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidInput {
    pub hours: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveQuotaInput {
    pub new_quota: f64,
    pub reason: String,
}
