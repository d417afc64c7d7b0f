use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use crate::database::models::{BalanceAdjustmentInput, LeaveQuotaInput, MarkPaidInput};
use crate::database::repositories::BalanceRepository;
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, actor_id};

pub async fn get_overtime_balance(
    repo: web::Data<BalanceRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    match repo.get_overtime_balance(employee_id).await? {
        Some(balance) => Ok(HttpResponse::Ok().json(ApiResponse::success(balance))),
        None => Err(AppError::NotFound(format!(
            "no overtime balance for employee {}",
            employee_id
        ))),
    }
}

/// Manual correction of an employee's hour balance (admin-only path; the
/// gateway enforces the role, the reason requirement is enforced here).
pub async fn adjust_overtime_balance(
    repo: web::Data<BalanceRepository>,
    path: web::Path<Uuid>,
    input: web::Json<BalanceAdjustmentInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let input = input.into_inner();
    let adjustment = repo
        .adjust_overtime(path.into_inner(), input.delta, &input.reason, actor)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(adjustment)))
}

pub async fn mark_paid(
    repo: web::Data<BalanceRepository>,
    path: web::Path<Uuid>,
    input: web::Json<MarkPaidInput>,
) -> Result<HttpResponse, AppError> {
    let balance = repo.mark_paid(path.into_inner(), input.hours).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(balance)))
}

pub async fn list_adjustments(
    repo: web::Data<BalanceRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let history = repo.list_adjustments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(history)))
}

pub async fn get_leave_balance(
    repo: web::Data<BalanceRepository>,
    path: web::Path<(Uuid, i32)>,
) -> Result<HttpResponse, AppError> {
    let (employee_id, year) = path.into_inner();
    match repo.get_leave_balance(employee_id, year).await? {
        Some(balance) => Ok(HttpResponse::Ok().json(ApiResponse::success(balance))),
        None => Err(AppError::NotFound(format!(
            "no leave balance for employee {} in {}",
            employee_id, year
        ))),
    }
}

pub async fn set_leave_quota(
    repo: web::Data<BalanceRepository>,
    path: web::Path<(Uuid, i32)>,
    input: web::Json<LeaveQuotaInput>,
) -> Result<HttpResponse, AppError> {
    let (employee_id, year) = path.into_inner();
    let input = input.into_inner();
    let balance = repo
        .adjust_leave_quota(employee_id, year, input.new_quota, &input.reason)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(balance)))
}
