use actix_web::{HttpResponse, web};

use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::AccrualService;

/// Kick off the yearly accrual batch. Idempotent: employees who already have
/// a balance row for the year are reported as skipped.
pub async fn run_yearly_accrual(
    service: web::Data<AccrualService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let summary = service.run_yearly_accrual(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}
