use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::database::models::EmployeeInput;
use crate::database::repositories::EmployeeRepository;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;

pub async fn create_employee(
    repo: web::Data<EmployeeRepository>,
    input: web::Json<EmployeeInput>,
) -> Result<HttpResponse, AppError> {
    let employee = repo.create(input.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(employee)))
}

pub async fn get_employee(
    repo: web::Data<EmployeeRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    match repo.get_by_id(id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(ApiResponse::success(employee))),
        None => Err(AppError::NotFound(format!("employee {} not found", id))),
    }
}
