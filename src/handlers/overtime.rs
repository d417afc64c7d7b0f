use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{OvertimeEntryInput, OvertimeStatus, SubmitOvertimeInput};
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, actor_id};
use crate::services::OvertimeWorkflow;

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBody {
    pub entries: Vec<OvertimeEntryInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeQuery {
    pub employee_id: Uuid,
    pub status: Option<String>,
}

/// Create a new overtime request (employees submit for themselves)
pub async fn submit(
    workflow: web::Data<OvertimeWorkflow>,
    input: web::Json<SubmitOvertimeInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let input = input.into_inner();

    if input.employee_id != actor {
        return Err(AppError::Forbidden(
            "can only submit requests for yourself".to_string(),
        ));
    }

    let outcome = workflow
        .submit(input.employee_id, input.current_approver_id, input.entries)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(outcome)))
}

pub async fn get_request(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let detail = workflow.get_detail(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(detail)))
}

pub async fn list_requests(
    workflow: web::Data<OvertimeWorkflow>,
    query: web::Query<OvertimeQuery>,
) -> Result<HttpResponse, AppError> {
    // Convert status string to enum if provided
    let status_filter = match &query.status {
        Some(status_str) => Some(
            status_str
                .parse::<OvertimeStatus>()
                .map_err(AppError::Validation)?,
        ),
        None => None,
    };

    let requests = workflow
        .list_for_employee(query.employee_id, status_filter)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

pub async fn edit(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    input: web::Json<EditBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .edit(path.into_inner(), actor, input.into_inner().entries)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn resubmit(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow.resubmit(path.into_inner(), actor).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn approve_supervisor(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .approve_as_supervisor(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn reject_supervisor(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .reject_as_supervisor(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn approve_division_head(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .approve_as_division_head(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn reject_division_head(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .reject_as_division_head(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn final_approve(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .final_approve(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn final_reject(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .final_reject(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn request_revision(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .request_revision(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn admin_reject(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<CommentBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .admin_reject(path.into_inner(), actor, body.comment.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn delete_request(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
    body: web::Json<DeleteBody>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let actor = actor_id(&req)?;
    let outcome = workflow
        .delete(path.into_inner(), actor, body.reason.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome)))
}

pub async fn history(
    workflow: web::Data<OvertimeWorkflow>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let revisions = workflow.history(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(revisions)))
}
