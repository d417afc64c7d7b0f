use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    // Success with data and message
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

}

impl ApiResponse<()> {
    // Error response (no data)
    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

/// Who is acting. Authentication and the approver hierarchy live in an
/// external identity service; the gateway forwards the resolved actor here.
pub fn actor_id(req: &HttpRequest) -> Result<Uuid, AppError> {
    let header = req
        .headers()
        .get("X-Actor-Id")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    header
        .parse::<Uuid>()
        .map_err(|_| AppError::validation("X-Actor-Id must be a UUID"))
}
