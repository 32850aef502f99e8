use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use wealthdesk_core::errors::{BillingError, DatabaseError, Error as CoreError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::ConstraintViolation(_) => StatusCode::CONFLICT,
        CoreError::Billing(e) => match e {
            BillingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BillingError::Duplicate(_)
            | BillingError::InvalidState { .. }
            | BillingError::ConcurrentModification { .. } => StatusCode::CONFLICT,
            BillingError::Import { .. } | BillingError::DivisionByZero { .. } => {
                StatusCode::BAD_REQUEST
            }
        },
        CoreError::Database(e) => match e {
            DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
            DatabaseError::UniqueViolation(_) | DatabaseError::ForeignKeyViolation(_) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        CoreError::Repository(_) | CoreError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Core(e) => core_status(e),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
