use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::errors::DomainError;

/// Failures while bringing the service up. Never reaches a client.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create DB pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("failed to run database migrations: {0}")]
    Migrations(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let msg = e.to_string();
        match e {
            DomainError::Validation(_)
            | DomainError::InvalidProductType(_)
            | DomainError::InvalidQuantity(_)
            | DomainError::InvalidPricing { .. }
            | DomainError::InactiveStore(_) => AppError::BadRequest(msg),
            DomainError::MissingTenantBinding(_) | DomainError::InvalidRole(_) => {
                AppError::Unauthorized(msg)
            }
            DomainError::Forbidden(_) => AppError::Forbidden(msg),
            DomainError::NotFound { .. } => AppError::NotFound(msg),
            DomainError::InvalidTransition { .. }
            | DomainError::IrreversibleState(_)
            | DomainError::Conflict(_)
            | DomainError::DuplicateTrackingCode(_) => AppError::Conflict(msg),
            DomainError::Internal(detail) => AppError::Internal(detail),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(detail) => {
                log::error!("Request failed: {detail}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
