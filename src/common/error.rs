// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::lifecycle::LifecycleAction;
use crate::models::client::ClientStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Account number already exists")]
    AccountNumberExists,

    #[error("Serial number already in use")]
    SerialNumberInUse,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account pending approval")]
    AccountPending,

    #[error("Account suspended")]
    AccountSuspended,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Cannot {action} a client whose status is {from}")]
    InvalidTransition {
        from: ClientStatus,
        action: LifecycleAction,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AccountPending | AppError::AccountSuspended | AppError::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::AccountNumberExists
            | AppError::SerialNumberInUse
            | AppError::Conflict(_)
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::EmailAlreadyExists => "Email already registered.".to_string(),
            AppError::AccountNumberExists => "Account number already exists.".to_string(),
            AppError::SerialNumberInUse => {
                "Serial number is already registered to another asset.".to_string()
            }
            AppError::InvalidCredentials => "Invalid verification code or password.".to_string(),
            AppError::AccountPending => {
                "Your account is pending approval. Please contact an administrator.".to_string()
            }
            AppError::AccountSuspended => {
                "Your account has been suspended. Please contact an administrator.".to_string()
            }
            AppError::InvalidToken => "Invalid or missing authentication token.".to_string(),
            AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg) => msg,
            e @ AppError::InvalidTransition { .. } => e.to_string(),

            // Everything else is a 500; log the detail, hide it from the caller.
            ref e => {
                tracing::error!("Internal server error: {:?}", e);
                "An unexpected error occurred.".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_status_codes() {
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::AccountPending.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::SerialNumberInUse.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::NotFound("client".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: ClientStatus::Closed,
                action: LifecycleAction::Relocate,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Config("missing".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transition_error_message_names_status_and_action() {
        let err = AppError::InvalidTransition {
            from: ClientStatus::Reversed,
            action: LifecycleAction::Relocate,
        };
        assert_eq!(err.to_string(), "Cannot relocate a client whose status is Reversed");
    }
}
