//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use crate::auth::AuthError;
use crate::invoice::InvoiceError;
use crate::mail::MailError;
use crate::store::cms::CmsError;
use crate::store::EnquiryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<EnquiryError> for AppError {
    fn from(err: EnquiryError) -> Self {
        match err {
            EnquiryError::NotFound(id) => AppError::NotFound(format!("enquiry {}", id)),
            EnquiryError::IllegalTransition { .. } => AppError::Conflict(err.to_string()),
            EnquiryError::Invalid(msg) => AppError::BadRequest(msg),
            EnquiryError::Storage(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<CmsError> for AppError {
    fn from(err: CmsError) -> Self {
        error!(error = %err, "Content API request failed");
        AppError::Upstream("Could not load listings. Please try again.".to_string())
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::InvalidRecipient(_) => AppError::BadRequest(err.to_string()),
            other => {
                error!(error = %other, "Email delivery failed");
                AppError::Upstream("Email could not be sent. Please try again.".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Auth(err) => return err.into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
