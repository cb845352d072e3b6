//! Sessions, roles and sign-in flows

pub mod codes;
pub mod guard;
pub mod password;
pub mod role;
pub mod service;
pub mod token;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::mail::MailError;
use crate::store::users::UserStoreError;

pub use role::{Role, LOGIN_PATH};
pub use service::AuthService;

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Session has been signed out")]
    SessionRevoked,

    #[error("Account no longer exists")]
    UnknownUser,

    #[error("This page requires a different role")]
    Forbidden,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email domain is not allowed to sign in with a code")]
    DomainNotAllowed,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Verification code expired")]
    CodeExpired,

    #[error("Too many verification codes requested, try again shortly")]
    TooManyRequests,

    #[error("Admin accounts cannot be self-registered")]
    AdminSignupForbidden,

    #[error("Admin accounts must sign in with a password")]
    AdminCodeSignInForbidden,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to deliver verification code")]
    Delivery(#[from] MailError),

    #[error("User storage failed")]
    Storage(#[source] UserStoreError),
}

impl AuthError {
    /// Errors that mean "sign in again": answered with a redirect to the login page
    pub fn redirects_to_login(&self) -> bool {
        matches!(
            self,
            AuthError::MissingHeader
                | AuthError::InvalidFormat
                | AuthError::InvalidToken
                | AuthError::TokenExpired
                | AuthError::SessionRevoked
                | AuthError::UnknownUser
                | AuthError::Forbidden
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingHeader
            | AuthError::InvalidFormat
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::SessionRevoked
            | AuthError::UnknownUser
            | AuthError::InvalidCredentials
            | AuthError::InvalidCode
            | AuthError::CodeExpired => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden
            | AuthError::AdminSignupForbidden
            | AuthError::AdminCodeSignInForbidden => StatusCode::FORBIDDEN,
            AuthError::DomainNotAllowed | AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Delivery(_) => StatusCode::BAD_GATEWAY,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UserStoreError> for AuthError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::NotFound(_) => AuthError::UnknownUser,
            UserStoreError::Invalid(msg) => AuthError::InvalidInput(msg),
            other => AuthError::Storage(other),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AuthError::Storage(source) => error!(error = %source, "User storage failed"),
            AuthError::Delivery(source) => error!(error = %source, "Verification code delivery failed"),
            _ => {}
        }

        if self.redirects_to_login() {
            let body = serde_json::json!({
                "error": self.to_string(),
                "redirect": LOGIN_PATH,
            });
            return (status, [(header::LOCATION, LOGIN_PATH)], Json(body)).into_response();
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });
        (status, Json(body)).into_response()
    }
}
