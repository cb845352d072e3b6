//! Session resolution and route guarding

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::auth::guard::{allowed_roles, check_access, Access, DenyReason};
use crate::auth::token::{extract_bearer_token, SessionClaims};
use crate::auth::AuthError;
use crate::store::users::User;

/// Signed-in user attached to guarded requests
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub claims: SessionClaims,
}

/// Middleware for protected routes: resolve the session, then check the
/// route's role table. Must be installed with `route_layer` so the matched
/// route pattern is known.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(route) = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
    else {
        warn!(path = %request.uri().path(), "Guarded request without a matched route");
        return Err(AuthError::Forbidden);
    };
    let allowed = allowed_roles(request.method(), &route);

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidFormat)?;
    let (user, claims) = state.auth.authenticate(token)?;

    match check_access(Some(user.role), allowed) {
        Access::Granted => {}
        Access::Redirect { reason, .. } => {
            warn!(
                user_id = %user.id,
                role = %user.role,
                route = %route,
                ?reason,
                "Route guard denied request"
            );
            return Err(match reason {
                DenyReason::NoSession => AuthError::MissingHeader,
                DenyReason::WrongRole => AuthError::Forbidden,
            });
        }
    }

    // Insert into request extensions for handlers to access
    request.extensions_mut().insert(CurrentUser { user, claims });

    Ok(next.run(request).await)
}
