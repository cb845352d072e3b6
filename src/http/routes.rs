//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, Method},
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::app::AppState;
use crate::http::auth::{
    login_code_handler, login_handler, logout_handler, send_code_handler, session_handler,
    signup_handler, update_profile_handler,
};
use crate::http::catalog::{get_vendor_handler, list_studios_handler, list_vendors_handler};
use crate::http::enquiries::{
    create_enquiry_handler, create_studio_enquiry_handler, get_enquiry_handler,
    list_enquiries_handler, list_studio_enquiries_handler, my_enquiries_handler,
    my_studio_enquiries_handler, studio_bookings_handler, update_enquiry_status_handler,
    update_studio_enquiry_status_handler, vendor_enquiries_handler,
};
use crate::http::invoices::send_invoice_handler;
use crate::http::middleware::require_session;
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::LOCATION])
        .allow_credentials(true);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/send-code", post(send_code_handler))
        .route("/api/auth/login-code", post(login_code_handler))
        .route("/api/vendors", get(list_vendors_handler))
        .route("/api/vendors/:id", get(get_vendor_handler))
        .route("/api/studios", get(list_studios_handler));

    // Protected routes; roles per route come from the guard table
    let protected_routes = Router::new()
        .route(
            "/api/session",
            get(session_handler).patch(update_profile_handler),
        )
        .route("/api/auth/logout", post(logout_handler))
        .route(
            "/api/enquiries",
            get(list_enquiries_handler).post(create_enquiry_handler),
        )
        .route("/api/enquiries/mine", get(my_enquiries_handler))
        .route(
            "/api/enquiries/vendor/:vendor_id",
            get(vendor_enquiries_handler),
        )
        .route("/api/enquiries/:id", get(get_enquiry_handler))
        .route(
            "/api/enquiries/:id/status",
            patch(update_enquiry_status_handler),
        )
        .route(
            "/api/studio-enquiries",
            get(list_studio_enquiries_handler).post(create_studio_enquiry_handler),
        )
        .route(
            "/api/studio-enquiries/mine",
            get(my_studio_enquiries_handler),
        )
        .route(
            "/api/studio-enquiries/studio/:name",
            get(studio_bookings_handler),
        )
        .route(
            "/api/studio-enquiries/:id/status",
            patch(update_studio_enquiry_status_handler),
        )
        .route("/api/invoices/send-email", post(send_invoice_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let request_timeout = state.config.request_timeout;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    users: usize,
    enquiries: usize,
    studio_enquiries: usize,
    cms_configured: bool,
    email_configured: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        users: state.auth.users().len(),
        enquiries: state.enquiries.len(),
        studio_enquiries: state.studio_enquiries.len(),
        cms_configured: state.config.cms_url.is_some(),
        email_configured: state.mailer.is_configured(),
    })
}
