//! Route guard decisions
//!
//! Every protected route names the roles allowed to use it. A request with no
//! session, or whose role is not in that list, is sent to the login page
//! before any handler runs. Routes missing from the table admit nobody.

use axum::http::Method;

use super::role::{Role, LOGIN_PATH};

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NoSession,
    WrongRole,
}

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect {
        to: &'static str,
        reason: DenyReason,
    },
}

/// Check a session's role against the roles a route accepts
pub fn check_access(role: Option<Role>, allowed: &[Role]) -> Access {
    match role {
        None => Access::Redirect {
            to: LOGIN_PATH,
            reason: DenyReason::NoSession,
        },
        Some(role) if allowed.contains(&role) => Access::Granted,
        Some(_) => Access::Redirect {
            to: LOGIN_PATH,
            reason: DenyReason::WrongRole,
        },
    }
}

const ADMIN: &[Role] = &[Role::Admin];
const REALTOR: &[Role] = &[Role::Realtor];
const ADMIN_OR_VENDOR: &[Role] = &[Role::Admin, Role::Vendor];
const ADMIN_VENDOR_OR_REALTOR: &[Role] = &[Role::Admin, Role::Vendor, Role::Realtor];
const ANY: &[Role] = &Role::ALL;
const NOBODY: &[Role] = &[];

/// Roles accepted by a protected route, keyed by method and route pattern
pub fn allowed_roles(method: &Method, route: &str) -> &'static [Role] {
    match (method.as_str(), route) {
        ("GET", "/api/session") | ("PATCH", "/api/session") => ANY,
        ("POST", "/api/auth/logout") => ANY,

        ("POST", "/api/enquiries") => REALTOR,
        ("GET", "/api/enquiries") => ADMIN,
        ("GET", "/api/enquiries/mine") => REALTOR,
        ("GET", "/api/enquiries/vendor/:vendor_id") => ADMIN_OR_VENDOR,
        // Realtors only see their own; the handler checks ownership
        ("GET", "/api/enquiries/:id") => ADMIN_VENDOR_OR_REALTOR,
        ("PATCH", "/api/enquiries/:id/status") => ADMIN_OR_VENDOR,

        ("POST", "/api/studio-enquiries") => REALTOR,
        ("GET", "/api/studio-enquiries") => ADMIN,
        ("GET", "/api/studio-enquiries/mine") => REALTOR,
        ("GET", "/api/studio-enquiries/studio/:name") => ADMIN,
        ("PATCH", "/api/studio-enquiries/:id/status") => ADMIN,

        ("POST", "/api/invoices/send-email") => ADMIN,

        _ => NOBODY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_redirects_to_login() {
        assert_eq!(
            check_access(None, ADMIN),
            Access::Redirect {
                to: "/login",
                reason: DenyReason::NoSession
            }
        );
        // Routes open to any role still need a session
        assert_eq!(
            check_access(None, ANY),
            Access::Redirect {
                to: "/login",
                reason: DenyReason::NoSession
            }
        );
    }

    #[test]
    fn wrong_role_redirects_to_login() {
        assert_eq!(
            check_access(Some(Role::Realtor), ADMIN),
            Access::Redirect {
                to: "/login",
                reason: DenyReason::WrongRole
            }
        );
        assert_eq!(check_access(Some(Role::Vendor), ADMIN_OR_VENDOR), Access::Granted);
    }

    #[test]
    fn any_accepts_every_role() {
        for role in Role::ALL {
            assert_eq!(check_access(Some(role), ANY), Access::Granted);
        }
    }

    #[test]
    fn unlisted_routes_admit_nobody() {
        for route in ["/api/unlisted", "/api/enquiries/123", "/api/enquiries/:id/notes"] {
            let allowed = allowed_roles(&Method::GET, route);
            for role in Role::ALL {
                assert_eq!(
                    check_access(Some(role), allowed),
                    Access::Redirect {
                        to: "/login",
                        reason: DenyReason::WrongRole
                    }
                );
            }
        }
        assert_eq!(allowed_roles(&Method::DELETE, "/api/session"), NOBODY);
    }

    #[test]
    fn route_table_distinguishes_methods() {
        assert_eq!(allowed_roles(&Method::POST, "/api/enquiries"), REALTOR);
        assert_eq!(allowed_roles(&Method::GET, "/api/enquiries"), ADMIN);
        assert_eq!(allowed_roles(&Method::GET, "/api/session"), ANY);
        assert_eq!(allowed_roles(&Method::POST, "/api/auth/logout"), ANY);
        assert_eq!(
            allowed_roles(&Method::POST, "/api/invoices/send-email"),
            ADMIN
        );
    }
}
