//! Roles and their landing routes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Route every unauthenticated or mismatched request is sent to
pub const LOGIN_PATH: &str = "/login";

/// Landing route for roles without a dedicated area
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";

/// Account role controlling which routes a session may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Realtor,
    Vendor,
    Client,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Realtor, Role::Vendor, Role::Client];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Realtor => "realtor",
            Role::Vendor => "vendor",
            Role::Client => "client",
        }
    }

    /// Route a freshly signed-in user of this role lands on
    pub fn landing_path(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Realtor => "/vendors",
            Role::Vendor | Role::Client => DEFAULT_LANDING_PATH,
        }
    }
}

/// Landing route for an optional role; unknown roles get the default
pub fn redirect_path(role: Option<Role>) -> &'static str {
    role.map(Role::landing_path).unwrap_or(DEFAULT_LANDING_PATH)
}

/// Landing route for a raw role tag as stored by older clients
pub fn redirect_path_for(raw_role: &str) -> &'static str {
    redirect_path(raw_role.parse().ok())
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "realtor" => Ok(Role::Realtor),
            "vendor" => Ok(Role::Vendor),
            "client" => Ok(Role::Client),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_paths_per_role() {
        assert_eq!(redirect_path(Some(Role::Admin)), "/admin");
        assert_eq!(redirect_path(Some(Role::Realtor)), "/vendors");
        assert_eq!(redirect_path(Some(Role::Vendor)), "/dashboard");
        assert_eq!(redirect_path(Some(Role::Client)), "/dashboard");
    }

    #[test]
    fn unknown_role_lands_on_dashboard() {
        assert_eq!(redirect_path(None), DEFAULT_LANDING_PATH);
        assert_eq!(redirect_path_for("superuser"), "/dashboard");
        assert_eq!(redirect_path_for(""), "/dashboard");
        assert_eq!(redirect_path_for("ADMIN"), "/admin");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Realtor).unwrap();
        assert_eq!(json, "\"realtor\"");
        let parsed: Role = serde_json::from_str("\"vendor\"").unwrap();
        assert_eq!(parsed, Role::Vendor);
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }
}
