//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human readable format
    pub log_json: bool,

    /// Directory holding one JSON document per storage key
    pub data_dir: PathBuf,

    /// HMAC secret used to sign session tokens
    pub session_secret: String,
    /// Session token lifetime
    pub session_ttl: Duration,

    /// Allowed client origin(s) for CORS, comma separated
    pub client_origin: String,
    /// Per-request timeout
    pub request_timeout: Duration,

    /// Strapi base URL for vendor/studio listings
    pub cms_url: Option<String>,
    /// Strapi API token
    pub cms_token: Option<String>,

    /// Email API endpoint (invoices, verification codes)
    pub email_api_url: Option<String>,
    /// Email API key
    pub email_api_key: Option<String>,
    /// Sender address for outgoing mail
    pub email_from: String,

    /// Reject enquiry status changes outside the pending/approved/completed flow
    pub strict_status_transitions: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR when a hosting platform provides it
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < 32 {
            return Err(ConfigError::WeakSecret);
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),

            session_secret,
            session_ttl: Duration::from_secs(parse_number("SESSION_TTL_SECS", 7 * 24 * 3600)?),

            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            request_timeout: Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", 30)?),

            cms_url: optional("CMS_URL").map(|url| url.trim_end_matches('/').to_string()),
            cms_token: optional("CMS_TOKEN"),

            email_api_url: optional("EMAIL_API_URL"),
            email_api_key: optional("EMAIL_API_KEY"),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Creative Market <no-reply@creativemarket.local>".to_string()),

            strict_status_transitions: parse_flag("STRICT_STATUS_TRANSITIONS")?,
        })
    }
}

/// Read a variable, treating empty values as unset
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn parse_flag(key: &'static str) -> Result<bool, ConfigError> {
    match optional(key).as_deref().map(str::trim) {
        None => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(_) => Err(ConfigError::Invalid(key)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("SESSION_SECRET must be at least 32 characters")]
    WeakSecret,

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
impl Config {
    /// Configuration for unit tests, storing data under `data_dir`
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Self {
            server_addr: "127.0.0.1:0".parse().expect("static address"),
            log_level: "debug".to_string(),
            log_json: false,
            data_dir,
            session_secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            session_ttl: Duration::from_secs(3600),
            client_origin: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(5),
            cms_url: None,
            cms_token: None,
            email_api_url: None,
            email_api_key: None,
            email_from: "test@creativemarket.local".to_string(),
            strict_status_transitions: false,
        }
    }
}
