//! Sign-in, sign-up and profile flows

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::codes::{is_allowed_domain, VerificationCodes};
use super::role::Role;
use super::token::{SessionClaims, SessionTokens};
use super::AuthError;
use crate::mail::{Email, Mailer};
use crate::store::users::{NewUser, ProfileUpdate, User, UserStore};

/// A freshly issued session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
    /// Landing route for the user's role
    pub redirect: &'static str,
}

/// Outcome of a verification code request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeDispatch {
    pub email: String,
    /// Whether the code left through the email API rather than the log
    pub delivered: bool,
    pub expires_in_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    tokens: Arc<SessionTokens>,
    codes: Arc<VerificationCodes>,
    mailer: Mailer,
}

impl AuthService {
    pub fn new(
        users: UserStore,
        tokens: Arc<SessionTokens>,
        codes: Arc<VerificationCodes>,
        mailer: Mailer,
    ) -> Self {
        Self {
            users,
            tokens,
            codes,
            mailer,
        }
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    fn grant(&self, user: User) -> Result<SessionGrant, AuthError> {
        let (token, claims) = self.tokens.issue(&user)?;
        Ok(SessionGrant {
            token,
            expires_at: claims.expires_at(),
            redirect: user.role.landing_path(),
            user,
        })
    }

    /// Sign in with email and password
    pub fn login(&self, email: &str, password: &str) -> Result<SessionGrant, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "email and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.find_by_credentials(email, password) else {
            warn!(email = %email.trim(), "Rejected password sign-in");
            return Err(AuthError::InvalidCredentials);
        };

        info!(user_id = %user.id, role = %user.role, "User signed in");
        self.grant(user)
    }

    /// Issue a sign-in code to an address on an allowed domain
    pub async fn send_verification_code(&self, email: &str) -> Result<CodeDispatch, AuthError> {
        if !is_allowed_domain(email) {
            return Err(AuthError::DomainNotAllowed);
        }
        let email = email.trim().to_ascii_lowercase();
        let code = self.codes.issue(&email)?;
        let minutes = self.codes.ttl().as_secs() / 60;

        let message = Email {
            to: email.clone(),
            subject: "Your sign-in code".to_string(),
            text: format!(
                "Your verification code is {}. It expires in {} minutes.",
                code, minutes
            ),
            html: None,
        };
        let delivery = match self.mailer.send(&message).await {
            Ok(delivery) => delivery,
            Err(err) => {
                // Nobody received it, so it must not stay redeemable
                self.codes.discard(&email, &code);
                return Err(err.into());
            }
        };
        debug!(email = %email, delivered = delivery.delivered(), "Verification code issued");

        Ok(CodeDispatch {
            email,
            delivered: delivery.delivered(),
            expires_in_secs: self.codes.ttl().as_secs(),
        })
    }

    /// Sign in with a code sent by [`send_verification_code`](Self::send_verification_code).
    /// First-time addresses get a realtor account. Admin accounts must use a password.
    pub fn login_with_email_code(&self, email: &str, code: &str) -> Result<SessionGrant, AuthError> {
        if !is_allowed_domain(email) {
            return Err(AuthError::DomainNotAllowed);
        }
        self.codes.redeem(email, code)?;

        let user = match self.users.find_by_email(email) {
            Some(user) if user.role == Role::Admin => {
                warn!(user_id = %user.id, "Refused code sign-in for admin account");
                return Err(AuthError::AdminCodeSignInForbidden);
            }
            Some(user) => user,
            None => {
                let user = self.users.insert(
                    NewUser {
                        email: email.to_string(),
                        name: name_from_email(email),
                        role: Role::Realtor,
                        company: None,
                        phone: None,
                    },
                    None,
                )?;
                info!(user_id = %user.id, "Created account on first code sign-in");
                user
            }
        };

        info!(user_id = %user.id, role = %user.role, "User signed in with code");
        self.grant(user)
    }

    /// Register an account and sign it in
    pub fn signup(&self, request: SignupRequest) -> Result<SessionGrant, AuthError> {
        if request.role == Role::Admin {
            return Err(AuthError::AdminSignupForbidden);
        }
        let email = request.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(AuthError::InvalidInput("a valid email is required".to_string())),
        }
        if request.name.trim().is_empty() {
            return Err(AuthError::InvalidInput("name is required".to_string()));
        }
        if request.password.len() < 6 {
            return Err(AuthError::InvalidInput(
                "password must be at least 6 characters".to_string(),
            ));
        }

        let user = self.users.insert(
            NewUser {
                email: email.to_string(),
                name: request.name,
                role: request.role,
                company: request.company,
                phone: request.phone,
            },
            Some(&request.password),
        )?;

        info!(user_id = %user.id, role = %user.role, "User signed up");
        self.grant(user)
    }

    /// Resolve a bearer token to its current user record
    pub fn authenticate(&self, token: &str) -> Result<(User, SessionClaims), AuthError> {
        let claims = self.tokens.verify(token)?;
        let user = self.users.get(claims.sub).ok_or(AuthError::UnknownUser)?;
        Ok((user, claims))
    }

    /// End a session; the account itself is kept
    pub fn logout(&self, claims: &SessionClaims) {
        self.tokens.revoke(claims);
        info!(user_id = %claims.sub, "User signed out");
    }

    pub fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User, AuthError> {
        let user = self.users.update_profile(user_id, update)?;
        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Forget expired revocations and verification codes
    pub fn sweep_expired(&self) {
        let tokens = self.tokens.sweep_expired();
        let codes = self.codes.sweep_expired();
        if tokens + codes > 0 {
            debug!(tokens, codes, "Swept expired session state");
        }
    }

    #[cfg(test)]
    pub fn pending_code(&self, email: &str) -> Option<String> {
        self.codes.peek(email)
    }
}

/// "jane.tan@..." -> "Jane Tan"
fn name_from_email(email: &str) -> String {
    let local = email.trim().split('@').next().unwrap_or_default();
    let name = local
        .split(|c: char| c == '.' || c == '_' || c == '-' || c == '+')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        local.to_string()
    } else {
        name
    }
}
