//! User directory persisted under the `users` storage key

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::local::{LocalStorage, StorageError};
use crate::auth::password::{digest_password, generate_salt, verify_password};
use crate::auth::Role;

pub const USERS_KEY: &str = "users";

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Account as persisted, including credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(flatten)]
    user: User,
    #[serde(default)]
    password_salt: Option<String>,
    #[serde(default)]
    password_digest: Option<String>,
    created_at: DateTime<Utc>,
}

/// Data for a new account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Profile edit; absent fields are left unchanged, empty strings clear optional ones
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Accounts created on first start so the marketplace can be explored
pub const DEMO_ACCOUNTS: &[(&str, &str, &str, Role)] = &[
    ("admin@kwsingapore.com", "admin123", "Marketplace Admin", Role::Admin),
    ("realtor@kwsingapore.com", "realtor123", "Demo Realtor", Role::Realtor),
    ("vendor@creativemarket.local", "vendor123", "Demo Vendor", Role::Vendor),
    ("client@creativemarket.local", "client123", "Demo Client", Role::Client),
];

/// User directory operations
#[derive(Clone)]
pub struct UserStore {
    storage: LocalStorage,
    users: Arc<RwLock<Vec<StoredUser>>>,
}

impl UserStore {
    /// Load the directory from storage
    pub fn open(storage: LocalStorage) -> Result<Self, StorageError> {
        let users: Vec<StoredUser> = storage.load(USERS_KEY)?;
        Ok(Self {
            storage,
            users: Arc::new(RwLock::new(users)),
        })
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Create the demo accounts when the directory is empty
    pub fn seed_demo_accounts(&self) -> Result<usize, UserStoreError> {
        if !self.is_empty() {
            return Ok(0);
        }
        for (email, password, name, role) in DEMO_ACCOUNTS {
            let new_user = NewUser {
                email: email.to_string(),
                name: name.to_string(),
                role: *role,
                company: None,
                phone: None,
            };
            self.insert(new_user, Some(password))?;
        }
        info!(count = DEMO_ACCOUNTS.len(), "Seeded demo accounts");
        Ok(DEMO_ACCOUNTS.len())
    }

    /// Append an account. Emails are not required to be unique.
    pub fn insert(&self, new_user: NewUser, password: Option<&str>) -> Result<User, UserStoreError> {
        let (password_salt, password_digest) = match password {
            Some(password) => {
                let salt = generate_salt();
                let digest =
                    digest_password(password, &salt).map_err(|_| UserStoreError::Credentials)?;
                (Some(salt), Some(digest))
            }
            None => (None, None),
        };

        let user = User {
            id: Uuid::new_v4(),
            email: normalize_email(&new_user.email),
            name: new_user.name.trim().to_string(),
            role: new_user.role,
            company: non_blank(new_user.company),
            phone: non_blank(new_user.phone),
        };
        let stored = StoredUser {
            user: user.clone(),
            password_salt,
            password_digest,
            created_at: Utc::now(),
        };

        let mut users = self.users.write();
        let mut next = users.clone();
        next.push(stored);
        self.storage.save(USERS_KEY, &next)?;
        *users = next;

        Ok(user)
    }

    /// Most recently registered account with this email and password
    pub fn find_by_credentials(&self, email: &str, password: &str) -> Option<User> {
        let email = normalize_email(email);
        self.users
            .read()
            .iter()
            .rev()
            .filter(|u| u.user.email == email)
            .find(|u| match (&u.password_salt, &u.password_digest) {
                (Some(salt), Some(digest)) => verify_password(password, salt, digest),
                _ => false,
            })
            .map(|u| u.user.clone())
    }

    /// Most recently registered account with this email
    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let email = normalize_email(email);
        self.users
            .read()
            .iter()
            .rev()
            .find(|u| u.user.email == email)
            .map(|u| u.user.clone())
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users
            .read()
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone())
    }

    /// Apply a profile edit
    pub fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User, UserStoreError> {
        let mut users = self.users.write();
        let mut next = users.clone();
        let entry = next
            .iter_mut()
            .find(|u| u.user.id == id)
            .ok_or(UserStoreError::NotFound(id))?;

        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(UserStoreError::Invalid("name must not be empty".to_string()));
            }
            entry.user.name = name.to_string();
        }
        if let Some(company) = update.company {
            entry.user.company = non_blank(Some(company));
        }
        if let Some(phone) = update.phone {
            entry.user.phone = non_blank(Some(phone));
        }
        let updated = entry.user.clone();

        self.storage.save(USERS_KEY, &next)?;
        *users = next;
        Ok(updated)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// User store errors
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid profile: {0}")]
    Invalid(String),

    #[error("Failed to derive password digest")]
    Credentials,
}

#[cfg(test)]
impl User {
    pub fn test_user(role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: format!("{}@kwsingapore.com", role),
            name: format!("Test {}", role),
            role,
            company: None,
            phone: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();
        (dir, UserStore::open(storage).unwrap())
    }

    fn new_user(email: &str, name: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: name.to_string(),
            role,
            company: None,
            phone: None,
        }
    }

    #[test]
    fn seeds_only_an_empty_directory() {
        let (_dir, users) = store();
        assert_eq!(users.seed_demo_accounts().unwrap(), DEMO_ACCOUNTS.len());
        assert_eq!(users.seed_demo_accounts().unwrap(), 0);
        assert_eq!(users.len(), DEMO_ACCOUNTS.len());

        let admin = users
            .find_by_credentials("ADMIN@kwsingapore.com", "admin123")
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn wrong_password_finds_nobody() {
        let (_dir, users) = store();
        users
            .insert(new_user("a@b.com", "A", Role::Client), Some("pw"))
            .unwrap();
        assert!(users.find_by_credentials("a@b.com", "nope").is_none());
        assert!(users.find_by_credentials("missing@b.com", "pw").is_none());
    }

    #[test]
    fn duplicate_emails_prefer_latest_registration() {
        let (_dir, users) = store();
        users
            .insert(new_user("dup@b.com", "First", Role::Client), Some("pw"))
            .unwrap();
        let second = users
            .insert(new_user("dup@b.com", "Second", Role::Vendor), Some("pw"))
            .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users.find_by_email("dup@b.com").unwrap().id, second.id);
        assert_eq!(
            users.find_by_credentials("dup@b.com", "pw").unwrap().name,
            "Second"
        );
    }

    #[test]
    fn passwordless_accounts_cannot_use_password_login() {
        let (_dir, users) = store();
        users
            .insert(new_user("code@kwsingapore.com", "Code", Role::Realtor), None)
            .unwrap();
        assert!(users.find_by_credentials("code@kwsingapore.com", "").is_none());
    }

    #[test]
    fn profile_update_persists() {
        let (dir, users) = store();
        let user = users
            .insert(new_user("p@b.com", "Before", Role::Vendor), Some("pw"))
            .unwrap();

        let updated = users
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some("After".to_string()),
                    company: Some("Studio Co".to_string()),
                    phone: None,
                },
            )
            .unwrap();
        assert_eq!(updated.name, "After");
        assert_eq!(updated.company.as_deref(), Some("Studio Co"));
        assert_eq!(updated.email, "p@b.com");

        let reopened = UserStore::open(LocalStorage::open(dir.path()).unwrap()).unwrap();
        assert_eq!(reopened.get(user.id).unwrap(), updated);
    }

    #[test]
    fn profile_update_rejects_blank_name() {
        let (_dir, users) = store();
        let user = users
            .insert(new_user("p@b.com", "Name", Role::Vendor), Some("pw"))
            .unwrap();
        let err = users
            .update_profile(
                user.id,
                ProfileUpdate {
                    name: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, UserStoreError::Invalid(_)));
        assert_eq!(users.get(user.id).unwrap().name, "Name");
    }

    #[test]
    fn stored_json_never_holds_plain_passwords() {
        let (dir, users) = store();
        users
            .insert(new_user("s@b.com", "S", Role::Client), Some("hunter2"))
            .unwrap();
        let raw = std::fs::read_to_string(dir.path().join("users.json")).unwrap();
        assert!(!raw.contains("hunter2"));
        assert!(raw.contains("passwordDigest"));
    }
}
