//! Application state shared across routes

use std::sync::Arc;

use crate::auth::codes::{VerificationCodes, CODE_TTL};
use crate::auth::token::SessionTokens;
use crate::auth::AuthService;
use crate::config::Config;
use crate::mail::Mailer;
use crate::store::users::UserStoreError;
use crate::store::{CmsClient, EnquiryStore, LocalStorage, StorageError, StudioEnquiryStore, UserStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub enquiries: EnquiryStore,
    pub studio_enquiries: StudioEnquiryStore,
    pub cms: CmsClient,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StateError> {
        let config = Arc::new(config);

        // Open local storage and load every key
        let storage = LocalStorage::open(config.data_dir.clone())?;
        let users = UserStore::open(storage.clone())?;
        users.seed_demo_accounts()?;

        let enquiries = EnquiryStore::open(storage.clone(), config.strict_status_transitions)?;
        let studio_enquiries =
            StudioEnquiryStore::open(storage, config.strict_status_transitions)?;

        // Outbound clients
        let mailer = Mailer::new(&config);
        let cms = CmsClient::new(&config);

        // Sessions and sign-in codes
        let tokens = Arc::new(SessionTokens::new(
            config.session_secret.clone(),
            config.session_ttl,
        ));
        let codes = Arc::new(VerificationCodes::new(CODE_TTL));
        let auth = AuthService::new(users, tokens, codes, mailer.clone());

        Ok(Self {
            config,
            auth,
            enquiries,
            studio_enquiries,
            cms,
            mailer,
        })
    }
}

/// Startup errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Users(#[from] UserStoreError),
}
