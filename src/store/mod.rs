//! Data stores: local JSON storage and the content API

pub mod cms;
pub mod enquiries;
pub mod local;
pub mod records;
pub mod studio;
pub mod users;

pub use cms::CmsClient;
pub use enquiries::EnquiryStore;
pub use local::{LocalStorage, StorageError};
pub use records::{EnquiryError, EnquiryStatus};
pub use studio::StudioEnquiryStore;
pub use users::UserStore;
