//! Array-of-records store backing both enquiry collections
//!
//! The whole array lives in memory and is rewritten under its storage key on
//! every mutation. Lookups are linear scans in insertion order.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::info;

use super::local::{LocalStorage, StorageError};
use crate::util::time::unix_millis;

/// Lifecycle of an enquiry or booking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnquiryStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl EnquiryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnquiryStatus::Pending => "pending",
            EnquiryStatus::Approved => "approved",
            EnquiryStatus::Rejected => "rejected",
            EnquiryStatus::Completed => "completed",
        }
    }

    /// Transitions of the intended flow: pending -> approved | rejected, approved -> completed.
    /// Setting the current status again is always allowed.
    pub fn can_transition_to(self, next: EnquiryStatus) -> bool {
        use EnquiryStatus::*;
        self == next
            || matches!(
                (self, next),
                (Pending, Approved) | (Pending, Rejected) | (Approved, Completed)
            )
    }
}

impl fmt::Display for EnquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record kept in a [`RecordStore`]
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Submitted data before an id and timestamp are assigned
    type Draft;

    /// Storage key holding the array
    const STORAGE_KEY: &'static str;

    /// Reject drafts missing required fields
    fn validate(draft: &Self::Draft) -> Result<(), EnquiryError>;

    fn from_draft(draft: Self::Draft, id: String, created_at: DateTime<Utc>) -> Self;

    fn id(&self) -> &str;
    fn realtor_id(&self) -> &str;
    fn status(&self) -> EnquiryStatus;
    fn set_status(&mut self, status: EnquiryStatus);
}

/// Store over one storage key
pub struct RecordStore<R: Record> {
    storage: LocalStorage,
    records: Arc<RwLock<Vec<R>>>,
    strict_transitions: bool,
}

impl<R: Record> Clone for RecordStore<R> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            records: self.records.clone(),
            strict_transitions: self.strict_transitions,
        }
    }
}

impl<R: Record> RecordStore<R> {
    /// Load the array stored under `R::STORAGE_KEY`
    pub fn open(storage: LocalStorage, strict_transitions: bool) -> Result<Self, StorageError> {
        let records: Vec<R> = storage.load(R::STORAGE_KEY)?;
        Ok(Self {
            storage,
            records: Arc::new(RwLock::new(records)),
            strict_transitions,
        })
    }

    /// Append a new record with a fresh id, `createdAt = now` and status pending
    pub fn add(&self, draft: R::Draft) -> Result<R, EnquiryError> {
        R::validate(&draft)?;

        let mut records = self.records.write();
        let id = next_id(records.as_slice(), unix_millis());
        let record = R::from_draft(draft, id, Utc::now());

        let mut next = records.clone();
        next.push(record.clone());
        self.storage.save(R::STORAGE_KEY, &next)?;
        *records = next;

        info!(key = R::STORAGE_KEY, id = record.id(), "Record added");
        Ok(record)
    }

    /// Replace the status of one record, leaving everything else untouched
    pub fn update_status(&self, id: &str, status: EnquiryStatus) -> Result<R, EnquiryError> {
        let mut records = self.records.write();
        let mut next = records.clone();
        let record = next
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| EnquiryError::NotFound(id.to_string()))?;

        let from = record.status();
        if self.strict_transitions && !from.can_transition_to(status) {
            return Err(EnquiryError::IllegalTransition { from, to: status });
        }
        record.set_status(status);
        let updated = record.clone();

        self.storage.save(R::STORAGE_KEY, &next)?;
        *records = next;

        info!(
            key = R::STORAGE_KEY,
            id,
            from = %from,
            to = %status,
            "Record status updated"
        );
        Ok(updated)
    }

    pub fn get(&self, id: &str) -> Option<R> {
        self.records.read().iter().find(|r| r.id() == id).cloned()
    }

    pub fn all(&self) -> Vec<R> {
        self.records.read().clone()
    }

    /// Records matching `predicate`, in insertion order
    pub fn filter(&self, predicate: impl Fn(&R) -> bool) -> Vec<R> {
        self.records
            .read()
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub fn by_realtor(&self, realtor_id: &str) -> Vec<R> {
        self.filter(|r| r.realtor_id() == realtor_id)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

/// Millisecond timestamp id, bumped past the newest existing id so records
/// created within the same millisecond stay distinct
fn next_id<R: Record>(records: &[R], now_millis: u64) -> String {
    let newest = records
        .iter()
        .filter_map(|r| r.id().parse::<u64>().ok())
        .max();
    let mut candidate = match newest {
        Some(newest) if newest >= now_millis => newest + 1,
        _ => now_millis,
    };
    while records.iter().any(|r| r.id() == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

/// Record store errors
#[derive(Debug, thiserror::Error)]
pub enum EnquiryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Enquiry not found: {0}")]
    NotFound(String),

    #[error("Cannot change status from {from} to {to}")]
    IllegalTransition {
        from: EnquiryStatus,
        to: EnquiryStatus,
    },

    #[error("Invalid enquiry: {0}")]
    Invalid(String),
}

/// Require a non-blank string field
pub(crate) fn require(field: &str, value: &str) -> Result<(), EnquiryError> {
    if value.trim().is_empty() {
        return Err(EnquiryError::Invalid(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intended_flow_transitions() {
        use EnquiryStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Completed));
        assert!(Approved.can_transition_to(Approved));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EnquiryStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert!(serde_json::from_str::<EnquiryStatus>("\"cancelled\"").is_err());
    }
}
