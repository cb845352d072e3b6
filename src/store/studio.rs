//! Studio booking requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::records::{require, EnquiryError, EnquiryStatus, Record, RecordStore};

pub const STUDIO_ENQUIRIES_KEY: &str = "studio-enquiries";

pub type StudioEnquiryStore = RecordStore<StudioEnquiry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioEnquiry {
    pub id: String,
    pub studio_name: String,
    pub studio_address: String,
    pub realtor_id: String,
    pub realtor_name: String,
    pub realtor_email: String,
    pub selected_date: String,
    pub selected_time: String,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewStudioEnquiry {
    pub studio_name: String,
    pub studio_address: String,
    pub realtor_id: String,
    pub realtor_name: String,
    pub realtor_email: String,
    pub selected_date: String,
    pub selected_time: String,
    pub notes: Option<String>,
}

impl Record for StudioEnquiry {
    type Draft = NewStudioEnquiry;

    const STORAGE_KEY: &'static str = STUDIO_ENQUIRIES_KEY;

    fn validate(draft: &NewStudioEnquiry) -> Result<(), EnquiryError> {
        require("studioName", &draft.studio_name)?;
        require("realtorId", &draft.realtor_id)?;
        require("selectedDate", &draft.selected_date)?;
        require("selectedTime", &draft.selected_time)
    }

    fn from_draft(draft: NewStudioEnquiry, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            studio_name: draft.studio_name.trim().to_string(),
            studio_address: draft.studio_address,
            realtor_id: draft.realtor_id,
            realtor_name: draft.realtor_name,
            realtor_email: draft.realtor_email,
            selected_date: draft.selected_date,
            selected_time: draft.selected_time,
            status: EnquiryStatus::Pending,
            created_at,
            notes: draft.notes,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn realtor_id(&self) -> &str {
        &self.realtor_id
    }

    fn status(&self) -> EnquiryStatus {
        self.status
    }

    fn set_status(&mut self, status: EnquiryStatus) {
        self.status = status;
    }
}

impl RecordStore<StudioEnquiry> {
    /// Bookings for one studio, matched by name as stored (trimmed)
    pub fn by_studio(&self, studio_name: &str) -> Vec<StudioEnquiry> {
        let studio_name = studio_name.trim();
        self.filter(|e| e.studio_name == studio_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::local::LocalStorage;

    fn booking(studio: &str, realtor_id: &str) -> NewStudioEnquiry {
        NewStudioEnquiry {
            studio_name: studio.to_string(),
            studio_address: "10 Anson Road".to_string(),
            realtor_id: realtor_id.to_string(),
            realtor_name: "Jane Tan".to_string(),
            realtor_email: "jane@kwsingapore.com".to_string(),
            selected_date: "2026-11-05".to_string(),
            selected_time: "14:00".to_string(),
            notes: Some("Need a backdrop".to_string()),
        }
    }

    #[test]
    fn bookings_filter_by_studio_and_realtor() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StudioEnquiryStore::open(LocalStorage::open(dir.path()).unwrap(), false).unwrap();

        let a = store.add(booking("Studio A", "r1")).unwrap();
        let b = store.add(booking("Studio B", "r1")).unwrap();
        store.add(booking("Studio A", "r2")).unwrap();

        assert_eq!(store.by_studio("Studio A").len(), 2);
        assert_eq!(store.by_studio("Studio C").len(), 0);
        assert_eq!(store.by_studio(" Studio A ").len(), 2);
        assert_eq!(store.by_realtor("r1"), vec![a, b]);
        assert!(dir.path().join("studio-enquiries.json").exists());
    }

    #[test]
    fn padded_studio_names_are_stored_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StudioEnquiryStore::open(LocalStorage::open(dir.path()).unwrap(), false).unwrap();
        let booked = store.add(booking("  Studio A ", "r1")).unwrap();
        assert_eq!(booked.studio_name, "Studio A");
        assert_eq!(store.by_studio("Studio A "), vec![booked]);
    }

    #[test]
    fn booking_requires_date_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StudioEnquiryStore::open(LocalStorage::open(dir.path()).unwrap(), false).unwrap();

        let mut missing_time = booking("Studio A", "r1");
        missing_time.selected_time = String::new();
        let err = store.add(missing_time).unwrap_err();
        assert_eq!(err.to_string(), "Invalid enquiry: selectedTime is required");
    }

    #[test]
    fn status_update_keeps_booking_details() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StudioEnquiryStore::open(LocalStorage::open(dir.path()).unwrap(), false).unwrap();
        let a = store.add(booking("Studio A", "r1")).unwrap();

        let rejected = store
            .update_status(&a.id, EnquiryStatus::Rejected)
            .unwrap();
        assert_eq!(rejected.selected_date, a.selected_date);
        assert_eq!(rejected.notes, a.notes);
        assert_eq!(rejected.status, EnquiryStatus::Rejected);
    }
}
