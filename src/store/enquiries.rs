//! Vendor enquiries: a realtor's interest in a vendor's offerings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::records::{require, EnquiryError, EnquiryStatus, Record, RecordStore};

pub const ENQUIRIES_KEY: &str = "enquiries";

pub type EnquiryStore = RecordStore<Enquiry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub realtor_id: String,
    pub realtor_name: String,
    pub realtor_email: String,
    pub offerings: Vec<String>,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Enquiry data as submitted through the interest form
#[derive(Debug, Clone, Default)]
pub struct NewEnquiry {
    pub vendor_id: String,
    pub vendor_name: String,
    pub realtor_id: String,
    pub realtor_name: String,
    pub realtor_email: String,
    pub offerings: Vec<String>,
    pub meeting_date: Option<String>,
    pub meeting_time: Option<String>,
    pub meeting_type: Option<String>,
    pub notes: Option<String>,
}

impl Record for Enquiry {
    type Draft = NewEnquiry;

    const STORAGE_KEY: &'static str = ENQUIRIES_KEY;

    fn validate(draft: &NewEnquiry) -> Result<(), EnquiryError> {
        require("vendorId", &draft.vendor_id)?;
        require("realtorId", &draft.realtor_id)?;
        if draft.offerings.iter().all(|o| o.trim().is_empty()) {
            return Err(EnquiryError::Invalid(
                "at least one offering must be selected".to_string(),
            ));
        }
        Ok(())
    }

    fn from_draft(draft: NewEnquiry, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            vendor_id: draft.vendor_id,
            vendor_name: draft.vendor_name,
            realtor_id: draft.realtor_id,
            realtor_name: draft.realtor_name,
            realtor_email: draft.realtor_email,
            offerings: draft
                .offerings
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            status: EnquiryStatus::Pending,
            created_at,
            meeting_date: draft.meeting_date,
            meeting_time: draft.meeting_time,
            meeting_type: draft.meeting_type,
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

impl RecordStore<Enquiry> {
    /// Enquiries addressed to one vendor
    pub fn by_vendor(&self, vendor_id: &str) -> Vec<Enquiry> {
        self.filter(|e| e.vendor_id == vendor_id)
    }
}
