//! Enquiry and studio booking endpoints

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::error::AppError;
use super::middleware::CurrentUser;
use crate::app::AppState;
use crate::auth::Role;
use crate::store::enquiries::{Enquiry, NewEnquiry};
use crate::store::studio::{NewStudioEnquiry, StudioEnquiry};
use crate::store::EnquiryStatus;

/// Interest form submitted by a realtor against a vendor
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnquiryRequest {
    vendor_id: String,
    #[serde(default)]
    vendor_name: String,
    #[serde(default)]
    offerings: Vec<String>,
    meeting_date: Option<String>,
    meeting_time: Option<String>,
    meeting_type: Option<String>,
    notes: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusFilter {
    status: Option<EnquiryStatus>,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    status: EnquiryStatus,
}

fn with_status<T>(
    records: Vec<T>,
    status: Option<EnquiryStatus>,
    of: impl Fn(&T) -> EnquiryStatus,
) -> Vec<T> {
    match status {
        Some(status) => records.into_iter().filter(|r| of(r) == status).collect(),
        None => records,
    }
}

pub async fn create_enquiry_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateEnquiryRequest>,
) -> Result<(StatusCode, Json<Enquiry>), AppError> {
    let realtor = current.user;
    let enquiry = state.enquiries.add(NewEnquiry {
        vendor_id: req.vendor_id,
        vendor_name: req.vendor_name,
        realtor_id: realtor.id.to_string(),
        realtor_name: realtor.name,
        realtor_email: realtor.email,
        offerings: req.offerings,
        meeting_date: req.meeting_date,
        meeting_time: req.meeting_time,
        meeting_type: req.meeting_type,
        notes: req.notes,
    })?;
    Ok((StatusCode::CREATED, Json(enquiry)))
}

pub async fn list_enquiries_handler(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> Json<Vec<Enquiry>> {
    Json(with_status(state.enquiries.all(), filter.status, |e| e.status))
}

pub async fn my_enquiries_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<StatusFilter>,
) -> Json<Vec<Enquiry>> {
    let mine = state.enquiries.by_realtor(&current.user.id.to_string());
    Json(with_status(mine, filter.status, |e| e.status))
}

pub async fn vendor_enquiries_handler(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
    Query(filter): Query<StatusFilter>,
) -> Json<Vec<Enquiry>> {
    let enquiries = state.enquiries.by_vendor(&vendor_id);
    Json(with_status(enquiries, filter.status, |e| e.status))
}

pub async fn get_enquiry_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Enquiry>, AppError> {
    let owner = current.user.id.to_string();
    state
        .enquiries
        .get(&id)
        // Another realtor's enquiry looks the same as a missing one
        .filter(|e| current.user.role != Role::Realtor || e.realtor_id == owner)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("enquiry {}", id)))
}

pub async fn update_enquiry_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Enquiry>, AppError> {
    Ok(Json(state.enquiries.update_status(&id, req.status)?))
}

/// Studio booking form
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudioEnquiryRequest {
    studio_name: String,
    #[serde(default)]
    studio_address: String,
    selected_date: String,
    selected_time: String,
    notes: Option<String>,
}

pub async fn create_studio_enquiry_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateStudioEnquiryRequest>,
) -> Result<(StatusCode, Json<StudioEnquiry>), AppError> {
    let realtor = current.user;
    let booking = state.studio_enquiries.add(NewStudioEnquiry {
        studio_name: req.studio_name,
        studio_address: req.studio_address,
        realtor_id: realtor.id.to_string(),
        realtor_name: realtor.name,
        realtor_email: realtor.email,
        selected_date: req.selected_date,
        selected_time: req.selected_time,
        notes: req.notes,
    })?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn list_studio_enquiries_handler(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> Json<Vec<StudioEnquiry>> {
    Json(with_status(
        state.studio_enquiries.all(),
        filter.status,
        |e| e.status,
    ))
}

pub async fn my_studio_enquiries_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Json<Vec<StudioEnquiry>> {
    Json(
        state
            .studio_enquiries
            .by_realtor(&current.user.id.to_string()),
    )
}

pub async fn studio_bookings_handler(
    State(state): State<AppState>,
    Path(studio_name): Path<String>,
) -> Json<Vec<StudioEnquiry>> {
    Json(state.studio_enquiries.by_studio(&studio_name))
}

pub async fn update_studio_enquiry_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<StudioEnquiry>, AppError> {
    Ok(Json(state.studio_enquiries.update_status(&id, req.status)?))
}
