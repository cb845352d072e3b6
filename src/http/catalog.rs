//! Vendor and studio listings from the content API

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::error::AppError;
use crate::app::AppState;
use crate::store::cms::{STUDIOS_COLLECTION, VENDORS_COLLECTION};

#[derive(Deserialize)]
pub struct VendorFilter {
    category: Option<String>,
}

fn matches_category(entry: &Value, category: &str) -> bool {
    entry
        .get("category")
        .and_then(Value::as_str)
        .map(|c| c.eq_ignore_ascii_case(category))
        .unwrap_or(false)
}

pub async fn list_vendors_handler(
    State(state): State<AppState>,
    Query(filter): Query<VendorFilter>,
) -> Result<Json<Vec<Value>>, AppError> {
    let vendors = state.cms.list(VENDORS_COLLECTION).await?;
    let vendors = match filter.category.as_deref().filter(|c| !c.is_empty()) {
        Some(category) => vendors
            .into_iter()
            .filter(|v| matches_category(v, category))
            .collect(),
        None => vendors,
    };
    Ok(Json(vendors))
}

pub async fn get_vendor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .cms
        .get(VENDORS_COLLECTION, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("vendor {}", id)))
}

pub async fn list_studios_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, AppError> {
    Ok(Json(state.cms.list(STUDIOS_COLLECTION).await?))
}
