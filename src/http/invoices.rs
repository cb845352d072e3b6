//! Invoice email endpoint

use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::info;

use super::error::AppError;
use crate::app::AppState;
use crate::invoice::{self, InvoiceRequest, InvoiceSummary};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSent {
    #[serde(flatten)]
    summary: InvoiceSummary,
    delivered: bool,
}

pub async fn send_invoice_handler(
    State(state): State<AppState>,
    Json(req): Json<InvoiceRequest>,
) -> Result<Json<InvoiceSent>, AppError> {
    // Nothing is rendered or sent unless the invoice validates
    let summary = invoice::validate(&req)?;
    let email = invoice::render_email(&req, &summary);
    let delivery = state.mailer.send(&email).await?;

    info!(
        invoice = %summary.invoice_number,
        total = summary.total,
        delivered = delivery.delivered(),
        "Invoice emailed"
    );

    Ok(Json(InvoiceSent {
        summary,
        delivered: delivery.delivered(),
    }))
}
