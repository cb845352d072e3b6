//! Invoice validation, totals and email rendering

use serde::{Deserialize, Serialize};

use crate::mail::Email;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    /// Price per unit in cents
    pub unit_price: i64,
}

impl InvoiceItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub invoice_number: String,
    pub recipient_name: String,
    pub recipient_email: String,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// An invoice that passed validation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub invoice_number: String,
    pub recipient_email: String,
    pub item_count: usize,
    /// Total in cents
    pub total: i64,
}

/// Check an invoice before anything is sent
pub fn validate(invoice: &InvoiceRequest) -> Result<InvoiceSummary, InvoiceError> {
    if invoice.items.is_empty() {
        return Err(InvoiceError::NoItems);
    }
    if invoice.invoice_number.trim().is_empty() {
        return Err(InvoiceError::Invalid("invoice number is required".to_string()));
    }
    if invoice.recipient_name.trim().is_empty() {
        return Err(InvoiceError::Invalid("recipient name is required".to_string()));
    }
    let email = invoice.recipient_email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(InvoiceError::Invalid(format!("invalid recipient email: {}", email))),
    }

    for (index, item) in invoice.items.iter().enumerate() {
        let line = index + 1;
        if item.description.trim().is_empty() {
            return Err(InvoiceError::InvalidItem {
                line,
                reason: "description is required",
            });
        }
        if item.quantity == 0 {
            return Err(InvoiceError::InvalidItem {
                line,
                reason: "quantity must be at least 1",
            });
        }
        if item.unit_price < 0 {
            return Err(InvoiceError::InvalidItem {
                line,
                reason: "unit price must not be negative",
            });
        }
    }

    let total = invoice
        .items
        .iter()
        .fold(0i64, |acc, item| acc.saturating_add(item.line_total()));

    Ok(InvoiceSummary {
        invoice_number: invoice.invoice_number.trim().to_string(),
        recipient_email: email.to_string(),
        item_count: invoice.items.len(),
        total,
    })
}

/// Format cents as `$1,234.56`
pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render a validated invoice as an email
pub fn render_email(invoice: &InvoiceRequest, summary: &InvoiceSummary) -> Email {
    let subject = format!("Invoice {}", summary.invoice_number);

    let mut text = format!(
        "Hi {},\n\nPlease find invoice {} below.\n\n",
        invoice.recipient_name.trim(),
        summary.invoice_number
    );
    for item in &invoice.items {
        text.push_str(&format!(
            "- {} x{} @ {} = {}\n",
            item.description.trim(),
            item.quantity,
            format_money(item.unit_price),
            format_money(item.line_total())
        ));
    }
    text.push_str(&format!("\nTotal: {}\n", format_money(summary.total)));
    if let Some(due) = invoice.due_date.as_deref().filter(|d| !d.trim().is_empty()) {
        text.push_str(&format!("Due: {}\n", due.trim()));
    }
    if let Some(notes) = invoice.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        text.push_str(&format!("\n{}\n", notes.trim()));
    }

    let rows: String = invoice
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(item.description.trim()),
                item.quantity,
                format_money(item.unit_price),
                format_money(item.line_total())
            )
        })
        .collect();
    let html = format!(
        "<h2>Invoice {}</h2><p>Hi {},</p>\
         <table><thead><tr><th>Description</th><th>Qty</th><th>Unit price</th><th>Amount</th></tr></thead>\
         <tbody>{}</tbody></table><p><strong>Total: {}</strong></p>{}",
        escape_html(&summary.invoice_number),
        escape_html(invoice.recipient_name.trim()),
        rows,
        format_money(summary.total),
        invoice
            .notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| format!("<p>{}</p>", escape_html(n.trim())))
            .unwrap_or_default()
    );

    Email {
        to: summary.recipient_email.clone(),
        subject,
        text,
        html: Some(html),
    }
}

/// Invoice errors
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("Invoice must contain at least one item")]
    NoItems,

    #[error("Invalid invoice: {0}")]
    Invalid(String),

    #[error("Invalid item on line {line}: {reason}")]
    InvalidItem { line: usize, reason: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(items: Vec<InvoiceItem>) -> InvoiceRequest {
        InvoiceRequest {
            invoice_number: "INV-0042".to_string(),
            recipient_name: "Jane Tan".to_string(),
            recipient_email: "jane@kwsingapore.com".to_string(),
            items,
            notes: Some("Thanks for your business".to_string()),
            due_date: Some("2026-11-30".to_string()),
        }
    }

    fn item(description: &str, quantity: u32, unit_price: i64) -> InvoiceItem {
        InvoiceItem {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn empty_invoice_is_rejected() {
        assert!(matches!(
            validate(&invoice(vec![])),
            Err(InvoiceError::NoItems)
        ));
    }

    #[test]
    fn totals_sum_line_items() {
        let summary = validate(&invoice(vec![
            item("Listing photography", 1, 35_000),
            item("Drone add-on", 2, 12_550),
        ]))
        .unwrap();
        assert_eq!(summary.total, 60_100);
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn bad_items_report_their_line() {
        let err = validate(&invoice(vec![item("Ok", 1, 100), item("Zero", 0, 100)])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid item on line 2: quantity must be at least 1"
        );
        assert!(validate(&invoice(vec![item("Refund", 1, -5)])).is_err());
        assert!(validate(&invoice(vec![item(" ", 1, 5)])).is_err());
    }

    #[test]
    fn recipient_email_is_checked() {
        let mut bad = invoice(vec![item("Video", 1, 100)]);
        bad.recipient_email = "jane".to_string();
        assert!(matches!(validate(&bad), Err(InvoiceError::Invalid(_))));
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(0), "$0.00");
        assert_eq!(format_money(5), "$0.05");
        assert_eq!(format_money(123_456_789), "$1,234,567.89");
        assert_eq!(format_money(-150), "-$1.50");
    }

    #[test]
    fn rendered_email_lists_items_and_total() {
        let inv = invoice(vec![item("Studio <half day>", 1, 40_000)]);
        let summary = validate(&inv).unwrap();
        let email = render_email(&inv, &summary);

        assert_eq!(email.to, "jane@kwsingapore.com");
        assert_eq!(email.subject, "Invoice INV-0042");
        assert!(email.text.contains("Studio <half day> x1 @ $400.00 = $400.00"));
        assert!(email.text.contains("Total: $400.00"));
        assert!(email.text.contains("Due: 2026-11-30"));
        let html = email.html.unwrap();
        assert!(html.contains("Studio &lt;half day&gt;"));
        assert!(!html.contains("<half day>"));
    }
}
