//! Invoice handlers: the REST surface of the ledger.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{validate_non_negative, validate_tax_rate, DEFAULT_LIMIT};
use crate::models::{CreateInvoice, Invoice, InvoiceStatus, ListInvoicesFilter, Payment};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub job_id: Uuid,
    #[validate(custom(function = validate_non_negative))]
    pub labor_cost: Decimal,
    #[validate(custom(function = validate_non_negative))]
    pub material_cost: Decimal,
    #[validate(custom(function = validate_non_negative))]
    pub additional_costs: Decimal,
    #[validate(custom(function = validate_tax_rate))]
    pub tax_rate: Decimal,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i32>,
}

/// Invoice plus its derived monetary fields, computed at read time.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub balance_due: Decimal,
    pub is_overdue: bool,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let today = Utc::now().date_naive();
        InvoiceResponse {
            subtotal: invoice.subtotal(),
            tax_amount: invoice.tax_amount(),
            total_amount: invoice.total_amount(),
            balance_due: invoice.balance_due(),
            is_overdue: invoice.is_overdue(today),
            invoice,
        }
    }
}

/// Invoice with derived fields and its payment history.
#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    #[serde(flatten)]
    pub invoice: InvoiceResponse,
    pub payments: Vec<Payment>,
}

/// Result of the overdue sweep.
#[derive(Debug, Serialize)]
pub struct OverdueSweepResponse {
    pub swept: u64,
    pub invoices: Vec<InvoiceResponse>,
}

fn parse_status(value: &str) -> Result<InvoiceStatus, AppError> {
    InvoiceStatus::from_string(value)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown invoice status '{}'", value)))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    payload.validate()?;

    let invoice = state
        .db
        .create_invoice(&CreateInvoice {
            job_id: payload.job_id,
            labor_cost: payload.labor_cost,
            material_cost: payload.material_cost,
            additional_costs: payload.additional_costs,
            tax_rate: payload.tax_rate,
            due_date: payload.due_date,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(invoice.into())))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let invoices = state
        .db
        .list_invoices(&ListInvoicesFilter {
            status,
            customer_id: query.customer_id,
            start_date: query.start_date,
            end_date: query.end_date,
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        })
        .await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceDetailResponse>, AppError> {
    let invoice = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    let payments = state.db.list_payments(invoice_id).await?;
    Ok(Json(InvoiceDetailResponse {
        invoice: invoice.into(),
        payments,
    }))
}

/// Issue a draft invoice to the customer.
pub async fn send_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .db
        .send_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    Ok(Json(invoice.into()))
}

/// Cancel an unpaid invoice.
pub async fn cancel_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .db
        .cancel_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    Ok(Json(invoice.into()))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_invoice(invoice_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Sweep sent invoices past their due date to OVERDUE, then return the
/// overdue set. The sweep is the one mutation reporting performs and is
/// idempotent: a second call flips nothing further.
pub async fn overdue_invoices(
    State(state): State<AppState>,
) -> Result<Json<OverdueSweepResponse>, AppError> {
    let today = Utc::now().date_naive();
    let swept = state.db.sweep_overdue_invoices(today).await?;
    let invoices = state.db.list_overdue_invoices(today).await?;
    Ok(Json(OverdueSweepResponse {
        swept,
        invoices: invoices.into_iter().map(Into::into).collect(),
    }))
}

/// All invoices still awaiting payment.
pub async fn unpaid_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceResponse>>, AppError> {
    let invoices = state.db.list_unpaid_invoices().await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}
