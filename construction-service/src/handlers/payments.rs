//! Payment handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::validate_positive;
use crate::models::{CreatePayment, Payment, PaymentMethod};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(custom(function = validate_positive))]
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 100))]
    pub transaction_reference: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub received_by: Option<String>,
    pub notes: Option<String>,
}

/// Record a payment against an invoice. Supplying the same transaction
/// reference twice returns the original payment instead of applying the
/// money again.
pub async fn record_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    payload.validate()?;

    let payment_method = PaymentMethod::from_string(&payload.payment_method).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Unknown payment method '{}'",
            payload.payment_method
        ))
    })?;

    let payment = state
        .db
        .record_payment(&CreatePayment {
            invoice_id,
            amount: payload.amount,
            payment_method,
            payment_date: payload.payment_date,
            transaction_reference: payload.transaction_reference,
            received_by: payload.received_by,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Payment history for an invoice.
pub async fn list_invoice_payments(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let payments = state.db.list_payments(invoice_id).await?;
    Ok(Json(payments))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = state
        .db
        .get_payment(payment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Payment not found")))?;
    Ok(Json(payment))
}
