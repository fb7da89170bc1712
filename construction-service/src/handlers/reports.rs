//! Report handlers: JSON summaries cut across the whole dataset.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub total_customers: i64,
    pub total_jobs: i64,
    pub total_revenue: Decimal,
    pub active_jobs: i64,
    pub pending_invoices: i64,
}

#[derive(Debug, Serialize)]
pub struct FinancialReport {
    pub total_revenue: Decimal,
    pub pending_revenue: Decimal,
    pub total_invoices: i64,
    pub paid_invoices: i64,
    pub unpaid_invoices: i64,
}

fn count_for(counts: &[crate::reporting::StatusCount], status: &str) -> i64 {
    counts
        .iter()
        .find(|c| c.status == status)
        .map(|c| c.total)
        .unwrap_or(0)
}

/// Dispatch on the requested report type.
pub async fn reports(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    match query.kind.as_deref().unwrap_or("summary") {
        "summary" => Ok(Json(summary_report(&state).await?).into_response()),
        "customer" => Ok(Json(state.db.customer_report().await?).into_response()),
        "financial" => Ok(Json(financial_report(&state).await?).into_response()),
        other => Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid report type '{}'",
            other
        ))),
    }
}

async fn summary_report(state: &AppState) -> Result<SummaryReport, AppError> {
    let job_counts = state.db.count_jobs_by_status().await?;
    let invoice_counts = state.db.count_invoices_by_status().await?;

    Ok(SummaryReport {
        total_customers: state.db.count_customers().await?,
        total_jobs: job_counts.iter().map(|c| c.total).sum(),
        total_revenue: state.db.collected_revenue().await?,
        active_jobs: count_for(&job_counts, "IN_PROGRESS"),
        pending_invoices: count_for(&invoice_counts, "SENT")
            + count_for(&invoice_counts, "OVERDUE"),
    })
}

async fn financial_report(state: &AppState) -> Result<FinancialReport, AppError> {
    let invoice_counts = state.db.count_invoices_by_status().await?;
    let unpaid = state.db.list_unpaid_invoices().await?;
    let pending_revenue: Decimal = unpaid
        .iter()
        .map(|invoice| invoice.total_amount() - invoice.amount_paid)
        .sum();

    Ok(FinancialReport {
        total_revenue: state.db.collected_revenue().await?,
        pending_revenue,
        total_invoices: invoice_counts.iter().map(|c| c.total).sum(),
        paid_invoices: count_for(&invoice_counts, "PAID"),
        unpaid_invoices: count_for(&invoice_counts, "SENT")
            + count_for(&invoice_counts, "OVERDUE"),
    })
}
