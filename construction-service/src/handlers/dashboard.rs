//! Dashboard handlers: statistics, chart data and file exports.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;
use std::collections::BTreeMap;

use crate::reporting::{
    build_dashboard_charts, compute_dashboard_stats, export, ChartData, DashboardStats,
};
use crate::services::metrics::DASHBOARD_EXPORTS_TOTAL;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Point-in-time dashboard statistics.
pub async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = compute_dashboard_stats(&state.db).await?;
    Ok(Json(stats))
}

/// Chart series for the dashboard, keyed by chart identifier. Charts with no
/// underlying data are simply absent.
pub async fn dashboard_charts(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<&'static str, ChartData>>, AppError> {
    let charts = build_dashboard_charts(&state.db).await?;
    Ok(Json(charts))
}

/// Export the dashboard as a downloadable file.
pub async fn export_dashboard(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = query.format.as_deref().unwrap_or("pdf").to_lowercase();

    let stats = compute_dashboard_stats(&state.db).await?;
    let charts = build_dashboard_charts(&state.db).await?;

    let (bytes, content_type, filename) = match format.as_str() {
        "csv" => (
            export::build_csv_report(&stats, &charts)?,
            "text/csv; charset=utf-8",
            "dashboard-report.csv",
        ),
        "pdf" => {
            let bytes = export::build_pdf_report(&stats, &charts).inspect_err(|_| {
                DASHBOARD_EXPORTS_TOTAL
                    .with_label_values(&["pdf", "unavailable"])
                    .inc();
            })?;
            (bytes, "application/pdf", "dashboard-report.pdf")
        }
        other => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unsupported export format '{}'",
                other
            )))
        }
    };

    DASHBOARD_EXPORTS_TOTAL
        .with_label_values(&[format.as_str(), "ok"])
        .inc();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
