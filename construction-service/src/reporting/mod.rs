//! Reporting: dashboard aggregation, chart data and export builders.
//!
//! Everything here is read-only over the primary entities; the only mutation
//! reporting ever performs is the overdue-invoice sweep in the data layer.

pub mod charts;
pub mod export;
pub mod stats;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub use charts::{build_dashboard_charts, ChartData, ChartKind, ChartSeries};
pub use stats::{compute_dashboard_stats, ActivityItem, DashboardStats};

/// Status/count pair from a GROUP BY query.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub total: i64,
}

/// Worker head counts.
#[derive(Debug, Clone, Copy, Serialize, FromRow)]
pub struct WorkerCounts {
    pub total: i64,
    pub available: i64,
}

/// Per-worker job counts for the productivity chart.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkerProductivity {
    pub worker_id: Uuid,
    pub full_name: String,
    pub hourly_rate: Decimal,
    pub completed_jobs: i64,
    pub scheduled_jobs: i64,
}

/// Per-customer job completion counts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerCompletion {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub total_jobs: i64,
    pub completed_jobs: i64,
}

/// Per-customer row for the customer report.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerReportRow {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub email: String,
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub total_spent: Decimal,
}
