//! Chart-data builders for the dashboard.
//!
//! Each builder is a pure function from an aggregate snapshot to a labeled
//! series. An empty dataset yields `None` rather than an empty placeholder.
//! Rendering is the consumer's concern.

use crate::models::{Invoice, Job, Material, Worker};
use crate::reporting::{CustomerCompletion, StatusCount, WorkerProductivity};
use crate::services::Database;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;
use std::collections::BTreeMap;

/// How far back the revenue trend looks.
const REVENUE_TREND_DAYS: i64 = 180;
/// Months covered by the completion-rate time series.
const COMPLETION_TREND_MONTHS: u32 = 12;
/// Assumed billable hours per completed job for the earnings series.
const HOURS_PER_COMPLETED_JOB: f64 = 8.0;

/// Shape of a chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    HorizontalBar,
    Line,
}

/// One named series of values aligned with the chart labels.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// A labeled series ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub key: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    fn single(
        key: &'static str,
        title: &'static str,
        kind: ChartKind,
        labels: Vec<String>,
        values: Vec<f64>,
    ) -> Self {
        ChartData {
            key,
            title,
            kind,
            labels,
            series: vec![ChartSeries {
                name: title.to_string(),
                values,
            }],
        }
    }
}

fn display_label(code: &str) -> String {
    let mut label = String::with_capacity(code.len());
    for (i, part) in code.split('_').enumerate() {
        if i > 0 {
            label.push(' ');
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            label.push(first);
            label.extend(chars.flat_map(|c| c.to_lowercase()));
        }
    }
    label
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Trailing month sequence ending with the month of `today`, oldest first.
fn month_sequence(today: NaiveDate, count: u32) -> Vec<(i32, u32)> {
    let mut months = Vec::with_capacity(count as usize);
    let mut year = today.year();
    let mut month = today.month();
    for _ in 0..count {
        months.push((year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}

fn month_label(year: i32, month: u32) -> String {
    const NAMES: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    format!("{} {}", NAMES[(month - 1) as usize], year)
}

/// Job status distribution.
pub fn chart_job_status(counts: &[StatusCount]) -> Option<ChartData> {
    if counts.is_empty() {
        return None;
    }
    Some(ChartData::single(
        "job_status",
        "Job Status Distribution",
        ChartKind::Pie,
        counts.iter().map(|c| display_label(&c.status)).collect(),
        counts.iter().map(|c| c.total as f64).collect(),
    ))
}

/// Invoice status distribution.
pub fn chart_invoice_status(counts: &[StatusCount]) -> Option<ChartData> {
    if counts.is_empty() {
        return None;
    }
    Some(ChartData::single(
        "invoice_status",
        "Invoice Status Distribution",
        ChartKind::Bar,
        counts.iter().map(|c| display_label(&c.status)).collect(),
        counts.iter().map(|c| c.total as f64).collect(),
    ))
}

/// Monthly invoiced totals over the trailing six months.
pub fn chart_revenue_trend(invoices: &[Invoice]) -> Option<ChartData> {
    if invoices.is_empty() {
        return None;
    }
    // BTreeMap keeps months in calendar order; input is already date-sorted.
    let mut monthly: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for invoice in invoices {
        let key = (invoice.invoice_date.year(), invoice.invoice_date.month());
        *monthly.entry(key).or_insert(Decimal::ZERO) += invoice.total_amount();
    }
    let labels = monthly.keys().map(|(y, m)| month_label(*y, *m)).collect();
    let values = monthly.values().map(|v| decimal_to_f64(*v)).collect();
    Some(ChartData::single(
        "revenue_trend",
        "Revenue Trend (6 Months)",
        ChartKind::Line,
        labels,
        values,
    ))
}

/// Top materials ranked by total spend.
pub fn chart_top_materials(materials: &[Material]) -> Option<ChartData> {
    if materials.is_empty() {
        return None;
    }
    Some(ChartData::single(
        "materials_cost",
        "Top Materials by Cost",
        ChartKind::HorizontalBar,
        materials.iter().map(|m| m.name.clone()).collect(),
        materials
            .iter()
            .map(|m| decimal_to_f64(m.total_cost()))
            .collect(),
    ))
}

/// Worker head count per trade.
pub fn chart_worker_distribution(workers: &[Worker]) -> Option<ChartData> {
    if workers.is_empty() {
        return None;
    }
    let mut by_type: BTreeMap<&str, i64> = BTreeMap::new();
    for worker in workers {
        *by_type.entry(worker.worker_type.as_str()).or_insert(0) += 1;
    }
    Some(ChartData::single(
        "worker_distribution",
        "Worker Type Distribution",
        ChartKind::Pie,
        by_type.keys().map(|t| display_label(t)).collect(),
        by_type.values().map(|v| *v as f64).collect(),
    ))
}

/// Combined hourly rates per trade.
pub fn chart_worker_cost_breakdown(workers: &[Worker]) -> Option<ChartData> {
    if workers.is_empty() {
        return None;
    }
    let mut by_type: BTreeMap<&str, Decimal> = BTreeMap::new();
    for worker in workers {
        *by_type
            .entry(worker.worker_type.as_str())
            .or_insert(Decimal::ZERO) += worker.hourly_rate;
    }
    Some(ChartData::single(
        "worker_costs",
        "Cost Breakdown by Worker Type",
        ChartKind::Bar,
        by_type.keys().map(|t| display_label(t)).collect(),
        by_type.values().map(|v| decimal_to_f64(*v)).collect(),
    ))
}

/// Completed and scheduled jobs per worker, with derived earnings.
pub fn chart_worker_productivity(rows: &[WorkerProductivity]) -> Option<ChartData> {
    let mut active: Vec<&WorkerProductivity> = rows
        .iter()
        .filter(|r| r.completed_jobs > 0 || r.scheduled_jobs > 0)
        .collect();
    if active.is_empty() {
        return None;
    }
    active.sort_by(|a, b| b.completed_jobs.cmp(&a.completed_jobs));
    active.truncate(8);

    let labels = active.iter().map(|r| r.full_name.clone()).collect();
    let completed: Vec<f64> = active.iter().map(|r| r.completed_jobs as f64).collect();
    let scheduled: Vec<f64> = active.iter().map(|r| r.scheduled_jobs as f64).collect();
    let earnings: Vec<f64> = active
        .iter()
        .map(|r| decimal_to_f64(r.hourly_rate) * r.completed_jobs as f64 * HOURS_PER_COMPLETED_JOB)
        .collect();

    Some(ChartData {
        key: "worker_productivity",
        title: "Worker Productivity Metrics",
        kind: ChartKind::Bar,
        labels,
        series: vec![
            ChartSeries {
                name: "Completed".to_string(),
                values: completed,
            },
            ChartSeries {
                name: "Scheduled".to_string(),
                values: scheduled,
            },
            ChartSeries {
                name: "Earnings".to_string(),
                values: earnings,
            },
        ],
    })
}

/// Jobs completed per month over the trailing year.
pub fn chart_monthly_completion(completed_jobs: &[Job], today: NaiveDate) -> Option<ChartData> {
    let months = month_sequence(today, COMPLETION_TREND_MONTHS);
    let mut totals: Vec<f64> = vec![0.0; months.len()];
    for job in completed_jobs {
        let Some(end) = job.actual_end_date else {
            continue;
        };
        if let Some(idx) = months
            .iter()
            .position(|(y, m)| *y == end.year() && *m == end.month())
        {
            totals[idx] += 1.0;
        }
    }
    if totals.iter().all(|t| *t == 0.0) {
        return None;
    }
    Some(ChartData::single(
        "monthly_completion",
        "Monthly Job Completion Rate",
        ChartKind::Line,
        months.iter().map(|(y, m)| month_label(*y, *m)).collect(),
        totals,
    ))
}

/// Completion rate per customer, best first.
pub fn chart_customer_completion(rows: &[CustomerCompletion]) -> Option<ChartData> {
    if rows.is_empty() {
        return None;
    }
    let top: Vec<&CustomerCompletion> = rows.iter().take(8).collect();
    Some(ChartData::single(
        "customer_completion",
        "Customer Completion Rates",
        ChartKind::Bar,
        top.iter().map(|r| r.customer_name.clone()).collect(),
        top.iter()
            .map(|r| {
                if r.total_jobs == 0 {
                    0.0
                } else {
                    (r.completed_jobs as f64 / r.total_jobs as f64 * 10000.0).round() / 100.0
                }
            })
            .collect(),
    ))
}

/// Fetch the chart inputs and run every builder, keyed by chart key.
/// Builders with nothing to show are absent from the result.
pub async fn build_dashboard_charts(
    db: &Database,
) -> Result<BTreeMap<&'static str, ChartData>, AppError> {
    let today = Utc::now().date_naive();

    let job_counts = db.count_jobs_by_status().await?;
    let invoice_counts = db.count_invoices_by_status().await?;
    let trend_invoices = db
        .list_invoices_since(today - Duration::days(REVENUE_TREND_DAYS))
        .await?;
    let top_materials = db.top_materials_by_cost(10).await?;
    let workers = db.list_workers(None, false).await?;
    let productivity = db.worker_productivity().await?;
    let trend_start = {
        let (year, month) = month_sequence(today, COMPLETION_TREND_MONTHS)[0];
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
    };
    let completed_jobs = db.completed_jobs_since(trend_start).await?;
    let completion = db.customer_completion().await?;

    let charts = [
        chart_job_status(&job_counts),
        chart_invoice_status(&invoice_counts),
        chart_revenue_trend(&trend_invoices),
        chart_top_materials(&top_materials),
        chart_worker_cost_breakdown(&workers),
        chart_worker_distribution(&workers),
        chart_worker_productivity(&productivity),
        chart_monthly_completion(&completed_jobs, today),
        chart_customer_completion(&completion),
    ];

    Ok(charts
        .into_iter()
        .flatten()
        .map(|chart| (chart.key, chart))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_count(status: &str, total: i64) -> StatusCount {
        StatusCount {
            status: status.to_string(),
            total,
        }
    }

    #[test]
    fn empty_datasets_yield_no_chart() {
        assert!(chart_job_status(&[]).is_none());
        assert!(chart_invoice_status(&[]).is_none());
        assert!(chart_revenue_trend(&[]).is_none());
        assert!(chart_top_materials(&[]).is_none());
        assert!(chart_worker_distribution(&[]).is_none());
        assert!(chart_worker_cost_breakdown(&[]).is_none());
        assert!(chart_worker_productivity(&[]).is_none());
        assert!(chart_customer_completion(&[]).is_none());

        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert!(chart_monthly_completion(&[], today).is_none());
    }

    #[test]
    fn job_status_chart_uses_display_labels() {
        let counts = [status_count("IN_PROGRESS", 3), status_count("SCHEDULED", 2)];
        let chart = chart_job_status(&counts).unwrap();
        assert_eq!(chart.kind, ChartKind::Pie);
        assert_eq!(chart.labels, vec!["In Progress", "Scheduled"]);
        assert_eq!(chart.series[0].values, vec![3.0, 2.0]);
    }

    #[test]
    fn month_sequence_is_oldest_first_and_wraps_years() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let months = month_sequence(today, 4);
        assert_eq!(months, vec![(2024, 11), (2024, 12), (2025, 1), (2025, 2)]);
    }

    #[test]
    fn productivity_chart_skips_idle_workers_and_ranks_by_completions() {
        let rows = vec![
            WorkerProductivity {
                worker_id: uuid::Uuid::new_v4(),
                full_name: "Idle".to_string(),
                hourly_rate: Decimal::new(2500, 2),
                completed_jobs: 0,
                scheduled_jobs: 0,
            },
            WorkerProductivity {
                worker_id: uuid::Uuid::new_v4(),
                full_name: "Busy".to_string(),
                hourly_rate: Decimal::new(5000, 2),
                completed_jobs: 4,
                scheduled_jobs: 1,
            },
            WorkerProductivity {
                worker_id: uuid::Uuid::new_v4(),
                full_name: "Steady".to_string(),
                hourly_rate: Decimal::new(3000, 2),
                completed_jobs: 2,
                scheduled_jobs: 3,
            },
        ];

        let chart = chart_worker_productivity(&rows).unwrap();
        assert_eq!(chart.labels, vec!["Busy", "Steady"]);
        assert_eq!(chart.series.len(), 3);
        // 4 completed jobs at 50.00/h for 8h each
        assert_eq!(chart.series[2].values[0], 1600.0);
    }

    #[test]
    fn customer_completion_rounds_percentages() {
        let rows = vec![CustomerCompletion {
            customer_id: uuid::Uuid::new_v4(),
            customer_name: "A Customer".to_string(),
            total_jobs: 3,
            completed_jobs: 1,
        }];
        let chart = chart_customer_completion(&rows).unwrap();
        assert_eq!(chart.series[0].values, vec![33.33]);
    }
}
