//! Dashboard statistics: one point-in-time aggregation pass.

use crate::models::{Invoice, InvoiceStatus, Job};
use crate::reporting::WorkerCounts;
use crate::services::Database;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;

/// Size of the merged recent-activity feed.
pub const ACTIVITY_FEED_LIMIT: usize = 6;

/// One entry in the recent-activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub entity: String,
    pub title: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Dashboard statistics record handed to views and exports.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub active_jobs: i64,
    pub scheduled_jobs: i64,
    pub completed_jobs: i64,
    pub pending_estimates: i64,
    pub accepted_estimates: i64,
    pub paid_invoices: i64,
    pub overdue_invoices: i64,
    pub total_revenue: Decimal,
    pub pending_revenue: Decimal,
    pub worker_availability: f64,
    pub worker_counts: WorkerCounts,
    pub material_spend: Decimal,
    pub average_job_duration: i64,
    pub customer_satisfaction: f64,
    pub recent_activity: Vec<ActivityItem>,
    pub last_updated: DateTime<Utc>,
}

fn count_for(counts: &[crate::reporting::StatusCount], status: &str) -> i64 {
    counts
        .iter()
        .find(|c| c.status == status)
        .map(|c| c.total)
        .unwrap_or(0)
}

fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let pct = part as f64 / whole as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Merge the most recently touched jobs and invoices into one feed, newest
/// first, truncated to [`ACTIVITY_FEED_LIMIT`] entries.
pub fn merge_recent_activity(jobs: &[Job], invoices: &[Invoice]) -> Vec<ActivityItem> {
    let mut feed: Vec<ActivityItem> = jobs
        .iter()
        .map(|job| ActivityItem {
            entity: "Job".to_string(),
            title: job.job_title.clone(),
            status: job.status.clone(),
            timestamp: job.updated_at,
        })
        .chain(invoices.iter().map(|invoice| ActivityItem {
            entity: "Invoice".to_string(),
            title: invoice.invoice_number.clone(),
            status: invoice.status.clone(),
            timestamp: invoice.updated_at,
        }))
        .collect();
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(ACTIVITY_FEED_LIMIT);
    feed
}

/// Compute the dashboard statistics snapshot.
///
/// Each query sees its own consistent state; the snapshot as a whole is
/// eventually consistent, which is acceptable for one dashboard render.
pub async fn compute_dashboard_stats(db: &Database) -> Result<DashboardStats, AppError> {
    let today = Utc::now().date_naive();

    let job_counts = db.count_jobs_by_status().await?;
    let estimate_counts = db.count_estimates_by_status().await?;

    let active_jobs = count_for(&job_counts, "IN_PROGRESS");
    let scheduled_jobs = count_for(&job_counts, "SCHEDULED") + count_for(&job_counts, "CONFIRMED");
    let completed_jobs = count_for(&job_counts, "COMPLETED");
    let total_jobs: i64 = job_counts.iter().map(|c| c.total).sum();

    let paid = db
        .list_invoices_with_statuses(&[InvoiceStatus::Paid])
        .await?;
    let total_revenue: Decimal = paid.iter().map(|invoice| invoice.total_amount()).sum();

    let unsettled = db.list_unsettled_invoices().await?;
    let pending_revenue: Decimal = unsettled
        .iter()
        .map(|invoice| invoice.total_amount() - invoice.amount_paid)
        .sum();
    let overdue_invoices = unsettled
        .iter()
        .filter(|invoice| invoice.is_overdue(today))
        .count() as i64;

    let worker_counts = db.worker_counts().await?;
    let material_spend = db.material_spend().await?;
    let average_job_duration = db.average_job_duration_days().await?;

    let recent_jobs = db.recent_jobs(5).await?;
    let recent_invoices = db.recent_invoices(5).await?;

    Ok(DashboardStats {
        active_jobs,
        scheduled_jobs,
        completed_jobs,
        pending_estimates: count_for(&estimate_counts, "PENDING"),
        accepted_estimates: count_for(&estimate_counts, "ACCEPTED"),
        paid_invoices: paid.len() as i64,
        overdue_invoices,
        total_revenue,
        pending_revenue,
        worker_availability: percentage(worker_counts.available, worker_counts.total),
        worker_counts,
        material_spend,
        average_job_duration,
        customer_satisfaction: percentage(completed_jobs, total_jobs),
        recent_activity: merge_recent_activity(&recent_jobs, &recent_invoices),
        last_updated: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    fn job_at(title: &str, minutes_ago: i64) -> Job {
        let now = Utc::now();
        Job {
            job_id: Uuid::new_v4(),
            estimate_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            job_title: title.to_string(),
            description: String::new(),
            scheduled_start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            scheduled_end_date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            actual_start_date: None,
            actual_end_date: None,
            status: "SCHEDULED".to_string(),
            confirmation_date: None,
            notes: String::new(),
            created_at: now,
            updated_at: now - Duration::minutes(minutes_ago),
        }
    }

    fn invoice_at(number: &str, minutes_ago: i64) -> Invoice {
        let now = Utc::now();
        Invoice {
            invoice_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            invoice_number: number.to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            labor_cost: Decimal::ZERO,
            material_cost: Decimal::ZERO,
            additional_costs: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            status: "SENT".to_string(),
            amount_paid: Decimal::ZERO,
            notes: String::new(),
            created_at: now,
            updated_at: now - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn activity_feed_merges_newest_first_and_truncates() {
        let jobs: Vec<Job> = (0..5).map(|i| job_at(&format!("Job {}", i), i * 10)).collect();
        let invoices: Vec<Invoice> = (0..5)
            .map(|i| invoice_at(&format!("INV-{:05}", i + 1), i * 10 + 5))
            .collect();

        let feed = merge_recent_activity(&jobs, &invoices);

        assert_eq!(feed.len(), ACTIVITY_FEED_LIMIT);
        assert!(feed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        // Jobs and invoices interleave by recency: job 0, invoice 0, job 1, ...
        assert_eq!(feed[0].entity, "Job");
        assert_eq!(feed[0].title, "Job 0");
        assert_eq!(feed[1].entity, "Invoice");
        assert_eq!(feed[1].title, "INV-00001");
    }

    #[test]
    fn activity_feed_handles_empty_inputs() {
        assert!(merge_recent_activity(&[], &[]).is_empty());

        let jobs = vec![job_at("Only job", 0)];
        let feed = merge_recent_activity(&jobs, &[]);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].entity, "Job");
    }

    #[test]
    fn percentage_rounds_to_two_decimals_and_guards_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(3, 3), 100.0);
    }
}
