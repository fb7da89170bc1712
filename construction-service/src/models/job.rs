//! Job model: scheduled building work for a customer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::Confirmed => "CONFIRMED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(JobStatus::Scheduled),
            "CONFIRMED" => Some(JobStatus::Confirmed),
            "IN_PROGRESS" => Some(JobStatus::InProgress),
            "COMPLETED" => Some(JobStatus::Completed),
            "CANCELLED" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

/// Job row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub job_id: Uuid,
    pub estimate_id: Uuid,
    pub customer_id: Uuid,
    pub job_title: String,
    pub description: String,
    pub scheduled_start_date: NaiveDate,
    pub scheduled_end_date: NaiveDate,
    pub actual_start_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub status: String,
    pub confirmation_date: Option<NaiveDate>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter parameters for listing jobs.
#[derive(Debug, Clone, Default)]
pub struct ListJobsFilter {
    pub status: Option<JobStatus>,
    pub customer_id: Option<Uuid>,
    pub limit: i32,
}

/// Input for creating a job from an accepted estimate.
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub estimate_id: Uuid,
    pub customer_id: Uuid,
    pub job_title: String,
    pub description: String,
    pub scheduled_start_date: NaiveDate,
    pub scheduled_end_date: NaiveDate,
    pub worker_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

/// Input for updating a job (partial).
#[derive(Debug, Clone, Default)]
pub struct UpdateJob {
    pub job_title: Option<String>,
    pub description: Option<String>,
    pub scheduled_start_date: Option<NaiveDate>,
    pub scheduled_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub worker_ids: Option<Vec<Uuid>>,
}
