//! Estimate model: the quoting stage before a job is scheduled.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estimate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimateStatus {
    Pending,
    Visited,
    Sent,
    Accepted,
    Rejected,
}

impl EstimateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateStatus::Pending => "PENDING",
            EstimateStatus::Visited => "VISITED",
            EstimateStatus::Sent => "SENT",
            EstimateStatus::Accepted => "ACCEPTED",
            EstimateStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(EstimateStatus::Pending),
            "VISITED" => Some(EstimateStatus::Visited),
            "SENT" => Some(EstimateStatus::Sent),
            "ACCEPTED" => Some(EstimateStatus::Accepted),
            "REJECTED" => Some(EstimateStatus::Rejected),
            _ => None,
        }
    }
}

/// Estimate row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Estimate {
    pub estimate_id: Uuid,
    pub customer_id: Uuid,
    pub work_description: String,
    pub property_visit_date: Option<NaiveDate>,
    pub detailed_work_description: String,
    pub estimated_cost: Decimal,
    pub estimated_duration_days: i32,
    pub status: String,
    pub estimate_sent_date: Option<NaiveDate>,
    pub response_date: Option<NaiveDate>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an estimate.
#[derive(Debug, Clone)]
pub struct CreateEstimate {
    pub customer_id: Uuid,
    pub work_description: String,
    pub estimated_cost: Decimal,
    pub estimated_duration_days: i32,
    pub notes: Option<String>,
}

/// Input for updating an estimate (partial).
#[derive(Debug, Clone, Default)]
pub struct UpdateEstimate {
    pub work_description: Option<String>,
    pub property_visit_date: Option<NaiveDate>,
    pub detailed_work_description: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub estimated_duration_days: Option<i32>,
    pub status: Option<EstimateStatus>,
    pub estimate_sent_date: Option<NaiveDate>,
    pub response_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
