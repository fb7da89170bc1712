//! Worker model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Skilled trade a worker is hired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerType {
    Bricklayer,
    Carpenter,
    Plumber,
    Electrician,
    Painter,
    General,
}

impl WorkerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerType::Bricklayer => "BRICKLAYER",
            WorkerType::Carpenter => "CARPENTER",
            WorkerType::Plumber => "PLUMBER",
            WorkerType::Electrician => "ELECTRICIAN",
            WorkerType::Painter => "PAINTER",
            WorkerType::General => "GENERAL",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "BRICKLAYER" => Some(WorkerType::Bricklayer),
            "CARPENTER" => Some(WorkerType::Carpenter),
            "PLUMBER" => Some(WorkerType::Plumber),
            "ELECTRICIAN" => Some(WorkerType::Electrician),
            "PAINTER" => Some(WorkerType::Painter),
            "GENERAL" => Some(WorkerType::General),
            _ => None,
        }
    }
}

/// Worker row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Worker {
    pub worker_id: Uuid,
    pub full_name: String,
    pub worker_type: String,
    pub phone: String,
    pub hourly_rate: Decimal,
    pub experience_years: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a worker.
#[derive(Debug, Clone)]
pub struct CreateWorker {
    pub full_name: String,
    pub worker_type: WorkerType,
    pub phone: String,
    pub hourly_rate: Decimal,
    pub experience_years: i32,
    pub is_available: bool,
}

/// Input for updating a worker (partial).
#[derive(Debug, Clone, Default)]
pub struct UpdateWorker {
    pub full_name: Option<String>,
    pub worker_type: Option<WorkerType>,
    pub phone: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub experience_years: Option<i32>,
    pub is_available: Option<bool>,
}
