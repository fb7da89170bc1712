//! Material model: building materials ordered for a job.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Material row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Material {
    pub material_id: Uuid,
    pub job_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_cost: Decimal,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub actual_delivery_date: Option<NaiveDate>,
    pub is_delivered: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// Total spend for this line: quantity times unit cost, derived on read.
    pub fn total_cost(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// Input for creating a material.
#[derive(Debug, Clone)]
pub struct CreateMaterial {
    pub job_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_cost: Decimal,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Input for updating a material (partial).
#[derive(Debug, Clone, Default)]
pub struct UpdateMaterial {
    pub supplier_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub actual_delivery_date: Option<NaiveDate>,
    pub is_delivered: Option<bool>,
    pub notes: Option<String>,
}
