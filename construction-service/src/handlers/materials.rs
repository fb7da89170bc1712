//! Material handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{validate_non_negative, DEFAULT_LIMIT};
use crate::models::{CreateMaterial, Material, UpdateMaterial};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    pub job_id: Uuid,
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 50))]
    pub unit: String,
    #[validate(custom(function = validate_non_negative))]
    pub unit_cost: Decimal,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMaterialRequest {
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub quantity: Option<Decimal>,
    #[validate(length(min = 1, max = 50))]
    pub unit: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub unit_cost: Option<Decimal>,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub actual_delivery_date: Option<NaiveDate>,
    pub is_delivered: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListMaterialsQuery {
    pub job_id: Option<Uuid>,
    pub limit: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct TopMaterialsQuery {
    pub limit: Option<i32>,
}

/// Material plus its derived total cost, for ranked listings.
#[derive(Debug, Serialize)]
pub struct MaterialWithCost {
    #[serde(flatten)]
    pub material: Material,
    pub total_cost: Decimal,
}

impl From<Material> for MaterialWithCost {
    fn from(material: Material) -> Self {
        let total_cost = material.total_cost();
        MaterialWithCost {
            material,
            total_cost,
        }
    }
}

pub async fn create_material(
    State(state): State<AppState>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<(StatusCode, Json<Material>), AppError> {
    payload.validate()?;

    let material = state
        .db
        .create_material(&CreateMaterial {
            job_id: payload.job_id,
            supplier_id: payload.supplier_id,
            name: payload.name,
            description: payload.description,
            quantity: payload.quantity,
            unit: payload.unit,
            unit_cost: payload.unit_cost,
            order_date: payload.order_date,
            expected_delivery_date: payload.expected_delivery_date,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn list_materials(
    State(state): State<AppState>,
    Query(query): Query<ListMaterialsQuery>,
) -> Result<Json<Vec<Material>>, AppError> {
    let materials = state
        .db
        .list_materials(query.job_id, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(materials))
}

/// Materials ordered but still awaiting delivery.
pub async fn pending_delivery_materials(
    State(state): State<AppState>,
) -> Result<Json<Vec<Material>>, AppError> {
    let materials = state.db.list_pending_delivery_materials().await?;
    Ok(Json(materials))
}

/// Materials ranked by total spend.
pub async fn top_materials_by_cost(
    State(state): State<AppState>,
    Query(query): Query<TopMaterialsQuery>,
) -> Result<Json<Vec<MaterialWithCost>>, AppError> {
    let materials = state
        .db
        .top_materials_by_cost(query.limit.unwrap_or(10))
        .await?;
    Ok(Json(
        materials.into_iter().map(MaterialWithCost::from).collect(),
    ))
}

pub async fn get_material(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
) -> Result<Json<Material>, AppError> {
    let material = state
        .db
        .get_material(material_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Material not found")))?;
    Ok(Json(material))
}

pub async fn update_material(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
    Json(payload): Json<UpdateMaterialRequest>,
) -> Result<Json<Material>, AppError> {
    payload.validate()?;

    let material = state
        .db
        .update_material(
            material_id,
            &UpdateMaterial {
                supplier_id: payload.supplier_id,
                name: payload.name,
                description: payload.description,
                quantity: payload.quantity,
                unit: payload.unit,
                unit_cost: payload.unit_cost,
                order_date: payload.order_date,
                expected_delivery_date: payload.expected_delivery_date,
                actual_delivery_date: payload.actual_delivery_date,
                is_delivered: payload.is_delivered,
                notes: payload.notes,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Material not found")))?;
    Ok(Json(material))
}

pub async fn delete_material(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_material(material_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Material not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
