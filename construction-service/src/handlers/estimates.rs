//! Estimate handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::{validate_non_negative, DEFAULT_LIMIT};
use crate::models::{CreateEstimate, Estimate, EstimateStatus, UpdateEstimate};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEstimateRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1))]
    pub work_description: String,
    #[validate(custom(function = validate_non_negative))]
    pub estimated_cost: Decimal,
    #[validate(range(min = 1))]
    pub estimated_duration_days: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEstimateRequest {
    #[validate(length(min = 1))]
    pub work_description: Option<String>,
    pub property_visit_date: Option<NaiveDate>,
    pub detailed_work_description: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub estimated_cost: Option<Decimal>,
    #[validate(range(min = 1))]
    pub estimated_duration_days: Option<i32>,
    pub status: Option<String>,
    pub estimate_sent_date: Option<NaiveDate>,
    pub response_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListEstimatesQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub limit: Option<i32>,
}

fn parse_status(value: &str) -> Result<EstimateStatus, AppError> {
    EstimateStatus::from_string(value)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown estimate status '{}'", value)))
}

pub async fn create_estimate(
    State(state): State<AppState>,
    Json(payload): Json<CreateEstimateRequest>,
) -> Result<(StatusCode, Json<Estimate>), AppError> {
    payload.validate()?;

    let estimate = state
        .db
        .create_estimate(&CreateEstimate {
            customer_id: payload.customer_id,
            work_description: payload.work_description,
            estimated_cost: payload.estimated_cost,
            estimated_duration_days: payload.estimated_duration_days,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(estimate)))
}

pub async fn list_estimates(
    State(state): State<AppState>,
    Query(query): Query<ListEstimatesQuery>,
) -> Result<Json<Vec<Estimate>>, AppError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let estimates = state
        .db
        .list_estimates(status, query.customer_id, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(estimates))
}

/// Estimates still waiting for a property visit.
pub async fn pending_visit_estimates(
    State(state): State<AppState>,
) -> Result<Json<Vec<Estimate>>, AppError> {
    let estimates = state
        .db
        .list_estimates(Some(EstimateStatus::Pending), None, 100)
        .await?;
    Ok(Json(estimates))
}

/// Accepted estimates ready for job scheduling.
pub async fn accepted_estimates(
    State(state): State<AppState>,
) -> Result<Json<Vec<Estimate>>, AppError> {
    let estimates = state
        .db
        .list_estimates(Some(EstimateStatus::Accepted), None, 100)
        .await?;
    Ok(Json(estimates))
}

pub async fn get_estimate(
    State(state): State<AppState>,
    Path(estimate_id): Path<Uuid>,
) -> Result<Json<Estimate>, AppError> {
    let estimate = state
        .db
        .get_estimate(estimate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Estimate not found")))?;
    Ok(Json(estimate))
}

pub async fn update_estimate(
    State(state): State<AppState>,
    Path(estimate_id): Path<Uuid>,
    Json(payload): Json<UpdateEstimateRequest>,
) -> Result<Json<Estimate>, AppError> {
    payload.validate()?;
    let status = payload.status.as_deref().map(parse_status).transpose()?;

    let estimate = state
        .db
        .update_estimate(
            estimate_id,
            &UpdateEstimate {
                work_description: payload.work_description,
                property_visit_date: payload.property_visit_date,
                detailed_work_description: payload.detailed_work_description,
                estimated_cost: payload.estimated_cost,
                estimated_duration_days: payload.estimated_duration_days,
                status,
                estimate_sent_date: payload.estimate_sent_date,
                response_date: payload.response_date,
                notes: payload.notes,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Estimate not found")))?;
    Ok(Json(estimate))
}

pub async fn delete_estimate(
    State(state): State<AppState>,
    Path(estimate_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_estimate(estimate_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Estimate not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
