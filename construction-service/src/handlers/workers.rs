//! Worker handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::validate_non_negative;
use crate::models::{CreateWorker, UpdateWorker, Worker, WorkerType};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkerRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub worker_type: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[validate(custom(function = validate_non_negative))]
    pub hourly_rate: Decimal,
    #[validate(range(min = 0))]
    pub experience_years: i32,
    pub is_available: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWorkerRequest {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    pub worker_type: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub phone: Option<String>,
    #[validate(custom(function = validate_non_negative))]
    pub hourly_rate: Option<Decimal>,
    #[validate(range(min = 0))]
    pub experience_years: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListWorkersQuery {
    pub worker_type: Option<String>,
}

fn parse_worker_type(value: &str) -> Result<WorkerType, AppError> {
    WorkerType::from_string(value)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown worker type '{}'", value)))
}

pub async fn create_worker(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkerRequest>,
) -> Result<(StatusCode, Json<Worker>), AppError> {
    payload.validate()?;
    let worker_type = parse_worker_type(&payload.worker_type)?;

    let worker = state
        .db
        .create_worker(&CreateWorker {
            full_name: payload.full_name,
            worker_type,
            phone: payload.phone,
            hourly_rate: payload.hourly_rate,
            experience_years: payload.experience_years,
            is_available: payload.is_available.unwrap_or(true),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(worker)))
}

pub async fn list_workers(
    State(state): State<AppState>,
    Query(query): Query<ListWorkersQuery>,
) -> Result<Json<Vec<Worker>>, AppError> {
    let worker_type = query
        .worker_type
        .as_deref()
        .map(parse_worker_type)
        .transpose()?;
    let workers = state.db.list_workers(worker_type, false).await?;
    Ok(Json(workers))
}

/// Workers currently available for assignment.
pub async fn available_workers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Worker>>, AppError> {
    let workers = state.db.list_workers(None, true).await?;
    Ok(Json(workers))
}

pub async fn get_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<Uuid>,
) -> Result<Json<Worker>, AppError> {
    let worker = state
        .db
        .get_worker(worker_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Worker not found")))?;
    Ok(Json(worker))
}

pub async fn update_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<Uuid>,
    Json(payload): Json<UpdateWorkerRequest>,
) -> Result<Json<Worker>, AppError> {
    payload.validate()?;
    let worker_type = payload
        .worker_type
        .as_deref()
        .map(parse_worker_type)
        .transpose()?;

    let worker = state
        .db
        .update_worker(
            worker_id,
            &UpdateWorker {
                full_name: payload.full_name,
                worker_type,
                phone: payload.phone,
                hourly_rate: payload.hourly_rate,
                experience_years: payload.experience_years,
                is_available: payload.is_available,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Worker not found")))?;
    Ok(Json(worker))
}

pub async fn delete_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_worker(worker_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Worker not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
