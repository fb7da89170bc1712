//! Job handlers, including the scheduling lifecycle actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::DEFAULT_LIMIT;
use crate::models::{CreateJob, Job, JobStatus, ListJobsFilter, UpdateJob, Worker};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    pub estimate_id: Uuid,
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub job_title: String,
    pub description: String,
    pub scheduled_start_date: NaiveDate,
    pub scheduled_end_date: NaiveDate,
    #[serde(default)]
    pub worker_ids: Vec<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, max = 200))]
    pub job_title: Option<String>,
    pub description: Option<String>,
    pub scheduled_start_date: Option<NaiveDate>,
    pub scheduled_end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub worker_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub limit: Option<i32>,
}

/// A job together with its assigned workers.
#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    #[serde(flatten)]
    pub job: Job,
    pub workers: Vec<Worker>,
}

fn parse_status(value: &str) -> Result<JobStatus, AppError> {
    JobStatus::from_string(value)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown job status '{}'", value)))
}

fn check_schedule(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Scheduled end date cannot precede the start date"
        )));
    }
    Ok(())
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    payload.validate()?;
    check_schedule(payload.scheduled_start_date, payload.scheduled_end_date)?;

    let job = state
        .db
        .create_job(&CreateJob {
            estimate_id: payload.estimate_id,
            customer_id: payload.customer_id,
            job_title: payload.job_title,
            description: payload.description,
            scheduled_start_date: payload.scheduled_start_date,
            scheduled_end_date: payload.scheduled_end_date,
            worker_ids: payload.worker_ids,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let jobs = state
        .db
        .list_jobs(&ListJobsFilter {
            status,
            customer_id: query.customer_id,
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        })
        .await?;
    Ok(Json(jobs))
}

/// Scheduled or confirmed jobs starting today or later.
pub async fn upcoming_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = state
        .db
        .list_upcoming_jobs(Utc::now().date_naive())
        .await?;
    Ok(Json(jobs))
}

/// Jobs currently on site.
pub async fn in_progress_jobs(State(state): State<AppState>) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = state
        .db
        .list_jobs(&ListJobsFilter {
            status: Some(JobStatus::InProgress),
            limit: 100,
            ..Default::default()
        })
        .await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job = state
        .db
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    let workers = state.db.get_job_workers(job_id).await?;
    Ok(Json(JobDetailResponse { job, workers }))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<Job>, AppError> {
    payload.validate()?;

    let job = state
        .db
        .update_job(
            job_id,
            &UpdateJob {
                job_title: payload.job_title,
                description: payload.description,
                scheduled_start_date: payload.scheduled_start_date,
                scheduled_end_date: payload.scheduled_end_date,
                notes: payload.notes,
                worker_ids: payload.worker_ids,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    Ok(Json(job))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_job(job_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Job not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Customer confirmed the start date.
pub async fn confirm_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .db
        .confirm_job(job_id, Utc::now().date_naive())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    Ok(Json(job))
}

/// Work began on site.
pub async fn start_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .db
        .start_job(job_id, Utc::now().date_naive())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    Ok(Json(job))
}

/// Call off a job that has not finished.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .db
        .cancel_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    Ok(Json(job))
}

/// Work finished; the job becomes eligible for invoicing.
pub async fn complete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .db
        .complete_job(job_id, Utc::now().date_naive())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;
    Ok(Json(job))
}
