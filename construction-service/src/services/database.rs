//! Database service for construction-service.

use crate::models::{
    format_invoice_number, CreateCustomer, CreateEstimate, CreateInvoice, CreateJob,
    CreateMaterial, CreatePayment, CreateSupplier, CreateWorker, Customer, Estimate, Invoice,
    InvoiceStatus, Job, JobStatus, ListInvoicesFilter, ListJobsFilter, Material, Payment,
    Supplier, UpdateCustomer, UpdateEstimate, UpdateJob, UpdateMaterial, UpdateSupplier,
    UpdateWorker, Worker, WorkerType, PAYMENT_TERMS_DAYS,
};
use crate::reporting::{
    CustomerCompletion, CustomerReportRow, StatusCount, WorkerCounts, WorkerProductivity,
};
use crate::services::metrics::{DB_QUERY_DURATION, INVOICES_TOTAL, PAYMENTS_TOTAL};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};
use uuid::Uuid;

const INVOICE_COLUMNS: &str = "invoice_id, job_id, customer_id, invoice_number, invoice_date, due_date, \
     labor_cost, material_cost, additional_costs, tax_rate, status, amount_paid, notes, \
     created_at, updated_at";

const JOB_COLUMNS: &str = "job_id, estimate_id, customer_id, job_title, description, \
     scheduled_start_date, scheduled_end_date, actual_start_date, actual_end_date, status, \
     confirmation_date, notes, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "payment_id, invoice_id, amount, payment_method, payment_date, \
     transaction_reference, received_by, notes, created_at, updated_at";

const MATERIAL_COLUMNS: &str = "material_id, job_id, supplier_id, name, description, quantity, unit, \
     unit_cost, order_date, expected_delivery_date, actual_delivery_date, is_delivered, notes, \
     created_at, updated_at";

const ESTIMATE_COLUMNS: &str = "estimate_id, customer_id, work_description, property_visit_date, \
     detailed_work_description, estimated_cost, estimated_duration_days, status, \
     estimate_sent_date, response_date, notes, created_at, updated_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "construction-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .idle_timeout(std::time::Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    /// Create a new customer.
    #[instrument(skip(self, input))]
    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let customer_id = Uuid::new_v4();
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (customer_id, first_name, last_name, email, phone, address, city, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING customer_id, first_name, last_name, email, phone, address, city, postal_code, created_at, updated_at
            "#,
        )
        .bind(customer_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "A customer with email '{}' already exists",
                    input.email
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)),
        })?;

        timer.observe_duration();

        info!(customer_id = %customer.customer_id, "Customer created");

        Ok(customer)
    }

    /// Get a customer by ID.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, first_name, last_name, email, phone, address, city, postal_code, created_at, updated_at
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// List customers, optionally filtered by a search term over name, email and city.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        search: Option<&str>,
        limit: i32,
    ) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let limit = limit.clamp(1, 100) as i64;
        let pattern = search.map(|s| format!("%{}%", s));

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, first_name, last_name, email, phone, address, city, postal_code, created_at, updated_at
            FROM customers
            WHERE $1::varchar IS NULL
               OR first_name ILIKE $1
               OR last_name ILIKE $1
               OR email ILIKE $1
               OR city ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Update a customer.
    #[instrument(skip(self, input), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                city = COALESCE($7, city),
                postal_code = COALESCE($8, postal_code)
            WHERE customer_id = $1
            RETURNING customer_id, first_name, last_name, email, phone, address, city, postal_code, created_at, updated_at
            "#,
        )
        .bind(customer_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.postal_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Another customer already uses that email"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)),
        })?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Delete a customer. Cascades to estimates, jobs and invoices.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Worker Operations
    // -------------------------------------------------------------------------

    /// Create a new worker.
    #[instrument(skip(self, input))]
    pub async fn create_worker(&self, input: &CreateWorker) -> Result<Worker, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_worker"])
            .start_timer();

        let worker_id = Uuid::new_v4();
        let worker = sqlx::query_as::<_, Worker>(
            r#"
            INSERT INTO workers (worker_id, full_name, worker_type, phone, hourly_rate, experience_years, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING worker_id, full_name, worker_type, phone, hourly_rate, experience_years, is_available, created_at, updated_at
            "#,
        )
        .bind(worker_id)
        .bind(&input.full_name)
        .bind(input.worker_type.as_str())
        .bind(&input.phone)
        .bind(input.hourly_rate)
        .bind(input.experience_years)
        .bind(input.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create worker: {}", e)))?;

        timer.observe_duration();

        info!(worker_id = %worker.worker_id, worker_type = %worker.worker_type, "Worker created");

        Ok(worker)
    }

    /// Get a worker by ID.
    #[instrument(skip(self), fields(worker_id = %worker_id))]
    pub async fn get_worker(&self, worker_id: Uuid) -> Result<Option<Worker>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_worker"])
            .start_timer();

        let worker = sqlx::query_as::<_, Worker>(
            r#"
            SELECT worker_id, full_name, worker_type, phone, hourly_rate, experience_years, is_available, created_at, updated_at
            FROM workers
            WHERE worker_id = $1
            "#,
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get worker: {}", e)))?;

        timer.observe_duration();

        Ok(worker)
    }

    /// List workers, optionally restricted to a trade or to available workers only.
    #[instrument(skip(self))]
    pub async fn list_workers(
        &self,
        worker_type: Option<WorkerType>,
        available_only: bool,
    ) -> Result<Vec<Worker>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_workers"])
            .start_timer();

        let type_str = worker_type.map(|t| t.as_str().to_string());

        let workers = sqlx::query_as::<_, Worker>(
            r#"
            SELECT worker_id, full_name, worker_type, phone, hourly_rate, experience_years, is_available, created_at, updated_at
            FROM workers
            WHERE ($1::varchar IS NULL OR worker_type = $1)
              AND ($2::bool = FALSE OR is_available = TRUE)
            ORDER BY worker_type, full_name
            "#,
        )
        .bind(&type_str)
        .bind(available_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list workers: {}", e)))?;

        timer.observe_duration();

        Ok(workers)
    }

    /// Update a worker.
    #[instrument(skip(self, input), fields(worker_id = %worker_id))]
    pub async fn update_worker(
        &self,
        worker_id: Uuid,
        input: &UpdateWorker,
    ) -> Result<Option<Worker>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_worker"])
            .start_timer();

        let type_str = input.worker_type.map(|t| t.as_str().to_string());

        let worker = sqlx::query_as::<_, Worker>(
            r#"
            UPDATE workers
            SET full_name = COALESCE($2, full_name),
                worker_type = COALESCE($3, worker_type),
                phone = COALESCE($4, phone),
                hourly_rate = COALESCE($5, hourly_rate),
                experience_years = COALESCE($6, experience_years),
                is_available = COALESCE($7, is_available)
            WHERE worker_id = $1
            RETURNING worker_id, full_name, worker_type, phone, hourly_rate, experience_years, is_available, created_at, updated_at
            "#,
        )
        .bind(worker_id)
        .bind(&input.full_name)
        .bind(&type_str)
        .bind(&input.phone)
        .bind(input.hourly_rate)
        .bind(input.experience_years)
        .bind(input.is_available)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update worker: {}", e)))?;

        timer.observe_duration();

        Ok(worker)
    }

    /// Delete a worker.
    #[instrument(skip(self), fields(worker_id = %worker_id))]
    pub async fn delete_worker(&self, worker_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_worker"])
            .start_timer();

        let result = sqlx::query("DELETE FROM workers WHERE worker_id = $1")
            .bind(worker_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete worker: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Estimate Operations
    // -------------------------------------------------------------------------

    /// Create a new estimate for a customer.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_estimate(&self, input: &CreateEstimate) -> Result<Estimate, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_estimate"])
            .start_timer();

        let estimate_id = Uuid::new_v4();
        let estimate = sqlx::query_as::<_, Estimate>(&format!(
            r#"
            INSERT INTO estimates (estimate_id, customer_id, work_description, estimated_cost, estimated_duration_days, notes)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, ''))
            RETURNING {ESTIMATE_COLUMNS}
            "#,
        ))
        .bind(estimate_id)
        .bind(input.customer_id)
        .bind(&input.work_description)
        .bind(input.estimated_cost)
        .bind(input.estimated_duration_days)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(anyhow::anyhow!("Unknown customer"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create estimate: {}", e)),
        })?;

        timer.observe_duration();

        info!(estimate_id = %estimate.estimate_id, "Estimate created");

        Ok(estimate)
    }

    /// Get an estimate by ID.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn get_estimate(&self, estimate_id: Uuid) -> Result<Option<Estimate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_estimate"])
            .start_timer();

        let estimate = sqlx::query_as::<_, Estimate>(&format!(
            "SELECT {ESTIMATE_COLUMNS} FROM estimates WHERE estimate_id = $1"
        ))
        .bind(estimate_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get estimate: {}", e)))?;

        timer.observe_duration();

        Ok(estimate)
    }

    /// List estimates, optionally filtered by status and customer.
    #[instrument(skip(self))]
    pub async fn list_estimates(
        &self,
        status: Option<crate::models::EstimateStatus>,
        customer_id: Option<Uuid>,
        limit: i32,
    ) -> Result<Vec<Estimate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_estimates"])
            .start_timer();

        let limit = limit.clamp(1, 100) as i64;
        let status_str = status.map(|s| s.as_str().to_string());

        let estimates = sqlx::query_as::<_, Estimate>(&format!(
            r#"
            SELECT {ESTIMATE_COLUMNS}
            FROM estimates
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        ))
        .bind(&status_str)
        .bind(customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list estimates: {}", e)))?;

        timer.observe_duration();

        Ok(estimates)
    }

    /// Update an estimate.
    #[instrument(skip(self, input), fields(estimate_id = %estimate_id))]
    pub async fn update_estimate(
        &self,
        estimate_id: Uuid,
        input: &UpdateEstimate,
    ) -> Result<Option<Estimate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_estimate"])
            .start_timer();

        let status_str = input.status.map(|s| s.as_str().to_string());

        let estimate = sqlx::query_as::<_, Estimate>(&format!(
            r#"
            UPDATE estimates
            SET work_description = COALESCE($2, work_description),
                property_visit_date = COALESCE($3, property_visit_date),
                detailed_work_description = COALESCE($4, detailed_work_description),
                estimated_cost = COALESCE($5, estimated_cost),
                estimated_duration_days = COALESCE($6, estimated_duration_days),
                status = COALESCE($7, status),
                estimate_sent_date = COALESCE($8, estimate_sent_date),
                response_date = COALESCE($9, response_date),
                notes = COALESCE($10, notes)
            WHERE estimate_id = $1
            RETURNING {ESTIMATE_COLUMNS}
            "#,
        ))
        .bind(estimate_id)
        .bind(&input.work_description)
        .bind(input.property_visit_date)
        .bind(&input.detailed_work_description)
        .bind(input.estimated_cost)
        .bind(input.estimated_duration_days)
        .bind(&status_str)
        .bind(input.estimate_sent_date)
        .bind(input.response_date)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update estimate: {}", e)))?;

        timer.observe_duration();

        Ok(estimate)
    }

    /// Delete an estimate.
    #[instrument(skip(self), fields(estimate_id = %estimate_id))]
    pub async fn delete_estimate(&self, estimate_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_estimate"])
            .start_timer();

        let result = sqlx::query("DELETE FROM estimates WHERE estimate_id = $1")
            .bind(estimate_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete estimate: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Job Operations
    // -------------------------------------------------------------------------

    /// Create a job from an accepted estimate, assigning workers in the same
    /// transaction.
    #[instrument(skip(self, input), fields(estimate_id = %input.estimate_id))]
    pub async fn create_job(&self, input: &CreateJob) -> Result<Job, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_job"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let job_id = Uuid::new_v4();
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (job_id, estimate_id, customer_id, job_title, description,
                scheduled_start_date, scheduled_end_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, ''))
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .bind(input.estimate_id)
        .bind(input.customer_id)
        .bind(&input.job_title)
        .bind(&input.description)
        .bind(input.scheduled_start_date)
        .bind(input.scheduled_end_date)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Estimate already has a job scheduled"))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(anyhow::anyhow!("Unknown estimate or customer"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create job: {}", e)),
        })?;

        for worker_id in &input.worker_ids {
            sqlx::query("INSERT INTO job_workers (job_id, worker_id) VALUES ($1, $2)")
                .bind(job_id)
                .bind(worker_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| match e {
                    sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                        AppError::BadRequest(anyhow::anyhow!("Unknown worker {}", worker_id))
                    }
                    _ => AppError::DatabaseError(anyhow::anyhow!("Failed to assign worker: {}", e)),
                })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(job_id = %job.job_id, workers = input.worker_ids.len(), "Job created");

        Ok(job)
    }

    /// Get a job by ID.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_job"])
            .start_timer();

        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get job: {}", e)))?;

        timer.observe_duration();

        Ok(job)
    }

    /// List jobs.
    #[instrument(skip(self, filter))]
    pub async fn list_jobs(&self, filter: &ListJobsFilter) -> Result<Vec<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_jobs"])
            .start_timer();

        let limit = filter.limit.clamp(1, 100) as i64;
        let status_str = filter.status.map(|s| s.as_str().to_string());

        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
            ORDER BY scheduled_start_date
            LIMIT $3
            "#,
        ))
        .bind(&status_str)
        .bind(filter.customer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list jobs: {}", e)))?;

        timer.observe_duration();

        Ok(jobs)
    }

    /// List upcoming jobs: scheduled or confirmed, starting today or later.
    #[instrument(skip(self))]
    pub async fn list_upcoming_jobs(&self, today: NaiveDate) -> Result<Vec<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_upcoming_jobs"])
            .start_timer();

        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE scheduled_start_date >= $1
              AND status IN ('SCHEDULED', 'CONFIRMED')
            ORDER BY scheduled_start_date
            "#,
        ))
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list upcoming jobs: {}", e))
        })?;

        timer.observe_duration();

        Ok(jobs)
    }

    /// Workers assigned to a job.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn get_job_workers(&self, job_id: Uuid) -> Result<Vec<Worker>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_job_workers"])
            .start_timer();

        let workers = sqlx::query_as::<_, Worker>(
            r#"
            SELECT w.worker_id, w.full_name, w.worker_type, w.phone, w.hourly_rate,
                   w.experience_years, w.is_available, w.created_at, w.updated_at
            FROM workers w
            JOIN job_workers jw ON jw.worker_id = w.worker_id
            WHERE jw.job_id = $1
            ORDER BY w.full_name
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get job workers: {}", e)))?;

        timer.observe_duration();

        Ok(workers)
    }

    /// Update a job. Replaces the worker assignment when one is given.
    #[instrument(skip(self, input), fields(job_id = %job_id))]
    pub async fn update_job(
        &self,
        job_id: Uuid,
        input: &UpdateJob,
    ) -> Result<Option<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_job"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET job_title = COALESCE($2, job_title),
                description = COALESCE($3, description),
                scheduled_start_date = COALESCE($4, scheduled_start_date),
                scheduled_end_date = COALESCE($5, scheduled_end_date),
                notes = COALESCE($6, notes)
            WHERE job_id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .bind(&input.job_title)
        .bind(&input.description)
        .bind(input.scheduled_start_date)
        .bind(input.scheduled_end_date)
        .bind(&input.notes)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update job: {}", e)))?;

        let Some(job) = job else {
            return Ok(None);
        };

        if let Some(worker_ids) = &input.worker_ids {
            sqlx::query("DELETE FROM job_workers WHERE job_id = $1")
                .bind(job_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to clear workers: {}", e))
                })?;

            for worker_id in worker_ids {
                sqlx::query("INSERT INTO job_workers (job_id, worker_id) VALUES ($1, $2)")
                    .bind(job_id)
                    .bind(worker_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| match e {
                        sqlx::Error::Database(ref db_err)
                            if db_err.is_foreign_key_violation() =>
                        {
                            AppError::BadRequest(anyhow::anyhow!("Unknown worker {}", worker_id))
                        }
                        _ => AppError::DatabaseError(anyhow::anyhow!(
                            "Failed to assign worker: {}",
                            e
                        )),
                    })?;
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        Ok(Some(job))
    }

    /// Delete a job. Cascades to materials, the invoice and its payments.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn delete_job(&self, job_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_job"])
            .start_timer();

        let result = sqlx::query("DELETE FROM jobs WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete job: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    /// Confirm a scheduled job's start date with the customer.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn confirm_job(&self, job_id: Uuid, today: NaiveDate) -> Result<Option<Job>, AppError> {
        self.transition_job(
            job_id,
            &["SCHEDULED"],
            JobStatus::Confirmed,
            "confirmation_date",
            today,
            "Only scheduled jobs can be confirmed",
        )
        .await
    }

    /// Start a job.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn start_job(&self, job_id: Uuid, today: NaiveDate) -> Result<Option<Job>, AppError> {
        self.transition_job(
            job_id,
            &["SCHEDULED", "CONFIRMED"],
            JobStatus::InProgress,
            "actual_start_date",
            today,
            "Only scheduled or confirmed jobs can be started",
        )
        .await
    }

    /// Complete a job, recording the actual end date.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn complete_job(
        &self,
        job_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Job>, AppError> {
        self.transition_job(
            job_id,
            &["SCHEDULED", "CONFIRMED", "IN_PROGRESS"],
            JobStatus::Completed,
            "actual_end_date",
            today,
            "Cancelled or already completed jobs cannot be completed",
        )
        .await
    }

    /// Cancel a job that has not finished.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["cancel_job"])
            .start_timer();

        let existing = self.get_job(job_id).await?;
        match existing {
            Some(ref job)
                if ["SCHEDULED", "CONFIRMED", "IN_PROGRESS"].contains(&job.status.as_str()) => {}
            Some(_) => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Completed or cancelled jobs cannot be cancelled"
                )))
            }
            None => return Ok(None),
        };

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'CANCELLED'
            WHERE job_id = $1 AND status IN ('SCHEDULED', 'CONFIRMED', 'IN_PROGRESS')
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to cancel job: {}", e)))?;

        timer.observe_duration();

        if let Some(ref job) = job {
            info!(job_id = %job.job_id, "Job cancelled");
        }

        Ok(job)
    }

    async fn transition_job(
        &self,
        job_id: Uuid,
        allowed_from: &[&str],
        to: JobStatus,
        date_column: &str,
        today: NaiveDate,
        rejection: &str,
    ) -> Result<Option<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition_job"])
            .start_timer();

        let existing = self.get_job(job_id).await?;
        match existing {
            Some(ref job) if allowed_from.contains(&job.status.as_str()) => {}
            Some(_) => return Err(AppError::BadRequest(anyhow::anyhow!("{}", rejection))),
            None => return Ok(None),
        };

        // date_column is one of our own fixed identifiers, never caller input.
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = $2, {date_column} = $3
            WHERE job_id = $1 AND status = ANY($4)
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .bind(to.as_str())
        .bind(today)
        .bind(allowed_from.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to transition job: {}", e)))?;

        timer.observe_duration();

        if let Some(ref job) = job {
            info!(job_id = %job.job_id, status = %job.status, "Job status changed");
        }

        Ok(job)
    }

    // -------------------------------------------------------------------------
    // Supplier Operations
    // -------------------------------------------------------------------------

    /// Create a new supplier.
    #[instrument(skip(self, input))]
    pub async fn create_supplier(&self, input: &CreateSupplier) -> Result<Supplier, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_supplier"])
            .start_timer();

        let supplier_id = Uuid::new_v4();
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (supplier_id, name, contact_person, email, phone, address, website)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, ''))
            RETURNING supplier_id, name, contact_person, email, phone, address, website, is_active, created_at, updated_at
            "#,
        )
        .bind(supplier_id)
        .bind(&input.name)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.website)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create supplier: {}", e)))?;

        timer.observe_duration();

        info!(supplier_id = %supplier.supplier_id, "Supplier created");

        Ok(supplier)
    }

    /// Get a supplier by ID.
    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn get_supplier(&self, supplier_id: Uuid) -> Result<Option<Supplier>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_supplier"])
            .start_timer();

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT supplier_id, name, contact_person, email, phone, address, website, is_active, created_at, updated_at
            FROM suppliers
            WHERE supplier_id = $1
            "#,
        )
        .bind(supplier_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get supplier: {}", e)))?;

        timer.observe_duration();

        Ok(supplier)
    }

    /// List suppliers.
    #[instrument(skip(self))]
    pub async fn list_suppliers(&self, active_only: bool) -> Result<Vec<Supplier>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_suppliers"])
            .start_timer();

        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT supplier_id, name, contact_person, email, phone, address, website, is_active, created_at, updated_at
            FROM suppliers
            WHERE $1::bool = FALSE OR is_active = TRUE
            ORDER BY name
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list suppliers: {}", e)))?;

        timer.observe_duration();

        Ok(suppliers)
    }

    /// Update a supplier.
    #[instrument(skip(self, input), fields(supplier_id = %supplier_id))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: &UpdateSupplier,
    ) -> Result<Option<Supplier>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_supplier"])
            .start_timer();

        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = COALESCE($2, name),
                contact_person = COALESCE($3, contact_person),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                website = COALESCE($7, website),
                is_active = COALESCE($8, is_active)
            WHERE supplier_id = $1
            RETURNING supplier_id, name, contact_person, email, phone, address, website, is_active, created_at, updated_at
            "#,
        )
        .bind(supplier_id)
        .bind(&input.name)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.website)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update supplier: {}", e)))?;

        timer.observe_duration();

        Ok(supplier)
    }

    /// Delete a supplier. Materials keep their rows with the supplier cleared.
    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_supplier"])
            .start_timer();

        let result = sqlx::query("DELETE FROM suppliers WHERE supplier_id = $1")
            .bind(supplier_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete supplier: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Material Operations
    // -------------------------------------------------------------------------

    /// Create a material for a job.
    #[instrument(skip(self, input), fields(job_id = %input.job_id))]
    pub async fn create_material(&self, input: &CreateMaterial) -> Result<Material, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_material"])
            .start_timer();

        let material_id = Uuid::new_v4();
        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            INSERT INTO materials (material_id, job_id, supplier_id, name, description, quantity,
                unit, unit_cost, order_date, expected_delivery_date, notes)
            VALUES ($1, $2, $3, $4, COALESCE($5, ''), $6, $7, $8, $9, $10, COALESCE($11, ''))
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(material_id)
        .bind(input.job_id)
        .bind(input.supplier_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.quantity)
        .bind(&input.unit)
        .bind(input.unit_cost)
        .bind(input.order_date)
        .bind(input.expected_delivery_date)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(anyhow::anyhow!("Unknown job or supplier"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create material: {}", e)),
        })?;

        timer.observe_duration();

        info!(material_id = %material.material_id, "Material created");

        Ok(material)
    }

    /// Get a material by ID.
    #[instrument(skip(self), fields(material_id = %material_id))]
    pub async fn get_material(&self, material_id: Uuid) -> Result<Option<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_material"])
            .start_timer();

        let material = sqlx::query_as::<_, Material>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE material_id = $1"
        ))
        .bind(material_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get material: {}", e)))?;

        timer.observe_duration();

        Ok(material)
    }

    /// List materials, optionally restricted to a job.
    #[instrument(skip(self))]
    pub async fn list_materials(
        &self,
        job_id: Option<Uuid>,
        limit: i32,
    ) -> Result<Vec<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_materials"])
            .start_timer();

        let limit = limit.clamp(1, 100) as i64;

        let materials = sqlx::query_as::<_, Material>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM materials
            WHERE $1::uuid IS NULL OR job_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        ))
        .bind(job_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list materials: {}", e)))?;

        timer.observe_duration();

        Ok(materials)
    }

    /// Materials that were ordered but not yet delivered.
    #[instrument(skip(self))]
    pub async fn list_pending_delivery_materials(&self) -> Result<Vec<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_pending_delivery_materials"])
            .start_timer();

        let materials = sqlx::query_as::<_, Material>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM materials
            WHERE is_delivered = FALSE AND order_date IS NOT NULL
            ORDER BY expected_delivery_date NULLS LAST
            "#,
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list pending materials: {}", e))
        })?;

        timer.observe_duration();

        Ok(materials)
    }

    /// Top materials ranked by total spend (quantity times unit cost).
    #[instrument(skip(self))]
    pub async fn top_materials_by_cost(&self, limit: i32) -> Result<Vec<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["top_materials_by_cost"])
            .start_timer();

        let limit = limit.clamp(1, 50) as i64;

        let materials = sqlx::query_as::<_, Material>(&format!(
            r#"
            SELECT {MATERIAL_COLUMNS}
            FROM materials
            ORDER BY quantity * unit_cost DESC
            LIMIT $1
            "#,
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to rank materials: {}", e))
        })?;

        timer.observe_duration();

        Ok(materials)
    }

    /// Update a material.
    #[instrument(skip(self, input), fields(material_id = %material_id))]
    pub async fn update_material(
        &self,
        material_id: Uuid,
        input: &UpdateMaterial,
    ) -> Result<Option<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_material"])
            .start_timer();

        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            UPDATE materials
            SET supplier_id = COALESCE($2, supplier_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                quantity = COALESCE($5, quantity),
                unit = COALESCE($6, unit),
                unit_cost = COALESCE($7, unit_cost),
                order_date = COALESCE($8, order_date),
                expected_delivery_date = COALESCE($9, expected_delivery_date),
                actual_delivery_date = COALESCE($10, actual_delivery_date),
                is_delivered = COALESCE($11, is_delivered),
                notes = COALESCE($12, notes)
            WHERE material_id = $1
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(material_id)
        .bind(input.supplier_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.quantity)
        .bind(&input.unit)
        .bind(input.unit_cost)
        .bind(input.order_date)
        .bind(input.expected_delivery_date)
        .bind(input.actual_delivery_date)
        .bind(input.is_delivered)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update material: {}", e)))?;

        timer.observe_duration();

        Ok(material)
    }

    /// Delete a material.
    #[instrument(skip(self), fields(material_id = %material_id))]
    pub async fn delete_material(&self, material_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_material"])
            .start_timer();

        let result = sqlx::query("DELETE FROM materials WHERE material_id = $1")
            .bind(material_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete material: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Ledger: Invoice Operations
    // -------------------------------------------------------------------------

    /// Create a draft invoice for a completed job.
    ///
    /// The invoice number comes from the single-row counter bumped inside the
    /// same transaction, so concurrent creations serialize on its row lock and
    /// can never observe the same sequence value.
    #[instrument(skip(self, input), fields(job_id = %input.job_id))]
    pub async fn create_invoice(&self, input: &CreateInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1"
        ))
        .bind(input.job_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get job: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job not found")))?;

        let sequence: i64 = sqlx::query_scalar(
            "UPDATE invoice_counters SET last_value = last_value + 1 WHERE counter_id = 1 RETURNING last_value",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance invoice counter: {}", e))
        })?;

        let invoice_number = format_invoice_number(sequence);
        let invoice_date = Utc::now().date_naive();
        let due_date = input
            .due_date
            .unwrap_or(invoice_date + Duration::days(PAYMENT_TERMS_DAYS));

        let invoice_id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (invoice_id, job_id, customer_id, invoice_number, invoice_date,
                due_date, labor_cost, material_cost, additional_costs, tax_rate, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, ''))
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .bind(job.job_id)
        .bind(job.customer_id)
        .bind(&invoice_number)
        .bind(invoice_date)
        .bind(due_date)
        .bind(input.labor_cost)
        .bind(input.material_cost)
        .bind(input.additional_costs)
        .bind(input.tax_rate)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Job already has an invoice"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)),
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        INVOICES_TOTAL.with_label_values(&["DRAFT"]).inc();

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            "Draft invoice created"
        );

        Ok(invoice)
    }

    /// Get an invoice by ID.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// List invoices.
    #[instrument(skip(self, filter))]
    pub async fn list_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let limit = filter.limit.clamp(1, 100) as i64;
        let status_str = filter.status.map(|s| s.as_str().to_string());

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::date IS NULL OR invoice_date >= $3)
              AND ($4::date IS NULL OR invoice_date <= $4)
            ORDER BY invoice_date DESC, invoice_number DESC
            LIMIT $5
            "#,
        ))
        .bind(&status_str)
        .bind(filter.customer_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Send a draft invoice to the customer.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn send_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        self.transition_invoice(
            invoice_id,
            &["DRAFT"],
            InvoiceStatus::Sent,
            "Only draft invoices can be sent",
        )
        .await
    }

    /// Cancel an invoice that has not been paid.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn cancel_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        self.transition_invoice(
            invoice_id,
            &["DRAFT", "SENT"],
            InvoiceStatus::Cancelled,
            "Only draft or sent invoices can be cancelled",
        )
        .await
    }

    async fn transition_invoice(
        &self,
        invoice_id: Uuid,
        allowed_from: &[&str],
        to: InvoiceStatus,
        rejection: &str,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition_invoice"])
            .start_timer();

        let existing = self.get_invoice(invoice_id).await?;
        match existing {
            Some(ref inv) if allowed_from.contains(&inv.status.as_str()) => {}
            Some(_) => return Err(AppError::BadRequest(anyhow::anyhow!("{}", rejection))),
            None => return Ok(None),
        };

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = $2
            WHERE invoice_id = $1 AND status = ANY($3)
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .bind(to.as_str())
        .bind(allowed_from.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to transition invoice: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref inv) = invoice {
            INVOICES_TOTAL.with_label_values(&[to.as_str()]).inc();
            info!(
                invoice_id = %inv.invoice_id,
                invoice_number = %inv.invoice_number,
                status = %inv.status,
                "Invoice status changed"
            );
        }

        Ok(invoice)
    }

    /// Delete a draft invoice.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let existing = self.get_invoice(invoice_id).await?;
        match existing {
            Some(ref inv) if inv.status == "DRAFT" => {}
            Some(_) => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Only draft invoices can be deleted"
                )))
            }
            None => return Ok(false),
        };

        let result = sqlx::query("DELETE FROM invoices WHERE invoice_id = $1 AND status = 'DRAFT'")
            .bind(invoice_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(invoice_id = %invoice_id, "Draft invoice deleted");
        }

        Ok(deleted)
    }

    /// Invoices awaiting payment (sent or already overdue).
    #[instrument(skip(self))]
    pub async fn list_unpaid_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_unpaid_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE status IN ('SENT', 'OVERDUE')
            ORDER BY due_date
            "#,
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list unpaid invoices: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Flip sent invoices whose due date has passed to OVERDUE.
    ///
    /// Only SENT rows match, so rows already flipped are untouched and a
    /// second sweep reports zero changes.
    #[instrument(skip(self))]
    pub async fn sweep_overdue_invoices(&self, today: NaiveDate) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sweep_overdue_invoices"])
            .start_timer();

        let result = sqlx::query(
            "UPDATE invoices SET status = 'OVERDUE' WHERE status = 'SENT' AND due_date < $1",
        )
        .bind(today)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to sweep overdue invoices: {}", e))
        })?;

        timer.observe_duration();

        let flipped = result.rows_affected();
        if flipped > 0 {
            INVOICES_TOTAL
                .with_label_values(&["OVERDUE"])
                .inc_by(flipped as f64);
            info!(flipped = flipped, "Invoices marked overdue");
        }

        Ok(flipped)
    }

    /// Overdue invoices: past due and still unpaid.
    #[instrument(skip(self))]
    pub async fn list_overdue_invoices(&self, today: NaiveDate) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_overdue_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE status IN ('SENT', 'OVERDUE') AND due_date < $1
            ORDER BY due_date
            "#,
        ))
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list overdue invoices: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoices)
    }

    // -------------------------------------------------------------------------
    // Ledger: Payment Operations
    // -------------------------------------------------------------------------

    /// Record a payment against an invoice.
    ///
    /// The invoice row is locked for the whole read-modify-write, `amount_paid`
    /// is re-derived from the payments table rather than incremented, and the
    /// PAID flip happens in the same transaction, so two concurrent payments
    /// cannot both observe the pre-update balance.
    #[instrument(skip(self, input), fields(invoice_id = %input.invoice_id))]
    pub async fn record_payment(&self, input: &CreatePayment) -> Result<Payment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1 FOR UPDATE"
        ))
        .bind(input.invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        if invoice.status == InvoiceStatus::Cancelled.as_str() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot record a payment against a cancelled invoice"
            )));
        }

        if let Some(reference) = &input.transaction_reference {
            let existing = sqlx::query_as::<_, Payment>(&format!(
                "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 AND transaction_reference = $2"
            ))
            .bind(input.invoice_id)
            .bind(reference)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to look up payment: {}", e))
            })?;

            if let Some(existing) = existing {
                tx.commit().await.map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
                })?;
                info!(
                    payment_id = %existing.payment_id,
                    reference = %reference,
                    "Payment reference already applied; returning existing payment"
                );
                return Ok(existing);
            }
        }

        let payment_id = Uuid::new_v4();
        let payment_date = input
            .payment_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (payment_id, invoice_id, amount, payment_method, payment_date,
                transaction_reference, received_by, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, ''))
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(payment_id)
        .bind(input.invoice_id)
        .bind(input.amount)
        .bind(input.payment_method.as_str())
        .bind(payment_date)
        .bind(&input.transaction_reference)
        .bind(&input.received_by)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?;

        // Re-derive from the source of truth, never increment.
        let amount_paid: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE invoice_id = $1",
        )
        .bind(input.invoice_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to recompute amount paid: {}", e))
        })?;

        let settled = amount_paid >= invoice.total_amount();
        let new_status = if settled {
            InvoiceStatus::Paid.as_str()
        } else {
            invoice.status.as_str()
        };

        sqlx::query("UPDATE invoices SET amount_paid = $2, status = $3 WHERE invoice_id = $1")
            .bind(input.invoice_id)
            .bind(amount_paid)
            .bind(new_status)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        PAYMENTS_TOTAL
            .with_label_values(&[payment.payment_method.as_str()])
            .inc();
        if settled && invoice.status != InvoiceStatus::Paid.as_str() {
            INVOICES_TOTAL.with_label_values(&["PAID"]).inc();
        }

        info!(
            payment_id = %payment.payment_id,
            invoice_id = %input.invoice_id,
            amount = %payment.amount,
            amount_paid = %amount_paid,
            settled = settled,
            "Payment recorded"
        );

        Ok(payment)
    }

    /// Get a payment by ID.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_payment"])
            .start_timer();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get payment: {}", e)))?;

        timer.observe_duration();

        Ok(payment)
    }

    /// Payments recorded against an invoice, newest first.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE invoice_id = $1
            ORDER BY payment_date DESC, created_at DESC
            "#,
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list payments: {}", e)))?;

        timer.observe_duration();

        Ok(payments)
    }

    // -------------------------------------------------------------------------
    // Reporting Queries
    // -------------------------------------------------------------------------

    /// Total number of customers.
    pub async fn count_customers(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count customers: {}", e))
            })?;
        Ok(count)
    }

    /// Job counts grouped by status.
    pub async fn count_jobs_by_status(&self) -> Result<Vec<StatusCount>, AppError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS total FROM jobs GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count jobs: {}", e)))?;
        Ok(counts)
    }

    /// Estimate counts grouped by status.
    pub async fn count_estimates_by_status(&self) -> Result<Vec<StatusCount>, AppError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS total FROM estimates GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count estimates: {}", e))
        })?;
        Ok(counts)
    }

    /// Invoice counts grouped by status.
    pub async fn count_invoices_by_status(&self) -> Result<Vec<StatusCount>, AppError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS total FROM invoices GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
        })?;
        Ok(counts)
    }

    /// Total and available worker head counts.
    pub async fn worker_counts(&self) -> Result<WorkerCounts, AppError> {
        let counts = sqlx::query_as::<_, WorkerCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_available) AS available
            FROM workers
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count workers: {}", e)))?;
        Ok(counts)
    }

    /// All invoices with a given set of statuses; totals are derived in code.
    pub async fn list_invoices_with_statuses(
        &self,
        statuses: &[InvoiceStatus],
    ) -> Result<Vec<Invoice>, AppError> {
        let status_strs: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE status = ANY($1)"
        ))
        .bind(&status_strs)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;
        Ok(invoices)
    }

    /// All invoices not yet settled.
    pub async fn list_unsettled_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE status <> 'PAID'"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;
        Ok(invoices)
    }

    /// Invoices issued on or after a date, oldest first (revenue trend input).
    pub async fn list_invoices_since(&self, date: NaiveDate) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_date >= $1 ORDER BY invoice_date"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;
        Ok(invoices)
    }

    /// Total material spend across all jobs.
    pub async fn material_spend(&self) -> Result<Decimal, AppError> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity * unit_cost), 0) FROM materials",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to sum material spend: {}", e))
        })?;
        Ok(total)
    }

    /// Average scheduled job duration in whole days.
    pub async fn average_job_duration_days(&self) -> Result<i64, AppError> {
        let days: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(FLOOR(AVG(scheduled_end_date - scheduled_start_date)), 0)::BIGINT
            FROM jobs
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to average job duration: {}", e))
        })?;
        Ok(days)
    }

    /// Sum of amounts collected on paid invoices (financial report).
    pub async fn collected_revenue(&self) -> Result<Decimal, AppError> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_paid), 0) FROM invoices WHERE status = 'PAID'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to sum collected revenue: {}", e))
        })?;
        Ok(total)
    }

    /// Most recently touched jobs (activity feed input).
    pub async fn recent_jobs(&self, limit: i64) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs ORDER BY updated_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list recent jobs: {}", e)))?;
        Ok(jobs)
    }

    /// Most recently touched invoices (activity feed input).
    pub async fn recent_invoices(&self, limit: i64) -> Result<Vec<Invoice>, AppError> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY updated_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list recent invoices: {}", e))
        })?;
        Ok(invoices)
    }

    /// Jobs completed on or after a date (monthly completion chart input).
    pub async fn completed_jobs_since(&self, date: NaiveDate) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE status = 'COMPLETED' AND actual_end_date >= $1
            ORDER BY actual_end_date
            "#,
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list completed jobs: {}", e))
        })?;
        Ok(jobs)
    }

    /// Completed and scheduled job counts per assigned worker.
    pub async fn worker_productivity(&self) -> Result<Vec<WorkerProductivity>, AppError> {
        let rows = sqlx::query_as::<_, WorkerProductivity>(
            r#"
            SELECT w.worker_id, w.full_name, w.hourly_rate,
                   COUNT(*) FILTER (WHERE j.status = 'COMPLETED') AS completed_jobs,
                   COUNT(*) FILTER (WHERE j.status IN ('SCHEDULED', 'CONFIRMED')) AS scheduled_jobs
            FROM workers w
            JOIN job_workers jw ON jw.worker_id = w.worker_id
            JOIN jobs j ON j.job_id = jw.job_id
            GROUP BY w.worker_id, w.full_name, w.hourly_rate
            ORDER BY completed_jobs DESC, w.full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to compute worker productivity: {}", e))
        })?;
        Ok(rows)
    }

    /// Per-customer job totals and completion counts.
    pub async fn customer_completion(&self) -> Result<Vec<CustomerCompletion>, AppError> {
        let rows = sqlx::query_as::<_, CustomerCompletion>(
            r#"
            SELECT c.customer_id,
                   c.first_name || ' ' || c.last_name AS customer_name,
                   COUNT(j.job_id) AS total_jobs,
                   COUNT(*) FILTER (WHERE j.status = 'COMPLETED') AS completed_jobs
            FROM customers c
            JOIN jobs j ON j.customer_id = c.customer_id
            GROUP BY c.customer_id, customer_name
            HAVING COUNT(j.job_id) > 0
            ORDER BY completed_jobs DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to compute customer completion: {}",
                e
            ))
        })?;
        Ok(rows)
    }

    /// Per-customer report rows: jobs, completions and amounts collected.
    pub async fn customer_report(&self) -> Result<Vec<CustomerReportRow>, AppError> {
        let rows = sqlx::query_as::<_, CustomerReportRow>(
            r#"
            SELECT c.customer_id,
                   c.first_name || ' ' || c.last_name AS customer_name,
                   c.email,
                   (SELECT COUNT(*) FROM jobs j WHERE j.customer_id = c.customer_id) AS total_jobs,
                   (SELECT COUNT(*) FROM jobs j
                     WHERE j.customer_id = c.customer_id AND j.status = 'COMPLETED') AS completed_jobs,
                   (SELECT COALESCE(SUM(i.amount_paid), 0) FROM invoices i
                     WHERE i.customer_id = c.customer_id AND i.status = 'PAID') AS total_spent
            FROM customers c
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to build customer report: {}", e))
        })?;
        Ok(rows)
    }
}
