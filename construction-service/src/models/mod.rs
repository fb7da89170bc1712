//! Domain models for construction-service.

mod customer;
mod estimate;
mod invoice;
mod job;
mod material;
mod payment;
mod supplier;
mod worker;

pub use customer::{CreateCustomer, Customer, UpdateCustomer};
pub use estimate::{CreateEstimate, Estimate, EstimateStatus, UpdateEstimate};
pub use invoice::{
    format_invoice_number, CreateInvoice, Invoice, InvoiceStatus, ListInvoicesFilter,
    PAYMENT_TERMS_DAYS,
};
pub use job::{CreateJob, Job, JobStatus, ListJobsFilter, UpdateJob};
pub use material::{CreateMaterial, Material, UpdateMaterial};
pub use payment::{CreatePayment, Payment, PaymentMethod};
pub use supplier::{CreateSupplier, Supplier, UpdateSupplier};
pub use worker::{CreateWorker, UpdateWorker, Worker, WorkerType};
