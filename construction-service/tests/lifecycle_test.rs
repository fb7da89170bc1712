//! Job and invoice state-machine tests.

mod common;

use common::{extract_id, TestApp};
use serde_json::json;

#[tokio::test]
async fn job_walks_through_its_lifecycle() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_job().await;

    let response = app
        .post(&format!("/api/jobs/{}/confirm", job_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let job: serde_json::Value = response.json().await.unwrap();
    assert_eq!(job["status"], "CONFIRMED");
    assert!(job["confirmation_date"].is_string());

    let response = app
        .post(&format!("/api/jobs/{}/start", job_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let job: serde_json::Value = response.json().await.unwrap();
    assert_eq!(job["status"], "IN_PROGRESS");
    assert!(job["actual_start_date"].is_string());

    let response = app
        .post(&format!("/api/jobs/{}/complete", job_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let job: serde_json::Value = response.json().await.unwrap();
    assert_eq!(job["status"], "COMPLETED");
    assert!(job["actual_end_date"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn finished_jobs_reject_further_transitions() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    for action in ["confirm", "start", "complete", "cancel"] {
        let response = app
            .post(&format!("/api/jobs/{}/{}", job_id, action), &json!({}))
            .await;
        assert_eq!(response.status(), 400, "{} should be rejected", action);
    }

    app.cleanup().await;
}

#[tokio::test]
async fn cancelled_jobs_stay_cancelled() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_job().await;

    let response = app
        .post(&format!("/api/jobs/{}/cancel", job_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let job: serde_json::Value = response.json().await.unwrap();
    assert_eq!(job["status"], "CANCELLED");

    let response = app
        .post(&format!("/api/jobs/{}/start", job_id), &json!({}))
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn draft_invoice_must_be_sent_before_anything_else() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;
    let invoice = app.seed_invoice(job_id).await;
    let invoice_id = extract_id(&invoice, "invoice_id");

    let response = app
        .post(&format!("/api/invoices/{}/send", invoice_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let sent: serde_json::Value = response.json().await.unwrap();
    assert_eq!(sent["status"], "SENT");

    // Sending twice is invalid.
    let response = app
        .post(&format!("/api/invoices/{}/send", invoice_id), &json!({}))
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn paid_invoices_cannot_be_cancelled() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;
    let invoice = app.seed_invoice(job_id).await;
    let invoice_id = extract_id(&invoice, "invoice_id");

    app.post(&format!("/api/invoices/{}/send", invoice_id), &json!({}))
        .await;
    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "17400", "payment_method": "BANK_TRANSFER" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .post(&format!("/api/invoices/{}/cancel", invoice_id), &json!({}))
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn estimate_status_updates_flow_through_put() {
    let app = TestApp::spawn().await;
    let customer_id = app.seed_customer().await;

    let response = app
        .post(
            "/api/estimates",
            &json!({
                "customer_id": customer_id,
                "work_description": "Garage conversion",
                "estimated_cost": "8000",
                "estimated_duration_days": 5
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let estimate: serde_json::Value = response.json().await.unwrap();
    assert_eq!(estimate["status"], "PENDING");
    let estimate_id = extract_id(&estimate, "estimate_id");

    let response = app
        .put(
            &format!("/api/estimates/{}", estimate_id),
            &json!({ "status": "SENT", "estimate_sent_date": "2025-04-01" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let estimate: serde_json::Value = response.json().await.unwrap();
    assert_eq!(estimate["status"], "SENT");

    let response = app
        .put(
            &format!("/api/estimates/{}", estimate_id),
            &json!({ "status": "NOT_A_STATUS" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn one_job_per_estimate() {
    let app = TestApp::spawn().await;
    let (customer_id, job_id) = app.seed_job().await;

    // Fetch the estimate back off the job and try to schedule it again.
    let response = app.get(&format!("/api/jobs/{}", job_id)).await;
    let job: serde_json::Value = response.json().await.unwrap();
    let estimate_id = job["estimate_id"].as_str().unwrap();

    let response = app
        .post(
            "/api/jobs",
            &json!({
                "estimate_id": estimate_id,
                "customer_id": customer_id,
                "job_title": "Duplicate",
                "description": "Should conflict",
                "scheduled_start_date": "2025-06-01",
                "scheduled_end_date": "2025-06-05"
            }),
        )
        .await;
    assert_eq!(response.status(), 409);

    app.cleanup().await;
}
