//! Invoice creation and numbering tests.

mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::{decimal_field, extract_id, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn first_invoice_gets_sequence_one_and_thirty_day_terms() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    let invoice = app.seed_invoice(job_id).await;

    assert_eq!(invoice["invoice_number"], "INV-00001");
    assert_eq!(invoice["status"], "DRAFT");
    assert_eq!(decimal_field(&invoice, "amount_paid"), Decimal::ZERO);

    let invoice_date =
        NaiveDate::parse_from_str(invoice["invoice_date"].as_str().unwrap(), "%Y-%m-%d").unwrap();
    let due_date =
        NaiveDate::parse_from_str(invoice["due_date"].as_str().unwrap(), "%Y-%m-%d").unwrap();
    assert_eq!(due_date, invoice_date + Duration::days(30));

    app.cleanup().await;
}

#[tokio::test]
async fn invoice_numbers_increase_in_creation_order() {
    let app = TestApp::spawn().await;

    let (_, first_job) = app.seed_completed_job().await;
    let (_, second_job) = app.seed_completed_job().await;

    let first = app.seed_invoice(first_job).await;
    let second = app.seed_invoice(second_job).await;

    assert_eq!(first["invoice_number"], "INV-00001");
    assert_eq!(second["invoice_number"], "INV-00002");

    app.cleanup().await;
}

#[tokio::test]
async fn invoice_carries_derived_amounts() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    let invoice = app.seed_invoice(job_id).await;

    assert_eq!(decimal_field(&invoice, "subtotal"), Decimal::from(15000));
    assert_eq!(decimal_field(&invoice, "tax_amount"), Decimal::from(2400));
    assert_eq!(decimal_field(&invoice, "total_amount"), Decimal::from(17400));
    assert_eq!(decimal_field(&invoice, "balance_due"), Decimal::from(17400));
    assert_eq!(invoice["is_overdue"], false);

    app.cleanup().await;
}

#[tokio::test]
async fn negative_costs_and_out_of_range_tax_are_rejected() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    for payload in [
        json!({ "job_id": job_id, "labor_cost": "-1", "material_cost": "0", "additional_costs": "0", "tax_rate": "0" }),
        json!({ "job_id": job_id, "labor_cost": "0", "material_cost": "-5", "additional_costs": "0", "tax_rate": "0" }),
        json!({ "job_id": job_id, "labor_cost": "0", "material_cost": "0", "additional_costs": "-0.01", "tax_rate": "0" }),
        json!({ "job_id": job_id, "labor_cost": "0", "material_cost": "0", "additional_costs": "0", "tax_rate": "-1" }),
        json!({ "job_id": job_id, "labor_cost": "0", "material_cost": "0", "additional_costs": "0", "tax_rate": "100.01" }),
    ] {
        let response = app.post("/api/invoices", &payload).await;
        assert_eq!(response.status(), 422, "payload should be rejected: {}", payload);
    }

    // Nothing was created along the way.
    let response = app.get("/api/invoices").await;
    let invoices: serde_json::Value = response.json().await.unwrap();
    assert_eq!(invoices.as_array().unwrap().len(), 0);

    app.cleanup().await;
}

#[tokio::test]
async fn second_invoice_for_same_job_conflicts() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    app.seed_invoice(job_id).await;

    let response = app
        .post(
            "/api/invoices",
            &json!({
                "job_id": job_id,
                "labor_cost": "100",
                "material_cost": "0",
                "additional_costs": "0",
                "tax_rate": "0"
            }),
        )
        .await;
    assert_eq!(response.status(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn invoice_for_unknown_job_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/api/invoices",
            &json!({
                "job_id": uuid::Uuid::new_v4(),
                "labor_cost": "100",
                "material_cost": "0",
                "additional_costs": "0",
                "tax_rate": "0"
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn explicit_due_date_is_honored() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    let due = (Utc::now().date_naive() + Duration::days(14))
        .format("%Y-%m-%d")
        .to_string();
    let response = app
        .post(
            "/api/invoices",
            &json!({
                "job_id": job_id,
                "labor_cost": "100",
                "material_cost": "0",
                "additional_costs": "0",
                "tax_rate": "0",
                "due_date": due
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let invoice: serde_json::Value = response.json().await.unwrap();
    assert_eq!(invoice["due_date"].as_str().unwrap(), due);

    app.cleanup().await;
}

#[tokio::test]
async fn only_draft_invoices_can_be_deleted() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    let invoice = app.seed_invoice(job_id).await;
    let invoice_id = extract_id(&invoice, "invoice_id");

    let response = app
        .post(&format!("/api/invoices/{}/send", invoice_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);

    let response = app.delete(&format!("/api/invoices/{}", invoice_id)).await;
    assert_eq!(response.status(), 400);

    // A fresh draft can be deleted.
    let (_, other_job) = app.seed_completed_job().await;
    let draft = app.seed_invoice(other_job).await;
    let draft_id = extract_id(&draft, "invoice_id");

    let response = app.delete(&format!("/api/invoices/{}", draft_id)).await;
    assert_eq!(response.status(), 204);

    app.cleanup().await;
}

#[tokio::test]
async fn invoice_detail_includes_payment_history() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    let invoice = app.seed_invoice(job_id).await;
    let invoice_id = extract_id(&invoice, "invoice_id");

    app.post(&format!("/api/invoices/{}/send", invoice_id), &json!({}))
        .await;
    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "5000", "payment_method": "CASH" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app.get(&format!("/api/invoices/{}", invoice_id)).await;
    assert_eq!(response.status(), 200);
    let detail: serde_json::Value = response.json().await.unwrap();
    assert_eq!(detail["payments"].as_array().unwrap().len(), 1);
    assert_eq!(decimal_field(&detail, "amount_paid"), Decimal::from(5000));

    app.cleanup().await;
}
