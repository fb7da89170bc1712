//! Payment application and reconciliation tests.

mod common;

use chrono::{Duration, Utc};
use common::{decimal_field, extract_id, TestApp};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

async fn seed_sent_invoice(app: &TestApp) -> Uuid {
    let (_, job_id) = app.seed_completed_job().await;
    let invoice = app.seed_invoice(job_id).await;
    let invoice_id = extract_id(&invoice, "invoice_id");
    let response = app
        .post(&format!("/api/invoices/{}/send", invoice_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);
    invoice_id
}

async fn get_invoice(app: &TestApp, invoice_id: Uuid) -> serde_json::Value {
    let response = app.get(&format!("/api/invoices/{}", invoice_id)).await;
    assert_eq!(response.status(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn partial_then_full_payment_settles_the_invoice() {
    let app = TestApp::spawn().await;
    let invoice_id = seed_sent_invoice(&app).await;

    // Partial payment: balance drops, status stays SENT.
    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "5000", "payment_method": "BANK_TRANSFER" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(invoice["status"], "SENT");
    assert_eq!(decimal_field(&invoice, "amount_paid"), Decimal::from(5000));
    assert_eq!(decimal_field(&invoice, "balance_due"), Decimal::from(12400));

    // Remaining balance: the invoice flips to PAID.
    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "12400", "payment_method": "CASH" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(invoice["status"], "PAID");
    assert_eq!(decimal_field(&invoice, "amount_paid"), Decimal::from(17400));
    assert_eq!(decimal_field(&invoice, "balance_due"), Decimal::ZERO);

    app.cleanup().await;
}

#[tokio::test]
async fn amount_paid_is_rederived_from_all_payments() {
    let app = TestApp::spawn().await;
    let invoice_id = seed_sent_invoice(&app).await;

    for amount in ["100", "250.50", "99.50"] {
        let response = app
            .post(
                &format!("/api/invoices/{}/payments", invoice_id),
                &json!({ "amount": amount, "payment_method": "CASH" }),
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(
        decimal_field(&invoice, "amount_paid"),
        Decimal::from_str_exact("450").unwrap()
    );
    assert_eq!(invoice["payments"].as_array().unwrap().len(), 3);

    app.cleanup().await;
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let app = TestApp::spawn().await;
    let invoice_id = seed_sent_invoice(&app).await;

    for amount in ["0", "-10"] {
        let response = app
            .post(
                &format!("/api/invoices/{}/payments", invoice_id),
                &json!({ "amount": amount, "payment_method": "CASH" }),
            )
            .await;
        assert_eq!(response.status(), 422, "amount {} should be rejected", amount);
    }

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(decimal_field(&invoice, "amount_paid"), Decimal::ZERO);

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_payment_method_is_rejected() {
    let app = TestApp::spawn().await;
    let invoice_id = seed_sent_invoice(&app).await;

    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "100", "payment_method": "BARTER" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn payments_against_cancelled_invoices_are_rejected() {
    let app = TestApp::spawn().await;
    let invoice_id = seed_sent_invoice(&app).await;

    let response = app
        .post(&format!("/api/invoices/{}/cancel", invoice_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "100", "payment_method": "CASH" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn repeated_transaction_reference_is_applied_once() {
    let app = TestApp::spawn().await;
    let invoice_id = seed_sent_invoice(&app).await;

    let payload = json!({
        "amount": "1000",
        "payment_method": "MOBILE_MONEY",
        "transaction_reference": "TXN-42"
    });

    let first = app
        .post(&format!("/api/invoices/{}/payments", invoice_id), &payload)
        .await;
    assert_eq!(first.status(), 201);
    let first: serde_json::Value = first.json().await.unwrap();

    let second = app
        .post(&format!("/api/invoices/{}/payments", invoice_id), &payload)
        .await;
    assert_eq!(second.status(), 201);
    let second: serde_json::Value = second.json().await.unwrap();

    assert_eq!(first["payment_id"], second["payment_id"]);

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(decimal_field(&invoice, "amount_paid"), Decimal::from(1000));
    assert_eq!(invoice["payments"].as_array().unwrap().len(), 1);

    app.cleanup().await;
}

#[tokio::test]
async fn overdue_invoice_can_still_be_paid_off() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;

    let past_due = (Utc::now().date_naive() - Duration::days(10))
        .format("%Y-%m-%d")
        .to_string();
    let response = app
        .post(
            "/api/invoices",
            &json!({
                "job_id": job_id,
                "labor_cost": "1000",
                "material_cost": "0",
                "additional_costs": "0",
                "tax_rate": "0",
                "due_date": past_due
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let invoice: serde_json::Value = response.json().await.unwrap();
    let invoice_id = extract_id(&invoice, "invoice_id");

    app.post(&format!("/api/invoices/{}/send", invoice_id), &json!({}))
        .await;

    // The sweep flips it to OVERDUE.
    let response = app.get("/api/invoices/overdue").await;
    assert_eq!(response.status(), 200);
    let sweep: serde_json::Value = response.json().await.unwrap();
    assert_eq!(sweep["swept"], 1);

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(invoice["status"], "OVERDUE");
    assert_eq!(invoice["is_overdue"], true);

    // Full payment still completes it.
    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "1000", "payment_method": "CHEQUE" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(invoice["status"], "PAID");

    app.cleanup().await;
}

#[tokio::test]
async fn overpayment_settles_and_leaves_a_credit() {
    let app = TestApp::spawn().await;
    let invoice_id = seed_sent_invoice(&app).await;

    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "20000", "payment_method": "BANK_TRANSFER" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(invoice["status"], "PAID");
    assert_eq!(
        decimal_field(&invoice, "balance_due"),
        Decimal::from(-2600)
    );

    app.cleanup().await;
}

#[tokio::test]
async fn partial_payment_on_a_draft_leaves_it_draft() {
    let app = TestApp::spawn().await;
    let (_, job_id) = app.seed_completed_job().await;
    let invoice = app.seed_invoice(job_id).await;
    let invoice_id = extract_id(&invoice, "invoice_id");

    let response = app
        .post(
            &format!("/api/invoices/{}/payments", invoice_id),
            &json!({ "amount": "50", "payment_method": "CASH" }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let invoice = get_invoice(&app, invoice_id).await;
    assert_eq!(invoice["status"], "DRAFT");

    app.cleanup().await;
}

#[tokio::test]
async fn payment_against_unknown_invoice_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            &format!("/api/invoices/{}/payments", Uuid::new_v4()),
            &json!({ "amount": "100", "payment_method": "CASH" }),
        )
        .await;
    assert_eq!(response.status(), 404);

    app.cleanup().await;
}
