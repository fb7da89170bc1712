//! Invoice model: the ledger side of a completed job.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Days a customer has to settle an invoice.
pub const PAYMENT_TERMS_DAYS: i64 = 30;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(InvoiceStatus::Draft),
            "SENT" => Some(InvoiceStatus::Sent),
            "PAID" => Some(InvoiceStatus::Paid),
            "OVERDUE" => Some(InvoiceStatus::Overdue),
            "CANCELLED" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// Format a sequence number as a customer-facing invoice number.
///
/// Pads to five digits and widens once the sequence outgrows them, so numbers
/// stay unique and strictly increasing past INV-99999.
pub fn format_invoice_number(sequence: i64) -> String {
    format!("INV-{:05}", sequence)
}

/// Invoice row. Monetary derivations (subtotal, tax, total, balance) are
/// computed accessors, never stored, so they cannot drift from the inputs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub job_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub labor_cost: Decimal,
    pub material_cost: Decimal,
    pub additional_costs: Decimal,
    pub tax_rate: Decimal,
    pub status: String,
    pub amount_paid: Decimal,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Sum of all cost components before tax.
    pub fn subtotal(&self) -> Decimal {
        self.labor_cost + self.material_cost + self.additional_costs
    }

    pub fn tax_amount(&self) -> Decimal {
        self.subtotal() * self.tax_rate / Decimal::ONE_HUNDRED
    }

    pub fn total_amount(&self) -> Decimal {
        self.subtotal() + self.tax_amount()
    }

    /// Remaining balance. Negative only for a paid invoice carrying a credit.
    pub fn balance_due(&self) -> Decimal {
        self.total_amount() - self.amount_paid
    }

    /// An invoice is overdue once it has been sent and its due date passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(
            InvoiceStatus::from_string(&self.status),
            Some(InvoiceStatus::Sent) | Some(InvoiceStatus::Overdue)
        ) && today > self.due_date
    }

    pub fn is_settled(&self) -> bool {
        self.amount_paid >= self.total_amount()
    }
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i32,
}

/// Input for creating an invoice against a completed job.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub job_id: Uuid,
    pub labor_cost: Decimal,
    pub material_cost: Decimal,
    pub additional_costs: Decimal,
    pub tax_rate: Decimal,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn invoice(labor: &str, material: &str, additional: &str, tax: &str) -> Invoice {
        Invoice {
            invoice_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            invoice_number: "INV-00001".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            labor_cost: d(labor),
            material_cost: d(material),
            additional_costs: d(additional),
            tax_rate: d(tax),
            status: "DRAFT".to_string(),
            amount_paid: Decimal::ZERO,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn derived_amounts_follow_cost_breakdown() {
        let inv = invoice("10000", "5000", "0", "16");
        assert_eq!(inv.subtotal(), d("15000"));
        assert_eq!(inv.tax_amount(), d("2400"));
        assert_eq!(inv.total_amount(), d("17400"));
        assert_eq!(inv.balance_due(), d("17400"));
    }

    #[test]
    fn partial_payment_reduces_balance_without_settling() {
        let mut inv = invoice("10000", "5000", "0", "16");
        inv.amount_paid = d("5000");
        assert_eq!(inv.balance_due(), d("12400"));
        assert!(!inv.is_settled());

        inv.amount_paid += d("12400");
        assert_eq!(inv.balance_due(), Decimal::ZERO);
        assert!(inv.is_settled());
    }

    #[test]
    fn zero_tax_total_equals_subtotal() {
        let inv = invoice("1200.50", "300.25", "99.25", "0");
        assert_eq!(inv.total_amount(), inv.subtotal());
    }

    #[test]
    fn invoice_number_pads_to_five_digits_and_widens() {
        assert_eq!(format_invoice_number(1), "INV-00001");
        assert_eq!(format_invoice_number(42), "INV-00042");
        assert_eq!(format_invoice_number(99999), "INV-99999");
        assert_eq!(format_invoice_number(100000), "INV-100000");
    }

    #[test]
    fn overdue_requires_sent_status_and_past_due_date() {
        let mut inv = invoice("100", "0", "0", "0");
        let after_due = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let before_due = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

        assert!(!inv.is_overdue(after_due), "draft invoices never go overdue");

        inv.status = "SENT".to_string();
        assert!(!inv.is_overdue(before_due));
        assert!(!inv.is_overdue(inv.due_date), "due date itself is not overdue");
        assert!(inv.is_overdue(after_due));

        inv.status = "OVERDUE".to_string();
        assert!(inv.is_overdue(after_due));

        inv.status = "PAID".to_string();
        assert!(!inv.is_overdue(after_due));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            assert_eq!(InvoiceStatus::from_string(status.as_str()), Some(status));
        }
        assert_eq!(InvoiceStatus::from_string("VOID"), None);
    }
}
