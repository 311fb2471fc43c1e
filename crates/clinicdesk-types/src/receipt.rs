//! Billing receipts with derived arithmetic
//!
//! A receipt is append-only after creation: only payment-status fields and
//! share bookkeeping may change. `subtotal` and `total_amount` are always
//! recomputed from the line items and discount, never supplied directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ClinicId, PatientSnapshot, ReceiptId, VisitId};

/// One billed line on a receipt. Amounts are in the minor currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub amount: i64,
}

/// How a receipt was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Card,
    Upi,
    Other,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "cash"),
            Self::Card => write!(f, "card"),
            Self::Upi => write!(f, "upi"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Sum of line-item amounts
pub fn subtotal_of(line_items: &[LineItem]) -> i64 {
    line_items.iter().map(|item| item.amount).sum()
}

/// Discount is clamped: the total never goes negative
pub fn total_of(subtotal: i64, discount_amount: i64) -> i64 {
    (subtotal - discount_amount).max(0)
}

/// One immutable billing document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub clinic_id: ClinicId,
    /// Owning visit, if the receipt was raised from one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<VisitId>,
    /// `RCP-{year}-{seq}`, unique within (clinic, year), assigned once
    pub receipt_number: String,
    pub patient: PatientSnapshot,
    pub line_items: Vec<LineItem>,
    /// Derived: sum of line items
    pub subtotal: i64,
    pub discount_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_reason: Option<String>,
    /// Derived: max(0, subtotal - discount_amount)
    pub total_amount: i64,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentMode>,
    pub receipt_date: NaiveDate,
    /// Share bookkeeping for the kiosk surface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_shared_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    /// Recompute the derived totals from stored fields (round-trip check)
    pub fn recomputed_total(&self) -> i64 {
        total_of(subtotal_of(&self.line_items), self.discount_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(amounts: &[i64]) -> Vec<LineItem> {
        amounts
            .iter()
            .map(|&amount| LineItem {
                description: "consultation".to_string(),
                amount,
            })
            .collect()
    }

    #[test]
    fn test_subtotal_is_sum() {
        assert_eq!(subtotal_of(&items(&[500, 300])), 800);
        assert_eq!(subtotal_of(&[]), 0);
    }

    #[test]
    fn test_discount_clamped_never_negative() {
        let subtotal = subtotal_of(&items(&[500, 300]));
        assert_eq!(total_of(subtotal, 1000), 0);
        assert_eq!(total_of(subtotal, 800), 0);
        assert_eq!(total_of(subtotal, 100), 700);
        assert_eq!(total_of(subtotal, 0), 800);
    }

    #[test]
    fn test_zero_amount_line_items_tolerated() {
        // Positivity is deliberately not hard-enforced
        assert_eq!(subtotal_of(&items(&[0, -50, 100])), 50);
    }
}
