//! ClinicDesk Receipt Ledger
//!
//! Receipts are append-only billing documents. Creation derives every
//! money field: the caller supplies line items and a discount, the ledger
//! computes `subtotal` and `total_amount` and allocates the next
//! `RCP-{year}-{seq}` number for the clinic's year. After creation only
//! payment status and share bookkeeping ever change; corrections are a
//! doctor-deleted receipt plus a fresh one, and the deleted number stays
//! burned.
//!
//! A receipt may stand alone (walk-in pharmacy sale) or reference a visit,
//! in which case the visit must be in or past consultation and the patient
//! snapshot is copied from it.

use chrono::Utc;

use clinicdesk_sequence::{retry_unique_insert, SequenceAllocator};
use clinicdesk_store::Store;
use clinicdesk_types::{
    calendar, permissions, receipt::subtotal_of, receipt::total_of, AuthContext, CoreError,
    LineItem, Operation, PatientSnapshot, PaymentMode, Receipt, ReceiptId, Result, VisitId,
};

/// Caller-supplied portion of a new receipt
#[derive(Debug, Clone)]
pub struct NewReceipt {
    /// Omit to bill a walk-in; supply to bill against a visit
    pub visit_id: Option<VisitId>,
    /// Required for walk-ins; ignored in favor of the visit's snapshot
    /// when `visit_id` is set
    pub patient: Option<PatientSnapshot>,
    pub line_items: Vec<LineItem>,
    pub discount_amount: i64,
    pub discount_reason: Option<String>,
}

/// Receipt operations over the shared store
#[derive(Clone)]
pub struct ReceiptService {
    store: Store,
    allocator: SequenceAllocator,
}

impl ReceiptService {
    pub fn new(store: Store) -> Self {
        let allocator = SequenceAllocator::new(store.clone());
        Self { store, allocator }
    }

    /// Create a receipt: validate, derive totals, allocate the number,
    /// insert. Line amounts are not sign-checked; the clamp on the total
    /// is the only arithmetic guard.
    pub async fn create_receipt(&self, ctx: &AuthContext, input: NewReceipt) -> Result<Receipt> {
        permissions::require(Operation::CreateReceipt, ctx.role)?;

        if input.line_items.is_empty() {
            return Err(CoreError::validation(
                "line_items",
                "a receipt needs at least one line item",
            ));
        }
        if input.discount_amount < 0 {
            return Err(CoreError::validation(
                "discount_amount",
                "must not be negative",
            ));
        }

        let patient = match input.visit_id {
            Some(visit_id) => {
                let visit = self
                    .store
                    .visit_repo()
                    .find_by_id(ctx.clinic_id, visit_id)
                    .await
                    .ok_or_else(|| CoreError::not_found("visit"))?;
                if !visit.status.allows_receipt() {
                    return Err(CoreError::validation(
                        "visit.status",
                        "receipts can only be raised during or after consultation",
                    ));
                }
                visit.patient
            }
            None => input.patient.ok_or_else(|| {
                CoreError::validation("patient", "required for a receipt without a visit")
            })?,
        };

        let now = Utc::now();
        let receipt_date = calendar::day_of(now);
        let year = calendar::year_of(receipt_date);
        let subtotal = subtotal_of(&input.line_items);
        let total_amount = total_of(subtotal, input.discount_amount);

        let clinic_id = ctx.clinic_id;
        let scope = format!("{clinic_id}/{year}");
        let receipt = retry_unique_insert(&scope, || async {
            let receipt_number = self.allocator.next_receipt_number(clinic_id, year).await;
            let receipt = Receipt {
                id: ReceiptId::new(),
                clinic_id,
                visit_id: input.visit_id,
                receipt_number,
                patient: patient.clone(),
                line_items: input.line_items.clone(),
                subtotal,
                discount_amount: input.discount_amount,
                discount_reason: input.discount_reason.clone(),
                total_amount,
                is_paid: false,
                payment_mode: None,
                receipt_date,
                last_shared_at: None,
                created_at: Utc::now(),
            };
            self.store.receipt_repo().insert_unique(receipt).await
        })
        .await?;

        tracing::info!(
            receipt_id = %receipt.id,
            receipt_number = %receipt.receipt_number,
            total = receipt.total_amount,
            "receipt created"
        );
        Ok(receipt)
    }

    pub async fn get_receipt(&self, ctx: &AuthContext, id: ReceiptId) -> Result<Receipt> {
        self.store
            .receipt_repo()
            .find_by_id(ctx.clinic_id, id)
            .await
            .ok_or_else(|| CoreError::not_found("receipt"))
    }

    /// Live receipts for the clinic, newest first
    pub async fn list_receipts(&self, ctx: &AuthContext) -> Vec<Receipt> {
        self.store.receipt_repo().list_by_clinic(ctx.clinic_id).await
    }

    /// Mark a batch of receipts paid in one pass. Already-paid and foreign
    /// ids are skipped; the count of receipts actually flipped is returned.
    pub async fn mark_paid(
        &self,
        ctx: &AuthContext,
        ids: &[ReceiptId],
        payment_mode: Option<PaymentMode>,
    ) -> Result<usize> {
        permissions::require(Operation::MarkReceiptPaid, ctx.role)?;
        let updated = self
            .store
            .receipt_repo()
            .mark_paid_bulk(ctx.clinic_id, ids, payment_mode)
            .await;
        tracing::info!(requested = ids.len(), updated, "receipts marked paid");
        Ok(updated)
    }

    /// Delete a mistaken receipt. The number stays burned; the replacement
    /// gets the next one in sequence.
    pub async fn delete_receipt(&self, ctx: &AuthContext, id: ReceiptId) -> Result<Receipt> {
        permissions::require(Operation::DeleteReceipt, ctx.role)?;
        let receipt = self.store.receipt_repo().delete(ctx.clinic_id, id).await?;
        tracing::info!(receipt_id = %id, receipt_number = %receipt.receipt_number, "receipt deleted");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicdesk_types::{Clinic, ClinicId, Role, UserId, Visit, VisitStatus};

    async fn setup() -> (ReceiptService, Store, AuthContext, AuthContext) {
        let store = Store::new();
        let clinic = Clinic::new("City Clinic", "12 Main St", "555-0101");
        let clinic_id = clinic.id;
        store.clinic_repo().create(clinic).await.unwrap();

        let doctor = AuthContext::new(UserId::new(), clinic_id, Role::Doctor);
        let desk = AuthContext::new(UserId::new(), clinic_id, Role::FrontDesk);
        (ReceiptService::new(store.clone()), store, doctor, desk)
    }

    fn patient() -> PatientSnapshot {
        PatientSnapshot {
            name: "Asha Rao".to_string(),
            phone: "555-0100".to_string(),
            age: Some(34),
            gender: None,
        }
    }

    fn items(amounts: &[i64]) -> Vec<LineItem> {
        amounts
            .iter()
            .map(|&amount| LineItem {
                description: "consultation".to_string(),
                amount,
            })
            .collect()
    }

    fn walk_in(amounts: &[i64], discount: i64) -> NewReceipt {
        NewReceipt {
            visit_id: None,
            patient: Some(patient()),
            line_items: items(amounts),
            discount_amount: discount,
            discount_reason: None,
        }
    }

    #[tokio::test]
    async fn test_totals_are_derived_not_supplied() {
        let (service, _, _, desk) = setup().await;
        let receipt = service
            .create_receipt(&desk, walk_in(&[500, 300], 100))
            .await
            .unwrap();
        assert_eq!(receipt.subtotal, 800);
        assert_eq!(receipt.total_amount, 700);
        assert_eq!(receipt.recomputed_total(), 700);
        assert!(!receipt.is_paid);
    }

    #[tokio::test]
    async fn test_oversized_discount_clamps_to_zero() {
        let (service, _, _, desk) = setup().await;
        let receipt = service
            .create_receipt(&desk, walk_in(&[800], 1000))
            .await
            .unwrap();
        assert_eq!(receipt.total_amount, 0);
    }

    #[tokio::test]
    async fn test_empty_line_items_rejected() {
        let (service, _, _, desk) = setup().await;
        let err = service
            .create_receipt(&desk, walk_in(&[], 0))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_negative_discount_rejected() {
        let (service, _, _, desk) = setup().await;
        let err = service
            .create_receipt(&desk, walk_in(&[500], -1))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_negative_line_amounts_tolerated() {
        let (service, _, _, desk) = setup().await;
        let receipt = service
            .create_receipt(&desk, walk_in(&[500, -100], 0))
            .await
            .unwrap();
        assert_eq!(receipt.subtotal, 400);
        assert_eq!(receipt.total_amount, 400);
    }

    #[tokio::test]
    async fn test_numbers_are_sequential_per_year() {
        let (service, _, _, desk) = setup().await;
        let year = calendar::year_of(Utc::now().date_naive());
        let r1 = service
            .create_receipt(&desk, walk_in(&[500], 0))
            .await
            .unwrap();
        let r2 = service
            .create_receipt(&desk, walk_in(&[300], 0))
            .await
            .unwrap();
        assert_eq!(r1.receipt_number, format!("RCP-{year}-0001"));
        assert_eq!(r2.receipt_number, format!("RCP-{year}-0002"));
    }

    #[tokio::test]
    async fn test_visit_receipt_copies_patient_and_gates_on_status() {
        let (service, store, doctor, desk) = setup().await;
        let clinic_id = doctor.clinic_id;
        let day = Utc::now().date_naive();

        let visit = Visit::new(clinic_id, patient(), "fever", day, 1);
        let visit = store.visit_repo().insert_unique(visit).await.unwrap();

        let billed = NewReceipt {
            visit_id: Some(visit.id),
            patient: None,
            line_items: items(&[500]),
            discount_amount: 0,
            discount_reason: None,
        };

        // Waiting visits cannot be billed
        let err = service
            .create_receipt(&desk, billed.clone())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        store
            .visit_repo()
            .update(clinic_id, visit.id, |v| {
                v.status = VisitStatus::InConsultation;
                Ok(())
            })
            .await
            .unwrap();

        let receipt = service.create_receipt(&desk, billed).await.unwrap();
        assert_eq!(receipt.visit_id, Some(visit.id));
        assert_eq!(receipt.patient.name, "Asha Rao");
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent_per_receipt() {
        let (service, _, _, desk) = setup().await;
        let r1 = service
            .create_receipt(&desk, walk_in(&[500], 0))
            .await
            .unwrap();
        let r2 = service
            .create_receipt(&desk, walk_in(&[300], 0))
            .await
            .unwrap();

        let updated = service
            .mark_paid(&desk, &[r1.id, r2.id], Some(PaymentMode::Upi))
            .await
            .unwrap();
        assert_eq!(updated, 2);

        // Second pass finds nothing left to flip
        let updated = service
            .mark_paid(&desk, &[r1.id, r2.id], Some(PaymentMode::Cash))
            .await
            .unwrap();
        assert_eq!(updated, 0);

        // Payment mode from the first pass is retained
        let r1 = service.get_receipt(&desk, r1.id).await.unwrap();
        assert_eq!(r1.payment_mode, Some(PaymentMode::Upi));
    }

    #[tokio::test]
    async fn test_delete_is_doctor_only_and_number_stays_burned() {
        let (service, _, doctor, desk) = setup().await;
        let year = calendar::year_of(Utc::now().date_naive());
        let r1 = service
            .create_receipt(&desk, walk_in(&[500], 0))
            .await
            .unwrap();

        let err = service.delete_receipt(&desk, r1.id).await.unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");

        service.delete_receipt(&doctor, r1.id).await.unwrap();
        let err = service.get_receipt(&desk, r1.id).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        // Replacement takes the next number, not the freed one
        let r2 = service
            .create_receipt(&desk, walk_in(&[500], 0))
            .await
            .unwrap();
        assert_eq!(r2.receipt_number, format!("RCP-{year}-0002"));
    }

    #[tokio::test]
    async fn test_cross_tenant_receipt_is_not_found() {
        let (service, _, _, desk) = setup().await;
        let receipt = service
            .create_receipt(&desk, walk_in(&[500], 0))
            .await
            .unwrap();

        let foreign = AuthContext::new(UserId::new(), ClinicId::new(), Role::Doctor);
        let err = service.get_receipt(&foreign, receipt.id).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }
}
