//! Receipt repository
//!
//! Owns the (clinic, receipt_number) unique index. Index entries survive
//! receipt deletion: a number is never issued twice.

use std::sync::Arc;

use clinicdesk_types::{ClinicId, PaymentMode, Receipt, ReceiptId};

use crate::error::{StoreError, StoreResult};
use crate::Collections;

pub struct ReceiptRepo {
    inner: Arc<Collections>,
}

impl ReceiptRepo {
    pub(crate) fn new(inner: Arc<Collections>) -> Self {
        Self { inner }
    }

    /// Insert a receipt, enforcing number uniqueness. Same contract as the
    /// visit insert: a racing caller gets [`StoreError::Duplicate`] and
    /// retries with a freshly derived number.
    pub async fn insert_unique(&self, receipt: Receipt) -> StoreResult<Receipt> {
        let mut receipts = self.inner.receipts.write().await;
        let mut number_index = self.inner.receipt_number_index.write().await;

        let key = (receipt.clinic_id, receipt.receipt_number.clone());
        if !number_index.insert(key) {
            return Err(StoreError::duplicate(
                "receipt_number",
                format!("{}/{}", receipt.clinic_id, receipt.receipt_number),
            ));
        }
        receipts.insert(receipt.id, receipt.clone());
        Ok(receipt)
    }

    pub async fn find_by_id(&self, clinic_id: ClinicId, id: ReceiptId) -> Option<Receipt> {
        let receipts = self.inner.receipts.read().await;
        receipts
            .get(&id)
            .filter(|r| r.clinic_id == clinic_id)
            .cloned()
    }

    /// Every number ever allocated for the clinic with the given prefix,
    /// deleted receipts included. The sequence allocator derives the next
    /// value from this set.
    pub async fn allocated_numbers(&self, clinic_id: ClinicId, prefix: &str) -> Vec<String> {
        let number_index = self.inner.receipt_number_index.read().await;
        number_index
            .iter()
            .filter(|(c, number)| *c == clinic_id && number.starts_with(prefix))
            .map(|(_, number)| number.clone())
            .collect()
    }

    /// Live receipts for the clinic, newest first
    pub async fn list_by_clinic(&self, clinic_id: ClinicId) -> Vec<Receipt> {
        let receipts = self.inner.receipts.read().await;
        let mut clinic_receipts: Vec<Receipt> = receipts
            .values()
            .filter(|r| r.clinic_id == clinic_id)
            .cloned()
            .collect();
        clinic_receipts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        clinic_receipts
    }

    /// Apply a mutation to one receipt under the collection's write lock
    pub async fn update<T>(
        &self,
        clinic_id: ClinicId,
        id: ReceiptId,
        f: impl FnOnce(&mut Receipt) -> clinicdesk_types::Result<T>,
    ) -> clinicdesk_types::Result<T> {
        let mut receipts = self.inner.receipts.write().await;
        let receipt = receipts
            .get_mut(&id)
            .filter(|r| r.clinic_id == clinic_id)
            .ok_or_else(|| clinicdesk_types::CoreError::not_found("receipt"))?;

        let mut draft = receipt.clone();
        let out = f(&mut draft)?;
        *receipt = draft;
        Ok(out)
    }

    /// Flip `is_paid` for exactly the unpaid receipts in `ids` owned by the
    /// clinic. Already-paid or foreign ids are skipped without error.
    /// Returns the count actually updated.
    pub async fn mark_paid_bulk(
        &self,
        clinic_id: ClinicId,
        ids: &[ReceiptId],
        payment_mode: Option<PaymentMode>,
    ) -> usize {
        let mut receipts = self.inner.receipts.write().await;
        let mut updated = 0;
        for id in ids {
            if let Some(receipt) = receipts.get_mut(id) {
                if receipt.clinic_id == clinic_id && !receipt.is_paid {
                    receipt.is_paid = true;
                    if payment_mode.is_some() {
                        receipt.payment_mode = payment_mode;
                    }
                    updated += 1;
                }
            }
        }
        updated
    }

    /// Delete a receipt. The number index entry is retained.
    pub async fn delete(&self, clinic_id: ClinicId, id: ReceiptId) -> StoreResult<Receipt> {
        let mut receipts = self.inner.receipts.write().await;
        let owned = receipts
            .get(&id)
            .map(|r| r.clinic_id == clinic_id)
            .unwrap_or(false);
        if !owned {
            return Err(StoreError::not_found("receipt"));
        }
        Ok(receipts.remove(&id).expect("presence checked above"))
    }
}
