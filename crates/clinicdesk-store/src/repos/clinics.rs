//! Clinic repository
//!
//! The clinic document embeds the shared-receipt slot, the one piece of
//! state unrelated requests contend over. Every slot mutation here happens
//! under a single write lock on the clinics collection, so the slot is
//! always a single consistent value, never a torn write.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use clinicdesk_types::{Clinic, ClinicId, SharedReceiptSlot};

use crate::error::{StoreError, StoreResult};
use crate::Collections;

pub struct ClinicRepo {
    inner: Arc<Collections>,
}

impl ClinicRepo {
    pub(crate) fn new(inner: Arc<Collections>) -> Self {
        Self { inner }
    }

    pub async fn create(&self, clinic: Clinic) -> StoreResult<Clinic> {
        let mut clinics = self.inner.clinics.write().await;
        clinics.insert(clinic.id, clinic.clone());
        Ok(clinic)
    }

    pub async fn find_by_id(&self, id: ClinicId) -> Option<Clinic> {
        let clinics = self.inner.clinics.read().await;
        clinics.get(&id).cloned()
    }

    /// Update clinic settings fields (not the slot)
    pub async fn update_settings(
        &self,
        id: ClinicId,
        name: Option<String>,
        address: Option<String>,
        phone: Option<String>,
        share_duration_minutes: Option<u32>,
    ) -> StoreResult<Clinic> {
        let mut clinics = self.inner.clinics.write().await;
        let clinic = clinics
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("clinic"))?;

        if let Some(name) = name {
            clinic.name = name;
        }
        if let Some(address) = address {
            clinic.address = address;
        }
        if let Some(phone) = phone {
            clinic.phone = phone;
        }
        if let Some(minutes) = share_duration_minutes {
            clinic.share_duration_minutes = minutes;
        }
        clinic.updated_at = Utc::now();
        Ok(clinic.clone())
    }

    /// Read the current slot without touching it
    pub async fn shared_slot(&self, id: ClinicId) -> StoreResult<Option<SharedReceiptSlot>> {
        let clinics = self.inner.clinics.read().await;
        let clinic = clinics
            .get(&id)
            .ok_or_else(|| StoreError::not_found("clinic"))?;
        Ok(clinic.shared_receipt_slot.clone())
    }

    /// Overwrite the slot. Last writer wins; sharing a new receipt silently
    /// supersedes the previous one.
    pub async fn set_shared_slot(
        &self,
        id: ClinicId,
        slot: SharedReceiptSlot,
    ) -> StoreResult<()> {
        let mut clinics = self.inner.clinics.write().await;
        let clinic = clinics
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("clinic"))?;
        clinic.shared_receipt_slot = Some(slot);
        clinic.updated_at = Utc::now();
        Ok(())
    }

    /// Unconditionally empty the slot. Idempotent.
    pub async fn clear_shared_slot(&self, id: ClinicId) -> StoreResult<()> {
        let mut clinics = self.inner.clinics.write().await;
        let clinic = clinics
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("clinic"))?;
        if clinic.shared_receipt_slot.take().is_some() {
            clinic.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Clear the slot only if it has expired as of `now`. Re-checks under
    /// the write lock so a racing `share` is never clobbered. Returns true
    /// if this call physically cleared the slot.
    pub async fn clear_expired_slot(&self, id: ClinicId, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut clinics = self.inner.clinics.write().await;
        let clinic = clinics
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("clinic"))?;
        match &clinic.shared_receipt_slot {
            Some(slot) if !slot.is_active(now) => {
                clinic.shared_receipt_slot = None;
                clinic.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Store;
    use clinicdesk_types::{Clinic, ReceiptId, SharedReceiptSlot};
    use chrono::Utc;

    #[tokio::test]
    async fn test_clear_expired_leaves_live_slot() {
        let store = Store::new();
        let clinic = Clinic::new("City Clinic", "12 Main St", "555-0101");
        let id = clinic.id;
        let repo = store.clinic_repo();
        repo.create(clinic).await.unwrap();

        let now = Utc::now();
        let slot = SharedReceiptSlot {
            receipt_id: ReceiptId::new(),
            expires_at: now + chrono::Duration::minutes(10),
        };
        repo.set_shared_slot(id, slot.clone()).await.unwrap();

        assert!(!repo.clear_expired_slot(id, now).await.unwrap());
        assert_eq!(repo.shared_slot(id).await.unwrap(), Some(slot));

        let later = now + chrono::Duration::minutes(11);
        assert!(repo.clear_expired_slot(id, later).await.unwrap());
        assert_eq!(repo.shared_slot(id).await.unwrap(), None);
        // Second clear is a no-op
        assert!(!repo.clear_expired_slot(id, later).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = Store::new();
        let clinic = Clinic::new("City Clinic", "12 Main St", "555-0101");
        let id = clinic.id;
        let repo = store.clinic_repo();
        repo.create(clinic).await.unwrap();

        repo.clear_shared_slot(id).await.unwrap();
        repo.clear_shared_slot(id).await.unwrap();
        assert_eq!(repo.shared_slot(id).await.unwrap(), None);
    }
}
