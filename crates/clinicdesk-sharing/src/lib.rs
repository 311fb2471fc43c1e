//! ClinicDesk Shared-Receipt Publisher
//!
//! Each clinic owns exactly one ephemeral kiosk slot: a pointer to a
//! receipt plus an expiry. Sharing overwrites the slot (last writer wins),
//! the public read lazily clears an expired slot, and clearing is
//! idempotent. There is no background sweeper; expiry is enforced at read
//! time, and the recheck happens under the write lock so a racing share is
//! never clobbered by a stale read.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use clinicdesk_store::Store;
use clinicdesk_types::{
    permissions, AuthContext, ClinicId, CoreError, Operation, Receipt, ReceiptId, Result,
    SharedReceiptSlot, SHARE_DURATION_MAX, SHARE_DURATION_MIN,
};

/// What the kiosk renders: the receipt plus display context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedReceiptView {
    pub clinic_name: String,
    pub receipt: Receipt,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Settings a doctor may change on the clinic document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClinicSettingsUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub share_duration_minutes: Option<u32>,
}

/// Slot operations over the shared store
#[derive(Clone)]
pub struct SharePublisher {
    store: Store,
}

impl SharePublisher {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Project a receipt onto the clinic's kiosk. Any previously shared
    /// receipt is silently superseded.
    pub async fn share(&self, ctx: &AuthContext, receipt_id: ReceiptId) -> Result<SharedReceiptSlot> {
        permissions::require(Operation::ShareReceipt, ctx.role)?;

        let clinic = self
            .store
            .clinic_repo()
            .find_by_id(ctx.clinic_id)
            .await
            .ok_or_else(|| CoreError::not_found("clinic"))?;

        // Ownership check before anything touches the slot: a foreign or
        // absent receipt must never land on the kiosk
        self.store
            .receipt_repo()
            .find_by_id(ctx.clinic_id, receipt_id)
            .await
            .ok_or_else(|| CoreError::not_found("receipt"))?;

        let now = Utc::now();
        let slot = SharedReceiptSlot {
            receipt_id,
            expires_at: now + clinic.share_duration(),
        };
        self.store
            .clinic_repo()
            .set_shared_slot(ctx.clinic_id, slot.clone())
            .await?;

        // Stamp only after the slot write: last_shared_at records shares
        // that actually became visible
        self.store
            .receipt_repo()
            .update(ctx.clinic_id, receipt_id, |receipt| {
                receipt.last_shared_at = Some(now);
                Ok(())
            })
            .await?;

        tracing::info!(
            receipt_id = %receipt_id,
            expires_at = %slot.expires_at,
            "receipt shared to kiosk"
        );
        Ok(slot)
    }

    /// The unauthenticated kiosk read. An expired slot reads as empty and
    /// is cleared as a side effect; a live slot whose receipt was deleted
    /// reads as empty and is left to expire on its own.
    pub async fn read(&self, clinic_id: ClinicId) -> Result<Option<SharedReceiptView>> {
        let clinic = self
            .store
            .clinic_repo()
            .find_by_id(clinic_id)
            .await
            .ok_or_else(|| CoreError::not_found("clinic"))?;

        let Some(slot) = clinic.shared_receipt_slot else {
            return Ok(None);
        };

        let now = Utc::now();
        if !slot.is_active(now) {
            let cleared = self
                .store
                .clinic_repo()
                .clear_expired_slot(clinic_id, now)
                .await?;
            if cleared {
                tracing::debug!(%clinic_id, "expired kiosk slot cleared on read");
            }
            return Ok(None);
        }

        let receipt = self
            .store
            .receipt_repo()
            .find_by_id(clinic_id, slot.receipt_id)
            .await;
        Ok(receipt.map(|receipt| SharedReceiptView {
            clinic_name: clinic.name,
            receipt,
            expires_at: slot.expires_at,
        }))
    }

    /// Take the kiosk display down now instead of waiting out the timer
    pub async fn clear(&self, ctx: &AuthContext) -> Result<()> {
        permissions::require(Operation::ClearSharedReceipt, ctx.role)?;
        self.store.clinic_repo().clear_shared_slot(ctx.clinic_id).await?;
        Ok(())
    }

    /// Update clinic settings, including the share duration knob
    pub async fn update_settings(
        &self,
        ctx: &AuthContext,
        update: ClinicSettingsUpdate,
    ) -> Result<clinicdesk_types::Clinic> {
        permissions::require(Operation::UpdateClinicSettings, ctx.role)?;

        if let Some(minutes) = update.share_duration_minutes {
            if !(SHARE_DURATION_MIN..=SHARE_DURATION_MAX).contains(&minutes) {
                return Err(CoreError::validation(
                    "share_duration_minutes",
                    "must be between 1 and 60",
                ));
            }
        }

        let clinic = self
            .store
            .clinic_repo()
            .update_settings(
                ctx.clinic_id,
                update.name,
                update.address,
                update.phone,
                update.share_duration_minutes,
            )
            .await?;
        Ok(clinic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicdesk_types::{Clinic, LineItem, PatientSnapshot, Role, UserId};

    async fn setup() -> (SharePublisher, Store, AuthContext, AuthContext) {
        let store = Store::new();
        let clinic = Clinic::new("City Clinic", "12 Main St", "555-0101");
        let clinic_id = clinic.id;
        store.clinic_repo().create(clinic).await.unwrap();

        let doctor = AuthContext::new(UserId::new(), clinic_id, Role::Doctor);
        let desk = AuthContext::new(UserId::new(), clinic_id, Role::FrontDesk);
        (SharePublisher::new(store.clone()), store, doctor, desk)
    }

    async fn seed_receipt(store: &Store, clinic_id: ClinicId, number: &str) -> Receipt {
        let receipt = Receipt {
            id: ReceiptId::new(),
            clinic_id,
            visit_id: None,
            receipt_number: number.to_string(),
            patient: PatientSnapshot {
                name: "Asha Rao".to_string(),
                phone: "555-0100".to_string(),
                age: None,
                gender: None,
            },
            line_items: vec![LineItem {
                description: "consultation".to_string(),
                amount: 500,
            }],
            subtotal: 500,
            discount_amount: 0,
            discount_reason: None,
            total_amount: 500,
            is_paid: false,
            payment_mode: None,
            receipt_date: Utc::now().date_naive(),
            last_shared_at: None,
            created_at: Utc::now(),
        };
        store.receipt_repo().insert_unique(receipt).await.unwrap()
    }

    #[tokio::test]
    async fn test_share_sets_slot_and_stamps_receipt() {
        let (publisher, store, _, desk) = setup().await;
        let receipt = seed_receipt(&store, desk.clinic_id, "RCP-2026-0001").await;

        let before = Utc::now();
        let slot = publisher.share(&desk, receipt.id).await.unwrap();
        assert_eq!(slot.receipt_id, receipt.id);
        // Default share duration is 10 minutes
        assert!(slot.expires_at >= before + chrono::Duration::minutes(10));

        let view = publisher.read(desk.clinic_id).await.unwrap().unwrap();
        assert_eq!(view.receipt.id, receipt.id);
        assert_eq!(view.clinic_name, "City Clinic");
        assert!(view.receipt.last_shared_at.is_some());
    }

    #[tokio::test]
    async fn test_share_supersedes_previous() {
        let (publisher, store, _, desk) = setup().await;
        let first = seed_receipt(&store, desk.clinic_id, "RCP-2026-0001").await;
        let second = seed_receipt(&store, desk.clinic_id, "RCP-2026-0002").await;

        publisher.share(&desk, first.id).await.unwrap();
        publisher.share(&desk, second.id).await.unwrap();

        let view = publisher.read(desk.clinic_id).await.unwrap().unwrap();
        assert_eq!(view.receipt.id, second.id);
    }

    #[tokio::test]
    async fn test_share_foreign_receipt_is_not_found() {
        let (publisher, store, _, desk) = setup().await;
        let other = Clinic::new("Other", "9 Side St", "555-0199");
        let other_id = other.id;
        store.clinic_repo().create(other).await.unwrap();
        let foreign = seed_receipt(&store, other_id, "RCP-2026-0001").await;

        let err = publisher.share(&desk, foreign.id).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(publisher.read(desk.clinic_id).await.unwrap().is_none());
        // The failed share must not stamp the other clinic's receipt
        let foreign = store
            .receipt_repo()
            .find_by_id(other_id, foreign.id)
            .await
            .unwrap();
        assert!(foreign.last_shared_at.is_none());
    }

    #[tokio::test]
    async fn test_failed_share_leaves_slot_empty() {
        let (publisher, store, _, desk) = setup().await;

        let err = publisher.share(&desk, ReceiptId::new()).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        let slot = store.clinic_repo().shared_slot(desk.clinic_id).await.unwrap();
        assert!(slot.is_none());
    }

    #[tokio::test]
    async fn test_expired_slot_reads_empty_and_clears_once() {
        let (publisher, store, _, desk) = setup().await;
        let receipt = seed_receipt(&store, desk.clinic_id, "RCP-2026-0001").await;
        publisher.share(&desk, receipt.id).await.unwrap();

        // Force the slot into the past
        let expired = SharedReceiptSlot {
            receipt_id: receipt.id,
            expires_at: Utc::now() - chrono::Duration::minutes(1),
        };
        store
            .clinic_repo()
            .set_shared_slot(desk.clinic_id, expired)
            .await
            .unwrap();

        assert!(publisher.read(desk.clinic_id).await.unwrap().is_none());
        // Slot is physically gone after the lazy clear
        let slot = store.clinic_repo().shared_slot(desk.clinic_id).await.unwrap();
        assert!(slot.is_none());
        // Further reads stay empty
        assert!(publisher.read(desk.clinic_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleted_receipt_reads_empty() {
        let (publisher, store, _, desk) = setup().await;
        let receipt = seed_receipt(&store, desk.clinic_id, "RCP-2026-0001").await;
        publisher.share(&desk, receipt.id).await.unwrap();
        store
            .receipt_repo()
            .delete(desk.clinic_id, receipt.id)
            .await
            .unwrap();

        assert!(publisher.read(desk.clinic_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (publisher, store, _, desk) = setup().await;
        let receipt = seed_receipt(&store, desk.clinic_id, "RCP-2026-0001").await;
        publisher.share(&desk, receipt.id).await.unwrap();

        publisher.clear(&desk).await.unwrap();
        assert!(publisher.read(desk.clinic_id).await.unwrap().is_none());
        // Clearing an already-empty slot succeeds
        publisher.clear(&desk).await.unwrap();
    }

    #[tokio::test]
    async fn test_settings_update_is_doctor_only_and_validated() {
        let (publisher, _, doctor, desk) = setup().await;

        let update = ClinicSettingsUpdate {
            share_duration_minutes: Some(30),
            ..Default::default()
        };
        let err = publisher
            .update_settings(&desk, update.clone())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");

        let clinic = publisher.update_settings(&doctor, update).await.unwrap();
        assert_eq!(clinic.share_duration_minutes, 30);

        let err = publisher
            .update_settings(
                &doctor,
                ClinicSettingsUpdate {
                    share_duration_minutes: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_new_share_duration_drives_expiry() {
        let (publisher, store, doctor, desk) = setup().await;
        publisher
            .update_settings(
                &doctor,
                ClinicSettingsUpdate {
                    share_duration_minutes: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let receipt = seed_receipt(&store, desk.clinic_id, "RCP-2026-0001").await;
        let before = Utc::now();
        let slot = publisher.share(&desk, receipt.id).await.unwrap();
        assert!(slot.expires_at <= before + chrono::Duration::minutes(6));
        assert!(slot.expires_at >= before + chrono::Duration::minutes(5));
    }
}
