//! Clinic tenant and the embedded shared-receipt slot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClinicId, ReceiptId};

/// Bounds and default for the kiosk share duration (minutes)
pub const SHARE_DURATION_MIN: u32 = 1;
pub const SHARE_DURATION_MAX: u32 = 60;
pub const SHARE_DURATION_DEFAULT: u32 = 10;

/// At most one outstanding shared-receipt pointer per clinic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedReceiptSlot {
    /// Receipt currently projected on the kiosk
    pub receipt_id: ReceiptId,
    /// Moment the slot stops being visible
    pub expires_at: DateTime<Utc>,
}

impl SharedReceiptSlot {
    /// A slot is active only while its expiry lies in the future
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Tenant root. Owns users, visits and receipts; never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: ClinicId,
    /// Display name
    pub name: String,
    /// Postal address shown on receipts
    pub address: String,
    /// Contact phone
    pub phone: String,
    /// Single ephemeral kiosk pointer
    pub shared_receipt_slot: Option<SharedReceiptSlot>,
    /// How long a shared receipt stays visible (1-60 minutes)
    pub share_duration_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Clinic {
    /// Create a new clinic with default settings
    pub fn new(name: impl Into<String>, address: impl Into<String>, phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ClinicId::new(),
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
            shared_receipt_slot: None,
            share_duration_minutes: SHARE_DURATION_DEFAULT,
            created_at: now,
            updated_at: now,
        }
    }

    /// Share duration clamped into the allowed range
    pub fn share_duration(&self) -> chrono::Duration {
        let minutes = self
            .share_duration_minutes
            .clamp(SHARE_DURATION_MIN, SHARE_DURATION_MAX);
        chrono::Duration::minutes(i64::from(minutes))
    }
}
