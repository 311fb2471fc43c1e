//! ClinicDesk Document Store
//!
//! In-process document store for the clinic core. The storage contract the
//! services rely on is small: atomic single-document read-modify-write and
//! unique-constraint enforcement. Both are provided here directly:
//!
//! - every mutation happens under one write lock on the owning collection,
//!   so a document update is always a single atomic write;
//! - unique indexes on (clinic, visit_date, token_number) and
//!   (clinic, receipt_number) reject duplicate inserts with
//!   [`StoreError::Duplicate`], which is what the allocation retry loops
//!   key on.
//!
//! The indexes retain entries for deleted documents. Token and receipt
//! numbers are never reused, even after a doctor deletes the row that held
//! the current maximum, because the allocators derive "next" from the index
//! rather than from live documents.
//!
//! # Repository Pattern
//!
//! Each domain has its own repository with CRUD and domain-specific
//! queries, all sharing the same collections.
//!
//! # Tenant isolation
//!
//! Every scoped lookup takes a `ClinicId`; a document owned by another
//! clinic is indistinguishable from an absent one.

pub mod error;
pub mod repos;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use clinicdesk_types::{
    Clinic, ClinicId, Prescription, PrescriptionId, Receipt, ReceiptId, Visit, VisitId,
};

pub use error::{StoreError, StoreResult};
pub use repos::{ClinicRepo, PrescriptionRepo, ReceiptRepo, VisitRepo};

/// Shared collections behind the repositories
pub(crate) struct Collections {
    pub(crate) clinics: RwLock<HashMap<ClinicId, Clinic>>,
    pub(crate) visits: RwLock<HashMap<VisitId, Visit>>,
    pub(crate) prescriptions: RwLock<HashMap<PrescriptionId, Prescription>>,
    pub(crate) receipts: RwLock<HashMap<ReceiptId, Receipt>>,
    /// Every token ever allocated, deleted visits included
    pub(crate) token_index: RwLock<HashSet<(ClinicId, NaiveDate, u32)>>,
    /// Every receipt number ever allocated, deleted receipts included
    pub(crate) receipt_number_index: RwLock<HashSet<(ClinicId, String)>>,
    /// One prescription per visit
    pub(crate) prescription_by_visit: RwLock<HashMap<VisitId, PrescriptionId>>,
}

/// The ClinicDesk document store
#[derive(Clone)]
pub struct Store {
    inner: Arc<Collections>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Collections {
                clinics: RwLock::new(HashMap::new()),
                visits: RwLock::new(HashMap::new()),
                prescriptions: RwLock::new(HashMap::new()),
                receipts: RwLock::new(HashMap::new()),
                token_index: RwLock::new(HashSet::new()),
                receipt_number_index: RwLock::new(HashSet::new()),
                prescription_by_visit: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create repository instances
    pub fn clinic_repo(&self) -> ClinicRepo {
        ClinicRepo::new(self.inner.clone())
    }

    pub fn visit_repo(&self) -> VisitRepo {
        VisitRepo::new(self.inner.clone())
    }

    pub fn prescription_repo(&self) -> PrescriptionRepo {
        PrescriptionRepo::new(self.inner.clone())
    }

    pub fn receipt_repo(&self) -> ReceiptRepo {
        ReceiptRepo::new(self.inner.clone())
    }

    /// Apply a mutation to a visit and its prescription as one atomic unit.
    ///
    /// Both write locks are held for the duration of the closure, so either
    /// both documents observe the mutation or neither does. This is the
    /// mechanism behind prescription finalization driving the visit to
    /// completed in a single logical step.
    pub async fn update_visit_with_prescription<T>(
        &self,
        clinic_id: ClinicId,
        visit_id: VisitId,
        f: impl FnOnce(&mut Visit, &mut Prescription) -> clinicdesk_types::Result<T>,
    ) -> clinicdesk_types::Result<T> {
        let mut visits = self.inner.visits.write().await;
        let mut prescriptions = self.inner.prescriptions.write().await;
        let by_visit = self.inner.prescription_by_visit.read().await;

        let visit = visits
            .get_mut(&visit_id)
            .filter(|v| v.clinic_id == clinic_id)
            .ok_or_else(|| clinicdesk_types::CoreError::not_found("visit"))?;

        let rx_id = by_visit
            .get(&visit_id)
            .copied()
            .ok_or_else(|| clinicdesk_types::CoreError::not_found("prescription"))?;
        let prescription = prescriptions
            .get_mut(&rx_id)
            .filter(|p| p.clinic_id == clinic_id)
            .ok_or_else(|| clinicdesk_types::CoreError::not_found("prescription"))?;

        // Work on copies; commit only if the closure succeeds
        let mut visit_draft = visit.clone();
        let mut rx_draft = prescription.clone();
        let out = f(&mut visit_draft, &mut rx_draft)?;
        *visit = visit_draft;
        *prescription = rx_draft;
        Ok(out)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicdesk_types::{PatientSnapshot, PrescriptionStatus, VisitStatus};

    fn patient() -> PatientSnapshot {
        PatientSnapshot {
            name: "Asha Rao".to_string(),
            phone: "555-0100".to_string(),
            age: Some(34),
            gender: None,
        }
    }

    #[tokio::test]
    async fn test_combined_update_commits_both_or_neither() {
        let store = Store::new();
        let clinic = Clinic::new("City Clinic", "12 Main St", "555-0101");
        let clinic_id = clinic.id;
        store.clinic_repo().create(clinic).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let visit = Visit::new(clinic_id, patient(), "fever", date, 1);
        let visit_id = visit.id;
        let visit = store.visit_repo().insert_unique(visit).await.unwrap();
        assert_eq!(visit.status, VisitStatus::Waiting);

        let rx = Prescription::new_draft(clinic_id, visit_id);
        store
            .prescription_repo()
            .insert_for_visit(rx)
            .await
            .unwrap();

        // Failing closure leaves both untouched
        let err = store
            .update_visit_with_prescription(clinic_id, visit_id, |visit, rx| {
                visit.status = VisitStatus::Completed;
                rx.status = PrescriptionStatus::Finalized;
                Err::<(), _>(clinicdesk_types::CoreError::validation("status", "nope"))
            })
            .await;
        assert!(err.is_err());

        let visit = store
            .visit_repo()
            .find_by_id(clinic_id, visit_id)
            .await
            .unwrap();
        assert_eq!(visit.status, VisitStatus::Waiting);
        let rx = store
            .prescription_repo()
            .find_by_visit(clinic_id, visit_id)
            .await
            .unwrap();
        assert_eq!(rx.status, PrescriptionStatus::Draft);

        // Succeeding closure commits both
        store
            .update_visit_with_prescription(clinic_id, visit_id, |visit, rx| {
                visit.status = VisitStatus::Completed;
                rx.status = PrescriptionStatus::Finalized;
                Ok(())
            })
            .await
            .unwrap();

        let visit = store
            .visit_repo()
            .find_by_id(clinic_id, visit_id)
            .await
            .unwrap();
        assert_eq!(visit.status, VisitStatus::Completed);
    }

    #[tokio::test]
    async fn test_cross_tenant_lookup_is_absent() {
        let store = Store::new();
        let clinic_a = Clinic::new("A", "1 St", "1");
        let clinic_b = Clinic::new("B", "2 St", "2");
        let a = clinic_a.id;
        let b = clinic_b.id;
        store.clinic_repo().create(clinic_a).await.unwrap();
        store.clinic_repo().create(clinic_b).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let visit = Visit::new(a, patient(), "fever", date, 1);
        let visit_id = visit.id;
        store.visit_repo().insert_unique(visit).await.unwrap();

        assert!(store.visit_repo().find_by_id(a, visit_id).await.is_some());
        assert!(store.visit_repo().find_by_id(b, visit_id).await.is_none());
    }
}
