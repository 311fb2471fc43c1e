//! Prescription repository
//!
//! Enforces the one-prescription-per-visit constraint at insert time.

use std::sync::Arc;

use clinicdesk_types::{ClinicId, Prescription, VisitId};

use crate::error::{StoreError, StoreResult};
use crate::Collections;

pub struct PrescriptionRepo {
    inner: Arc<Collections>,
}

impl PrescriptionRepo {
    pub(crate) fn new(inner: Arc<Collections>) -> Self {
        Self { inner }
    }

    /// Insert a prescription, rejecting a second one for the same visit
    pub async fn insert_for_visit(&self, rx: Prescription) -> StoreResult<Prescription> {
        let mut prescriptions = self.inner.prescriptions.write().await;
        let mut by_visit = self.inner.prescription_by_visit.write().await;

        if by_visit.contains_key(&rx.visit_id) {
            return Err(StoreError::duplicate(
                "prescription_visit",
                rx.visit_id.to_string(),
            ));
        }
        by_visit.insert(rx.visit_id, rx.id);
        prescriptions.insert(rx.id, rx.clone());
        Ok(rx)
    }

    pub async fn find_by_visit(
        &self,
        clinic_id: ClinicId,
        visit_id: VisitId,
    ) -> Option<Prescription> {
        let by_visit = self.inner.prescription_by_visit.read().await;
        let rx_id = by_visit.get(&visit_id)?;
        let prescriptions = self.inner.prescriptions.read().await;
        prescriptions
            .get(rx_id)
            .filter(|p| p.clinic_id == clinic_id)
            .cloned()
    }

    /// Apply a mutation to the visit's prescription under the write lock
    pub async fn update_by_visit<T>(
        &self,
        clinic_id: ClinicId,
        visit_id: VisitId,
        f: impl FnOnce(&mut Prescription) -> clinicdesk_types::Result<T>,
    ) -> clinicdesk_types::Result<T> {
        let mut prescriptions = self.inner.prescriptions.write().await;
        let by_visit = self.inner.prescription_by_visit.read().await;

        let rx = by_visit
            .get(&visit_id)
            .and_then(|rx_id| prescriptions.get_mut(rx_id))
            .filter(|p| p.clinic_id == clinic_id)
            .ok_or_else(|| clinicdesk_types::CoreError::not_found("prescription"))?;

        let mut draft = rx.clone();
        let out = f(&mut draft)?;
        *rx = draft;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Store, StoreError};
    use clinicdesk_types::{ClinicId, Prescription, VisitId};

    #[tokio::test]
    async fn test_second_prescription_rejected() {
        let store = Store::new();
        let repo = store.prescription_repo();
        let clinic_id = ClinicId::new();
        let visit_id = VisitId::new();

        repo.insert_for_visit(Prescription::new_draft(clinic_id, visit_id))
            .await
            .unwrap();
        let err = repo
            .insert_for_visit(Prescription::new_draft(clinic_id, visit_id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_find_is_tenant_scoped() {
        let store = Store::new();
        let repo = store.prescription_repo();
        let clinic_id = ClinicId::new();
        let visit_id = VisitId::new();

        repo.insert_for_visit(Prescription::new_draft(clinic_id, visit_id))
            .await
            .unwrap();
        assert!(repo.find_by_visit(clinic_id, visit_id).await.is_some());
        assert!(repo.find_by_visit(ClinicId::new(), visit_id).await.is_none());
    }
}
