//! Visit repository
//!
//! Owns the (clinic, visit_date, token_number) unique index. The index
//! keeps entries for deleted visits so a token is never handed out twice
//! within a day, even after the visit holding the day's maximum is deleted.

use std::sync::Arc;

use chrono::NaiveDate;

use clinicdesk_types::{ClinicId, Visit, VisitId};

use crate::error::{StoreError, StoreResult};
use crate::Collections;

pub struct VisitRepo {
    inner: Arc<Collections>,
}

impl VisitRepo {
    pub(crate) fn new(inner: Arc<Collections>) -> Self {
        Self { inner }
    }

    /// Insert a visit, enforcing token uniqueness.
    ///
    /// The index check and the document write happen under the same write
    /// locks; a concurrent caller that computed the same token observes
    /// [`StoreError::Duplicate`] and must retry with a fresh maximum.
    pub async fn insert_unique(&self, visit: Visit) -> StoreResult<Visit> {
        let mut visits = self.inner.visits.write().await;
        let mut token_index = self.inner.token_index.write().await;

        let key = (visit.clinic_id, visit.visit_date, visit.token_number);
        if !token_index.insert(key) {
            return Err(StoreError::duplicate(
                "visit_token",
                format!("{}/{}/{}", key.0, key.1, key.2),
            ));
        }
        visits.insert(visit.id, visit.clone());
        Ok(visit)
    }

    pub async fn find_by_id(&self, clinic_id: ClinicId, id: VisitId) -> Option<Visit> {
        let visits = self.inner.visits.read().await;
        visits
            .get(&id)
            .filter(|v| v.clinic_id == clinic_id)
            .cloned()
    }

    /// Highest token ever allocated for the day, deleted visits included
    pub async fn max_token(&self, clinic_id: ClinicId, day: NaiveDate) -> u32 {
        let token_index = self.inner.token_index.read().await;
        token_index
            .iter()
            .filter(|(c, d, _)| *c == clinic_id && *d == day)
            .map(|(_, _, token)| *token)
            .max()
            .unwrap_or(0)
    }

    /// Live visits for a day, in token order
    pub async fn list_by_day(&self, clinic_id: ClinicId, day: NaiveDate) -> Vec<Visit> {
        let visits = self.inner.visits.read().await;
        let mut day_visits: Vec<Visit> = visits
            .values()
            .filter(|v| v.clinic_id == clinic_id && v.visit_date == day)
            .cloned()
            .collect();
        day_visits.sort_by_key(|v| v.token_number);
        day_visits
    }

    /// Apply a mutation to one visit under the collection's write lock.
    /// The closure failing leaves the document untouched.
    pub async fn update<T>(
        &self,
        clinic_id: ClinicId,
        id: VisitId,
        f: impl FnOnce(&mut Visit) -> clinicdesk_types::Result<T>,
    ) -> clinicdesk_types::Result<T> {
        let mut visits = self.inner.visits.write().await;
        let visit = visits
            .get_mut(&id)
            .filter(|v| v.clinic_id == clinic_id)
            .ok_or_else(|| clinicdesk_types::CoreError::not_found("visit"))?;

        let mut draft = visit.clone();
        let out = f(&mut draft)?;
        *visit = draft;
        Ok(out)
    }

    /// Delete a visit together with its prescription and receipts.
    ///
    /// The guard closure inspects the visit under the write locks; the
    /// cascade only proceeds when it returns Ok, so a racing transition
    /// cannot slip between check and delete. Dependents go first, the root
    /// last; deleting an already-absent dependent is a no-op, so a retried
    /// cascade is idempotent. Token and receipt-number index entries are
    /// retained (numbers are never reused).
    pub async fn delete_cascade(
        &self,
        clinic_id: ClinicId,
        id: VisitId,
        guard: impl FnOnce(&Visit) -> clinicdesk_types::Result<()>,
    ) -> clinicdesk_types::Result<Visit> {
        let mut visits = self.inner.visits.write().await;
        let mut prescriptions = self.inner.prescriptions.write().await;
        let mut receipts = self.inner.receipts.write().await;
        let mut by_visit = self.inner.prescription_by_visit.write().await;

        let visit = visits
            .get(&id)
            .filter(|v| v.clinic_id == clinic_id)
            .ok_or_else(|| clinicdesk_types::CoreError::not_found("visit"))?;
        guard(visit)?;

        if let Some(rx_id) = by_visit.remove(&id) {
            prescriptions.remove(&rx_id);
        }
        receipts.retain(|_, r| r.visit_id != Some(id));

        let visit = visits.remove(&id).expect("presence checked above");
        Ok(visit)
    }
}
