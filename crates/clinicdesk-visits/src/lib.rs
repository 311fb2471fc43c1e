//! ClinicDesk Visit Lifecycle
//!
//! The state machine governing a visit's status and the role-gated
//! transitions available at each state:
//!
//! ```text
//! waiting ──doctor──► in_consultation ──finalize──► completed
//!    │
//!    └──frontdesk──► cancelled
//! ```
//!
//! Completed and cancelled are terminal. Completion is never requested
//! directly; it is driven by finalizing the visit's prescription (see
//! [`prescriptions`]), which updates prescription and visit as one atomic
//! unit. A doctor may delete any non-terminal bookkeeping mistake, which
//! cascades to the visit's prescription and receipts.

pub mod prescriptions;

use chrono::{NaiveDate, Utc};

use clinicdesk_sequence::{retry_unique_insert, SequenceAllocator};
use clinicdesk_store::Store;
use clinicdesk_types::{
    calendar, permissions, AuthContext, CoreError, Operation, PatientSnapshot, Result, Visit,
    VisitId, VisitStatus,
};

pub use prescriptions::PrescriptionContent;

/// Visit operations over the shared store
#[derive(Clone)]
pub struct VisitService {
    store: Store,
    allocator: SequenceAllocator,
}

impl VisitService {
    pub fn new(store: Store) -> Self {
        let allocator = SequenceAllocator::new(store.clone());
        Self { store, allocator }
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    /// Check in a patient: allocate today's next token and create the
    /// visit in `waiting`. The uniqueness-enforcing insert runs last,
    /// after validation, and is retried on allocation races.
    pub async fn create_visit(
        &self,
        ctx: &AuthContext,
        patient: PatientSnapshot,
        reason: String,
    ) -> Result<Visit> {
        permissions::require(Operation::CreateVisit, ctx.role)?;

        if patient.name.trim().is_empty() {
            return Err(CoreError::validation("patient.name", "must not be empty"));
        }
        if reason.trim().is_empty() {
            return Err(CoreError::validation("reason", "must not be empty"));
        }

        let visit_date = calendar::day_of(Utc::now());
        let clinic_id = ctx.clinic_id;
        let scope = format!("{clinic_id}/{visit_date}");

        let visit = retry_unique_insert(&scope, || async {
            let token = self.allocator.next_token(clinic_id, visit_date).await;
            let visit = Visit::new(clinic_id, patient.clone(), reason.clone(), visit_date, token);
            self.store.visit_repo().insert_unique(visit).await
        })
        .await?;

        tracing::info!(
            visit_id = %visit.id,
            token = visit.token_number,
            %visit_date,
            "visit created"
        );
        Ok(visit)
    }

    pub async fn get_visit(&self, ctx: &AuthContext, id: VisitId) -> Result<Visit> {
        self.store
            .visit_repo()
            .find_by_id(ctx.clinic_id, id)
            .await
            .ok_or_else(|| CoreError::not_found("visit"))
    }

    /// Live visits for one day, in token order. Defaults to today.
    pub async fn list_visits(&self, ctx: &AuthContext, day: Option<NaiveDate>) -> Vec<Visit> {
        let day = day.unwrap_or_else(|| calendar::day_of(Utc::now()));
        self.store.visit_repo().list_by_day(ctx.clinic_id, day).await
    }

    /// Request a status transition.
    ///
    /// `completed` cannot be requested here; it is only reached through
    /// prescription finalization. The legality check and the mutation run
    /// under the store's write lock, so a racing request observes either
    /// the old or the new state, never a half-applied one.
    pub async fn transition(
        &self,
        ctx: &AuthContext,
        id: VisitId,
        new_status: VisitStatus,
    ) -> Result<Visit> {
        let operation = match new_status {
            VisitStatus::InConsultation => Operation::StartConsultation,
            VisitStatus::Cancelled => Operation::CancelVisit,
            VisitStatus::Completed => {
                return Err(CoreError::validation(
                    "status",
                    "completed is reached by finalizing the prescription",
                ));
            }
            VisitStatus::Waiting => {
                return Err(CoreError::validation(
                    "status",
                    "waiting is the initial state and cannot be requested",
                ));
            }
        };
        permissions::require(operation, ctx.role)?;

        let user_id = ctx.user_id;
        let updated = self
            .store
            .visit_repo()
            .update(ctx.clinic_id, id, |visit| {
                if !visit.status.can_transition_to(new_status) {
                    return Err(CoreError::InvalidTransition {
                        from: visit.status.to_string(),
                        to: new_status.to_string(),
                    });
                }
                if new_status == VisitStatus::InConsultation {
                    visit.consulted_by = Some(user_id);
                }
                visit.status = new_status;
                visit.updated_at = Utc::now();
                Ok(visit.clone())
            })
            .await?;

        tracing::info!(visit_id = %id, status = %new_status, "visit transitioned");
        Ok(updated)
    }

    /// Delete a non-terminal visit and everything that exists only in
    /// reference to it. Tokens already allocated stay burned.
    pub async fn delete_visit(&self, ctx: &AuthContext, id: VisitId) -> Result<Visit> {
        permissions::require(Operation::DeleteVisit, ctx.role)?;
        let visit = self
            .store
            .visit_repo()
            .delete_cascade(ctx.clinic_id, id, |visit| {
                if visit.status.is_terminal() {
                    return Err(CoreError::InvalidTransition {
                        from: visit.status.to_string(),
                        to: "deleted".to_string(),
                    });
                }
                Ok(())
            })
            .await?;
        tracing::info!(visit_id = %id, "visit deleted with cascade");
        Ok(visit)
    }
}
