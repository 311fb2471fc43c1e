//! Prescriptions: one draft per visit, finalize completes the visit
//!
//! Writing requires the visit to be `in_consultation`; edits require the
//! prescription to still be a draft. Finalization mutates prescription and
//! visit under the same write locks, so either both records advance or
//! neither does.

use chrono::Utc;

use clinicdesk_store::StoreError;
use clinicdesk_types::{
    permissions, AuthContext, CoreError, MedicationLine, Operation, Prescription,
    PrescriptionStatus, Result, VisitId, VisitStatus,
};

use crate::VisitService;

/// The doctor-editable portion of a prescription
#[derive(Debug, Clone, Default)]
pub struct PrescriptionContent {
    pub diagnosis: Option<String>,
    pub medications: Vec<MedicationLine>,
    pub advice: Option<String>,
}

impl PrescriptionContent {
    fn apply_to(self, rx: &mut Prescription) {
        rx.diagnosis = self.diagnosis;
        rx.medications = self.medications;
        rx.advice = self.advice;
        rx.updated_at = Utc::now();
    }
}

impl VisitService {
    /// Create the visit's draft prescription. Fails if the visit is not in
    /// consultation or already has one.
    pub async fn create_prescription(
        &self,
        ctx: &AuthContext,
        visit_id: VisitId,
        content: PrescriptionContent,
    ) -> Result<Prescription> {
        permissions::require(Operation::WritePrescription, ctx.role)?;

        let visit = self.get_visit(ctx, visit_id).await?;
        if !visit.status.allows_prescription() {
            return Err(CoreError::validation(
                "visit.status",
                "prescriptions can only be written during consultation",
            ));
        }

        let mut rx = Prescription::new_draft(ctx.clinic_id, visit_id);
        content.apply_to(&mut rx);

        let rx = self
            .store()
            .prescription_repo()
            .insert_for_visit(rx)
            .await
            .map_err(|err| match err {
                StoreError::Duplicate { .. } => CoreError::PrescriptionAlreadyExists {
                    visit_id: visit_id.to_string(),
                },
                other => other.into(),
            })?;

        tracing::info!(visit_id = %visit_id, prescription_id = %rx.id, "prescription drafted");
        Ok(rx)
    }

    pub async fn get_prescription(
        &self,
        ctx: &AuthContext,
        visit_id: VisitId,
    ) -> Result<Prescription> {
        // Resolve the visit first so a foreign visit id reads as absent
        self.get_visit(ctx, visit_id).await?;
        self.store()
            .prescription_repo()
            .find_by_visit(ctx.clinic_id, visit_id)
            .await
            .ok_or_else(|| CoreError::not_found("prescription"))
    }

    /// Replace the draft's content. Finalized prescriptions are immutable.
    pub async fn update_prescription(
        &self,
        ctx: &AuthContext,
        visit_id: VisitId,
        content: PrescriptionContent,
    ) -> Result<Prescription> {
        permissions::require(Operation::WritePrescription, ctx.role)?;

        self.store()
            .prescription_repo()
            .update_by_visit(ctx.clinic_id, visit_id, |rx| {
                if !rx.is_editable() {
                    return Err(CoreError::InvalidTransition {
                        from: rx.status.to_string(),
                        to: "draft edit".to_string(),
                    });
                }
                content.apply_to(rx);
                Ok(rx.clone())
            })
            .await
    }

    /// Finalize the draft and complete the owning visit atomically.
    ///
    /// A second finalize reports `InvalidTransition`; the records are
    /// untouched when any check fails.
    pub async fn finalize_prescription(
        &self,
        ctx: &AuthContext,
        visit_id: VisitId,
    ) -> Result<Prescription> {
        permissions::require(Operation::FinalizePrescription, ctx.role)?;

        let rx = self
            .store()
            .update_visit_with_prescription(ctx.clinic_id, visit_id, |visit, rx| {
                if rx.status == PrescriptionStatus::Finalized {
                    return Err(CoreError::InvalidTransition {
                        from: PrescriptionStatus::Finalized.to_string(),
                        to: PrescriptionStatus::Finalized.to_string(),
                    });
                }
                if !visit.status.can_transition_to(VisitStatus::Completed) {
                    return Err(CoreError::InvalidTransition {
                        from: visit.status.to_string(),
                        to: VisitStatus::Completed.to_string(),
                    });
                }

                let now = Utc::now();
                rx.status = PrescriptionStatus::Finalized;
                rx.finalized_at = Some(now);
                rx.updated_at = now;
                visit.status = VisitStatus::Completed;
                visit.completed_at = Some(now);
                visit.updated_at = now;
                Ok(rx.clone())
            })
            .await?;

        tracing::info!(visit_id = %visit_id, "prescription finalized, visit completed");
        Ok(rx)
    }
}
