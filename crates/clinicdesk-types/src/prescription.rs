//! Prescriptions attached to visits
//!
//! At most one prescription exists per visit. A prescription is editable
//! only while `Draft`; finalizing it is the action that drives the owning
//! visit to `Completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ClinicId, PrescriptionId, VisitId};

/// Prescription lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    /// Editable working copy
    Draft,
    /// Immutable; the owning visit completed in the same step
    Finalized,
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// One medication line on a prescription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationLine {
    pub name: String,
    /// e.g. "500mg"
    pub dosage: String,
    /// e.g. "1-0-1 after food"
    pub schedule: String,
    /// e.g. "5 days"
    pub duration: String,
}

/// The prescription document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub clinic_id: ClinicId,
    /// Owning visit (back-reference; the visit never points here)
    pub visit_id: VisitId,
    pub status: PrescriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    pub medications: Vec<MedicationLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Prescription {
    /// Create a draft prescription for a visit
    pub fn new_draft(clinic_id: ClinicId, visit_id: VisitId) -> Self {
        let now = Utc::now();
        Self {
            id: PrescriptionId::new(),
            clinic_id,
            visit_id,
            status: PrescriptionStatus::Draft,
            diagnosis: None,
            medications: Vec::new(),
            advice: None,
            created_at: now,
            updated_at: now,
            finalized_at: None,
        }
    }

    /// Whether the prescription can still be edited
    pub fn is_editable(&self) -> bool {
        self.status == PrescriptionStatus::Draft
    }
}
