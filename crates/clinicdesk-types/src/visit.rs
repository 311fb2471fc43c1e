//! Patient visits and the visit lifecycle states
//!
//! The legality of a status change is defined here, next to the status
//! enum, so the lifecycle guard has a single source of truth. Role gating
//! for each transition lives with the services consuming these types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ClinicId, UserId, VisitId};

/// Patient details captured at check-in. Snapshot, not a registry reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Other,
}

/// Visit lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    /// Initial state: patient holds a token and waits
    Waiting,
    /// Doctor has taken the patient in
    InConsultation,
    /// Terminal: consultation finished (via prescription finalize)
    Completed,
    /// Terminal: visit abandoned before consultation
    Cancelled,
}

impl VisitStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The lifecycle legality table
    pub fn can_transition_to(&self, next: VisitStatus) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::InConsultation)
                | (Self::Waiting, Self::Cancelled)
                | (Self::InConsultation, Self::Completed)
        )
    }

    /// Receipt generation is permitted during or after consultation
    pub fn allows_receipt(&self) -> bool {
        matches!(self, Self::InConsultation | Self::Completed)
    }

    /// Prescription writing is permitted only during consultation
    pub fn allows_prescription(&self) -> bool {
        matches!(self, Self::InConsultation)
    }

    /// Cancellation is permitted only while waiting
    pub fn allows_cancellation(&self) -> bool {
        matches!(self, Self::Waiting)
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::InConsultation => write!(f, "in_consultation"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One patient encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub clinic_id: ClinicId,
    pub patient: PatientSnapshot,
    /// Reason for the visit as given at check-in
    pub reason: String,
    /// Calendar day the token belongs to
    pub visit_date: NaiveDate,
    /// Positive, unique within (clinic_id, visit_date), assigned once
    pub token_number: u32,
    pub status: VisitStatus,
    /// Set when entering consultation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consulted_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Visit {
    /// Create a waiting visit holding the given token
    pub fn new(
        clinic_id: ClinicId,
        patient: PatientSnapshot,
        reason: impl Into<String>,
        visit_date: NaiveDate,
        token_number: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VisitId::new(),
            clinic_id,
            patient,
            reason: reason.into(),
            visit_date,
            token_number,
            status: VisitStatus::Waiting,
            consulted_by: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}
