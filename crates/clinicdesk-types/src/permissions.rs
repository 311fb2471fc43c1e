//! Role permission table
//!
//! One enumerated table keyed by (operation, role), consulted once per
//! request, instead of role conditionals scattered through handlers. The
//! state-dependent legality of a transition stays with
//! [`crate::VisitStatus`]; this table answers only "may this role attempt
//! the operation at all".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CoreError, Role};

/// Every role-gated operation the core exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateVisit,
    StartConsultation,
    CancelVisit,
    DeleteVisit,
    WritePrescription,
    FinalizePrescription,
    CreateReceipt,
    MarkReceiptPaid,
    DeleteReceipt,
    ShareReceipt,
    ClearSharedReceipt,
    UpdateClinicSettings,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateVisit => "create visit",
            Self::StartConsultation => "start consultation",
            Self::CancelVisit => "cancel visit",
            Self::DeleteVisit => "delete visit",
            Self::WritePrescription => "write prescription",
            Self::FinalizePrescription => "finalize prescription",
            Self::CreateReceipt => "create receipt",
            Self::MarkReceiptPaid => "mark receipt paid",
            Self::DeleteReceipt => "delete receipt",
            Self::ShareReceipt => "share receipt",
            Self::ClearSharedReceipt => "clear shared receipt",
            Self::UpdateClinicSettings => "update clinic settings",
        };
        write!(f, "{name}")
    }
}

/// The permission table
pub fn is_allowed(operation: Operation, role: Role) -> bool {
    use Operation::*;
    match operation {
        // Either role
        CreateVisit | CreateReceipt | MarkReceiptPaid | ShareReceipt | ClearSharedReceipt => true,

        // Doctor only
        StartConsultation
        | DeleteVisit
        | WritePrescription
        | FinalizePrescription
        | DeleteReceipt
        | UpdateClinicSettings => role == Role::Doctor,

        // Front desk only
        CancelVisit => role == Role::FrontDesk,
    }
}

/// Fail with `Forbidden` unless the table allows the operation
pub fn require(operation: Operation, role: Role) -> crate::Result<()> {
    if is_allowed(operation, role) {
        Ok(())
    } else {
        Err(CoreError::forbidden(
            operation.to_string(),
            role.to_string(),
        ))
    }
}
