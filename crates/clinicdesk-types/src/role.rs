//! Roles and the resolved caller context
//!
//! Every core operation is parameterized by the `AuthContext` that the
//! access guard resolves for the request. Token verification itself lives
//! outside this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ClinicId, UserId};

/// Staff roles within a clinic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Consulting doctor
    Doctor,
    /// Front-desk / reception staff
    FrontDesk,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doctor => write!(f, "doctor"),
            Self::FrontDesk => write!(f, "frontdesk"),
        }
    }
}

/// Resolved identity for an authenticated request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Acting user
    pub user_id: UserId,
    /// Clinic the user belongs to
    pub clinic_id: ClinicId,
    /// Role within the clinic
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: UserId, clinic_id: ClinicId, role: Role) -> Self {
        Self {
            user_id,
            clinic_id,
            role,
        }
    }
}
