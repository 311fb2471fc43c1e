//! ClinicDesk Types - Canonical domain types for the clinic front-desk core
//!
//! This crate contains all foundational types for ClinicDesk with zero
//! dependencies on other clinicdesk crates. It defines the type system for:
//!
//! - Identity types (ClinicId, VisitId, ReceiptId, etc.)
//! - Roles and the resolved caller context
//! - Clinic tenants and the embedded shared-receipt slot
//! - Visits, prescriptions and their lifecycle states
//! - Receipts with derived billing arithmetic
//! - Calendar helpers used by every sequence scope and filter
//!
//! # Architectural Invariants
//!
//! 1. Token numbers are assigned exactly once, never reused within a
//!    (clinic, day) scope
//! 2. Receipt numbers are assigned exactly once, never reused within a
//!    (clinic, year) scope
//! 3. Receipt totals are always derived from line items, never supplied
//! 4. Cross-tenant lookups are indistinguishable from absent records

pub mod calendar;
pub mod clinic;
pub mod error;
pub mod identity;
pub mod permissions;
pub mod prescription;
pub mod receipt;
pub mod role;
pub mod visit;

pub use calendar::*;
pub use clinic::*;
pub use error::*;
pub use identity::*;
pub use permissions::{is_allowed, Operation};
pub use prescription::*;
pub use receipt::*;
pub use role::*;
pub use visit::*;
