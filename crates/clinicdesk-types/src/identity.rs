//! Identity types for ClinicDesk
//!
//! All identity types are strongly typed wrappers around UUIDs to prevent
//! accidental mixing of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix)
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

// Tenant identity
define_id_type!(ClinicId, "clinic", "Unique identifier for a clinic tenant");
define_id_type!(UserId, "user", "Unique identifier for a clinic staff member");

// Encounter identity types
define_id_type!(VisitId, "visit", "Unique identifier for a patient visit");
define_id_type!(
    PrescriptionId,
    "rx",
    "Unique identifier for a prescription attached to a visit"
);
define_id_type!(ReceiptId, "rcpt", "Unique identifier for a billing receipt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = VisitId::new();
        let shown = id.to_string();
        assert!(shown.starts_with("visit_"));
        assert_eq!(VisitId::parse(&shown).unwrap(), id);
    }

    #[test]
    fn test_parse_without_prefix() {
        let raw = Uuid::new_v4();
        let id = ClinicId::parse(&raw.to_string()).unwrap();
        assert_eq!(*id.as_uuid(), raw);
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // Compile-time guarantee; just exercise conversion paths
        let uuid = Uuid::new_v4();
        let clinic = ClinicId::from_uuid(uuid);
        let user = UserId::from_uuid(uuid);
        assert_eq!(clinic.as_uuid(), user.as_uuid());
    }
}
