//! Typed identifiers for the two entities that participate in keys
//! across tables (dispatch ledger, due-set ordering). Everything else
//! keeps a plain `Uuid`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(ClinicId);
id_type!(PatientId);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_display_and_from_str() {
        let id = ClinicId::new();
        let parsed = ClinicId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let id = PatientId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn rejects_garbage() {
        assert!(ClinicId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn orders_by_uuid_bytes() {
        let a = PatientId::from_uuid(Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap());
        let b = PatientId::from_uuid(Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap());
        assert!(a < b);
    }
}
