use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(TreatmentCategory {
    Botox => "botox",
    Filler => "filler",
    Laser => "laser",
    Peeling => "peeling",
    Facial => "facial",
    Consultation => "consultation",
});

impl TreatmentCategory {
    /// Human form used when rendering reminder templates.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Botox => "Botox",
            Self::Filler => "Filler",
            Self::Laser => "Laser",
            Self::Peeling => "Peeling",
            Self::Facial => "Facial",
            Self::Consultation => "Consultation",
        }
    }
}

str_enum!(InvoiceStatus {
    Open => "open",
    Paid => "paid",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn treatment_category_round_trip() {
        for (variant, s) in [
            (TreatmentCategory::Botox, "botox"),
            (TreatmentCategory::Filler, "filler"),
            (TreatmentCategory::Laser, "laser"),
            (TreatmentCategory::Peeling, "peeling"),
            (TreatmentCategory::Facial, "facial"),
            (TreatmentCategory::Consultation, "consultation"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(TreatmentCategory::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invoice_status_round_trip() {
        for (variant, s) in [(InvoiceStatus::Open, "open"), (InvoiceStatus::Paid, "paid")] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(InvoiceStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn labels_are_capitalized() {
        assert_eq!(TreatmentCategory::Botox.label(), "Botox");
        assert_eq!(TreatmentCategory::Consultation.label(), "Consultation");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(TreatmentCategory::from_str("massage").is_err());
        assert!(InvoiceStatus::from_str("").is_err());
    }

    #[test]
    fn json_matches_storage_token() {
        let json = serde_json::to_string(&TreatmentCategory::Laser).unwrap();
        assert_eq!(json, "\"laser\"");
        let back: TreatmentCategory = serde_json::from_str("\"laser\"").unwrap();
        assert_eq!(back, TreatmentCategory::Laser);
    }
}
