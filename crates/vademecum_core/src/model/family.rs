//! Content family enumeration.
//!
//! # Responsibility
//! - Name every reference-content family the backend stores.
//! - Validate family slugs at the boundary (CLI, API, serialized form).
//!
//! # Invariants
//! - The set of families is closed; unknown slugs are rejected, never mapped
//!   to a default.
//! - `as_str()` and `FromStr` round-trip for every variant.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Reference-content family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Legal codes (`codigos`).
    #[serde(rename = "codigos")]
    Codes,
    /// Statutes (`estatutos`).
    #[serde(rename = "estatutos")]
    Statutes,
    /// Ordinary laws (`leis`).
    #[serde(rename = "leis")]
    Laws,
    /// Jurisprudence statements (`jurisprudencia`).
    #[serde(rename = "jurisprudencia")]
    Jurisprudence,
    /// Constitutional articles (`constituicao`).
    #[serde(rename = "constituicao")]
    Constitution,
    /// Professional-exam content (`oab`).
    #[serde(rename = "oab")]
    Exam,
}

impl Family {
    /// Every family, in registry order.
    pub const ALL: [Family; 6] = [
        Family::Codes,
        Family::Statutes,
        Family::Laws,
        Family::Jurisprudence,
        Family::Constitution,
        Family::Exam,
    ];

    /// Stable slug used at every external boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Codes => "codigos",
            Self::Statutes => "estatutos",
            Self::Laws => "leis",
            Self::Jurisprudence => "jurisprudencia",
            Self::Constitution => "constituicao",
            Self::Exam => "oab",
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a slug does not name a known family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyParseError {
    pub value: String,
}

impl Display for FamilyParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let accepted = Family::ALL
            .iter()
            .map(|family| family.as_str())
            .collect::<Vec<_>>()
            .join("|");
        write!(
            f,
            "unknown content family `{}`; expected {accepted}",
            self.value
        )
    }
}

impl Error for FamilyParseError {}

impl FromStr for Family {
    type Err = FamilyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Family::ALL
            .into_iter()
            .find(|family| family.as_str() == normalized)
            .ok_or_else(|| FamilyParseError {
                value: value.trim().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::Family;

    #[test]
    fn slugs_round_trip() {
        for family in Family::ALL {
            assert_eq!(family.as_str().parse::<Family>().unwrap(), family);
        }
    }

    #[test]
    fn parse_trims_and_ignores_case() {
        assert_eq!(" Jurisprudencia ".parse::<Family>().unwrap(), Family::Jurisprudence);
        assert_eq!("OAB".parse::<Family>().unwrap(), Family::Exam);
    }

    #[test]
    fn unknown_slug_lists_accepted_values() {
        let err = "cursos".parse::<Family>().unwrap_err();
        assert_eq!(err.value, "cursos");
        assert!(err.to_string().contains("codigos|estatutos|leis"));
    }
}
