//! Beneficiary records, roles, and group canonicalization

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sex carried on the wire as 1 (male) or 2 (female), matching the technical
/// basis table columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Sex {
    Male,
    Female,
}

impl TryFrom<u8> for Sex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Sex::Male),
            2 => Ok(Sex::Female),
            other => Err(format!("sex must be 1 or 2, got {other}")),
        }
    }
}

impl From<Sex> for u8 {
    fn from(sex: Sex) -> u8 {
        match sex {
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }
}

/// Beneficiary role, carried on the wire as the legacy single-letter code:
/// T (primary/titular), C (spouse or partner), H (child)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "T")]
    Primary,
    #[serde(rename = "C")]
    Spouse,
    #[serde(rename = "H")]
    Child,
}

/// Raw beneficiary record as submitted by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryRecord {
    #[serde(rename = "type")]
    pub role: Role,
    pub sex: Sex,
    /// ISO birth date (YYYY-MM-DD), parsed during validation
    #[serde(rename = "birthDate")]
    pub birth_date: String,
    /// Disability flag: 0 or 1
    pub invalid: u8,
}

impl BeneficiaryRecord {
    pub fn is_disabled(&self) -> bool {
        self.invalid == 1
    }
}

/// Engine-internal beneficiary, derived once per simulation run and never
/// mutated afterwards
#[derive(Debug, Clone, Copy)]
pub struct Beneficiary {
    /// Age in months at the retirement date
    pub age_month: u32,
    pub sex: Sex,
    pub disabled: bool,
    pub role: Role,
}

/// The beneficiary group cannot form a canonical layout
#[derive(Debug, Error, PartialEq, Eq)]
#[error("beneficiary group declares more than one primary")]
pub struct InvalidGroup;

/// Reorder the raw list into the canonical layout: primary (0 or 1), then
/// spouses, then children, preserving relative order within each role.
///
/// The combinatorial engine's configuration-bit indices and its spouse/child
/// block ranges assume exactly this layout.
pub fn canonicalize(records: &[BeneficiaryRecord]) -> Result<Vec<BeneficiaryRecord>, InvalidGroup> {
    let primaries: Vec<BeneficiaryRecord> = records
        .iter()
        .filter(|r| r.role == Role::Primary)
        .cloned()
        .collect();

    if primaries.len() > 1 {
        return Err(InvalidGroup);
    }

    let spouses = records.iter().filter(|r| r.role == Role::Spouse).cloned();
    let children = records.iter().filter(|r| r.role == Role::Child).cloned();

    Ok(primaries.into_iter().chain(spouses).chain(children).collect())
}

/// Role counts of a canonical group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupShape {
    pub n: usize,
    pub spouses: usize,
    pub children: usize,
}

impl GroupShape {
    pub fn of(records: &[BeneficiaryRecord]) -> Self {
        Self {
            n: records.len(),
            spouses: records.iter().filter(|r| r.role == Role::Spouse).count(),
            children: records.iter().filter(|r| r.role == Role::Child).count(),
        }
    }

    /// A group with a primary has one member beyond its spouse/child blocks
    pub fn has_primary(&self) -> bool {
        self.n != self.spouses + self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(role: Role, birth: &str) -> BeneficiaryRecord {
        BeneficiaryRecord {
            role,
            sex: Sex::Male,
            birth_date: birth.to_string(),
            invalid: 0,
        }
    }

    #[test]
    fn test_canonical_order_is_stable_partition() {
        let raw = vec![
            record(Role::Child, "2010-01-01"),
            record(Role::Spouse, "1980-01-01"),
            record(Role::Child, "2012-01-01"),
            record(Role::Primary, "1975-01-01"),
            record(Role::Spouse, "1982-01-01"),
        ];

        let ordered = canonicalize(&raw).unwrap();
        let roles: Vec<Role> = ordered.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![Role::Primary, Role::Spouse, Role::Spouse, Role::Child, Role::Child]
        );
        // Relative order preserved within each role block
        assert_eq!(ordered[1].birth_date, "1980-01-01");
        assert_eq!(ordered[2].birth_date, "1982-01-01");
        assert_eq!(ordered[3].birth_date, "2010-01-01");
        assert_eq!(ordered[4].birth_date, "2012-01-01");
    }

    #[test]
    fn test_two_primaries_rejected() {
        let raw = vec![
            record(Role::Primary, "1970-01-01"),
            record(Role::Primary, "1971-01-01"),
        ];
        assert_eq!(canonicalize(&raw), Err(InvalidGroup));
    }

    #[test]
    fn test_group_shape_detects_primary() {
        let with_primary = vec![
            record(Role::Primary, "1970-01-01"),
            record(Role::Spouse, "1972-01-01"),
        ];
        let shape = GroupShape::of(&with_primary);
        assert_eq!(shape.n, 2);
        assert_eq!(shape.spouses, 1);
        assert_eq!(shape.children, 0);
        assert!(shape.has_primary());

        let without = vec![
            record(Role::Spouse, "1972-01-01"),
            record(Role::Child, "2010-01-01"),
        ];
        assert!(!GroupShape::of(&without).has_primary());
    }

    #[test]
    fn test_sex_wire_values() {
        assert_eq!(Sex::try_from(1u8), Ok(Sex::Male));
        assert_eq!(Sex::try_from(2u8), Ok(Sex::Female));
        assert!(Sex::try_from(3u8).is_err());
        assert_eq!(u8::from(Sex::Female), 2);
    }
}
