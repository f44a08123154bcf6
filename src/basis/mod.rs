//! Technical basis repository: immutable, load-once survivorship and factor
//! tables plus horizon/rate metadata
//!
//! The basis is loaded once at process start and shared read-only (behind an
//! `Arc`) by every concurrent simulation; nothing here is mutated after load.

mod factors;
pub mod loader;
mod mortality;

pub use factors::LookupFactorTable;
pub use loader::{BasisMetadata, DEFAULT_BASIS_PATH};
pub use mortality::{MortalityRow, MortalityTable};

use std::error::Error;
use std::path::Path;

use crate::family::Sex;

/// Container for the mortality/disability tables, the lump-sum factor table,
/// and the fixed constants of the technical basis
#[derive(Debug, Clone)]
pub struct TechnicalBasis {
    mortality: MortalityTable,
    factors: LookupFactorTable,
    metadata: BasisMetadata,
}

impl TechnicalBasis {
    /// Load the basis from the default versioned data directory
    pub fn from_csv() -> Result<Self, Box<dyn Error>> {
        Self::from_csv_path(Path::new(DEFAULT_BASIS_PATH))
    }

    /// Load the basis from a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let metadata = loader::load_metadata(path)?;
        let rows = loader::load_mortality_rows(path)?;
        let mortality = MortalityTable::from_rows(
            &rows,
            metadata.horizon_month,
            metadata.max_incidence_age_month,
        );
        let factors = LookupFactorTable::from_pairs(loader::load_lookup_factors(path)?);

        log::info!(
            "technical basis {} loaded: {} mortality rows, {} lookup factors",
            metadata.version,
            rows.len(),
            factors.len()
        );

        Ok(Self {
            mortality,
            factors,
            metadata,
        })
    }

    /// Assemble a basis from in-memory parts (fixtures, alternative sources)
    pub fn from_parts(
        mortality: MortalityTable,
        factors: LookupFactorTable,
        metadata: BasisMetadata,
    ) -> Self {
        Self {
            mortality,
            factors,
            metadata,
        }
    }

    /// Active-lives survivors Lx; 0 outside the table
    pub fn survivors(&self, age_month: u32, sex: Sex) -> f64 {
        self.mortality.survivors(age_month, sex)
    }

    /// Disabled-lives survivors Li; 0 outside the table
    pub fn disability_survivors(&self, age_month: u32, sex: Sex) -> f64 {
        self.mortality.disability_survivors(age_month, sex)
    }

    /// Disability incidence Pai; 0 beyond its age ceiling
    pub fn disability_incidence(&self, age_month: u32, sex: Sex) -> f64 {
        self.mortality.disability_incidence(age_month, sex)
    }

    /// Lump-sum factor for an integer age, absent when the table has no row
    pub fn lookup_factor(&self, age: u32) -> Option<f64> {
        self.factors.get(age)
    }

    pub fn metadata(&self) -> &BasisMetadata {
        &self.metadata
    }

    /// Upper bound on elapsed months for the combinatorial engine:
    /// table horizon minus the fixed xmin constant
    pub fn projection_months(&self) -> u32 {
        self.metadata.horizon_month - self.metadata.xmin_fixed
    }

    /// Effective annual interest factor (1 + rate)
    pub fn interest_factor(&self) -> f64 {
        1.0 + self.metadata.interest_rate_effective_annual
    }
}
