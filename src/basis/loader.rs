//! CSV/JSON-based technical basis loader
//!
//! Loads the versioned, immutable technical basis files from
//! data/technical/<version>/. Loading validates row shape but is otherwise a
//! straight data import.

use std::error::Error;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::mortality::MortalityRow;

/// Default path to the current technical basis version
pub const DEFAULT_BASIS_PATH: &str = "data/technical/v2025";

/// Metadata record shipped alongside the tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasisMetadata {
    pub version: String,

    /// Effective annual interest rate (0.04 = 4%)
    pub interest_rate_effective_annual: f64,

    /// Fixed lower bound of the projection horizon, in months
    pub xmin_fixed: u32,

    /// Final month of the survivorship tables
    pub horizon_month: u32,

    /// Last month with a defined disability incidence value
    pub max_incidence_age_month: u32,
}

/// Load mortality rows from mortality_table.csv
///
/// Columns: age_month, lx_male, lx_female, li_male, li_female, pai_male, pai_female
pub fn load_mortality_rows(path: &Path) -> Result<Vec<MortalityRow>, Box<dyn Error>> {
    let file = File::open(path.join("mortality_table.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        rows.push(MortalityRow {
            age_month: record[0].parse()?,
            lx: (record[1].parse()?, record[2].parse()?),
            li: (record[3].parse()?, record[4].parse()?),
            pai: (record[5].parse()?, record[6].parse()?),
        });
    }

    Ok(rows)
}

/// Load the sparse age -> factor table from lookup_factor_table.csv
pub fn load_lookup_factors(path: &Path) -> Result<Vec<(u32, f64)>, Box<dyn Error>> {
    let file = File::open(path.join("lookup_factor_table.csv"))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut pairs = Vec::new();

    for result in reader.records() {
        let record = result?;
        let age: u32 = record[0].parse()?;
        let factor: f64 = record[1].parse()?;
        pairs.push((age, factor));
    }

    Ok(pairs)
}

/// Load the metadata record from metadata.json
pub fn load_metadata(path: &Path) -> Result<BasisMetadata, Box<dyn Error>> {
    let file = File::open(path.join("metadata.json"))?;
    Ok(serde_json::from_reader(file)?)
}
