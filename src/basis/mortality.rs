//! Survivorship tables indexed by age in months
//!
//! Three columns per sex: active-lives survivors (Lx), disabled-lives
//! survivors (Li), and disability incidence (Pai). Incidence is only defined
//! up to a bounded age ceiling; the survivor columns run to the table horizon.
//! Out-of-range lookups return 0 so the engine's survival ratios decay to
//! zero past the horizon instead of failing.

use crate::family::Sex;

/// One row of the mortality table file, values stored as (male, female)
#[derive(Debug, Clone, Copy)]
pub struct MortalityRow {
    pub age_month: u32,
    pub lx: (f64, f64),
    pub li: (f64, f64),
    pub pai: (f64, f64),
}

/// Direct-indexed survivorship table; index = age in months, slot 0 unused
#[derive(Debug, Clone)]
pub struct MortalityTable {
    lx_male: Vec<f64>,
    lx_female: Vec<f64>,
    li_male: Vec<f64>,
    li_female: Vec<f64>,
    pai_male: Vec<f64>,
    pai_female: Vec<f64>,
}

impl MortalityTable {
    /// Build the direct-indexed columns from loaded rows.
    ///
    /// Rows outside `1..=horizon_month` are skipped; incidence values are
    /// kept only up to `max_incidence_month`.
    pub fn from_rows(rows: &[MortalityRow], horizon_month: u32, max_incidence_month: u32) -> Self {
        let n = horizon_month as usize + 1;
        let n_pai = max_incidence_month as usize + 1;

        let mut table = Self {
            lx_male: vec![0.0; n],
            lx_female: vec![0.0; n],
            li_male: vec![0.0; n],
            li_female: vec![0.0; n],
            pai_male: vec![0.0; n_pai],
            pai_female: vec![0.0; n_pai],
        };

        for row in rows {
            let age = row.age_month as usize;
            if row.age_month < 1 || row.age_month > horizon_month {
                continue;
            }

            table.lx_male[age] = row.lx.0;
            table.lx_female[age] = row.lx.1;
            table.li_male[age] = row.li.0;
            table.li_female[age] = row.li.1;

            if row.age_month <= max_incidence_month {
                table.pai_male[age] = row.pai.0;
                table.pai_female[age] = row.pai.1;
            }
        }

        table
    }

    /// Active-lives survivors Lx at an age in months; 0 outside the table
    pub fn survivors(&self, age_month: u32, sex: Sex) -> f64 {
        match sex {
            Sex::Male => at(&self.lx_male, age_month),
            Sex::Female => at(&self.lx_female, age_month),
        }
    }

    /// Disabled-lives survivors Li at an age in months; 0 outside the table
    pub fn disability_survivors(&self, age_month: u32, sex: Sex) -> f64 {
        match sex {
            Sex::Male => at(&self.li_male, age_month),
            Sex::Female => at(&self.li_female, age_month),
        }
    }

    /// Disability incidence Pai at an age in months; 0 beyond the incidence
    /// ceiling or outside the table
    pub fn disability_incidence(&self, age_month: u32, sex: Sex) -> f64 {
        match sex {
            Sex::Male => at(&self.pai_male, age_month),
            Sex::Female => at(&self.pai_female, age_month),
        }
    }
}

fn at(column: &[f64], age_month: u32) -> f64 {
    column.get(age_month as usize).copied().unwrap_or(0.0)
}
