//! Account balance projection at retirement
//!
//! Closed-form accumulation of the current balance to age 65, a lump-sum
//! term driven by the sparse factor table, and a voluntary-contribution
//! annuity term.

use crate::basis::TechnicalBasis;

/// Inputs for the balance projection, all taken at the calculation date
#[derive(Debug, Clone, Copy)]
pub struct BalanceInputs {
    pub account_balance: f64,
    /// External target reference value multiplying the lump-sum factor
    pub bov: f64,
    pub mandatory_start_age: u32,
    pub voluntary_start_age: u32,
    pub voluntary_end_age: u32,
    pub voluntary_monthly_amount: f64,
    /// Age in whole years under the 365.25-day-year convention
    pub current_age_years: i64,
}

/// Projected balance at retirement.
///
/// When the factor table has no row for the mandatory start age, the lump-sum
/// and voluntary terms are BOTH omitted and only the accumulated base is
/// returned. The legacy workbook behaves this way; absence is not a zero
/// factor, and the behavior must not be extended to new scenarios.
pub fn final_balance(basis: &TechnicalBasis, inputs: &BalanceInputs) -> f64 {
    let rate = basis.interest_factor();
    let base = inputs.account_balance * rate.powf((65 - inputs.current_age_years) as f64);

    let Some(factor) = basis.lookup_factor(inputs.mandatory_start_age) else {
        return base;
    };

    let voluntary_years = (inputs.voluntary_end_age - inputs.voluntary_start_age) as f64;
    let voluntary =
        inputs.voluntary_monthly_amount * 12.0 * (rate.powf(voluntary_years) - 1.0) / 0.04;

    base + (factor * inputs.bov + voluntary)
}
