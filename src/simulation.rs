//! Simulation orchestrator: validated input to result plus diagnostic trace
//!
//! `simulate` is a pure function of the request and the (constant) technical
//! basis: no I/O, no hidden state, safe to run from any number of threads
//! sharing one basis.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::basis::TechnicalBasis;
use crate::dates;
use crate::engine::{final_balance, BalanceInputs, PpuEngine};
use crate::error::{SimulationError, MAX_EXACT_GROUP_SIZE};
use crate::family::{canonicalize, Beneficiary, BeneficiaryRecord, GroupShape, Role, Sex};

/// Upper bound on raw beneficiary records in one request
pub const MAX_RAW_BENEFICIARIES: usize = 56;

/// Fixed parameters of the audit annuity: a male life aged 779 months
/// discounted over 552 months, mirroring the legacy workbook's side sheet
const REFERENCE_ANNUITY_BASE_MONTH: u32 = 779;
const REFERENCE_ANNUITY_PERIODS: u32 = 552;

/// Mandatory contribution age range, in years
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRange {
    pub start_age: u32,
    pub end_age: u32,
}

/// Voluntary contribution age range plus monthly amount
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoluntaryContribution {
    pub start_age: u32,
    pub end_age: u32,
    pub monthly_amount: f64,
}

/// One simulation request as submitted over the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationInput {
    /// ISO date (YYYY-MM-DD) the projection is taken from
    pub calculation_date: String,
    pub account_balance: f64,
    /// External target reference value for the lump-sum term
    pub bov: f64,
    pub mandatory_contribution: ContributionRange,
    pub voluntary_contribution: VoluntaryContribution,
    pub beneficiaries: Vec<BeneficiaryRecord>,
}

/// Per-beneficiary age decomposition at the retirement date
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryAgeRow {
    /// 1-based canonical position
    pub beneficiary_index: usize,
    #[serde(rename = "type")]
    pub role: Role,
    pub birth_date: String,
    pub age_months_at_retirement: i32,
    pub diff_years: i32,
    pub diff_months: i32,
    pub diff_days: i32,
}

/// One month of the reference single-life audit annuity
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceAnnuityRow {
    pub month: u32,
    pub survival_ratio: f64,
    pub discount_factor: f64,
    pub discounted_product: f64,
}

/// Discounted survival of a fixed reference life, kept for auditing a loaded
/// basis against the legacy workbook's side calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceAnnuityTrace {
    pub base_age_month: u32,
    pub period_count: u32,
    pub sum_discounted_product: f64,
    /// Thirteen-payment annual equivalent of the monthly sum
    pub equivalent_fuu: f64,
    pub rows: Vec<ReferenceAnnuityRow>,
}

/// Detailed diagnostics carried alongside the result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedTrace {
    pub beneficiary_ages: Vec<BeneficiaryAgeRow>,
    pub reference_annuity: ReferenceAnnuityTrace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationTrace {
    /// Fixed lower horizon constant of the technical basis
    pub xmin: u32,
    pub t_max: u32,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedTrace>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Present-value annuity factor of the benefit stream
    pub ppuu: f64,
    /// `final_balance / ppuu`, or 0 by convention when `ppuu` is 0
    pub projected_benefit: f64,
    pub final_balance: f64,
    /// ISO retirement date
    pub retirement_date: String,
    pub counts: GroupShape,
    /// Age in months at retirement, in canonical order
    pub ages_in_months: Vec<u32>,
    pub trace: SimulationTrace,
}

/// Run one simulation against a loaded technical basis
pub fn simulate(
    basis: &TechnicalBasis,
    input: &SimulationInput,
) -> Result<SimulationResult, SimulationError> {
    let calculation_date = validate(input)?;

    let ordered = canonicalize(&input.beneficiaries)?;
    let shape = GroupShape::of(&ordered);
    if shape.n > MAX_EXACT_GROUP_SIZE {
        return Err(SimulationError::GroupTooLarge {
            n: shape.n,
            max: MAX_EXACT_GROUP_SIZE,
        });
    }

    // Retirement anchors on the primary, or the first canonical member when
    // the group has none
    let anchor = ordered
        .iter()
        .find(|r| r.role == Role::Primary)
        .unwrap_or(&ordered[0]);
    let anchor_birth = parse_iso_date("beneficiaries.birthDate", &anchor.birth_date)?;
    let retirement = dates::retirement_date(anchor_birth, calculation_date);

    let mut age_rows = Vec::with_capacity(shape.n);
    let mut members = Vec::with_capacity(shape.n);
    for (idx, record) in ordered.iter().enumerate() {
        let birth = parse_iso_date("beneficiaries.birthDate", &record.birth_date)?;
        let diff = dates::exact_month_diff(birth, retirement);

        age_rows.push(BeneficiaryAgeRow {
            beneficiary_index: idx + 1,
            role: record.role,
            birth_date: record.birth_date.clone(),
            age_months_at_retirement: diff.months,
            diff_years: diff.years_part,
            diff_months: diff.months_part,
            diff_days: diff.days_part,
        });

        members.push(Beneficiary {
            age_month: diff.months.max(0) as u32,
            sex: record.sex,
            disabled: record.is_disabled(),
            role: record.role,
        });
    }

    // The balance projection's current-age term uses the coarser 365.25-day
    // convention, and always reads the FIRST canonical member
    let first_birth = parse_iso_date("beneficiaries.birthDate", &ordered[0].birth_date)?;
    let current_age_years = dates::age_in_whole_years(first_birth, calculation_date);

    let balance = final_balance(
        basis,
        &BalanceInputs {
            account_balance: input.account_balance,
            bov: input.bov,
            mandatory_start_age: input.mandatory_contribution.start_age,
            voluntary_start_age: input.voluntary_contribution.start_age,
            voluntary_end_age: input.voluntary_contribution.end_age,
            voluntary_monthly_amount: input.voluntary_contribution.monthly_amount,
            current_age_years,
        },
    );

    let t_max = basis.projection_months();
    let ppuu = PpuEngine::new(basis).annuity_factor(&members, shape, t_max);

    let mut warnings = Vec::new();
    if ppuu == 0.0 {
        warnings.push(String::from(
            "PPUU evaluated to 0; projected benefit is defined as 0 to avoid division by zero",
        ));
    }
    let projected_benefit = if ppuu == 0.0 { 0.0 } else { balance / ppuu };

    Ok(SimulationResult {
        ppuu,
        projected_benefit,
        final_balance: balance,
        retirement_date: retirement.format("%Y-%m-%d").to_string(),
        counts: shape,
        ages_in_months: members.iter().map(|m| m.age_month).collect(),
        trace: SimulationTrace {
            xmin: basis.metadata().xmin_fixed,
            t_max,
            warnings,
            advanced: Some(AdvancedTrace {
                beneficiary_ages: age_rows,
                reference_annuity: reference_annuity_trace(basis),
            }),
        },
    })
}

/// Reject a request before any computation runs
fn validate(input: &SimulationInput) -> Result<NaiveDate, SimulationError> {
    let calculation_date = parse_iso_date("calculationDate", &input.calculation_date)?;

    require_non_negative("accountBalance", input.account_balance)?;
    require_non_negative("bov", input.bov)?;
    require_non_negative(
        "voluntaryContribution.monthlyAmount",
        input.voluntary_contribution.monthly_amount,
    )?;

    let mandatory = input.mandatory_contribution;
    if mandatory.end_age < 65 {
        return Err(SimulationError::InvalidInput(
            "mandatoryContribution.endAge must be at least 65".to_string(),
        ));
    }
    if mandatory.end_age < mandatory.start_age {
        return Err(SimulationError::InvalidInput(
            "mandatoryContribution.endAge must not precede startAge".to_string(),
        ));
    }

    let voluntary = input.voluntary_contribution;
    if voluntary.end_age < voluntary.start_age {
        return Err(SimulationError::InvalidInput(
            "voluntaryContribution.endAge must not precede startAge".to_string(),
        ));
    }
    if voluntary.end_age > mandatory.end_age {
        return Err(SimulationError::InvalidInput(
            "voluntaryContribution.endAge must not exceed mandatoryContribution.endAge".to_string(),
        ));
    }

    if input.beneficiaries.is_empty() {
        return Err(SimulationError::InvalidInput(
            "at least one beneficiary is required".to_string(),
        ));
    }
    if input.beneficiaries.len() > MAX_RAW_BENEFICIARIES {
        return Err(SimulationError::InvalidInput(format!(
            "at most {MAX_RAW_BENEFICIARIES} beneficiaries are accepted, got {}",
            input.beneficiaries.len()
        )));
    }
    for (idx, record) in input.beneficiaries.iter().enumerate() {
        if record.invalid > 1 {
            return Err(SimulationError::InvalidInput(format!(
                "beneficiaries[{idx}].invalid must be 0 or 1"
            )));
        }
        parse_iso_date(&format!("beneficiaries[{idx}].birthDate"), &record.birth_date)?;
    }

    Ok(calculation_date)
}

fn parse_iso_date(field: &str, value: &str) -> Result<NaiveDate, SimulationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        SimulationError::InvalidInput(format!(
            "{field} must be an ISO date (YYYY-MM-DD), got {value:?}"
        ))
    })
}

fn require_non_negative(field: &str, value: f64) -> Result<(), SimulationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimulationError::InvalidInput(format!(
            "{field} must be a finite non-negative number"
        )));
    }
    Ok(())
}

fn reference_annuity_trace(basis: &TechnicalBasis) -> ReferenceAnnuityTrace {
    let rate = basis.interest_factor();
    let base = basis.survivors(REFERENCE_ANNUITY_BASE_MONTH, Sex::Male);

    let mut rows = Vec::with_capacity(REFERENCE_ANNUITY_PERIODS as usize);
    let mut sum = 0.0;

    for month in 1..=REFERENCE_ANNUITY_PERIODS {
        let target = basis.survivors(REFERENCE_ANNUITY_BASE_MONTH + month, Sex::Male);
        let ratio = if base == 0.0 { 0.0 } else { target / base };
        let discount = rate.powf(-(month as f64 / 12.0));
        let discounted = ratio * discount;

        rows.push(ReferenceAnnuityRow {
            month,
            survival_ratio: ratio,
            discount_factor: discount,
            discounted_product: discounted,
        });
        sum += discounted;
    }

    ReferenceAnnuityTrace {
        base_age_month: REFERENCE_ANNUITY_BASE_MONTH,
        period_count: REFERENCE_ANNUITY_PERIODS,
        sum_discounted_product: sum,
        equivalent_fuu: sum / 12.0 * 13.0,
        rows,
    }
}
