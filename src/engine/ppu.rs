//! Combinatorial survivorship engine (PPU)
//!
//! For every elapsed month the engine enumerates all 2^n alive/dead
//! configurations of the canonical beneficiary group, weights each by a joint
//! survival probability taken from the technical basis, maps it to a
//! benefit-share fraction, and discounts the expected share to present value.
//! The accumulated total is the present-value annuity factor (PPUU) of the
//! benefit stream.
//!
//! Cost is O(t_max * 2^n * n); the caller rejects groups above
//! `MAX_EXACT_GROUP_SIZE` before this engine runs.

use crate::basis::TechnicalBasis;
use crate::family::{Beneficiary, GroupShape};

/// Li reference age for the incidence-weighted ratio, in months
const DISABILITY_REFERENCE_MONTH: u32 = 252;

/// Child cover ends at this age in months; past it a non-disabled child
/// switches from the survivor ratio to the incidence ratio
const CHILD_COVER_CEILING_MONTH: i64 = 252;

/// One-hot weights selecting which table ratio drives a beneficiary's
/// survival probability for a given month
#[derive(Debug, Clone, Copy, PartialEq)]
struct Gamma {
    g1: f64,
    g2: f64,
    g3: f64,
}

impl Gamma {
    /// Active-lives survivor ratio (Lx)
    const MORTALITY: Gamma = Gamma { g1: 1.0, g2: 0.0, g3: 0.0 };
    /// Disabled-lives survivor ratio (Li)
    const DISABILITY: Gamma = Gamma { g1: 0.0, g2: 1.0, g3: 0.0 };
    /// Incidence-weighted ratio (Pai against the Li reference age)
    const INCIDENCE: Gamma = Gamma { g1: 0.0, g2: 0.0, g3: 1.0 };
}

/// Present-value annuity factor calculator over a shared technical basis
pub struct PpuEngine<'a> {
    basis: &'a TechnicalBasis,
    interest_factor: f64,
}

impl<'a> PpuEngine<'a> {
    pub fn new(basis: &'a TechnicalBasis) -> Self {
        Self {
            basis,
            interest_factor: basis.interest_factor(),
        }
    }

    /// Expected discounted benefit-unit stream for a canonical group.
    ///
    /// `members` must already be in canonical order (primary, spouses,
    /// children); configuration bit `e-1` encodes whether beneficiary `e`
    /// is alive in that configuration.
    pub fn annuity_factor(&self, members: &[Beneficiary], shape: GroupShape, t_max: u32) -> f64 {
        let n = members.len();
        debug_assert_eq!(n, shape.n);
        debug_assert!((1..=crate::error::MAX_EXACT_GROUP_SIZE).contains(&n));

        let config_count: u32 = 1 << n;
        let mut alive = vec![0.0_f64; n];
        let mut dead = vec![0.0_f64; n];
        let mut ppuu = 0.0;

        for t in 1..=t_max {
            // Per-beneficiary probabilities do not depend on the
            // configuration; hoist them out of the 2^n loop. With one-hot
            // weights the blended dead-state probability is exactly the
            // complement of the alive-state one.
            for (idx, member) in members.iter().enumerate() {
                let gamma = gamma_weights(members, shape, idx, t);
                let p = self.alive_probability(member, gamma, t);
                alive[idx] = p;
                dead[idx] = 1.0 - p;
            }

            let mut month_sum = 0.0;
            for mask in 0..config_count {
                let mut port = 1.0;
                for e in 0..n {
                    port *= if mask >> e & 1 == 1 { alive[e] } else { dead[e] };
                }

                let gh = child_alive_count(mask, shape);
                let gc = spouse_alive_count(mask, shape);
                let titular_alive = mask & 1 == 1;

                month_sum += port * benefit_proportion(shape, gh, gc, titular_alive);
            }

            ppuu += month_sum * self.interest_factor.powf(-(t as f64 / 12.0));
        }

        ppuu
    }

    /// Probability that a beneficiary is alive `t` months after retirement,
    /// under the ratio its gamma weights select. Ratios with a zero
    /// denominator are defined as 0.
    fn alive_probability(&self, member: &Beneficiary, gamma: Gamma, t: u32) -> f64 {
        let age = member.age_month;
        let sex = member.sex;

        let px = safe_ratio(
            self.basis.survivors(age + t, sex),
            self.basis.survivors(age, sex),
        );
        let pi = safe_ratio(
            self.basis.disability_survivors(age + t, sex),
            self.basis.disability_survivors(age, sex),
        );

        let li_reference = self
            .basis
            .disability_survivors(DISABILITY_REFERENCE_MONTH, sex);
        let pp = if li_reference == 0.0 {
            0.0
        } else {
            self.basis.disability_incidence(age, sex) * self.basis.disability_survivors(age + t, sex)
                / li_reference
        };

        gamma.g1 * px + gamma.g2 * pi + gamma.g3 * pp
    }
}

/// Select the ratio weights for beneficiary `idx` (0-based canonical
/// position) at elapsed month `t`
fn gamma_weights(members: &[Beneficiary], shape: GroupShape, idx: usize, t: u32) -> Gamma {
    let member = &members[idx];
    let e = idx + 1;
    let cs = shape.spouses;
    let hs = shape.children;

    if !shape.has_primary() {
        if hs == 0 || e <= cs {
            return Gamma::MORTALITY;
        }
        return child_gamma(member, t);
    }

    if members[0].disabled {
        if e == 1 {
            return Gamma::DISABILITY;
        }
        if hs == 0 || e <= cs + 1 {
            return Gamma::MORTALITY;
        }
        return child_gamma(member, t);
    }

    if hs == 0 || e <= cs + 1 {
        return Gamma::MORTALITY;
    }
    child_gamma(member, t)
}

fn child_gamma(member: &Beneficiary, t: u32) -> Gamma {
    if member.disabled {
        return Gamma::DISABILITY;
    }
    if i64::from(t) > CHILD_COVER_CEILING_MONTH - i64::from(member.age_month) {
        return Gamma::INCIDENCE;
    }
    Gamma::MORTALITY
}

/// Alive bits within the child block of the mask (the top `children` bits
/// of the canonical layout)
fn child_alive_count(mask: u32, shape: GroupShape) -> u32 {
    if shape.children == 0 {
        return 0;
    }
    let shift = shape.n - shape.children;
    (mask >> shift & ((1 << shape.children) - 1)).count_ones()
}

/// Alive bits within the spouse block of the mask
fn spouse_alive_count(mask: u32, shape: GroupShape) -> u32 {
    if shape.spouses == 0 {
        return 0;
    }
    let shift = shape.n - shape.spouses - shape.children;
    (mask >> shift & ((1 << shape.spouses) - 1)).count_ones()
}

/// Fraction of the full benefit unit payable under a configuration.
///
/// Total function of the group shape, the alive counts of the child (`gh`)
/// and spouse (`gc`) blocks, and whether the primary's bit is set.
pub fn benefit_proportion(shape: GroupShape, gh: u32, gc: u32, titular_alive: bool) -> f64 {
    if !shape.has_primary() {
        if gh > 2 {
            return 1.0;
        }
        if gh == 2 {
            return 0.9;
        }
        if gh == 1 || gc > 0 {
            return 0.7;
        }
        return 0.0;
    }

    if titular_alive || gh >= 3 {
        return 1.0;
    }
    if gh == 2 {
        return 0.9;
    }
    if gh == 1 || gc > 0 {
        return 0.7;
    }
    0.0
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{BasisMetadata, LookupFactorTable, MortalityRow, MortalityTable};
    use crate::family::{Role, Sex};
    use approx::assert_relative_eq;

    fn metadata(horizon: u32) -> BasisMetadata {
        BasisMetadata {
            version: "test".to_string(),
            interest_rate_effective_annual: 0.04,
            xmin_fixed: 187,
            horizon_month: horizon,
            max_incidence_age_month: 253,
        }
    }

    /// Basis whose survivor columns are flat: nobody ever dies inside the
    /// horizon, so every survivor ratio is exactly 1
    fn immortal_basis(horizon: u32) -> TechnicalBasis {
        let rows: Vec<MortalityRow> = (1..=horizon)
            .map(|m| MortalityRow {
                age_month: m,
                lx: (1000.0, 1000.0),
                li: (800.0, 800.0),
                pai: (0.001, 0.001),
            })
            .collect();
        TechnicalBasis::from_parts(
            MortalityTable::from_rows(&rows, horizon, 253),
            LookupFactorTable::default(),
            metadata(horizon),
        )
    }

    /// Basis where the disabled-lives column halves every month
    fn halving_disability_basis(horizon: u32) -> TechnicalBasis {
        let rows: Vec<MortalityRow> = (1..=horizon)
            .map(|m| MortalityRow {
                age_month: m,
                lx: (1000.0, 1000.0),
                li: (1000.0 * 0.5_f64.powi(m as i32), 1000.0 * 0.5_f64.powi(m as i32)),
                pai: (0.001, 0.001),
            })
            .collect();
        TechnicalBasis::from_parts(
            MortalityTable::from_rows(&rows, horizon, 253),
            LookupFactorTable::default(),
            metadata(horizon),
        )
    }

    fn member(age_month: u32, role: Role, disabled: bool) -> Beneficiary {
        Beneficiary {
            age_month,
            sex: Sex::Male,
            disabled,
            role,
        }
    }

    #[test]
    fn test_single_immortal_primary_is_pure_discount_sum() {
        let basis = immortal_basis(700);
        let members = vec![member(600, Role::Primary, false)];
        let shape = GroupShape { n: 1, spouses: 0, children: 0 };

        let t_max = 24;
        let ppuu = PpuEngine::new(&basis).annuity_factor(&members, shape, t_max);

        // Alive probability is 1 every month, the all-dead configuration pays
        // nothing, so the result is the plain geometric discount sum
        let q = 1.04_f64.powf(-1.0 / 12.0);
        let expected = q * (1.0 - q.powi(t_max as i32)) / (1.0 - q);
        assert_relative_eq!(ppuu, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_couple_immortal_matches_single() {
        // Primary and spouse both immortal: only the all-alive configuration
        // has weight, and it pays the full unit
        let basis = immortal_basis(700);
        let couple = vec![
            member(600, Role::Primary, false),
            member(580, Role::Spouse, false),
        ];
        let shape = GroupShape { n: 2, spouses: 1, children: 0 };
        let single = vec![member(600, Role::Primary, false)];
        let single_shape = GroupShape { n: 1, spouses: 0, children: 0 };

        let engine = PpuEngine::new(&basis);
        let couple_ppuu = engine.annuity_factor(&couple, shape, 36);
        let single_ppuu = engine.annuity_factor(&single, single_shape, 36);
        assert_relative_eq!(couple_ppuu, single_ppuu, max_relative = 1e-12);
    }

    #[test]
    fn test_disabled_lone_child_uses_disability_column() {
        let basis = halving_disability_basis(64);
        let members = vec![member(10, Role::Child, true)];
        let shape = GroupShape { n: 1, spouses: 0, children: 1 };

        let ppuu = PpuEngine::new(&basis).annuity_factor(&members, shape, 1);

        // Month 1: alive with probability li(11)/li(10) = 0.5, paying the
        // single-child share 0.7; the dead configuration pays 0
        let expected = 0.5 * 0.7 * 1.04_f64.powf(-(1.0 / 12.0));
        assert_relative_eq!(ppuu, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_child_past_cover_ceiling_switches_to_incidence() {
        // Non-disabled child aged 252 months: from t=1 the ceiling is passed
        let ceiling_child = member(252, Role::Child, false);
        assert_eq!(child_gamma(&ceiling_child, 1), Gamma::INCIDENCE);

        // A younger child stays on mortality until the ceiling
        let young = member(240, Role::Child, false);
        assert_eq!(child_gamma(&young, 12), Gamma::MORTALITY);
        assert_eq!(child_gamma(&young, 13), Gamma::INCIDENCE);
    }

    #[test]
    fn test_gamma_disabled_primary_gets_disability_column() {
        let members = vec![
            member(700, Role::Primary, true),
            member(650, Role::Spouse, false),
            member(100, Role::Child, false),
        ];
        let shape = GroupShape { n: 3, spouses: 1, children: 1 };
        assert_eq!(gamma_weights(&members, shape, 0, 1), Gamma::DISABILITY);
        assert_eq!(gamma_weights(&members, shape, 1, 1), Gamma::MORTALITY);
        assert_eq!(gamma_weights(&members, shape, 2, 1), Gamma::MORTALITY);
    }

    #[test]
    fn test_block_alive_counts() {
        // Canonical layout: primary bit 0, spouse bit 1, children bits 2-3
        let shape = GroupShape { n: 4, spouses: 1, children: 2 };
        assert_eq!(child_alive_count(0b1100, shape), 2);
        assert_eq!(child_alive_count(0b0100, shape), 1);
        assert_eq!(child_alive_count(0b0011, shape), 0);
        assert_eq!(spouse_alive_count(0b0010, shape), 1);
        assert_eq!(spouse_alive_count(0b1101, shape), 0);
    }

    #[test]
    fn test_benefit_proportion_boundaries() {
        // Primary alive pays the full unit no matter who else survives
        let with_primary = GroupShape { n: 3, spouses: 1, children: 1 };
        assert_eq!(benefit_proportion(with_primary, 0, 1, true), 1.0);

        // Spouse-and-children group (no primary): two alive children
        let orphans = GroupShape { n: 4, spouses: 1, children: 3 };
        assert_eq!(benefit_proportion(orphans, 2, 0, false), 0.9);
        assert_eq!(benefit_proportion(orphans, 3, 0, false), 1.0);
        assert_eq!(benefit_proportion(orphans, 0, 1, false), 0.7);
        assert_eq!(benefit_proportion(orphans, 0, 0, false), 0.0);

        // Primary dead, one alive child out of two
        let four = GroupShape { n: 4, spouses: 1, children: 2 };
        assert_eq!(benefit_proportion(four, 1, 0, false), 0.7);
        assert_eq!(benefit_proportion(four, 2, 0, false), 0.9);
        assert_eq!(benefit_proportion(four, 3, 0, false), 1.0);
    }

    #[test]
    fn test_zero_survivors_basis_yields_zero() {
        let rows = vec![MortalityRow {
            age_month: 1,
            lx: (0.0, 0.0),
            li: (0.0, 0.0),
            pai: (0.0, 0.0),
        }];
        let basis = TechnicalBasis::from_parts(
            MortalityTable::from_rows(&rows, 10, 5),
            LookupFactorTable::default(),
            metadata(10),
        );
        let members = vec![member(1, Role::Primary, false)];
        let shape = GroupShape { n: 1, spouses: 0, children: 0 };

        let ppuu = PpuEngine::new(&basis).annuity_factor(&members, shape, 10);
        assert_eq!(ppuu, 0.0);
    }
}
