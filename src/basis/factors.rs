//! Sparse lump-sum factor table keyed by integer age in years

use std::collections::HashMap;

/// Lump-sum lookup factors for the balance projection
#[derive(Debug, Clone, Default)]
pub struct LookupFactorTable {
    factors: HashMap<u32, f64>,
}

impl LookupFactorTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, f64)>) -> Self {
        Self {
            factors: pairs.into_iter().collect(),
        }
    }

    /// None when the table has no row for the age. The balance projection
    /// treats absence as "omit the lump-sum and voluntary terms entirely",
    /// not as a zero factor.
    pub fn get(&self, age: u32) -> Option<f64> {
        self.factors.get(&age).copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
