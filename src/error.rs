//! Error taxonomy for simulation requests
//!
//! Only conditions that abort a request live here. A PPUU of exactly 0 and a
//! failed worker-pool offload are recoverable by convention and surface as
//! trace warnings on the result instead.

use thiserror::Error;

use crate::family::InvalidGroup;

/// Largest canonicalized group the exact combinatorial engine accepts.
/// The configuration enumeration costs O(2^n) per projected month.
pub const MAX_EXACT_GROUP_SIZE: usize = 12;

/// Errors surfaced to the caller before any computation runs
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Malformed dates, out-of-range numeric fields, or an impossible
    /// contribution schedule; rejected with no partial result
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The beneficiary group cannot form a canonical layout
    #[error(transparent)]
    InvalidGroup(#[from] InvalidGroup),

    /// Canonicalized group exceeds the exact-engine limit. This is a
    /// resource-exhaustion guard, not a validation failure.
    #[error("group of {n} beneficiaries exceeds the exact engine limit of {max}")]
    GroupTooLarge { n: usize, max: usize },
}
