//! Pension Projector - family pension benefit projection engine
//!
//! This library provides:
//! - Exact enumeration of beneficiary alive/dead configurations (2^n masks)
//! - Month-by-month survival weighting against mortality/disability tables
//! - Present-value annuity factor (PPUU) and projected monthly benefit
//! - Account balance projection with lump-sum and voluntary contribution terms
//! - Worker-pool dispatch with synchronous in-process fallback

pub mod basis;
pub mod dates;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod family;
pub mod simulation;

// Re-export commonly used types
pub use basis::TechnicalBasis;
pub use dispatch::SimulationDispatcher;
pub use error::SimulationError;
pub use simulation::{simulate, SimulationInput, SimulationResult};
