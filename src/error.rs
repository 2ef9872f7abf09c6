//! Fatal errors for a shift's allocation run.
//!
//! Only structural failures live here; recoverable data-quality findings
//! are reported as [`crate::models::Diagnostic`] values instead, so a run
//! can continue around them. On any `PlanError` the caller must discard
//! the run's output entirely rather than persist a partial allocation.

use thiserror::Error;

/// A failure that aborts the shift's allocation.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A region with bus demand has no configured capacity tiers, so its
    /// remainder demand cannot be placed.
    #[error("region '{0}' has bus demand but no capacity tiers configured")]
    NoCapacityTiers(String),

    /// The assignment model admits no feasible solution.
    #[error("no feasible transport assignment exists for this shift")]
    Infeasible,

    /// The optimization backend failed for a reason other than
    /// infeasibility (license, numeric trouble, missing solver).
    #[error("solver backend error: {0}")]
    Solver(String),
}
