//! Pre-flight compatibility checks.
//!
//! Runs before the assignment model is built. A worker leg that has no
//! compatible bus or no eligible flight would make a hard cardinality
//! constraint unsatisfiable and render the whole model infeasible, so
//! such legs are surfaced as diagnostics and excluded from the
//! corresponding constraint instead — operators fix data gaps rather
//! than debug solver infeasibility blindly.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{BusTrip, CharterFlight, CommercialFlight, Diagnostic, WorkerLeg};
use crate::rationing::FlightEligibility;

/// Compatibility findings consumed by the solver.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityReport {
    /// One finding per worker-mode with no compatible resource.
    pub diagnostics: Vec<Diagnostic>,
    /// Workers excluded from bus cardinality constraints.
    pub bus_excluded: BTreeSet<String>,
    /// Workers excluded from flight cardinality constraints.
    pub flight_excluded: BTreeSet<String>,
}

impl CompatibilityReport {
    /// Whether the worker still takes part in bus assignment.
    pub fn bus_active(&self, worker_id: &str) -> bool {
        !self.bus_excluded.contains(worker_id)
    }

    /// Whether the worker still takes part in flight assignment.
    pub fn flight_active(&self, worker_id: &str) -> bool {
        !self.flight_excluded.contains(worker_id)
    }
}

/// Checks every worker leg against the trips and flights it could be
/// assigned to.
///
/// `eligibility` comes from the rationing stage; a worker absent from the
/// map is checked against both flight pools. Workers already rationed to
/// `Unassigned` are excluded without a fresh diagnostic (rationing
/// reported them).
pub fn check_compatibility(
    workers: &[WorkerLeg],
    trips: &[BusTrip],
    charters: &[CharterFlight],
    commercial: &[CommercialFlight],
    eligibility: &BTreeMap<String, FlightEligibility>,
) -> CompatibilityReport {
    let mut report = CompatibilityReport::default();

    for worker in workers {
        if worker.needs_bus && !trips.iter().any(|t| t.serves(worker)) {
            report.diagnostics.push(Diagnostic::no_compatible_bus(
                &worker.id,
                format!(
                    "no {} bus serves community '{}' for worker '{}'",
                    worker.direction, worker.home_community, worker.id
                ),
            ));
            report.bus_excluded.insert(worker.id.clone());
        }

        if worker.needs_flight {
            let (check_charter, check_commercial) = match eligibility.get(&worker.id) {
                Some(FlightEligibility::Charter) => (true, false),
                Some(FlightEligibility::Commercial) => (false, true),
                Some(FlightEligibility::Unassigned) => {
                    report.flight_excluded.insert(worker.id.clone());
                    continue;
                }
                None => (true, true),
            };

            let charter_ok = check_charter
                && charters
                    .iter()
                    .any(|f| f.matches_route(&worker.flight_origin, &worker.flight_destination));
            let commercial_ok = check_commercial
                && commercial
                    .iter()
                    .any(|f| f.matches_route(&worker.flight_origin, &worker.flight_destination));

            if !charter_ok && !commercial_ok {
                report.diagnostics.push(Diagnostic::no_compatible_flight(
                    &worker.id,
                    format!(
                        "no flight on route {} → {} for worker '{}'",
                        worker.flight_origin, worker.flight_destination, worker.id
                    ),
                ));
                report.flight_excluded.insert(worker.id.clone());
            }
        }
    }

    report
}
