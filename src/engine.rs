//! One-shot allocation pipeline for a shift.
//!
//! Wires the stages in data-flow order: bus route construction (or an
//! existing trip inventory), flight rationing, pre-flight compatibility
//! checks, the joint assignment solve, and schedule materialization.
//! Each shift's run is independent; nothing here outlives the call.

use crate::config::PlanParams;
use crate::distance::DistanceOracle;
use crate::error::PlanError;
use crate::models::{
    BusTrip, CharterFlight, CommercialFlight, Region, TransportPlan, WorkerLeg,
};
use crate::materialize::materialize_trips;
use crate::rationing::ration_flights;
use crate::routing::build_bus_trips;
use crate::solver::AssignmentModel;
use crate::validation::check_compatibility;

/// Everything the engine consumes for one shift.
#[derive(Debug, Clone, Default)]
pub struct ShiftInput {
    /// Worker legs travelling in this shift.
    pub workers: Vec<WorkerLeg>,
    /// Region records for every region with bus demand.
    pub regions: Vec<Region>,
    /// Existing bus inventory. When `None`, trips are built fresh from
    /// the workers' per-community demand.
    pub trips: Option<Vec<BusTrip>>,
    /// Charter flight inventory.
    pub charters: Vec<CharterFlight>,
    /// Commercial flight inventory (pre-rationing).
    pub commercial: Vec<CommercialFlight>,
}

impl ShiftInput {
    /// Creates an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker legs.
    pub fn with_workers(mut self, workers: Vec<WorkerLeg>) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the region records.
    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    /// Supplies an existing trip inventory instead of building one.
    pub fn with_trips(mut self, trips: Vec<BusTrip>) -> Self {
        self.trips = Some(trips);
        self
    }

    /// Sets the charter inventory.
    pub fn with_charters(mut self, charters: Vec<CharterFlight>) -> Self {
        self.charters = charters;
        self
    }

    /// Sets the commercial inventory.
    pub fn with_commercial(mut self, commercial: Vec<CommercialFlight>) -> Self {
        self.commercial = commercial;
        self
    }
}

/// Runs the full allocation pipeline for one shift.
///
/// On success the returned plan is complete and internally consistent:
/// capacities hold, served-community and route compatibility hold, and
/// every connection respects its buffer. On error nothing partial is
/// returned.
pub fn plan_shift(
    input: &ShiftInput,
    oracle: &dyn DistanceOracle,
    params: &PlanParams,
) -> Result<TransportPlan, PlanError> {
    let mut diagnostics = Vec::new();

    // Bus legs: take the provided inventory or pack demand into trips.
    let trips: Vec<BusTrip> = match &input.trips {
        Some(existing) => existing.clone(),
        None => {
            let route_plan = build_bus_trips(&input.workers, &input.regions, oracle, params)?;
            diagnostics.extend(route_plan.diagnostics);
            route_plan.trips.into_iter().map(|p| p.trip).collect()
        }
    };

    // Flight legs: charter first, then the cheapest sufficient
    // commercial prefix.
    let rationing = ration_flights(&input.workers, &input.charters, &input.commercial, params);
    diagnostics.extend(rationing.diagnostics.clone());

    // Pre-flight diagnostics keep data gaps out of the hard constraints.
    let report = check_compatibility(
        &input.workers,
        &trips,
        &input.charters,
        &rationing.retained_commercial,
        &rationing.eligibility,
    );
    diagnostics.extend(report.diagnostics.clone());

    let outcome = AssignmentModel::new(
        &input.workers,
        &trips,
        &input.charters,
        &rationing.retained_commercial,
        params,
    )
    .with_eligibility(&rationing.eligibility)
    .with_report(&report)
    .solve()?;

    let (scheduled, materialize_diagnostics) =
        materialize_trips(&trips, &outcome.bus_times, &input.regions, params);
    diagnostics.extend(materialize_diagnostics);

    Ok(TransportPlan {
        trips: scheduled,
        assignments: outcome.assignments,
        diagnostics,
        total_wait_min: outcome.total_wait_min,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceTable;
    use crate::models::{DiagnosticKind, Direction, FlightLeg};

    fn sample_region() -> Region {
        Region::new("Valparaíso")
            .with_capacity_tiers(vec![12, 20, 10])
            .with_leg_duration(90)
            .with_outbound_communities(vec!["Quillota".into(), "La Calera".into()])
            .with_inbound_communities(vec!["Quillota".into(), "La Calera".into()])
    }

    fn outbound_worker(id: &str, community: &str) -> WorkerLeg {
        WorkerLeg::new(id, Direction::Outbound)
            .with_home_community(community)
            .with_route("Santiago", "Calama")
            .with_region("Valparaíso")
    }

    fn sample_input(worker_count: usize) -> ShiftInput {
        let workers = (0..worker_count)
            .map(|i| outbound_worker(&format!("w{i:02}"), "Quillota"))
            .collect();
        ShiftInput::new()
            .with_workers(workers)
            .with_regions(vec![sample_region()])
            .with_charters(vec![CharterFlight::new("c1", "Santiago", "Calama")
                .with_capacity(60)
                .with_times(700, 820)])
    }

    #[test]
    fn test_full_pipeline_places_everyone() {
        let input = sample_input(15);
        let plan = plan_shift(&input, &DistanceTable::new(), &PlanParams::default()).unwrap();

        assert_eq!(plan.assignments.len(), 15);
        for a in &plan.assignments {
            assert!(a.bus_id.is_some());
            assert_eq!(a.flight, Some(FlightLeg::Charter("c1".into())));
        }
        // 15 = one full 12-tier load plus a residual of 3 on the
        // smallest covering tier.
        assert_eq!(plan.trips.len(), 2);
        let capacities: Vec<u32> = plan.trips.iter().map(|t| t.trip.capacity).collect();
        assert_eq!(capacities, vec![12, 10]);
        for trip in &plan.trips {
            // Arrival leaves the outbound buffer before the 700
            // departure, and departure backs off the 90-minute leg.
            assert_eq!(trip.arrival_min, 520);
            assert_eq!(trip.departure_min, 430);
        }
        assert!(plan.diagnostics.is_empty());
    }

    #[test]
    fn test_commercial_overflow_and_diagnostics() {
        let mut input = sample_input(5);
        // Charter covers 2; commercial has 2 more seats; one worker is
        // left without a flight but keeps a bus seat.
        input.charters = vec![CharterFlight::new("c1", "Santiago", "Calama")
            .with_capacity(2)
            .with_times(700, 820)];
        input.commercial = vec![CommercialFlight::new("f1", "Santiago", "Calama")
            .with_seats(2)
            .with_price(120)
            .with_times(800, 920)];

        let plan = plan_shift(&input, &DistanceTable::new(), &PlanParams::default()).unwrap();

        let with_flight = plan
            .assignments
            .iter()
            .filter(|a| a.flight.is_some())
            .count();
        assert_eq!(with_flight, 4);
        assert_eq!(
            plan.diagnostics_of(DiagnosticKind::ExhaustedFlightCapacity)
                .len(),
            1
        );
        // Everyone still rides a bus.
        assert!(plan.assignments.iter().all(|a| a.bus_id.is_some()));
    }

    #[test]
    fn test_existing_trip_inventory_is_used() {
        let input = sample_input(3).with_trips(vec![BusTrip::new(
            "manual_bus",
            "Valparaíso",
            Direction::Outbound,
            51,
        )
        .with_communities(vec!["Quillota".into()])]);

        let plan = plan_shift(&input, &DistanceTable::new(), &PlanParams::default()).unwrap();
        assert_eq!(plan.trips.len(), 1);
        assert_eq!(plan.trips[0].trip.id, "manual_bus");
        assert!(plan
            .assignments
            .iter()
            .all(|a| a.bus_id.as_deref() == Some("manual_bus")));
    }

    #[test]
    fn test_infeasible_shift_returns_error() {
        // The only flight departs too early for any in-window bus to
        // make the connection.
        let mut input = sample_input(1);
        input.charters = vec![CharterFlight::new("c1", "Santiago", "Calama")
            .with_capacity(10)
            .with_times(400, 520)];

        let err = plan_shift(&input, &DistanceTable::new(), &PlanParams::default()).unwrap_err();
        assert!(matches!(err, PlanError::Infeasible));
    }

    #[test]
    fn test_missing_region_aborts_nothing_and_reports() {
        let mut input = sample_input(2);
        input
            .workers
            .push(outbound_worker("w_lost", "Limache").with_region("Ghost"));
        let plan = plan_shift(&input, &DistanceTable::new(), &PlanParams::default()).unwrap();

        // The unmapped worker's demand is skipped (reported), so no trip
        // serves Limache and the bus leg is excluded too, but the
        // charter still flies them.
        assert_eq!(
            plan.diagnostics_of(DiagnosticKind::MissingRegionMapping).len(),
            1
        );
        assert_eq!(plan.diagnostics_of(DiagnosticKind::NoCompatibleBus).len(), 1);
        let lost = plan.assignment_for("w_lost").unwrap();
        assert!(lost.bus_id.is_none());
        assert!(lost.flight.is_some());
    }
}
