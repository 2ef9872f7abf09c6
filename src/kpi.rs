//! Plan quality indicators.
//!
//! Computes summary figures from a finished plan so operators can judge
//! it at a glance before persisting.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Assigned bus/flight | Workers that received each leg kind |
//! | Missing bus/flight | Workers needing a leg that got none |
//! | Total / mean wait | Connection wait, absolute and per connection |
//! | Seat utilization | Riders ÷ capacity, per vehicle and averaged |

use std::collections::BTreeMap;

use crate::models::{CharterFlight, CommercialFlight, TransportPlan, WorkerLeg};

/// Summary indicators for one shift's plan.
#[derive(Debug, Clone)]
pub struct PlanKpi {
    /// Workers with a bus leg assigned.
    pub assigned_bus: usize,
    /// Workers with a flight leg assigned.
    pub assigned_flight: usize,
    /// Workers needing a bus that received none.
    pub missing_bus: usize,
    /// Workers needing a flight that received none.
    pub missing_flight: usize,
    /// Total connection wait (minutes).
    pub total_wait_min: i64,
    /// Mean wait per worker holding both legs.
    pub mean_wait_min: f64,
    /// Riders ÷ capacity per bus trip.
    pub bus_utilization: BTreeMap<String, f64>,
    /// Average bus seat utilization (0.0..1.0).
    pub avg_bus_utilization: f64,
    /// Passengers ÷ capacity per flight that carries anyone.
    pub flight_utilization: BTreeMap<String, f64>,
    /// Count of data-quality findings attached to the plan.
    pub diagnostic_count: usize,
}

impl PlanKpi {
    /// Computes KPIs from a plan and its inputs.
    pub fn calculate(
        plan: &TransportPlan,
        workers: &[WorkerLeg],
        charters: &[CharterFlight],
        commercial: &[CommercialFlight],
    ) -> Self {
        let assigned_bus = plan.assignments.iter().filter(|a| a.bus_id.is_some()).count();
        let assigned_flight = plan.assignments.iter().filter(|a| a.flight.is_some()).count();

        let mut missing_bus = 0;
        let mut missing_flight = 0;
        let mut both_legs = 0;
        for worker in workers {
            let assignment = plan.assignment_for(&worker.id);
            let has_bus = assignment.is_some_and(|a| a.bus_id.is_some());
            let has_flight = assignment.is_some_and(|a| a.flight.is_some());
            if worker.needs_bus && !has_bus {
                missing_bus += 1;
            }
            if worker.needs_flight && !has_flight {
                missing_flight += 1;
            }
            if has_bus && has_flight {
                both_legs += 1;
            }
        }

        let mut bus_utilization = BTreeMap::new();
        for scheduled in &plan.trips {
            let trip = &scheduled.trip;
            if trip.capacity > 0 {
                bus_utilization.insert(
                    trip.id.clone(),
                    plan.riders_of(&trip.id) as f64 / trip.capacity as f64,
                );
            }
        }
        let avg_bus_utilization = if bus_utilization.is_empty() {
            0.0
        } else {
            bus_utilization.values().sum::<f64>() / bus_utilization.len() as f64
        };

        let mut flight_utilization = BTreeMap::new();
        for (id, capacity) in charters
            .iter()
            .map(|f| (f.id.as_str(), f.remaining()))
            .chain(commercial.iter().map(|f| (f.id.as_str(), f.seats)))
        {
            let passengers = plan.passengers_of(id);
            if passengers > 0 && capacity > 0 {
                flight_utilization.insert(id.to_string(), passengers as f64 / capacity as f64);
            }
        }

        let mean_wait_min = if both_legs == 0 {
            0.0
        } else {
            plan.total_wait_min as f64 / both_legs as f64
        };

        Self {
            assigned_bus,
            assigned_flight,
            missing_bus,
            missing_flight,
            total_wait_min: plan.total_wait_min,
            mean_wait_min,
            bus_utilization,
            avg_bus_utilization,
            flight_utilization,
            diagnostic_count: plan.diagnostics.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Assignment, BusTrip, Diagnostic, Direction, FlightLeg, ScheduledTrip,
    };

    fn sample_plan() -> TransportPlan {
        TransportPlan {
            trips: vec![ScheduledTrip {
                trip: BusTrip::new("b1", "Valparaíso", Direction::Outbound, 10),
                departure_min: 430,
                arrival_min: 520,
            }],
            assignments: vec![
                Assignment {
                    worker_id: "w1".into(),
                    bus_id: Some("b1".into()),
                    flight: Some(FlightLeg::Charter("c1".into())),
                },
                Assignment {
                    worker_id: "w2".into(),
                    bus_id: Some("b1".into()),
                    flight: None,
                },
            ],
            diagnostics: vec![Diagnostic::exhausted_flight_capacity("w2", "no seats")],
            total_wait_min: 180,
        }
    }

    fn sample_workers() -> Vec<WorkerLeg> {
        vec![
            WorkerLeg::new("w1", Direction::Outbound).with_region("Valparaíso"),
            WorkerLeg::new("w2", Direction::Outbound).with_region("Valparaíso"),
        ]
    }

    #[test]
    fn test_kpi_counts() {
        let charters = vec![CharterFlight::new("c1", "Santiago", "Calama").with_capacity(4)];
        let kpi = PlanKpi::calculate(&sample_plan(), &sample_workers(), &charters, &[]);

        assert_eq!(kpi.assigned_bus, 2);
        assert_eq!(kpi.assigned_flight, 1);
        assert_eq!(kpi.missing_bus, 0);
        assert_eq!(kpi.missing_flight, 1);
        assert_eq!(kpi.diagnostic_count, 1);
    }

    #[test]
    fn test_kpi_wait_and_utilization() {
        let charters = vec![CharterFlight::new("c1", "Santiago", "Calama").with_capacity(4)];
        let kpi = PlanKpi::calculate(&sample_plan(), &sample_workers(), &charters, &[]);

        assert_eq!(kpi.total_wait_min, 180);
        // One worker holds both legs.
        assert!((kpi.mean_wait_min - 180.0).abs() < 1e-10);
        // 2 riders on a 10-seat bus.
        assert!((kpi.bus_utilization["b1"] - 0.2).abs() < 1e-10);
        assert!((kpi.avg_bus_utilization - 0.2).abs() < 1e-10);
        // 1 passenger on 4 charter seats.
        assert!((kpi.flight_utilization["c1"] - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_kpi_empty_plan() {
        let kpi = PlanKpi::calculate(&TransportPlan::default(), &[], &[], &[]);
        assert_eq!(kpi.assigned_bus, 0);
        assert_eq!(kpi.total_wait_min, 0);
        assert!((kpi.avg_bus_utilization - 0.0).abs() < 1e-10);
    }
}
