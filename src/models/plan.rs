//! Plan (solution) model and diagnostics.
//!
//! A `TransportPlan` is the engine's complete output for one shift: the
//! scheduled bus trips, the per-worker assignments, and every
//! data-quality finding collected along the way. Diagnostics are
//! recoverable by design — the affected worker or trip is excluded and
//! reported, never silently dropped.

use serde::{Deserialize, Serialize};

use super::{BusTrip, FlightLeg};

/// The legs chosen for one worker: at most one bus, at most one flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// The worker leg this assignment belongs to.
    pub worker_id: String,
    /// Chosen bus trip, if the worker needed and received one.
    pub bus_id: Option<String>,
    /// Chosen flight, tagged charter or commercial.
    pub flight: Option<FlightLeg>,
}

/// A bus trip with its solved departure/arrival clocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTrip {
    /// The trip as planned (capacity, communities, region).
    pub trip: BusTrip,
    /// Departure clock (minutes).
    pub departure_min: i64,
    /// Arrival clock (minutes).
    pub arrival_min: i64,
}

/// A recoverable data-quality finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Finding category.
    pub kind: DiagnosticKind,
    /// Related entity id (worker, trip, or community).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Categories of recoverable findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A worker's community/region has no matching `Region` record; its
    /// demand was skipped, not merged elsewhere.
    MissingRegionMapping,
    /// A worker needing a bus has no trip serving their community.
    NoCompatibleBus,
    /// A worker needing a flight has no flight on their exact route.
    NoCompatibleFlight,
    /// Residual flight demand exceeded charter plus commercial capacity;
    /// the worker leg is left without a flight.
    ExhaustedFlightCapacity,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }

    /// A worker or trip referencing an unknown region.
    pub fn missing_region(entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::MissingRegionMapping, entity_id, message)
    }

    /// A worker with no compatible bus trip.
    pub fn no_compatible_bus(worker_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::NoCompatibleBus, worker_id, message)
    }

    /// A worker with no compatible flight.
    pub fn no_compatible_flight(worker_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::NoCompatibleFlight, worker_id, message)
    }

    /// A worker left unplaced after both rationing passes.
    pub fn exhausted_flight_capacity(
        worker_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(DiagnosticKind::ExhaustedFlightCapacity, worker_id, message)
    }
}

/// The engine's complete output for one shift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportPlan {
    /// Finalized bus trips with computed clocks.
    pub trips: Vec<ScheduledTrip>,
    /// Per-worker leg choices.
    pub assignments: Vec<Assignment>,
    /// All data-quality findings from routing, rationing, and validation.
    pub diagnostics: Vec<Diagnostic>,
    /// Objective value: total connection wait across assigned workers.
    pub total_wait_min: i64,
}

impl TransportPlan {
    /// Finds the assignment for a worker leg.
    pub fn assignment_for(&self, worker_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.worker_id == worker_id)
    }

    /// Number of workers assigned to the given bus trip.
    pub fn riders_of(&self, bus_id: &str) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.bus_id.as_deref() == Some(bus_id))
            .count()
    }

    /// Number of workers assigned to the given flight.
    pub fn passengers_of(&self, flight_id: &str) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.flight.as_ref().is_some_and(|f| f.id() == flight_id))
            .count()
    }

    /// Diagnostics of one kind.
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }
}
