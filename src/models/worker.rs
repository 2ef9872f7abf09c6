//! Worker leg model.
//!
//! A `WorkerLeg` is one worker's participation in one shift-direction:
//! outbound (home → worksite) or inbound (worksite → home). It is an
//! immutable input to the solve; whether the worker needs a bus and/or a
//! flight is decided upstream from their home region.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::same_name;

/// Direction of travel within a shift rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Worksite-bound: bus from the home community, then flight out.
    Outbound,
    /// Home-bound: flight back, then bus to the home community.
    Inbound,
}

impl Direction {
    /// Lowercase label, used in generated trip ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One worker's transport needs for one shift-direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerLeg {
    /// Unique identifier (per shift).
    pub id: String,
    /// Travel direction.
    pub direction: Direction,
    /// Community the bus leg starts from (outbound) or ends at (inbound).
    pub home_community: String,
    /// Flight origin city.
    pub flight_origin: String,
    /// Flight destination city.
    pub flight_destination: String,
    /// Home region name; drives capacity tiers and charter priority.
    pub region: String,
    /// `false` only for headquarters-region workers, who board flights
    /// without a feeder bus.
    pub needs_bus: bool,
    /// `false` for regions already adjacent to the headquarters.
    pub needs_flight: bool,
}

impl WorkerLeg {
    /// Creates a worker leg needing both a bus and a flight.
    pub fn new(id: impl Into<String>, direction: Direction) -> Self {
        Self {
            id: id.into(),
            direction,
            home_community: String::new(),
            flight_origin: String::new(),
            flight_destination: String::new(),
            region: String::new(),
            needs_bus: true,
            needs_flight: true,
        }
    }

    /// Sets the home community.
    pub fn with_home_community(mut self, community: impl Into<String>) -> Self {
        self.home_community = community.into();
        self
    }

    /// Sets the flight origin/destination pair.
    pub fn with_route(
        mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        self.flight_origin = origin.into();
        self.flight_destination = destination.into();
        self
    }

    /// Sets the home region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets whether a bus leg is required.
    pub fn with_needs_bus(mut self, needs_bus: bool) -> Self {
        self.needs_bus = needs_bus;
        self
    }

    /// Sets whether a flight leg is required.
    pub fn with_needs_flight(mut self, needs_flight: bool) -> Self {
        self.needs_flight = needs_flight;
        self
    }

    /// Whether this worker's flight route equals the given city pair
    /// exactly (case-insensitive).
    pub fn matches_route(&self, origin: &str, destination: &str) -> bool {
        same_name(&self.flight_origin, origin) && same_name(&self.flight_destination, destination)
    }
}
