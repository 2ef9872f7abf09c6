//! Bus trip model.
//!
//! A trip's clock is not part of the input: the solver owns it as a
//! bounded variable inside the operating window, and the materializer
//! turns the solved value into departure/arrival clocks afterwards.

use serde::{Deserialize, Serialize};

use super::{contains_name, Direction, WorkerLeg};

/// One discrete bus trip for a shift-direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusTrip {
    /// Unique trip identifier.
    pub id: String,
    /// Seat capacity; one of the region's configured tiers when the trip
    /// comes out of the route builder.
    pub capacity: u32,
    /// Travel direction.
    pub direction: Direction,
    /// Served communities. A single community for full-load trips; more
    /// than one only when remainder demand was clustered.
    pub communities: Vec<String>,
    /// Region the trip belongs to.
    pub region: String,
}

impl BusTrip {
    /// Creates a trip serving no communities yet.
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        direction: Direction,
        capacity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            capacity,
            direction,
            communities: Vec::new(),
            region: region.into(),
        }
    }

    /// Sets the served communities.
    pub fn with_communities(mut self, communities: Vec<String>) -> Self {
        self.communities = communities;
        self
    }

    /// Whether this trip can carry the given worker: same direction, and
    /// the worker's home community is among the served communities (the
    /// boarding side outbound, the drop-off side inbound).
    pub fn serves(&self, worker: &WorkerLeg) -> bool {
        self.direction == worker.direction && contains_name(&self.communities, &worker.home_community)
    }
}
