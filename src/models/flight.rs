//! Flight models.
//!
//! Charter flights are pre-contracted capacity dedicated to the
//! operation; commercial flights are purchasable seats scraped from
//! public schedules. Price and seat counts on commercial flights are
//! authoritative snapshots taken before the run, never re-fetched
//! mid-solve.
//!
//! Clocks are minutes from the shift-day midnight (small-hours times of
//! the next day appear as `minute + 1440`).

use serde::{Deserialize, Serialize};

use super::same_name;

/// Pre-contracted flight capacity dedicated to the operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharterFlight {
    /// Unique flight identifier.
    pub id: String,
    /// Total contracted seats.
    pub capacity: u32,
    /// Seats already committed by manual assignment before the run.
    pub reserved: u32,
    /// Origin city.
    pub origin: String,
    /// Destination city.
    pub destination: String,
    /// Departure clock (minutes).
    pub departure_min: i64,
    /// Arrival clock (minutes).
    pub arrival_min: i64,
}

/// Purchasable seats on a public-schedule flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommercialFlight {
    /// Unique flight identifier.
    pub id: String,
    /// Seats available for purchase.
    pub seats: u32,
    /// Price per seat, in the operation's currency minor unit.
    pub price: i64,
    /// Origin city.
    pub origin: String,
    /// Destination city.
    pub destination: String,
    /// Departure clock (minutes).
    pub departure_min: i64,
    /// Arrival clock (minutes).
    pub arrival_min: i64,
    /// Number of intermediate stops.
    pub stops: u32,
}

/// Reference to the flight chosen for a worker, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightLeg {
    /// A charter flight, by id.
    Charter(String),
    /// A commercial flight, by id.
    Commercial(String),
}

impl CharterFlight {
    /// Creates a charter flight with zero capacity.
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            capacity: 0,
            reserved: 0,
            origin: origin.into(),
            destination: destination.into(),
            departure_min: 0,
            arrival_min: 0,
        }
    }

    /// Sets the contracted capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets seats already committed manually.
    pub fn with_reserved(mut self, reserved: u32) -> Self {
        self.reserved = reserved;
        self
    }

    /// Sets departure/arrival clocks.
    pub fn with_times(mut self, departure_min: i64, arrival_min: i64) -> Self {
        self.departure_min = departure_min;
        self.arrival_min = arrival_min;
        self
    }

    /// Seats still open after manual assignments.
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.reserved)
    }

    /// Whether the flight's city pair equals the given route exactly.
    pub fn matches_route(&self, origin: &str, destination: &str) -> bool {
        same_name(&self.origin, origin) && same_name(&self.destination, destination)
    }
}

impl CommercialFlight {
    /// Creates a commercial flight with zero seats.
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            seats: 0,
            price: 0,
            origin: origin.into(),
            destination: destination.into(),
            departure_min: 0,
            arrival_min: 0,
            stops: 0,
        }
    }

    /// Sets the purchasable seat count.
    pub fn with_seats(mut self, seats: u32) -> Self {
        self.seats = seats;
        self
    }

    /// Sets the per-seat price.
    pub fn with_price(mut self, price: i64) -> Self {
        self.price = price;
        self
    }

    /// Sets departure/arrival clocks.
    pub fn with_times(mut self, departure_min: i64, arrival_min: i64) -> Self {
        self.departure_min = departure_min;
        self.arrival_min = arrival_min;
        self
    }

    /// Sets the intermediate stop count.
    pub fn with_stops(mut self, stops: u32) -> Self {
        self.stops = stops;
        self
    }

    /// Whether the flight's city pair equals the given route exactly.
    pub fn matches_route(&self, origin: &str, destination: &str) -> bool {
        same_name(&self.origin, origin) && same_name(&self.destination, destination)
    }
}

impl FlightLeg {
    /// The referenced flight id, regardless of kind.
    pub fn id(&self) -> &str {
        match self {
            FlightLeg::Charter(id) | FlightLeg::Commercial(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charter_remaining() {
        let f = CharterFlight::new("c1", "Santiago", "Calama")
            .with_capacity(100)
            .with_reserved(12);
        assert_eq!(f.remaining(), 88);

        let over = CharterFlight::new("c2", "Santiago", "Calama")
            .with_capacity(10)
            .with_reserved(15);
        assert_eq!(over.remaining(), 0);
    }

    #[test]
    fn test_route_match_is_exact_pair() {
        let f = CommercialFlight::new("f1", "Santiago", "Calama");
        assert!(f.matches_route("SANTIAGO", "calama"));
        assert!(!f.matches_route("Calama", "Santiago"));
    }

    #[test]
    fn test_flight_leg_id() {
        assert_eq!(FlightLeg::Charter("c1".into()).id(), "c1");
        assert_eq!(FlightLeg::Commercial("f9".into()).id(), "f9");
    }
}
