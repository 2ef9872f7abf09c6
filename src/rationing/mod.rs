//! Charter/commercial flight demand rationing.
//!
//! Two passes over each (origin, destination) route's demand, charter
//! first:
//!
//! 1. **Charter**: if remaining charter capacity covers the route's
//!    demand, everyone flies charter. Otherwise headquarters-region
//!    workers board first (input order), then others, and the overflow
//!    rolls to pass 2.
//! 2. **Commercial**: window-valid flights are sorted by ascending price
//!    and accumulated until their seats cover the residual demand; the
//!    rest of the inventory is discarded (not purchased). The same
//!    headquarters-first split fills the retained seats.
//!
//! Workers unplaced after both passes are marked unassigned and reported;
//! they keep whatever bus leg they qualify for — the flight and bus legs
//! stay independent.
//!
//! The stage is idempotent: re-running it over an already-trimmed
//! commercial set reproduces the same retained flights and the same
//! split.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::PlanParams;
use crate::models::{
    canon, same_name, CharterFlight, CommercialFlight, Diagnostic, WorkerLeg,
};

/// Which flight pool a worker leg may draw from after rationing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightEligibility {
    /// Covered by charter capacity on the worker's route.
    Charter,
    /// Covered by retained commercial seats on the worker's route.
    Commercial,
    /// Beyond total capacity; excluded from the solver's flight
    /// constraints.
    Unassigned,
}

/// Rationing output for a shift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RationingOutcome {
    /// The commercial flights actually offered to the solver, cheapest
    /// sufficient prefix per route.
    pub retained_commercial: Vec<CommercialFlight>,
    /// Worker leg → flight pool, for every worker with `needs_flight`.
    pub eligibility: BTreeMap<String, FlightEligibility>,
    /// One finding per worker left without any flight.
    pub diagnostics: Vec<Diagnostic>,
}

impl RationingOutcome {
    /// Workers rationed into the given pool, sorted by worker id.
    pub fn workers_in(&self, pool: FlightEligibility) -> Vec<&str> {
        self.eligibility
            .iter()
            .filter(|(_, e)| **e == pool)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// Splits flight demand between charter capacity and commercial seats.
pub fn ration_flights(
    workers: &[WorkerLeg],
    charters: &[CharterFlight],
    commercial: &[CommercialFlight],
    params: &PlanParams,
) -> RationingOutcome {
    let mut outcome = RationingOutcome::default();

    // Route → demanders in input order.
    let mut routes: BTreeMap<(String, String), Vec<&WorkerLeg>> = BTreeMap::new();
    for worker in workers.iter().filter(|w| w.needs_flight) {
        routes
            .entry((canon(&worker.flight_origin), canon(&worker.flight_destination)))
            .or_default()
            .push(worker);
    }

    for ((origin, destination), demanders) in &routes {
        // Headquarters-region demanders first, stably, then input order.
        let prioritized: Vec<&WorkerLeg> = demanders
            .iter()
            .copied()
            .filter(|w| same_name(&w.region, &params.headquarters_region))
            .chain(
                demanders
                    .iter()
                    .copied()
                    .filter(|w| !same_name(&w.region, &params.headquarters_region)),
            )
            .collect();

        // Pass 1: charter capacity remaining after manual assignments.
        let charter_seats: u32 = charters
            .iter()
            .filter(|c| c.matches_route(origin, destination))
            .map(|c| c.remaining())
            .sum();

        let (charter_bound, residual) = split_at_capacity(&prioritized, charter_seats);
        for w in charter_bound {
            outcome
                .eligibility
                .insert(w.id.clone(), FlightEligibility::Charter);
        }

        // Pass 2: cheapest sufficient commercial prefix.
        let retained = retain_commercial(commercial, origin, destination, residual.len(), params);
        let commercial_seats: u32 = retained.iter().map(|f| f.seats).sum();
        outcome
            .retained_commercial
            .extend(retained.into_iter().cloned());

        let (commercial_bound, unplaced) = split_at_capacity(&residual, commercial_seats);
        for w in commercial_bound {
            outcome
                .eligibility
                .insert(w.id.clone(), FlightEligibility::Commercial);
        }
        for w in unplaced {
            outcome
                .eligibility
                .insert(w.id.clone(), FlightEligibility::Unassigned);
            outcome.diagnostics.push(Diagnostic::exhausted_flight_capacity(
                &w.id,
                format!(
                    "no flight available on {origin} → {destination} for worker '{}'",
                    w.id
                ),
            ));
        }
    }

    outcome
}

/// First `capacity` workers, and the overflow.
fn split_at_capacity<'a>(
    ordered: &[&'a WorkerLeg],
    capacity: u32,
) -> (Vec<&'a WorkerLeg>, Vec<&'a WorkerLeg>) {
    let cut = (capacity as usize).min(ordered.len());
    (ordered[..cut].to_vec(), ordered[cut..].to_vec())
}

/// The cheapest prefix of window-valid flights whose seats cover
/// `demand`, or the whole valid inventory if nothing suffices.
fn retain_commercial<'a>(
    commercial: &'a [CommercialFlight],
    origin: &str,
    destination: &str,
    demand: usize,
    params: &PlanParams,
) -> Vec<&'a CommercialFlight> {
    if demand == 0 {
        return Vec::new();
    }

    let valid = commercial
        .iter()
        .filter(|f| f.matches_route(origin, destination))
        .filter(|f| fits_operating_window(f, params))
        .sorted_by(|a, b| a.price.cmp(&b.price).then_with(|| a.id.cmp(&b.id)));

    let mut retained = Vec::new();
    let mut seats = 0usize;
    for flight in valid {
        if seats >= demand {
            break;
        }
        seats += flight.seats as usize;
        retained.push(flight);
    }
    retained
}

// Flights touching the headquarters city must depart and arrive inside
// the bus operating window; all other routes pass unfiltered.
fn fits_operating_window(flight: &CommercialFlight, params: &PlanParams) -> bool {
    let touches_hq = same_name(&flight.origin, &params.headquarters_city)
        || same_name(&flight.destination, &params.headquarters_city);
    if !touches_hq {
        return true;
    }
    let in_window = |t: i64| t >= params.window_start_min && t <= params.window_end_min;
    in_window(flight.departure_min) && in_window(flight.arrival_min)
}
