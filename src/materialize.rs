//! Bus schedule materialization.
//!
//! The solver resolves one clock per trip: the arrival at the
//! interchange for outbound trips, the departure from it for inbound
//! trips. This stage derives the paired clock from the region's base leg
//! duration plus a fixed penalty per served community beyond the first.

use std::collections::BTreeMap;

use crate::config::PlanParams;
use crate::models::{same_name, BusTrip, Diagnostic, Direction, Region, ScheduledTrip};

/// Turns solved trip clocks into departure/arrival pairs.
///
/// Trips without a solved clock are skipped; trips whose region has no
/// record are reported and skipped.
pub fn materialize_trips(
    trips: &[BusTrip],
    bus_times: &BTreeMap<String, i64>,
    regions: &[Region],
    params: &PlanParams,
) -> (Vec<ScheduledTrip>, Vec<Diagnostic>) {
    let mut scheduled = Vec::new();
    let mut diagnostics = Vec::new();

    for trip in trips {
        let Some(&solved) = bus_times.get(&trip.id) else {
            continue;
        };
        let Some(region) = regions.iter().find(|r| same_name(&r.name, &trip.region)) else {
            diagnostics.push(Diagnostic::missing_region(
                &trip.id,
                format!(
                    "trip '{}' region '{}' has no region record; schedule not materialized",
                    trip.id, trip.region
                ),
            ));
            continue;
        };

        let extra_stops = trip.communities.len().saturating_sub(1) as i64;
        let duration = region.base_leg_duration_min + params.stop_penalty_min * extra_stops;

        let (departure_min, arrival_min) = match trip.direction {
            Direction::Outbound => (solved - duration, solved),
            Direction::Inbound => (solved, solved + duration),
        };
        scheduled.push(ScheduledTrip {
            trip: trip.clone(),
            departure_min,
            arrival_min,
        });
    }

    (scheduled, diagnostics)
}
