//! Bus route construction.
//!
//! Packs per-community worker demand into discrete bus trips under a
//! region's allowed capacity tiers, in two phases:
//!
//! 1. **Full loads**: per community, repeatedly carve off the largest
//!    tier that still fits the remaining count — one community per trip.
//! 2. **Remainder clustering**: seed a cluster with the first community
//!    still holding a residual, pull in every other residual community
//!    within the distance threshold, and cover the cluster with the
//!    smallest sufficient tier (or the largest available if none covers
//!    it, carrying the overflow back into the pool).
//!
//! Grouping is sensitive to traversal order, so all iteration runs in
//! sorted community/region order — never incidental map order.
//!
//! # Reference
//! Martello & Toth (1990), "Knapsack Problems", Ch. 8 (FFD-style packing)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::PlanParams;
use crate::distance::DistanceOracle;
use crate::error::PlanError;
use crate::models::{canon, same_name, BusTrip, Diagnostic, Direction, Region, WorkerLeg};

/// Occupants a trip carries for one community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityLoad {
    /// Community name (canonical form).
    pub community: String,
    /// Workers boarding/alighting there.
    pub count: u32,
}

/// A built trip together with its planned occupancy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedTrip {
    /// The trip handed to the solver.
    pub trip: BusTrip,
    /// Per-community occupant counts; sums to at most the capacity.
    pub loads: Vec<CommunityLoad>,
}

/// Route builder output for a whole shift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Trips across all regions and directions.
    pub trips: Vec<PlannedTrip>,
    /// Workers skipped for missing region mappings.
    pub diagnostics: Vec<Diagnostic>,
}

impl PlannedTrip {
    /// Total planned occupants.
    pub fn occupancy(&self) -> u32 {
        self.loads.iter().map(|l| l.count).sum()
    }
}

/// Builds bus trips for every region and direction with demand.
///
/// Demand is counted from worker legs with `needs_bus`, grouped by
/// region and direction and keyed by canonical home community. Workers
/// whose region has no matching [`Region`] record are skipped with a
/// [`Diagnostic`], as are workers whose home community falls outside a
/// region's declared approach list for their direction (a region that
/// declares no list accepts any community). A region that has demand but
/// no capacity tiers aborts the run.
pub fn build_bus_trips(
    workers: &[WorkerLeg],
    regions: &[Region],
    oracle: &dyn DistanceOracle,
    params: &PlanParams,
) -> Result<RoutePlan, PlanError> {
    let mut plan = RoutePlan::default();

    // (region name, direction) → community → count, all BTree-ordered.
    let mut demand: BTreeMap<(String, Direction), BTreeMap<String, u32>> = BTreeMap::new();
    for worker in workers.iter().filter(|w| w.needs_bus) {
        let Some(region) = find_region(regions, &worker.region) else {
            plan.diagnostics.push(Diagnostic::missing_region(
                &worker.id,
                format!(
                    "worker '{}' region '{}' has no region record; bus demand skipped",
                    worker.id, worker.region
                ),
            ));
            continue;
        };
        if !region.approach_communities(worker.direction).is_empty()
            && !region.recognizes(&worker.home_community, worker.direction)
        {
            plan.diagnostics.push(Diagnostic::missing_region(
                &worker.id,
                format!(
                    "community '{}' is not a recognized {} approach point of region '{}'; bus demand skipped",
                    worker.home_community, worker.direction, region.name
                ),
            ));
            continue;
        }
        *demand
            .entry((region.name.clone(), worker.direction))
            .or_default()
            .entry(canon(&worker.home_community))
            .or_insert(0) += 1;
    }

    for ((region_name, direction), counts) in &demand {
        let region = find_region(regions, region_name)
            .expect("demand only holds regions resolved above");
        let trips = build_region_trips(region, *direction, counts, oracle, params)?;
        plan.trips.extend(trips);
    }

    Ok(plan)
}

/// Builds the trips for one region and direction.
///
/// `counts` must be keyed by canonical community name; iteration order of
/// the `BTreeMap` is the tie-break order required for reproducibility.
pub fn build_region_trips(
    region: &Region,
    direction: Direction,
    counts: &BTreeMap<String, u32>,
    oracle: &dyn DistanceOracle,
    params: &PlanParams,
) -> Result<Vec<PlannedTrip>, PlanError> {
    let total: u32 = counts.values().sum();
    if total == 0 {
        return Ok(Vec::new());
    }
    if region.capacity_tiers.is_empty() {
        return Err(PlanError::NoCapacityTiers(region.name.clone()));
    }

    let mut trips = Vec::new();
    let mut seq = 0usize;
    let next_id = |seq: &mut usize| {
        *seq += 1;
        format!("{}_{}_bus{}", canon(&region.name), direction, seq)
    };

    // Phase 1: full loads, one community per trip.
    let mut residual: BTreeMap<String, u32> = BTreeMap::new();
    for (community, &count) in counts {
        let mut remaining = count;
        while let Some(tier) = region.largest_tier_at_most(remaining) {
            trips.push(PlannedTrip {
                trip: BusTrip::new(next_id(&mut seq), &region.name, direction, tier)
                    .with_communities(vec![community.clone()]),
                loads: vec![CommunityLoad {
                    community: community.clone(),
                    count: tier,
                }],
            });
            remaining -= tier;
        }
        if remaining > 0 {
            residual.insert(community.clone(), remaining);
        }
    }

    // Phase 2: cluster residuals by distance to the seed community.
    while let Some(seed) = residual.keys().next().cloned() {
        let mut cluster = vec![seed.clone()];
        cluster.extend(
            residual
                .keys()
                .filter(|c| **c != seed)
                .filter(|c| oracle.distance(&seed, c) <= params.cluster_threshold)
                .cloned(),
        );

        let cluster_total: u32 = cluster.iter().map(|c| residual[c]).sum();
        let tier = region
            .tier_covering(cluster_total)
            .expect("tier list verified non-empty above");

        let mut loads = Vec::new();
        let mut seats_left = tier;
        for community in &cluster {
            if seats_left == 0 {
                break;
            }
            let have = residual[community];
            let take = have.min(seats_left);
            seats_left -= take;
            loads.push(CommunityLoad {
                community: community.clone(),
                count: take,
            });
            if take == have {
                residual.remove(community);
            } else {
                // Overflow beyond the tier goes back into the pool.
                residual.insert(community.clone(), have - take);
            }
        }

        let communities = loads.iter().map(|l| l.community.clone()).collect();
        trips.push(PlannedTrip {
            trip: BusTrip::new(next_id(&mut seq), &region.name, direction, tier)
                .with_communities(communities),
            loads,
        });
    }

    Ok(trips)
}

fn find_region<'a>(regions: &'a [Region], name: &str) -> Option<&'a Region> {
    regions.iter().find(|r| same_name(&r.name, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceTable;

    fn sample_region() -> Region {
        Region::new("Valparaíso")
            .with_capacity_tiers(vec![12, 20, 10])
            .with_leg_duration(90)
    }

    fn counts(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(c, n)| (canon(c), *n)).collect()
    }

    #[test]
    fn test_single_community_full_loads_and_residual() {
        // 37 with tiers [12,20,10]: full trips of 20 and 12, residual 5.
        let region = sample_region();
        let trips = build_region_trips(
            &region,
            Direction::Outbound,
            &counts(&[("Quillota", 37)]),
            &DistanceTable::new(),
            &PlanParams::default(),
        )
        .unwrap();

        assert_eq!(trips.len(), 3);
        assert_eq!(trips[0].trip.capacity, 20);
        assert_eq!(trips[0].occupancy(), 20);
        assert_eq!(trips[1].trip.capacity, 12);
        assert_eq!(trips[1].occupancy(), 12);
        // Residual of 5 is carried into a clustering trip on the
        // smallest sufficient tier.
        assert_eq!(trips[2].trip.capacity, 10);
        assert_eq!(trips[2].occupancy(), 5);
        assert_eq!(trips[2].trip.communities, vec![canon("Quillota")]);
    }

    #[test]
    fn test_full_load_trips_serve_one_community() {
        let region = sample_region();
        let trips = build_region_trips(
            &region,
            Direction::Outbound,
            &counts(&[("Quillota", 40), ("La Calera", 25)]),
            &DistanceTable::new(),
            &PlanParams::default(),
        )
        .unwrap();

        for t in trips.iter().filter(|t| t.occupancy() == t.trip.capacity) {
            assert_eq!(t.trip.communities.len(), 1);
        }
    }

    #[test]
    fn test_residuals_merge_within_threshold() {
        // Residuals 5 and 8 at distance 15 merge into one trip on the
        // smallest tier covering 13.
        let region = Region::new("Valparaíso").with_capacity_tiers(vec![20, 13]);
        let oracle = DistanceTable::new().with_entry("A", "B", 15.0);
        let trips = build_region_trips(
            &region,
            Direction::Outbound,
            &counts(&[("A", 5), ("B", 8)]),
            &oracle,
            &PlanParams::default(),
        )
        .unwrap();

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].trip.capacity, 13);
        assert_eq!(trips[0].occupancy(), 13);
        assert_eq!(trips[0].trip.communities.len(), 2);
    }

    #[test]
    fn test_distant_residuals_stay_apart() {
        let region = Region::new("Valparaíso").with_capacity_tiers(vec![20]);
        let oracle = DistanceTable::new().with_entry("A", "B", 120.0);
        let trips = build_region_trips(
            &region,
            Direction::Outbound,
            &counts(&[("A", 5), ("B", 8)]),
            &oracle,
            &PlanParams::default(),
        )
        .unwrap();

        assert_eq!(trips.len(), 2);
        for t in &trips {
            assert_eq!(t.trip.communities.len(), 1);
        }
    }

    #[test]
    fn test_cluster_overflow_returns_to_pool() {
        // 18 + 15 = 33 residual, largest tier 20: first trip fills 20,
        // the remaining 13 comes back as a second clustered trip.
        let region = Region::new("Valparaíso").with_capacity_tiers(vec![20]);
        let oracle = DistanceTable::new().with_entry("A", "B", 10.0);
        let trips = build_region_trips(
            &region,
            Direction::Outbound,
            &counts(&[("A", 18), ("B", 15)]),
            &oracle,
            &PlanParams::default(),
        )
        .unwrap();

        assert_eq!(trips.len(), 2);
        let placed: u32 = trips.iter().map(|t| t.occupancy()).sum();
        assert_eq!(placed, 33);
        for t in &trips {
            assert!(t.occupancy() <= t.trip.capacity);
        }
    }

    #[test]
    fn test_demand_conservation() {
        let region = sample_region();
        let demand = counts(&[("A", 37), ("B", 8), ("C", 3)]);
        let oracle = DistanceTable::new()
            .with_entry("A", "B", 15.0)
            .with_entry("A", "C", 20.0)
            .with_entry("B", "C", 12.0);
        let trips = build_region_trips(
            &region,
            Direction::Inbound,
            &demand,
            &oracle,
            &PlanParams::default(),
        )
        .unwrap();

        let placed: u32 = trips.iter().map(|t| t.occupancy()).sum();
        assert_eq!(placed, 48);
        for t in &trips {
            assert!(t.occupancy() <= t.trip.capacity);
        }
    }

    #[test]
    fn test_no_tiers_is_fatal() {
        let region = Region::new("Atacama");
        let err = build_region_trips(
            &region,
            Direction::Outbound,
            &counts(&[("A", 5)]),
            &DistanceTable::new(),
            &PlanParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::NoCapacityTiers(name) if name == "Atacama"));
    }

    #[test]
    fn test_missing_region_mapping_is_diagnosed() {
        let workers = vec![
            WorkerLeg::new("w1", Direction::Outbound)
                .with_home_community("Quillota")
                .with_region("Valparaíso"),
            WorkerLeg::new("w2", Direction::Outbound)
                .with_home_community("Somewhere")
                .with_region("Unmapped"),
        ];
        let regions = vec![sample_region()];
        let plan = build_bus_trips(
            &workers,
            &regions,
            &DistanceTable::new(),
            &PlanParams::default(),
        )
        .unwrap();

        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].entity_id, "w2");
        // w1's demand still produced a trip.
        assert_eq!(plan.trips.len(), 1);
        assert_eq!(plan.trips[0].occupancy(), 1);
    }

    #[test]
    fn test_unrecognized_approach_community_is_diagnosed() {
        let region = sample_region()
            .with_outbound_communities(vec!["Quillota".into(), "La Calera".into()]);
        let workers = vec![
            WorkerLeg::new("w1", Direction::Outbound)
                .with_home_community("Quillota")
                .with_region("Valparaíso"),
            // Not an approach point for outbound travel in this region.
            WorkerLeg::new("w2", Direction::Outbound)
                .with_home_community("Limache")
                .with_region("Valparaíso"),
        ];
        let plan = build_bus_trips(
            &workers,
            &[region],
            &DistanceTable::new(),
            &PlanParams::default(),
        )
        .unwrap();

        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(plan.diagnostics[0].entity_id, "w2");
        assert_eq!(plan.trips.len(), 1);
        assert_eq!(plan.trips[0].occupancy(), 1);
    }

    #[test]
    fn test_deterministic_across_input_order() {
        let regions = vec![sample_region()];
        let oracle = DistanceTable::new().with_entry("A", "B", 15.0);
        let make = |ids: &[(&str, &str)]| {
            let workers: Vec<_> = ids
                .iter()
                .map(|(id, c)| {
                    WorkerLeg::new(*id, Direction::Outbound)
                        .with_home_community(*c)
                        .with_region("Valparaíso")
                })
                .collect();
            build_bus_trips(&workers, &regions, &oracle, &PlanParams::default()).unwrap()
        };

        let forward = make(&[("w1", "A"), ("w2", "B"), ("w3", "A")]);
        let backward = make(&[("w3", "A"), ("w2", "B"), ("w1", "A")]);

        let ids = |p: &RoutePlan| {
            p.trips
                .iter()
                .map(|t| (t.trip.id.clone(), t.trip.communities.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&forward), ids(&backward));
    }
}
