//! Inter-community ground distances.
//!
//! The Bus Route Builder merges residual demand from communities that are
//! close to each other, so its grouping decisions are only reproducible if
//! the distance source is a pure function. The oracle is a trait so a
//! static table (the default) can be swapped for a routing-backed lookup.

use std::collections::HashMap;

use crate::models::canon;

/// Distance reported for community pairs absent from the table.
///
/// Large enough that an unknown pair can never fall under any sane
/// clustering threshold.
pub const UNKNOWN_DISTANCE: f64 = 1.0e9;

/// A pure inter-community distance function.
///
/// Implementations must be symmetric and return `0.0` for identical
/// communities (compared case-insensitively).
pub trait DistanceOracle {
    /// Distance between two communities, in the same units as
    /// [`crate::config::PlanParams::cluster_threshold`].
    fn distance(&self, a: &str, b: &str) -> f64;
}

/// Table-backed distance oracle over unordered community pairs.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    entries: HashMap<(String, String), f64>,
}

impl DistanceTable {
    /// Creates an empty table. Every lookup returns [`UNKNOWN_DISTANCE`]
    /// until entries are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a distance entry (builder form).
    pub fn with_entry(mut self, a: &str, b: &str, distance: f64) -> Self {
        self.insert(a, b, distance);
        self
    }

    /// Adds a distance entry for the unordered pair `{a, b}`.
    pub fn insert(&mut self, a: &str, b: &str, distance: f64) {
        self.entries.insert(Self::key(a, b), distance);
    }

    // Unordered pairs are stored under a sorted canonical key so lookup
    // order never matters.
    fn key(a: &str, b: &str) -> (String, String) {
        let (a, b) = (canon(a), canon(b));
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl DistanceOracle for DistanceTable {
    fn distance(&self, a: &str, b: &str) -> f64 {
        if canon(a) == canon(b) {
            return 0.0;
        }
        self.entries
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(UNKNOWN_DISTANCE)
    }
}
