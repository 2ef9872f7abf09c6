//! Per-run allocation parameters.
//!
//! Every component takes an immutable [`PlanParams`] reference instead of
//! reading process-wide state, so two shifts solved back to back cannot
//! observe each other's configuration.
//!
//! All clocks are minutes from the shift-day midnight; times in the small
//! hours of the following day are expressed as `minute + 1440`, which is
//! why the default operating window extends past 1440.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable parameters for one shift's allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanParams {
    /// Earliest bus clock value the solver may choose (minutes).
    pub window_start_min: i64,
    /// Latest bus clock value the solver may choose (minutes).
    pub window_end_min: i64,
    /// Minimum gap between bus arrival and flight departure, outbound.
    pub outbound_buffer_min: i64,
    /// Minimum gap between flight arrival and bus departure, inbound.
    pub inbound_buffer_min: i64,
    /// Extra leg duration per served community beyond the first.
    pub stop_penalty_min: i64,
    /// Maximum inter-community distance for remainder clustering.
    pub cluster_threshold: f64,
    /// Wall-clock budget for the assignment solve. The best incumbent
    /// found within the budget is accepted even if not proven optimal.
    pub solve_time_limit: Duration,
    /// Region whose workers need no bus leg and get charter priority.
    pub headquarters_region: String,
    /// City used as the bus-to-flight interchange. Commercial flights
    /// touching it must fit inside the operating window.
    pub headquarters_city: String,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            window_start_min: 300,  // 05:00
            window_end_min: 1740,   // 05:00 next day
            outbound_buffer_min: 180,
            inbound_buffer_min: 60,
            stop_penalty_min: 30,
            cluster_threshold: 40.0,
            solve_time_limit: Duration::from_secs(30),
            headquarters_region: "METROPOLITANA".into(),
            headquarters_city: "SANTIAGO".into(),
        }
    }
}

impl PlanParams {
    /// Sets the bus operating window.
    pub fn with_window(mut self, start_min: i64, end_min: i64) -> Self {
        self.window_start_min = start_min;
        self.window_end_min = end_min;
        self
    }

    /// Sets both connection buffers.
    pub fn with_buffers(mut self, outbound_min: i64, inbound_min: i64) -> Self {
        self.outbound_buffer_min = outbound_min;
        self.inbound_buffer_min = inbound_min;
        self
    }

    /// Sets the per-additional-stop time penalty.
    pub fn with_stop_penalty(mut self, penalty_min: i64) -> Self {
        self.stop_penalty_min = penalty_min;
        self
    }

    /// Sets the remainder-clustering distance threshold.
    pub fn with_cluster_threshold(mut self, threshold: f64) -> Self {
        self.cluster_threshold = threshold;
        self
    }

    /// Sets the solve time budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.solve_time_limit = limit;
        self
    }

    /// Sets the headquarters region and city names.
    pub fn with_headquarters(
        mut self,
        region: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        self.headquarters_region = region.into();
        self.headquarters_city = city.into();
        self
    }
}
