//! Joint bus/flight assignment model.
//!
//! Builds one mixed-integer model per shift and solves it with the
//! default `good_lp` backend (HiGHS):
//!
//! - a binary per compatible (worker, bus-trip) pair and per eligible
//!   (worker, flight) pair — pairs ruled out by community, direction, or
//!   route never become variables, which is equivalent to forcing their
//!   booleans to zero and keeps the model small and deterministic;
//! - a bounded integer per bus trip for its scheduled clock inside the
//!   operating window;
//! - connection-buffer constraints active only when a worker's bus and
//!   flight booleans are both chosen (big-M form);
//! - per-(worker, bus, flight) conjunction indicators driving a wait
//!   variable that equals the clock gap under the conjunction and zero
//!   otherwise — the linearization for a conditionally-meaningful
//!   difference; the raw gap only means anything for the one combination
//!   actually chosen.
//!
//! The objective minimizes total wait over worker legs that need both
//! legs and live outside the headquarters region. The solve is bounded
//! by the configured wall-clock budget and the best incumbent feasible
//! solution is accepted.
//!
//! # Reference
//! Wolsey (1998), "Integer Programming", Ch. 1.3 (big-M/indicator forms)

use std::collections::BTreeMap;

use good_lp::{
    default_solver, variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable, WithTimeLimit,
};
use serde::{Deserialize, Serialize};

use crate::config::PlanParams;
use crate::error::PlanError;
use crate::models::{
    same_name, Assignment, BusTrip, CharterFlight, CommercialFlight, Direction, FlightLeg,
    WorkerLeg,
};
use crate::rationing::FlightEligibility;
use crate::validation::CompatibilityReport;

/// Solver result: per-worker choices plus the resolved bus clocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveOutcome {
    /// One entry per input worker leg, in input order. Workers excluded
    /// from a mode keep `None` there.
    pub assignments: Vec<Assignment>,
    /// Trip id → solved clock value (arrival outbound, departure
    /// inbound).
    pub bus_times: BTreeMap<String, i64>,
    /// Objective value: total connection wait minutes.
    pub total_wait_min: i64,
}

/// One shift's assignment model over workers, trips, and flights.
pub struct AssignmentModel<'a> {
    workers: &'a [WorkerLeg],
    trips: &'a [BusTrip],
    charters: &'a [CharterFlight],
    commercial: &'a [CommercialFlight],
    eligibility: Option<&'a BTreeMap<String, FlightEligibility>>,
    report: Option<&'a CompatibilityReport>,
    params: &'a PlanParams,
}

// Charter and commercial flights enter the model through one flat slot
// list so constraints never care about the kind.
struct FlightSlot {
    leg: FlightLeg,
    origin: String,
    destination: String,
    departure_min: i64,
    arrival_min: i64,
    capacity: u32,
    kind: FlightEligibility,
}

impl<'a> AssignmentModel<'a> {
    /// Creates a model over the given entities.
    pub fn new(
        workers: &'a [WorkerLeg],
        trips: &'a [BusTrip],
        charters: &'a [CharterFlight],
        commercial: &'a [CommercialFlight],
        params: &'a PlanParams,
    ) -> Self {
        Self {
            workers,
            trips,
            charters,
            commercial,
            eligibility: None,
            report: None,
            params,
        }
    }

    /// Restricts each worker to the flight pool rationing chose for them.
    /// Without this, workers may draw from both pools.
    pub fn with_eligibility(
        mut self,
        eligibility: &'a BTreeMap<String, FlightEligibility>,
    ) -> Self {
        self.eligibility = Some(eligibility);
        self
    }

    /// Applies pre-flight exclusions from the validation stage.
    pub fn with_report(mut self, report: &'a CompatibilityReport) -> Self {
        self.report = Some(report);
        self
    }

    /// Builds and solves the model.
    ///
    /// Returns [`PlanError::Infeasible`] when no assignment satisfies
    /// the hard constraints; the caller must not persist anything in
    /// that case.
    pub fn solve(&self) -> Result<SolveOutcome, PlanError> {
        let slots = self.flight_slots();
        let empty_eligibility = BTreeMap::new();
        let eligibility = self.eligibility.unwrap_or(&empty_eligibility);
        let empty_report = CompatibilityReport::default();
        let report = self.report.unwrap_or(&empty_report);

        // Trips in sorted-id order so variable creation never depends on
        // input order.
        let mut trip_order: Vec<usize> = (0..self.trips.len()).collect();
        trip_order.sort_by(|&i, &j| self.trips[i].id.cmp(&self.trips[j].id));

        let big_m = self.big_m(&slots);

        let mut vars = variables!();

        // t[b]: scheduled clock per trip, bounded by the operating window.
        let mut t: BTreeMap<usize, Variable> = BTreeMap::new();
        for &b in &trip_order {
            t.insert(
                b,
                vars.add(
                    variable()
                        .integer()
                        .min(self.params.window_start_min as f64)
                        .max(self.params.window_end_min as f64)
                        .name(format!("t_{}", self.trips[b].id)),
                ),
            );
        }

        // x[w,b] / y[w,f]: compatible pairs only.
        let mut x: BTreeMap<(usize, usize), Variable> = BTreeMap::new();
        let mut y: BTreeMap<(usize, usize), Variable> = BTreeMap::new();
        for (w, worker) in self.workers.iter().enumerate() {
            if worker.needs_bus && report.bus_active(&worker.id) {
                for &b in &trip_order {
                    if self.trips[b].serves(worker) {
                        x.insert(
                            (w, b),
                            vars.add(variable().binary().name(format!(
                                "x_{}_{}",
                                worker.id, self.trips[b].id
                            ))),
                        );
                    }
                }
            }
            if worker.needs_flight && report.flight_active(&worker.id) {
                let pool = eligibility.get(&worker.id);
                for (f, slot) in slots.iter().enumerate() {
                    if pool.is_some_and(|p| *p != slot.kind) {
                        continue;
                    }
                    if worker.matches_route(&slot.origin, &slot.destination) {
                        y.insert(
                            (w, f),
                            vars.add(variable().binary().name(format!(
                                "y_{}_{}",
                                worker.id,
                                slot.leg.id()
                            ))),
                        );
                    }
                }
            }
        }

        // Conjunction indicators and conditionally-equal wait terms for
        // every (worker, bus, flight) triple that can influence the
        // objective or the connection buffers.
        struct WaitTerm {
            w: usize,
            b: usize,
            f: usize,
            conj: Option<Variable>,
            wait: Option<Variable>,
        }
        let mut terms: Vec<WaitTerm> = Vec::new();
        for (w, worker) in self.workers.iter().enumerate() {
            if !(worker.needs_bus && worker.needs_flight) {
                continue;
            }
            let counts_in_objective = !same_name(&worker.region, &self.params.headquarters_region);
            for &b in &trip_order {
                if !x.contains_key(&(w, b)) {
                    continue;
                }
                for (f, _slot) in slots.iter().enumerate() {
                    if !y.contains_key(&(w, f)) {
                        continue;
                    }
                    let (conj, wait) = if counts_in_objective {
                        let conj = vars.add(
                            variable()
                                .binary()
                                .name(format!("c_{}_{}_{}", worker.id, b, f)),
                        );
                        let wait = vars.add(
                            variable()
                                .integer()
                                .min(0.0)
                                .max(big_m)
                                .name(format!("wait_{}_{}_{}", worker.id, b, f)),
                        );
                        (Some(conj), Some(wait))
                    } else {
                        (None, None)
                    };
                    terms.push(WaitTerm { w, b, f, conj, wait });
                }
            }
        }

        let objective = terms
            .iter()
            .filter_map(|term| term.wait)
            .fold(Expression::from(0.0), |acc, wait| acc + wait);

        let mut model = vars
            .minimise(objective)
            .using(default_solver)
            .with_time_limit(self.params.solve_time_limit.as_secs_f64());

        // Cardinality: exactly one bus / one flight per participating
        // worker. Workers with no compatible pair were excluded by the
        // validation stage; an empty sum here would only re-create the
        // infeasibility that stage exists to prevent.
        for (w, _worker) in self.workers.iter().enumerate() {
            let bus_vars: Vec<Variable> = trip_order
                .iter()
                .filter_map(|&b| x.get(&(w, b)).copied())
                .collect();
            if !bus_vars.is_empty() {
                let sum = bus_vars
                    .iter()
                    .fold(Expression::from(0.0), |acc, &v| acc + v);
                model.add_constraint(sum.eq(1.0));
            }

            let flight_vars: Vec<Variable> = (0..slots.len())
                .filter_map(|f| y.get(&(w, f)).copied())
                .collect();
            if !flight_vars.is_empty() {
                let sum = flight_vars
                    .iter()
                    .fold(Expression::from(0.0), |acc, &v| acc + v);
                model.add_constraint(sum.eq(1.0));
            }
        }

        // Capacity per trip and per flight slot.
        for &b in &trip_order {
            let riders: Vec<Variable> = (0..self.workers.len())
                .filter_map(|w| x.get(&(w, b)).copied())
                .collect();
            if !riders.is_empty() {
                let sum = riders
                    .iter()
                    .fold(Expression::from(0.0), |acc, &v| acc + v);
                model.add_constraint(sum.leq(self.trips[b].capacity as f64));
            }
        }
        for (f, slot) in slots.iter().enumerate() {
            let passengers: Vec<Variable> = (0..self.workers.len())
                .filter_map(|w| y.get(&(w, f)).copied())
                .collect();
            if !passengers.is_empty() {
                let sum = passengers
                    .iter()
                    .fold(Expression::from(0.0), |acc, &v| acc + v);
                model.add_constraint(sum.leq(slot.capacity as f64));
            }
        }

        // Connection buffers and conditional wait equality.
        for term in &terms {
            let worker = &self.workers[term.w];
            let slot = &slots[term.f];
            let xv = x[&(term.w, term.b)];
            let yv = y[&(term.w, term.f)];
            let tv = t[&term.b];

            match worker.direction {
                Direction::Outbound => {
                    // t + buffer ≤ departure, when x and y are both 1.
                    let buffer = self.params.outbound_buffer_min as f64;
                    let dep = slot.departure_min as f64;
                    model.add_constraint(
                        (Expression::from(tv) + big_m * xv + big_m * yv)
                            .leq(dep - buffer + 2.0 * big_m),
                    );
                }
                Direction::Inbound => {
                    // t ≥ arrival + buffer, when x and y are both 1.
                    let buffer = self.params.inbound_buffer_min as f64;
                    let arr = slot.arrival_min as f64;
                    model.add_constraint(
                        (big_m * xv + big_m * yv - tv).leq(2.0 * big_m - arr - buffer),
                    );
                }
            }

            let (Some(conj), Some(wait)) = (term.conj, term.wait) else {
                continue;
            };

            // conj = x ∧ y.
            model.add_constraint((Expression::from(xv) + yv - conj).leq(1.0));
            model.add_constraint((Expression::from(conj) - xv).leq(0.0));
            model.add_constraint((Expression::from(conj) - yv).leq(0.0));

            // wait equals the clock gap under the conjunction, else 0.
            model.add_constraint((Expression::from(wait) - big_m * conj).leq(0.0));
            match worker.direction {
                Direction::Outbound => {
                    let dep = slot.departure_min as f64;
                    // wait = departure − t when conj = 1.
                    model.add_constraint(
                        (Expression::from(wait) + tv - big_m * conj).geq(dep - big_m),
                    );
                    model.add_constraint(
                        (Expression::from(wait) + tv + big_m * conj).leq(dep + big_m),
                    );
                }
                Direction::Inbound => {
                    let arr = slot.arrival_min as f64;
                    // wait = t − arrival when conj = 1.
                    model.add_constraint(
                        (Expression::from(wait) - tv - big_m * conj).geq(-arr - big_m),
                    );
                    model.add_constraint(
                        (Expression::from(wait) - tv + big_m * conj).leq(big_m - arr),
                    );
                }
            }
        }

        let solution = model.solve().map_err(|err| match err {
            ResolutionError::Infeasible => PlanError::Infeasible,
            other => PlanError::Solver(other.to_string()),
        })?;

        // Decode.
        let mut outcome = SolveOutcome::default();
        for &b in &trip_order {
            outcome.bus_times.insert(
                self.trips[b].id.clone(),
                solution.value(t[&b]).round() as i64,
            );
        }
        for (w, worker) in self.workers.iter().enumerate() {
            let bus_id = trip_order
                .iter()
                .find(|&&b| {
                    x.get(&(w, b))
                        .is_some_and(|&v| solution.value(v) > 0.5)
                })
                .map(|&b| self.trips[b].id.clone());
            let flight = (0..slots.len())
                .find(|&f| {
                    y.get(&(w, f))
                        .is_some_and(|&v| solution.value(v) > 0.5)
                })
                .map(|f| slots[f].leg.clone());
            outcome.assignments.push(Assignment {
                worker_id: worker.id.clone(),
                bus_id,
                flight,
            });
        }
        outcome.total_wait_min = terms
            .iter()
            .filter_map(|term| term.wait)
            .map(|wait| solution.value(wait))
            .sum::<f64>()
            .round() as i64;

        Ok(outcome)
    }

    // Charters first (sorted by id), then commercial (sorted by id).
    fn flight_slots(&self) -> Vec<FlightSlot> {
        let mut slots = Vec::with_capacity(self.charters.len() + self.commercial.len());
        let mut charters: Vec<&CharterFlight> = self.charters.iter().collect();
        charters.sort_by(|a, b| a.id.cmp(&b.id));
        for f in charters {
            slots.push(FlightSlot {
                leg: FlightLeg::Charter(f.id.clone()),
                origin: f.origin.clone(),
                destination: f.destination.clone(),
                departure_min: f.departure_min,
                arrival_min: f.arrival_min,
                capacity: f.remaining(),
                kind: FlightEligibility::Charter,
            });
        }
        let mut commercial: Vec<&CommercialFlight> = self.commercial.iter().collect();
        commercial.sort_by(|a, b| a.id.cmp(&b.id));
        for f in commercial {
            slots.push(FlightSlot {
                leg: FlightLeg::Commercial(f.id.clone()),
                origin: f.origin.clone(),
                destination: f.destination.clone(),
                departure_min: f.departure_min,
                arrival_min: f.arrival_min,
                capacity: f.seats,
                kind: FlightEligibility::Commercial,
            });
        }
        slots
    }

    // Large enough to deactivate any timing or equality constraint whose
    // indicator is off, small enough to keep the relaxation sane.
    fn big_m(&self, slots: &[FlightSlot]) -> f64 {
        let max_clock = slots
            .iter()
            .map(|s| s.departure_min.max(s.arrival_min))
            .max()
            .unwrap_or(0)
            .max(self.params.window_end_min);
        let max_buffer = self
            .params
            .outbound_buffer_min
            .max(self.params.inbound_buffer_min);
        (max_clock + max_buffer + 1) as f64
    }
}
