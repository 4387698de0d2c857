//! Route scheduling and cost evaluation.
//!
//! Every feasibility decision the router makes goes through
//! [`CostEvaluator::schedule`], a forward pass over a visit sequence that
//! waits for pickup windows to open, charges service times and tracks the
//! carried load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PlannerConfig;
use crate::error::ModelError;
use crate::graph::AirportGraph;
use crate::ids::{Seconds, Timestamp};
use crate::model::Handler;
use crate::route::{RouteSchedule, StopAction, Visit, WorkingRoute};
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowViolation {
    #[error("pickup at stop {stop} would start at {start}, after its window closed at {close}")]
    PickupWindowClosed {
        stop: usize,
        start: Timestamp,
        close: Timestamp,
    },

    #[error("delivery at stop {stop} would arrive at {arrival}, after its limit {limit}")]
    DeadlineMissed {
        stop: usize,
        arrival: Timestamp,
        limit: Timestamp,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertionError {
    #[error("carried load {load} exceeds capacity {capacity} at stop {stop}")]
    Capacity { stop: usize, load: u64, capacity: u32 },

    #[error(transparent)]
    Window(#[from] WindowViolation),
}

/// A feasible placement of one task into a route.
#[derive(Debug, Clone)]
pub struct Insertion {
    pub pickup_pos: usize,
    pub delivery_pos: usize,
    pub added_travel: Seconds,
    pub added_lateness: Seconds,
    /// Deadline slack the existing deliveries lose.
    pub slack_consumed: Seconds,
    pub marginal_cost: i64,
    /// The route after insertion.
    pub route: WorkingRoute,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub travel_time: Seconds,
    pub handlers_used: usize,
    pub lateness: Seconds,
    /// Weighted sum of the three terms.
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostWeights {
    pub travel: i64,
    pub handler_count: i64,
    pub lateness: i64,
}

impl From<&PlannerConfig> for CostWeights {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            travel: config.travel_weight,
            handler_count: config.handler_count_weight,
            lateness: config.lateness_weight,
        }
    }
}

impl CostWeights {
    pub fn combine(&self, travel_time: Seconds, handlers_used: usize, lateness: Seconds) -> i64 {
        self.travel * travel_time + self.handler_count * handlers_used as i64 + self.lateness * lateness
    }
}

#[derive(Debug, Clone)]
pub struct CostEvaluator<'a> {
    graph: &'a AirportGraph,
    tasks: &'a [Task],
    handlers: &'a [Handler],
    start_gates: Vec<usize>,
    weights: CostWeights,
    allow_late_delivery: bool,
    return_to_start: bool,
}

impl<'a> CostEvaluator<'a> {
    pub fn new(
        graph: &'a AirportGraph,
        tasks: &'a [Task],
        handlers: &'a [Handler],
        config: &PlannerConfig,
    ) -> Result<Self, ModelError> {
        let start_gates = handlers
            .iter()
            .map(|handler| graph.index_of(&handler.start_gate))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            graph,
            tasks,
            handlers,
            start_gates,
            weights: CostWeights::from(config),
            allow_late_delivery: config.allow_late_delivery,
            return_to_start: config.return_to_start,
        })
    }

    pub fn graph(&self) -> &'a AirportGraph {
        self.graph
    }

    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    pub fn handlers(&self) -> &'a [Handler] {
        self.handlers
    }

    pub fn weights(&self) -> CostWeights {
        self.weights
    }

    /// Forward pass over `visits` for `handler`.
    pub fn schedule(&self, handler: usize, visits: &[Visit]) -> Result<RouteSchedule, InsertionError> {
        let spec = &self.handlers[handler];
        let start = self.start_gates[handler];

        let mut time = spec.available_from;
        let mut at = start;
        let mut load: u64 = 0;
        let mut schedule = RouteSchedule {
            times: Vec::with_capacity(visits.len()),
            ..RouteSchedule::default()
        };

        for (stop, visit) in visits.iter().enumerate() {
            let task = &self.tasks[visit.task];
            match visit.action {
                StopAction::Pickup => {
                    let leg = self.graph.time_between(at, task.pickup_gate);
                    schedule.travel_time += leg;
                    let begin = (time + leg).max(task.window_open);
                    if begin > task.window_close {
                        return Err(WindowViolation::PickupWindowClosed {
                            stop,
                            start: begin,
                            close: task.window_close,
                        }
                        .into());
                    }
                    load += u64::from(task.size);
                    if load > u64::from(spec.capacity) {
                        return Err(InsertionError::Capacity {
                            stop,
                            load,
                            capacity: spec.capacity,
                        });
                    }
                    schedule.times.push(begin);
                    time = begin + spec.load_time;
                    at = task.pickup_gate;
                }
                StopAction::Delivery => {
                    let leg = self.graph.time_between(at, task.delivery_gate);
                    schedule.travel_time += leg;
                    let arrival = time + leg;
                    let limit = if self.allow_late_delivery {
                        task.departure
                    } else {
                        task.deadline
                    };
                    if arrival > limit {
                        return Err(WindowViolation::DeadlineMissed { stop, arrival, limit }.into());
                    }
                    schedule.lateness += (arrival - task.deadline).max(0);
                    schedule.slack += (task.deadline - arrival).max(0);
                    load = load.saturating_sub(u64::from(task.size));
                    schedule.times.push(arrival);
                    time = arrival + spec.unload_time;
                    at = task.delivery_gate;
                }
            }
        }

        if self.return_to_start && !visits.is_empty() {
            schedule.travel_time += self.graph.time_between(at, start);
        }

        Ok(schedule)
    }

    /// Weighted cost of one route; an empty route costs nothing.
    pub fn route_cost(&self, visits: &[Visit], schedule: &RouteSchedule) -> i64 {
        if visits.is_empty() {
            return 0;
        }
        self.weights.combine(schedule.travel_time, 1, schedule.lateness)
    }

    /// Schedules `visits` and wraps them as a working route.
    pub fn evaluate(&self, handler: usize, visits: Vec<Visit>) -> Result<WorkingRoute, InsertionError> {
        let schedule = self.schedule(handler, &visits)?;
        let cost = self.route_cost(&visits, &schedule);
        Ok(WorkingRoute {
            handler,
            visits,
            schedule,
            cost,
        })
    }

    /// Cost of placing `task` at the given positions of `route`.
    pub fn insertion(
        &self,
        route: &WorkingRoute,
        task: usize,
        pickup_pos: usize,
        delivery_pos: usize,
    ) -> Result<Insertion, InsertionError> {
        let visits = route.with_insertion(task, pickup_pos, delivery_pos);
        let candidate = self.evaluate(route.handler, visits)?;

        let own_slack = (self.tasks[task].deadline - candidate.schedule.times[delivery_pos]).max(0);
        Ok(Insertion {
            pickup_pos,
            delivery_pos,
            added_travel: candidate.schedule.travel_time - route.schedule.travel_time,
            added_lateness: candidate.schedule.lateness - route.schedule.lateness,
            slack_consumed: route.schedule.slack - (candidate.schedule.slack - own_slack),
            marginal_cost: candidate.cost - route.cost,
            route: candidate,
        })
    }

    /// Cheapest feasible placement of `task` in `route`; the earlier
    /// position wins on equal cost.
    pub fn best_insertion(&self, route: &WorkingRoute, task: usize) -> Option<Insertion> {
        if self.tasks[task].size > self.handlers[route.handler].capacity {
            return None;
        }

        let len = route.visits.len();
        let mut best: Option<Insertion> = None;
        for pickup_pos in 0..=len {
            for delivery_pos in pickup_pos + 1..=len + 1 {
                if let Ok(insertion) = self.insertion(route, task, pickup_pos, delivery_pos) {
                    let better = best
                        .as_ref()
                        .is_none_or(|current| insertion.marginal_cost < current.marginal_cost);
                    if better {
                        best = Some(insertion);
                    }
                }
            }
        }
        best
    }

    /// Whether `task` alone fits on `handler`.
    pub fn fits_alone(&self, handler: usize, task: usize) -> bool {
        self.insertion(&WorkingRoute::empty(handler), task, 0, 1).is_ok()
    }

    pub fn solution_cost(&self, routes: &[WorkingRoute]) -> CostBreakdown {
        let mut breakdown = CostBreakdown::default();
        for route in routes.iter().filter(|route| !route.is_empty()) {
            breakdown.travel_time += route.schedule.travel_time;
            breakdown.lateness += route.schedule.lateness;
            breakdown.handlers_used += 1;
        }
        breakdown.total =
            self.weights
                .combine(breakdown.travel_time, breakdown.handlers_used, breakdown.lateness);
        breakdown
    }
}
