//! Planning pipeline entry point.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::config::PlannerConfig;
use crate::cost::{CostBreakdown, CostEvaluator, Insertion};
use crate::error::ModelError;
use crate::incumbent::SharedBest;
use crate::model::PlanningModel;
use crate::route::WorkingRoute;
use crate::search::{LocalSearch, SearchBudget, WorkerStats};
use crate::solution::{InfeasibleBag, InfeasibleReason, Solution};
use crate::task::{deadline_order, extract_tasks};
use crate::traits::Ranked;
use crate::validator::{ValidationReport, validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub construction_cost: CostBreakdown,
    /// Tasks construction could not place.
    pub construction_unrouted: usize,
    /// Worker whose candidate was kept.
    pub winning_worker: usize,
    /// One entry per improvement worker, in worker order.
    pub workers: Vec<WorkerStats>,
}

impl SearchStats {
    pub fn winner(&self) -> Option<&WorkerStats> {
        self.workers.iter().find(|stats| stats.worker == self.winning_worker)
    }
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub solution: Solution,
    pub report: ValidationReport,
    pub stats: SearchStats,
}

impl PlanOutcome {
    /// The solution passed validation and may be used as-is.
    pub fn is_accepted(&self) -> bool {
        self.report.is_valid()
    }
}

/// A worker's finished routes, ranked by unrouted count, then cost, then
/// worker index.
#[derive(Debug, Clone)]
struct Candidate {
    routes: Vec<WorkingRoute>,
    unrouted: Vec<usize>,
    cost: CostBreakdown,
    stats: WorkerStats,
}

impl Ranked for Candidate {
    type Key = (usize, i64, usize);

    fn rank(&self) -> (usize, i64, usize) {
        (self.unrouted.len(), self.cost.total, self.stats.worker)
    }
}

/// Plans handler routes for every routable bag in `model`.
///
/// Fails only if `config` is invalid; unroutable bags are reported in the
/// solution instead.
pub fn solve(model: &PlanningModel, config: &PlannerConfig) -> Result<PlanOutcome, ModelError> {
    config.validate()?;
    let started = Instant::now();

    let span = info_span!("solve", bags = model.bags().len(), handlers = model.handlers().len());
    let _enter = span.enter();

    let tasks = extract_tasks(model, config);
    let unconnectable = model.unconnectable_bags(config.minimum_connection_time);
    let eval = CostEvaluator::new(model.graph(), &tasks, model.handlers(), config)?;
    info!(
        tasks = tasks.len(),
        structurally_infeasible = unconnectable.len(),
        "planning run started"
    );

    let (routes, unrouted) = construct(&eval);
    let construction_cost = eval.solution_cost(&routes);
    info!(
        cost = construction_cost.total,
        unrouted = unrouted.len(),
        "construction finished"
    );

    let budget = SearchBudget {
        max_iterations: config.max_iterations,
        deadline: config
            .time_budget_ms
            .map(|ms| started + Duration::from_millis(ms)),
    };

    let best = SharedBest::new();
    let workers: Vec<WorkerStats> = (0..config.workers)
        .into_par_iter()
        .map(|worker| {
            let rng = (worker > 0).then(|| StdRng::seed_from_u64(config.seed.wrapping_add(worker as u64)));
            let candidate = improve(&eval, routes.clone(), unrouted.clone(), budget, rng, worker);
            if best.offer(&candidate) {
                debug!(
                    worker,
                    cost = candidate.cost.total,
                    unrouted = candidate.unrouted.len(),
                    "new best candidate"
                );
            }
            candidate.stats
        })
        .collect();

    let winner = best.into_inner().unwrap_or_else(|| Candidate {
        cost: construction_cost,
        routes: routes.clone(),
        unrouted: unrouted.clone(),
        stats: WorkerStats::default(),
    });

    let mut infeasible: Vec<InfeasibleBag> = unconnectable
        .into_iter()
        .map(|bag| InfeasibleBag {
            bag,
            reason: InfeasibleReason::StructurallyInfeasible,
        })
        .collect();
    for &task in &winner.unrouted {
        infeasible.push(InfeasibleBag {
            bag: tasks[task].bag.clone(),
            reason: classify(&eval, task),
        });
    }
    for entry in &infeasible {
        warn!(bag = %entry.bag, reason = ?entry.reason, "bag not routed");
    }

    let solution = Solution::materialize(&eval, &winner.routes, infeasible, winner.stats.reached_fixed_point);
    let report = validate(&solution, model, config);
    if !report.is_valid() {
        warn!(violations = report.violations.len(), "solution failed validation");
    }

    info!(
        cost = solution.cost.total,
        travel_time = solution.cost.travel_time,
        handlers_used = solution.cost.handlers_used,
        infeasible = solution.infeasible.len(),
        reached_fixed_point = solution.reached_fixed_point,
        "planning run finished"
    );

    Ok(PlanOutcome {
        solution,
        report,
        stats: SearchStats {
            construction_cost,
            construction_unrouted: unrouted.len(),
            winning_worker: winner.stats.worker,
            workers,
        },
    })
}

/// Greedy cheapest insertion in earliest-deadline order.
fn construct(eval: &CostEvaluator<'_>) -> (Vec<WorkingRoute>, Vec<usize>) {
    let mut routes: Vec<WorkingRoute> = (0..eval.handlers().len()).map(WorkingRoute::empty).collect();
    let mut unrouted = Vec::new();

    for task in deadline_order(eval.tasks()) {
        match cheapest_insertion(eval, &routes, task) {
            Some((route, insertion)) => {
                debug!(
                    bag = %eval.tasks()[task].bag,
                    handler = %eval.handlers()[route].id,
                    pickup_pos = insertion.pickup_pos,
                    delivery_pos = insertion.delivery_pos,
                    marginal_cost = insertion.marginal_cost,
                    "task placed"
                );
                routes[route] = insertion.route;
            }
            None => {
                debug!(bag = %eval.tasks()[task].bag, "no feasible position");
                unrouted.push(task);
            }
        }
    }

    (routes, unrouted)
}

/// Cheapest placement across all routes. Routes are in handler id order, so
/// the earlier handler wins on equal cost.
fn cheapest_insertion(
    eval: &CostEvaluator<'_>,
    routes: &[WorkingRoute],
    task: usize,
) -> Option<(usize, Insertion)> {
    let mut best: Option<(usize, Insertion)> = None;
    for (index, route) in routes.iter().enumerate() {
        let Some(insertion) = eval.best_insertion(route, task) else {
            continue;
        };
        let better = best
            .as_ref()
            .is_none_or(|(_, current)| insertion.marginal_cost < current.marginal_cost);
        if better {
            best = Some((index, insertion));
        }
    }
    best
}

/// One worker: local search, then repair. Routes changed by repair have not
/// been searched again, so placing anything clears the fixed-point flag.
fn improve(
    eval: &CostEvaluator<'_>,
    mut routes: Vec<WorkingRoute>,
    mut unrouted: Vec<usize>,
    budget: SearchBudget,
    rng: Option<StdRng>,
    worker: usize,
) -> Candidate {
    let mut stats = LocalSearch::new(eval, budget, rng).run(&mut routes);
    stats.worker = worker;

    let placed = repair(eval, &mut routes, &mut unrouted);
    if placed > 0 {
        debug!(worker, placed, "repair placed tasks after search");
        stats.reached_fixed_point = false;
    }

    Candidate {
        cost: eval.solution_cost(&routes),
        routes,
        unrouted,
        stats,
    }
}

/// Retries every unrouted task against the improved routes. Returns how
/// many were placed.
fn repair(eval: &CostEvaluator<'_>, routes: &mut [WorkingRoute], unrouted: &mut Vec<usize>) -> usize {
    let before = unrouted.len();
    unrouted.retain(|&task| match cheapest_insertion(eval, routes, task) {
        Some((route, insertion)) => {
            routes[route] = insertion.route;
            false
        }
        None => true,
    });
    before - unrouted.len()
}

fn classify(eval: &CostEvaluator<'_>, task: usize) -> InfeasibleReason {
    let size = eval.tasks()[task].size;
    let handlers = eval.handlers();
    if !handlers.iter().any(|handler| handler.capacity >= size) {
        return InfeasibleReason::CapacityExhausted;
    }
    // Fits some handler on its own, so the fleet was simply too busy.
    if (0..handlers.len()).any(|handler| eval.fits_alone(handler, task)) {
        return InfeasibleReason::CapacityExhausted;
    }
    InfeasibleReason::NoTimeWindowFit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AirportGraph, Gate};
    use crate::ids::{BagId, Seconds};
    use crate::model::Handler;
    use crate::task::Task;

    fn graph() -> AirportGraph {
        AirportGraph::builder()
            .gate("G0", 0.0, 0.0)
            .gate("G1", 60.0, 0.0)
            .gate("G2", 120.0, 0.0)
            .default_metric(|a: &Gate, b: &Gate| Some((a.location.0 - b.location.0).abs() as Seconds))
            .build()
            .unwrap()
    }

    fn task(bag: &str) -> Task {
        Task {
            bag: BagId::new(bag),
            size: 1,
            pickup_gate: 1,
            delivery_gate: 2,
            window_open: 0,
            window_close: 4_900,
            deadline: 5_000,
            departure: 5_300,
        }
    }

    fn unlimited() -> SearchBudget {
        SearchBudget {
            max_iterations: usize::MAX,
            deadline: None,
        }
    }

    #[test]
    fn test_repair_after_search_clears_fixed_point() {
        let graph = graph();
        let tasks = vec![task("b1")];
        let handlers = vec![Handler::new("h1", 2, "G0", 0)];
        let eval = CostEvaluator::new(&graph, &tasks, &handlers, &PlannerConfig::default()).unwrap();

        // Nothing to search, one task left for repair.
        let candidate = improve(&eval, vec![WorkingRoute::empty(0)], vec![0], unlimited(), None, 0);

        assert!(candidate.unrouted.is_empty());
        assert_eq!(candidate.routes[0].tasks(), vec![0]);
        assert!(!candidate.stats.reached_fixed_point);
    }

    #[test]
    fn test_fixed_point_kept_when_repair_places_nothing() {
        let graph = graph();
        let tasks = vec![task("b1")];
        let handlers = vec![Handler::new("h1", 2, "G0", 0)];
        let eval = CostEvaluator::new(&graph, &tasks, &handlers, &PlannerConfig::default()).unwrap();

        let (routes, unrouted) = construct(&eval);
        assert!(unrouted.is_empty());
        let candidate = improve(&eval, routes, unrouted, unlimited(), None, 0);

        assert!(candidate.stats.reached_fixed_point);
    }

    #[test]
    fn test_equal_candidates_prefer_lower_worker() {
        let graph = graph();
        let tasks = vec![task("b1")];
        let handlers = vec![Handler::new("h1", 2, "G0", 0)];
        let eval = CostEvaluator::new(&graph, &tasks, &handlers, &PlannerConfig::default()).unwrap();
        let (routes, unrouted) = construct(&eval);

        let late = improve(&eval, routes.clone(), unrouted.clone(), unlimited(), None, 3);
        let early = improve(&eval, routes, unrouted, unlimited(), None, 1);
        assert_eq!(late.cost, early.cost);

        let best = SharedBest::new();
        assert!(best.offer(&late));
        assert!(best.offer(&early));
        assert!(!best.offer(&late));
        assert_eq!(best.into_inner().map(|c| c.stats.worker), Some(1));
    }
}
