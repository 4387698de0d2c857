//! Local search improvement over a constructed set of routes.
//!
//! Two neighbourhoods, tried in order until neither yields an improvement:
//! relocate (move one task's pickup/delivery pair elsewhere) and exchange
//! (swap two tasks between routes). A move is taken only when every touched
//! route still schedules and the total cost strictly drops.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cost::CostEvaluator;
use crate::route::WorkingRoute;

/// Limits for one worker. The iteration count is per worker; the deadline
/// is shared by all of them.
#[derive(Debug, Clone, Copy)]
pub struct SearchBudget {
    pub max_iterations: usize,
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker: usize,
    /// Candidate moves evaluated.
    pub iterations: usize,
    pub relocations: usize,
    pub exchanges: usize,
    /// Total cost before the first move and after every accepted one.
    pub cost_trace: Vec<i64>,
    pub reached_fixed_point: bool,
}

impl WorkerStats {
    pub fn accepted_moves(&self) -> usize {
        self.relocations + self.exchanges
    }
}

enum Step {
    Improved,
    Stalled,
    OutOfBudget,
}

pub struct LocalSearch<'e, 'a> {
    eval: &'e CostEvaluator<'a>,
    budget: SearchBudget,
    /// Scan-order shuffler. `None` scans in natural order.
    rng: Option<StdRng>,
    iterations: usize,
}

impl<'e, 'a> LocalSearch<'e, 'a> {
    pub fn new(eval: &'e CostEvaluator<'a>, budget: SearchBudget, rng: Option<StdRng>) -> Self {
        Self {
            eval,
            budget,
            rng,
            iterations: 0,
        }
    }

    /// Improves `routes` in place until a fixed point or the budget runs out.
    pub fn run(&mut self, routes: &mut [WorkingRoute]) -> WorkerStats {
        let mut stats = WorkerStats::default();
        stats.cost_trace.push(total_cost(routes));

        loop {
            match self.relocate(routes) {
                Step::Improved => {
                    stats.relocations += 1;
                    stats.cost_trace.push(total_cost(routes));
                    continue;
                }
                Step::OutOfBudget => break,
                Step::Stalled => {}
            }

            match self.exchange(routes) {
                Step::Improved => {
                    stats.exchanges += 1;
                    stats.cost_trace.push(total_cost(routes));
                }
                Step::OutOfBudget => break,
                Step::Stalled => {
                    stats.reached_fixed_point = true;
                    break;
                }
            }
        }

        stats.iterations = self.iterations;
        stats
    }

    /// Counts one candidate move; true once the budget is spent.
    fn tick(&mut self) -> bool {
        self.iterations += 1;
        if self.iterations > self.budget.max_iterations {
            return true;
        }
        self.budget
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn shuffled(&mut self, mut items: Vec<usize>) -> Vec<usize> {
        if let Some(rng) = self.rng.as_mut() {
            items.shuffle(rng);
        }
        items
    }

    fn relocate(&mut self, routes: &mut [WorkingRoute]) -> Step {
        let eval = self.eval;
        let order = self.shuffled((0..routes.len()).collect());

        for &from in &order {
            let tasks = self.shuffled(routes[from].tasks());
            for task in tasks {
                let Ok(reduced) = eval.evaluate(routes[from].handler, routes[from].without(task)) else {
                    continue;
                };

                for &to in &order {
                    if self.tick() {
                        return Step::OutOfBudget;
                    }

                    if from == to {
                        let Some(insertion) = eval.best_insertion(&reduced, task) else {
                            continue;
                        };
                        if insertion.route.cost < routes[from].cost {
                            trace!(task, route = from, "relocate within route");
                            routes[from] = insertion.route;
                            return Step::Improved;
                        }
                        continue;
                    }

                    let Some(insertion) = eval.best_insertion(&routes[to], task) else {
                        continue;
                    };
                    let before = routes[from].cost + routes[to].cost;
                    let after = reduced.cost + insertion.route.cost;
                    if after < before {
                        trace!(task, from, to, delta = after - before, "relocate across routes");
                        routes[from] = reduced;
                        routes[to] = insertion.route;
                        return Step::Improved;
                    }
                }
            }
        }

        Step::Stalled
    }

    fn exchange(&mut self, routes: &mut [WorkingRoute]) -> Step {
        let eval = self.eval;
        let order = self.shuffled((0..routes.len()).collect());

        for (i, &a) in order.iter().enumerate() {
            if routes[a].is_empty() {
                continue;
            }
            for &b in &order[i + 1..] {
                if routes[b].is_empty() {
                    continue;
                }

                let b_tasks = self.shuffled(routes[b].tasks());
                let b_reduced: Vec<(usize, Option<WorkingRoute>)> = b_tasks
                    .into_iter()
                    .map(|task| {
                        let reduced = eval.evaluate(routes[b].handler, routes[b].without(task)).ok();
                        (task, reduced)
                    })
                    .collect();

                let a_tasks = self.shuffled(routes[a].tasks());
                for first in a_tasks {
                    let Ok(a_reduced) = eval.evaluate(routes[a].handler, routes[a].without(first)) else {
                        continue;
                    };

                    for (second, b_without) in &b_reduced {
                        if self.tick() {
                            return Step::OutOfBudget;
                        }
                        let Some(b_without) = b_without else {
                            continue;
                        };
                        let Some(into_a) = eval.best_insertion(&a_reduced, *second) else {
                            continue;
                        };
                        let Some(into_b) = eval.best_insertion(b_without, first) else {
                            continue;
                        };

                        let before = routes[a].cost + routes[b].cost;
                        let after = into_a.route.cost + into_b.route.cost;
                        if after < before {
                            trace!(first, second, a, b, delta = after - before, "exchange");
                            routes[a] = into_a.route;
                            routes[b] = into_b.route;
                            return Step::Improved;
                        }
                    }
                }
            }
        }

        Step::Stalled
    }
}

pub fn total_cost(routes: &[WorkingRoute]) -> i64 {
    routes.iter().map(|route| route.cost).sum()
}
