//! Planner output handed to the reporting layer.

use serde::{Deserialize, Serialize};

use crate::cost::{CostBreakdown, CostEvaluator};
use crate::ids::{BagId, GateId, HandlerId, Seconds, Timestamp};
use crate::route::{StopAction, WorkingRoute};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfeasibleReason {
    /// The connection window is negative regardless of routing.
    StructurallyInfeasible,
    /// No handler could carry the bag with the capacity it had left.
    CapacityExhausted,
    /// No handler could reach the bag and its outbound gate in time.
    NoTimeWindowFit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStop {
    pub bag: BagId,
    pub action: StopAction,
    pub scheduled_time: Timestamp,
    pub gate: GateId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerRoute {
    pub handler: HandlerId,
    pub stops: Vec<PlannedStop>,
    pub travel_time: Seconds,
    pub lateness: Seconds,
}

impl HandlerRoute {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Bags served by this route, in pickup order.
    pub fn bags(&self) -> impl Iterator<Item = &BagId> {
        self.stops
            .iter()
            .filter(|stop| stop.action == StopAction::Pickup)
            .map(|stop| &stop.bag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfeasibleBag {
    pub bag: BagId,
    pub reason: InfeasibleReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// One route per handler, in handler id order. Unused handlers have an
    /// empty route.
    pub routes: Vec<HandlerRoute>,
    pub infeasible: Vec<InfeasibleBag>,
    pub cost: CostBreakdown,
    /// False when the search budget ran out before no improving move was
    /// left.
    pub reached_fixed_point: bool,
}

impl Solution {
    pub(crate) fn materialize(
        eval: &CostEvaluator<'_>,
        routes: &[WorkingRoute],
        infeasible: Vec<InfeasibleBag>,
        reached_fixed_point: bool,
    ) -> Self {
        let tasks = eval.tasks();
        let handlers = eval.handlers();
        let graph = eval.graph();
        let cost = eval.solution_cost(routes);

        let routes = routes
            .iter()
            .map(|route| HandlerRoute {
                handler: handlers[route.handler].id.clone(),
                stops: route
                    .visits
                    .iter()
                    .zip(&route.schedule.times)
                    .map(|(visit, &scheduled_time)| {
                        let task = &tasks[visit.task];
                        let gate = match visit.action {
                            StopAction::Pickup => task.pickup_gate,
                            StopAction::Delivery => task.delivery_gate,
                        };
                        PlannedStop {
                            bag: task.bag.clone(),
                            action: visit.action,
                            scheduled_time,
                            gate: graph.gate(gate).id.clone(),
                        }
                    })
                    .collect(),
                travel_time: route.schedule.travel_time,
                lateness: route.schedule.lateness,
            })
            .collect();

        Self {
            routes,
            infeasible,
            cost,
            reached_fixed_point,
        }
    }

    pub fn route_for(&self, handler: &HandlerId) -> Option<&HandlerRoute> {
        self.routes.iter().find(|route| &route.handler == handler)
    }

    /// Routes with at least one stop.
    pub fn used_routes(&self) -> impl Iterator<Item = &HandlerRoute> {
        self.routes.iter().filter(|route| !route.is_empty())
    }

    pub fn routed_bags(&self) -> Vec<&BagId> {
        self.routes.iter().flat_map(|route| route.bags()).collect()
    }

    pub fn infeasible_reason(&self, bag: &BagId) -> Option<InfeasibleReason> {
        self.infeasible
            .iter()
            .find(|entry| &entry.bag == bag)
            .map(|entry| entry.reason)
    }

    /// Every bag was routed.
    pub fn is_complete(&self) -> bool {
        self.infeasible.is_empty()
    }

    /// Share of bags left behind, in `0.0..=1.0`.
    pub fn missed_bag_ratio(&self) -> f64 {
        let missed = self.infeasible.len();
        let total = missed + self.routed_bags().len();
        if total == 0 {
            return 0.0;
        }
        missed as f64 / total as f64
    }
}
