//! Independent re-check of a finished solution against every hard
//! constraint.
//!
//! Windows are rebuilt from the model's flights and bags, never from the
//! router's tasks or cached schedules, so bookkeeping bugs in the router show
//! up here as violations.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::ids::{BagId, GateId, HandlerId, Timestamp};
use crate::model::{Handler, PlanningModel, connection_window};
use crate::route::StopAction;
use crate::solution::{HandlerRoute, Solution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Constraint {
    /// A stop is scheduled before the handler could physically get there.
    TravelTime,
    PickupWindow,
    DeliveryDeadline,
    Capacity,
    /// Missing, duplicated or out-of-order pickup/delivery stops.
    Pairing,
    /// A stop at a gate other than the bag's flight gate.
    WrongGate,
    /// A handler, bag or gate the model does not know.
    UnknownReference,
    /// A bag routed more than once, both routed and infeasible, or neither.
    Coverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub handler: Option<HandlerId>,
    pub stop: Option<usize>,
    pub constraint: Constraint,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.constraint)?;
        if let Some(handler) = &self.handler {
            write!(f, " on {}", handler)?;
        }
        if let Some(stop) = self.stop {
            write!(f, " at stop {}", stop)?;
        }
        write!(f, ": {}", self.detail)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn of(&self, constraint: Constraint) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |violation| violation.constraint == constraint)
    }

    fn push(
        &mut self,
        handler: Option<&HandlerId>,
        stop: Option<usize>,
        constraint: Constraint,
        detail: String,
    ) {
        self.violations.push(Violation {
            handler: handler.cloned(),
            stop,
            constraint,
            detail,
        });
    }
}

/// What a bag's flights allow, rebuilt from the model.
struct BagWindow<'m> {
    size: u32,
    pickup_gate: &'m GateId,
    delivery_gate: &'m GateId,
    open: Timestamp,
    close: Timestamp,
    limit: Timestamp,
}

pub fn validate(solution: &Solution, model: &PlanningModel, config: &PlannerConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut windows: HashMap<&BagId, BagWindow<'_>> = HashMap::with_capacity(model.bags().len());
    for bag in model.bags() {
        let (Some(origin), Some(destination)) = (model.flight(&bag.origin), model.flight(&bag.destination)) else {
            continue;
        };
        let Some((arrival, departure)) =
            connection_window(origin, destination, config.minimum_connection_time)
        else {
            continue;
        };
        let limit = if config.allow_late_delivery {
            departure
        } else {
            departure - config.deadline_buffer
        };
        windows.insert(
            &bag.id,
            BagWindow {
                size: bag.size,
                pickup_gate: &origin.gate,
                delivery_gate: &destination.gate,
                open: arrival,
                close: departure - config.minimum_connection_time,
                limit,
            },
        );
    }

    let mut pickups: BTreeMap<&BagId, usize> = BTreeMap::new();
    let mut seen_handlers: BTreeMap<&HandlerId, usize> = BTreeMap::new();
    for route in &solution.routes {
        *seen_handlers.entry(&route.handler).or_default() += 1;
        for bag in route.bags() {
            *pickups.entry(bag).or_default() += 1;
        }

        let Some(handler) = model.handlers().iter().find(|handler| handler.id == route.handler) else {
            report.push(
                Some(&route.handler),
                None,
                Constraint::UnknownReference,
                "handler is not part of the fleet".to_string(),
            );
            continue;
        };
        check_route(route, handler, &windows, model, &mut report);
    }

    for (handler, count) in seen_handlers {
        if count > 1 {
            report.push(
                Some(handler),
                None,
                Constraint::Coverage,
                format!("handler has {} routes", count),
            );
        }
    }

    check_coverage(solution, model, &pickups, &mut report);
    report
}

fn check_route(
    route: &HandlerRoute,
    handler: &Handler,
    windows: &HashMap<&BagId, BagWindow<'_>>,
    model: &PlanningModel,
    report: &mut ValidationReport,
) {
    let graph = model.graph();
    let id = Some(&handler.id);

    let mut at = &handler.start_gate;
    let mut ready = handler.available_from;
    let mut load: u64 = 0;
    // bag -> delivered?
    let mut carried: BTreeMap<&BagId, bool> = BTreeMap::new();

    for (stop, planned) in route.stops.iter().enumerate() {
        match graph.time(at, &planned.gate) {
            Ok(leg) => {
                if planned.scheduled_time < ready + leg {
                    report.push(
                        id,
                        Some(stop),
                        Constraint::TravelTime,
                        format!(
                            "scheduled at {} but earliest arrival from {} is {}",
                            planned.scheduled_time,
                            at,
                            ready + leg
                        ),
                    );
                }
            }
            Err(_) => {
                report.push(
                    id,
                    Some(stop),
                    Constraint::UnknownReference,
                    format!("gate {} is not in the airport graph", planned.gate),
                );
                continue;
            }
        }
        at = &planned.gate;

        let Some(window) = windows.get(&planned.bag) else {
            let detail = if model.bags().iter().any(|bag| bag.id == planned.bag) {
                format!("bag {} has no connection window", planned.bag)
            } else {
                format!("bag {} is not in the model", planned.bag)
            };
            report.push(id, Some(stop), Constraint::UnknownReference, detail);
            ready = planned.scheduled_time
                + match planned.action {
                    StopAction::Pickup => handler.load_time,
                    StopAction::Delivery => handler.unload_time,
                };
            continue;
        };

        match planned.action {
            StopAction::Pickup => {
                if &planned.gate != window.pickup_gate {
                    report.push(
                        id,
                        Some(stop),
                        Constraint::WrongGate,
                        format!("bag {} is picked up at {}, not {}", planned.bag, planned.gate, window.pickup_gate),
                    );
                }
                if planned.scheduled_time < window.open || planned.scheduled_time > window.close {
                    report.push(
                        id,
                        Some(stop),
                        Constraint::PickupWindow,
                        format!(
                            "bag {} picked up at {}, outside [{}, {}]",
                            planned.bag, planned.scheduled_time, window.open, window.close
                        ),
                    );
                }
                if carried.insert(&planned.bag, false).is_some() {
                    report.push(
                        id,
                        Some(stop),
                        Constraint::Pairing,
                        format!("bag {} picked up twice", planned.bag),
                    );
                } else {
                    load += u64::from(window.size);
                }
                if load > u64::from(handler.capacity) {
                    report.push(
                        id,
                        Some(stop),
                        Constraint::Capacity,
                        format!("carrying {} with capacity {}", load, handler.capacity),
                    );
                }
                ready = planned.scheduled_time + handler.load_time;
            }
            StopAction::Delivery => {
                if &planned.gate != window.delivery_gate {
                    report.push(
                        id,
                        Some(stop),
                        Constraint::WrongGate,
                        format!("bag {} is delivered to {}, not {}", planned.bag, planned.gate, window.delivery_gate),
                    );
                }
                match carried.get_mut(&planned.bag) {
                    None => report.push(
                        id,
                        Some(stop),
                        Constraint::Pairing,
                        format!("bag {} delivered before pickup", planned.bag),
                    ),
                    Some(true) => report.push(
                        id,
                        Some(stop),
                        Constraint::Pairing,
                        format!("bag {} delivered twice", planned.bag),
                    ),
                    Some(delivered) => {
                        *delivered = true;
                        load = load.saturating_sub(u64::from(window.size));
                    }
                }
                if planned.scheduled_time > window.limit {
                    report.push(
                        id,
                        Some(stop),
                        Constraint::DeliveryDeadline,
                        format!(
                            "bag {} delivered at {}, after {}",
                            planned.bag, planned.scheduled_time, window.limit
                        ),
                    );
                }
                ready = planned.scheduled_time + handler.unload_time;
            }
        }
    }

    for (bag, delivered) in carried {
        if !delivered {
            report.push(id, None, Constraint::Pairing, format!("bag {} is never delivered", bag));
        }
    }
}

fn check_coverage(
    solution: &Solution,
    model: &PlanningModel,
    pickups: &BTreeMap<&BagId, usize>,
    report: &mut ValidationReport,
) {
    let mut listed: BTreeMap<&BagId, usize> = BTreeMap::new();
    for entry in &solution.infeasible {
        *listed.entry(&entry.bag).or_default() += 1;
    }

    for bag in model.bags() {
        let routed = pickups.get(&bag.id).copied().unwrap_or(0);
        let reported = listed.get(&bag.id).copied().unwrap_or(0);
        let detail = match (routed, reported) {
            (1, 0) | (0, 1) => continue,
            (0, 0) => format!("bag {} is neither routed nor reported", bag.id),
            (r, 0) => format!("bag {} is routed {} times", bag.id, r),
            (0, n) => format!("bag {} is reported infeasible {} times", bag.id, n),
            _ => format!("bag {} is both routed and reported infeasible", bag.id),
        };
        report.push(None, None, Constraint::Coverage, detail);
    }

    for bag in listed.keys() {
        if !model.bags().iter().any(|known| &&known.id == bag) {
            report.push(
                None,
                None,
                Constraint::UnknownReference,
                format!("infeasible bag {} is not in the model", bag),
            );
        }
    }
}
