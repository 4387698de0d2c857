//! Test fixtures for bag-transfer-planner.
//!
//! Provides a small linear airport and a builder for planning scenarios:
//! - Gates `G0`..`G9` spaced 60 m apart, driven at 1 m/s, so each step
//!   between neighbouring gates takes one minute
//! - A scenario builder for flights, bags and handlers

#![allow(dead_code)]

use bag_transfer_planner::config::PlannerConfig;
use bag_transfer_planner::error::ModelError;
use bag_transfer_planner::graph::AirportGraph;
use bag_transfer_planner::ids::{Seconds, Timestamp};
use bag_transfer_planner::metric::EuclideanMetric;
use bag_transfer_planner::model::{Bag, Flight, Handler, PlanningModel};
use bag_transfer_planner::route::StopAction;
use bag_transfer_planner::solution::Solution;
use bag_transfer_planner::solver::{PlanOutcome, solve};

pub const GATE_SPACING_M: f64 = 60.0;

pub fn minutes(m: i64) -> Seconds {
    m * 60
}

/// Gates `G0`..`G9` on a straight line.
pub fn airport() -> AirportGraph {
    let mut builder = AirportGraph::builder();
    for i in 0..10 {
        builder = builder.gate(format!("G{}", i), i as f64 * GATE_SPACING_M, 0.0);
    }
    builder
        .default_metric(EuclideanMetric::new(1.0))
        .build()
        .expect("fixture airport is complete")
}

/// Ten-minute connection, five-minute buffer, two workers.
pub fn test_config() -> PlannerConfig {
    PlannerConfig {
        minimum_connection_time: minutes(10),
        deadline_buffer: minutes(5),
        workers: 2,
        max_iterations: 5_000,
        ..PlannerConfig::default()
    }
}

/// Builder for planning scenarios with sensible defaults.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub flights: Vec<Flight>,
    pub bags: Vec<Bag>,
    pub handlers: Vec<Handler>,
    pub config: PlannerConfig,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            flights: Vec::new(),
            bags: Vec::new(),
            handlers: Vec::new(),
            config: test_config(),
        }
    }

    pub fn inbound(mut self, id: &str, gate: &str, arrival: Timestamp) -> Self {
        self.flights.push(Flight::arriving(id, gate, arrival));
        self
    }

    pub fn outbound(mut self, id: &str, gate: &str, departure: Timestamp) -> Self {
        self.flights.push(Flight::departing(id, gate, departure));
        self
    }

    pub fn bag(mut self, id: &str, origin: &str, destination: &str, size: u32) -> Self {
        self.bags.push(Bag::new(id, origin, destination, size));
        self
    }

    pub fn bags(mut self, bags: Vec<Bag>) -> Self {
        self.bags.extend(bags);
        self
    }

    pub fn handler(mut self, id: &str, capacity: u32, gate: &str, available_from: Timestamp) -> Self {
        self.handlers.push(Handler::new(id, capacity, gate, available_from));
        self
    }

    pub fn handler_spec(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn configure(mut self, update: impl FnOnce(&mut PlannerConfig)) -> Self {
        update(&mut self.config);
        self
    }

    pub fn load(&self) -> Result<PlanningModel, ModelError> {
        PlanningModel::load(
            airport(),
            self.flights.clone(),
            self.bags.clone(),
            self.handlers.clone(),
            &self.config,
        )
    }

    pub fn solve(&self) -> PlanOutcome {
        let model = self.load().expect("scenario model is valid");
        solve(&model, &self.config).expect("scenario config is valid")
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Bags on `handler`'s route, in pickup order.
pub fn handler_bags<'a>(solution: &'a Solution, handler: &str) -> Vec<&'a str> {
    solution
        .route_for(&handler.into())
        .map(|route| route.bags().map(|bag| bag.as_str()).collect())
        .unwrap_or_default()
}

/// Largest load carried at any point on any route, from sizes in `bags`.
pub fn peak_load(solution: &Solution, bags: &[Bag]) -> u32 {
    let size_of = |id: &str| {
        bags.iter()
            .find(|bag| bag.id.as_str() == id)
            .map(|bag| bag.size)
            .unwrap_or(0)
    };
    let mut peak = 0;
    for route in &solution.routes {
        let mut load = 0;
        for stop in &route.stops {
            match stop.action {
                StopAction::Pickup => load += size_of(stop.bag.as_str()),
                StopAction::Delivery => load -= size_of(stop.bag.as_str()),
            }
            peak = peak.max(load);
        }
    }
    peak
}

pub fn assert_accepted(outcome: &PlanOutcome) {
    assert!(
        outcome.is_accepted(),
        "solution should validate, got {:?}",
        outcome.report.violations
    );
}
