//! Flights, bags and handlers, validated against the airport graph.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::ModelError;
use crate::graph::AirportGraph;
use crate::ids::{BagId, FlightId, GateId, HandlerId, Seconds, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub id: FlightId,
    pub gate: GateId,
    /// Absent for flights originating here.
    pub arrival: Option<Timestamp>,
    /// Absent for flights terminating here.
    pub departure: Option<Timestamp>,
}

impl Flight {
    pub fn turnaround(
        id: impl Into<FlightId>,
        gate: impl Into<GateId>,
        arrival: Timestamp,
        departure: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            gate: gate.into(),
            arrival: Some(arrival),
            departure: Some(departure),
        }
    }

    pub fn arriving(id: impl Into<FlightId>, gate: impl Into<GateId>, arrival: Timestamp) -> Self {
        Self {
            id: id.into(),
            gate: gate.into(),
            arrival: Some(arrival),
            departure: None,
        }
    }

    pub fn departing(id: impl Into<FlightId>, gate: impl Into<GateId>, departure: Timestamp) -> Self {
        Self {
            id: id.into(),
            gate: gate.into(),
            arrival: None,
            departure: Some(departure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bag {
    pub id: BagId,
    pub origin: FlightId,
    pub destination: FlightId,
    /// Capacity units consumed while carried.
    pub size: u32,
}

impl Bag {
    pub fn new(
        id: impl Into<BagId>,
        origin: impl Into<FlightId>,
        destination: impl Into<FlightId>,
        size: u32,
    ) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            destination: destination.into(),
            size,
        }
    }

    /// Expands "`count` bags from `origin` to `destination`" into individual
    /// bags tagged `{prefix}-{n}`.
    pub fn batch(
        prefix: &str,
        origin: impl Into<FlightId>,
        destination: impl Into<FlightId>,
        count: usize,
        size: u32,
    ) -> Vec<Bag> {
        let origin = origin.into();
        let destination = destination.into();
        (0..count)
            .map(|n| Bag {
                id: BagId::new(format!("{}-{:03}", prefix, n)),
                origin: origin.clone(),
                destination: destination.clone(),
                size,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub id: HandlerId,
    /// Maximum total size carried at once.
    pub capacity: u32,
    pub start_gate: GateId,
    pub available_from: Timestamp,
    /// Time spent at the gate for a pickup.
    #[serde(default)]
    pub load_time: Seconds,
    /// Time spent at the gate for a delivery.
    #[serde(default)]
    pub unload_time: Seconds,
}

impl Handler {
    pub fn new(
        id: impl Into<HandlerId>,
        capacity: u32,
        start_gate: impl Into<GateId>,
        available_from: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            capacity,
            start_gate: start_gate.into(),
            available_from,
            load_time: 0,
            unload_time: 0,
        }
    }

    pub fn with_service_times(mut self, load_time: Seconds, unload_time: Seconds) -> Self {
        self.load_time = load_time;
        self.unload_time = unload_time;
        self
    }

    /// `count` interchangeable handlers named `H00`, `H01`, ...
    pub fn fleet(
        count: usize,
        capacity: u32,
        start_gate: impl Into<GateId>,
        available_from: Timestamp,
    ) -> Vec<Handler> {
        let start_gate = start_gate.into();
        (0..count)
            .map(|n| Handler::new(format!("H{:02}", n), capacity, start_gate.clone(), available_from))
            .collect()
    }
}

/// Immutable snapshot of everything one planning run consumes.
#[derive(Debug, Clone)]
pub struct PlanningModel {
    graph: AirportGraph,
    flights: Vec<Flight>,
    flight_index: HashMap<FlightId, usize>,
    bags: Vec<Bag>,
    handlers: Vec<Handler>,
    structurally_infeasible: Vec<BagId>,
    structurally_infeasible_set: HashSet<BagId>,
}

impl PlanningModel {
    /// Validates the inputs and flags bags whose connection window is
    /// negative before any routing.
    pub fn load(
        graph: AirportGraph,
        flights: Vec<Flight>,
        bags: Vec<Bag>,
        mut handlers: Vec<Handler>,
        config: &PlannerConfig,
    ) -> Result<Self, ModelError> {
        config.validate()?;

        let mut flight_index = HashMap::with_capacity(flights.len());
        for (i, flight) in flights.iter().enumerate() {
            if !graph.contains(&flight.gate) {
                return Err(ModelError::UnknownGate(flight.gate.clone()));
            }
            if let (Some(arrival), Some(departure)) = (flight.arrival, flight.departure) {
                if departure <= arrival {
                    return Err(ModelError::InvalidFlight {
                        flight: flight.id.clone(),
                        reason: format!("departure {} is not after arrival {}", departure, arrival),
                    });
                }
            }
            if flight.arrival.is_none() && flight.departure.is_none() {
                return Err(ModelError::InvalidFlight {
                    flight: flight.id.clone(),
                    reason: "neither arrival nor departure time".to_string(),
                });
            }
            if flight_index.insert(flight.id.clone(), i).is_some() {
                return Err(ModelError::InvalidFlight {
                    flight: flight.id.clone(),
                    reason: "duplicate flight id".to_string(),
                });
            }
        }

        let mut seen_bags = HashSet::with_capacity(bags.len());
        let mut structurally_infeasible = Vec::new();
        for bag in &bags {
            if !seen_bags.insert(&bag.id) {
                return Err(ModelError::DuplicateBag(bag.id.clone()));
            }
            let origin = flight_index
                .get(&bag.origin)
                .map(|&i| &flights[i])
                .ok_or_else(|| ModelError::UnknownFlight {
                    bag: bag.id.clone(),
                    flight: bag.origin.clone(),
                })?;
            let destination = flight_index
                .get(&bag.destination)
                .map(|&i| &flights[i])
                .ok_or_else(|| ModelError::UnknownFlight {
                    bag: bag.id.clone(),
                    flight: bag.destination.clone(),
                })?;

            if connection_window(origin, destination, config.minimum_connection_time).is_none() {
                debug!(bag = %bag.id, "bag has no connection window");
                structurally_infeasible.push(bag.id.clone());
            }
        }

        handlers.sort_by(|a, b| a.id.cmp(&b.id));
        for pair in handlers.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(ModelError::DuplicateHandler(pair[0].id.clone()));
            }
        }
        for handler in &handlers {
            if !graph.contains(&handler.start_gate) {
                return Err(ModelError::UnknownGate(handler.start_gate.clone()));
            }
            if handler.load_time < 0 || handler.unload_time < 0 {
                return Err(ModelError::InvalidHandler {
                    handler: handler.id.clone(),
                    reason: format!(
                        "service times must not be negative (load {}, unload {})",
                        handler.load_time, handler.unload_time
                    ),
                });
            }
        }

        Ok(Self {
            graph,
            flights,
            flight_index,
            bags,
            handlers,
            structurally_infeasible_set: structurally_infeasible.iter().cloned().collect(),
            structurally_infeasible,
        })
    }

    pub fn graph(&self) -> &AirportGraph {
        &self.graph
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn flight(&self, id: &FlightId) -> Option<&Flight> {
        self.flight_index.get(id).map(|&i| &self.flights[i])
    }

    pub fn bags(&self) -> &[Bag] {
        &self.bags
    }

    /// Handlers in ascending id order.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Bags whose connection cannot be made regardless of handlers, under
    /// the connection time the model was loaded with.
    pub fn structurally_infeasible(&self) -> &[BagId] {
        &self.structurally_infeasible
    }

    pub fn is_structurally_infeasible(&self, bag: &BagId) -> bool {
        self.structurally_infeasible_set.contains(bag)
    }

    /// `(arrival, departure)` of `bag`'s connection under
    /// `minimum_connection_time`.
    pub fn connection(&self, bag: &Bag, minimum_connection_time: Seconds) -> Option<(Timestamp, Timestamp)> {
        let origin = self.flight(&bag.origin)?;
        let destination = self.flight(&bag.destination)?;
        connection_window(origin, destination, minimum_connection_time)
    }

    /// Bags with no connection under `minimum_connection_time`, in input
    /// order.
    pub fn unconnectable_bags(&self, minimum_connection_time: Seconds) -> Vec<BagId> {
        self.bags
            .iter()
            .filter(|bag| self.connection(bag, minimum_connection_time).is_none())
            .map(|bag| bag.id.clone())
            .collect()
    }
}

/// `(arrival, departure)` of a bag's connection when
/// `departure >= arrival + minimum_connection_time`.
pub fn connection_window(
    origin: &Flight,
    destination: &Flight,
    minimum_connection_time: Seconds,
) -> Option<(Timestamp, Timestamp)> {
    let arrival = origin.arrival?;
    let departure = destination.departure?;
    (departure >= arrival + minimum_connection_time).then_some((arrival, departure))
}
