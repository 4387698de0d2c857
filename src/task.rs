//! Pickup-delivery tasks derived from transferring bags.

use crate::config::PlannerConfig;
use crate::ids::{BagId, Timestamp};
use crate::model::{PlanningModel, connection_window};

/// The obligation to carry one bag from its inbound gate to its outbound
/// gate. Gate fields are dense indices into the model's airport graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub bag: BagId,
    pub size: u32,
    pub pickup_gate: usize,
    pub delivery_gate: usize,
    /// Inbound arrival.
    pub window_open: Timestamp,
    /// Latest pickup: outbound departure minus the minimum connection time.
    pub window_close: Timestamp,
    /// Outbound departure minus the deadline buffer.
    pub deadline: Timestamp,
    /// Outbound departure; the hard limit when late delivery is allowed.
    pub departure: Timestamp,
}

/// One task per bag that has a connection under `config`, in bag input
/// order. The remaining bags are exactly
/// [`PlanningModel::unconnectable_bags`] for the same connection time.
pub fn extract_tasks(model: &PlanningModel, config: &PlannerConfig) -> Vec<Task> {
    model
        .bags()
        .iter()
        .filter_map(|bag| {
            let origin = model.flight(&bag.origin)?;
            let destination = model.flight(&bag.destination)?;
            let (arrival, departure) =
                connection_window(origin, destination, config.minimum_connection_time)?;
            let graph = model.graph();
            Some(Task {
                bag: bag.id.clone(),
                size: bag.size,
                pickup_gate: graph.index_of(&origin.gate).ok()?,
                delivery_gate: graph.index_of(&destination.gate).ok()?,
                window_open: arrival,
                window_close: departure - config.minimum_connection_time,
                deadline: departure - config.deadline_buffer,
                departure,
            })
        })
        .collect()
}

/// Earliest deadline first, ties by bag id.
pub fn deadline_order(tasks: &[Task]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by(|&a, &b| {
        tasks[a]
            .deadline
            .cmp(&tasks[b].deadline)
            .then_with(|| tasks[a].bag.cmp(&tasks[b].bag))
    });
    order
}
