//! Working routes mutated by the router during search.

use serde::{Deserialize, Serialize};

use crate::ids::{Seconds, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopAction {
    Pickup,
    Delivery,
}

/// A stop in a working route: the task index and what happens there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    pub task: usize,
    pub action: StopAction,
}

impl Visit {
    pub fn pickup(task: usize) -> Self {
        Self {
            task,
            action: StopAction::Pickup,
        }
    }

    pub fn delivery(task: usize) -> Self {
        Self {
            task,
            action: StopAction::Delivery,
        }
    }
}

/// Result of the forward pass over a visit sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSchedule {
    /// Service time of each visit: pickup start or delivery arrival.
    pub times: Vec<Timestamp>,
    pub travel_time: Seconds,
    /// Sum of seconds each delivery lands after its deadline.
    pub lateness: Seconds,
    /// Sum of seconds each delivery lands before its deadline.
    pub slack: Seconds,
}

/// One handler's route with its cached schedule and weighted cost.
#[derive(Debug, Clone)]
pub struct WorkingRoute {
    pub handler: usize,
    pub visits: Vec<Visit>,
    pub schedule: RouteSchedule,
    pub cost: i64,
}

impl WorkingRoute {
    pub fn empty(handler: usize) -> Self {
        Self {
            handler,
            visits: Vec::new(),
            schedule: RouteSchedule::default(),
            cost: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Tasks served by this route, in pickup order.
    pub fn tasks(&self) -> Vec<usize> {
        self.visits
            .iter()
            .filter(|visit| visit.action == StopAction::Pickup)
            .map(|visit| visit.task)
            .collect()
    }

    /// Visit sequence with `task` inserted. `pickup_pos` indexes the current
    /// sequence (`0..=len`); `delivery_pos` indexes the sequence after the
    /// pickup went in (`pickup_pos + 1..=len + 1`).
    pub fn with_insertion(&self, task: usize, pickup_pos: usize, delivery_pos: usize) -> Vec<Visit> {
        let mut visits = Vec::with_capacity(self.visits.len() + 2);
        visits.extend_from_slice(&self.visits);
        visits.insert(pickup_pos, Visit::pickup(task));
        visits.insert(delivery_pos, Visit::delivery(task));
        visits
    }

    /// Visit sequence with both stops of `task` removed.
    pub fn without(&self, task: usize) -> Vec<Visit> {
        self.visits
            .iter()
            .copied()
            .filter(|visit| visit.task != task)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(visits: Vec<Visit>) -> WorkingRoute {
        WorkingRoute {
            visits,
            ..WorkingRoute::empty(0)
        }
    }

    #[test]
    fn test_insertion_positions() {
        let route = route(vec![Visit::pickup(0), Visit::delivery(0)]);
        let visits = route.with_insertion(1, 1, 3);
        assert_eq!(
            visits,
            vec![Visit::pickup(0), Visit::pickup(1), Visit::delivery(0), Visit::delivery(1)]
        );
    }

    #[test]
    fn test_insertion_into_empty_route() {
        let visits = WorkingRoute::empty(0).with_insertion(4, 0, 1);
        assert_eq!(visits, vec![Visit::pickup(4), Visit::delivery(4)]);
    }

    #[test]
    fn test_without_removes_both_stops() {
        let route = route(vec![
            Visit::pickup(0),
            Visit::pickup(1),
            Visit::delivery(0),
            Visit::delivery(1),
        ]);
        assert_eq!(route.without(0), vec![Visit::pickup(1), Visit::delivery(1)]);
        assert_eq!(route.tasks(), vec![0, 1]);
    }
}
