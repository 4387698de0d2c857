//! Planner configuration.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::Seconds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerConfig {
    /// Minimum gap between inbound arrival and the latest pickup for the
    /// outbound flight.
    pub minimum_connection_time: Seconds,
    /// Delivery deadline is the outbound departure minus this buffer.
    pub deadline_buffer: Seconds,
    /// Weight per second of handler travel.
    pub travel_weight: i64,
    /// Weight per handler with a non-empty route.
    pub handler_count_weight: i64,
    /// Weight per second of late delivery. Only charged when
    /// `allow_late_delivery` is set.
    pub lateness_weight: i64,
    /// Wall-clock budget in milliseconds, counted from the start of the
    /// run. Improvement workers stop once it has passed; construction and
    /// the repair pass always run to completion.
    pub time_budget_ms: Option<u64>,
    /// Move evaluations per improvement worker.
    pub max_iterations: usize,
    /// Number of parallel improvement workers.
    pub workers: usize,
    /// Base seed for the scan-order shuffles of workers after the first.
    pub seed: u64,
    /// Treat the delivery deadline as soft, bounded by the actual departure.
    pub allow_late_delivery: bool,
    /// Charge the leg back to the handler's starting gate.
    pub return_to_start: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            minimum_connection_time: 20 * 60,
            deadline_buffer: 5 * 60,
            travel_weight: 1,
            handler_count_weight: 600, // ~10 minutes of travel
            lateness_weight: 100,
            time_budget_ms: None,
            max_iterations: 20_000,
            workers: 4,
            seed: 0,
            allow_late_delivery: false,
            return_to_start: false,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.minimum_connection_time < 0 {
            return Err(ModelError::InvalidConfig(
                "minimumConnectionTime must not be negative".to_string(),
            ));
        }
        if self.deadline_buffer < 0 {
            return Err(ModelError::InvalidConfig(
                "deadlineBuffer must not be negative".to_string(),
            ));
        }
        if self.travel_weight < 0 || self.handler_count_weight < 0 || self.lateness_weight < 0 {
            return Err(ModelError::InvalidConfig(
                "cost weights must not be negative".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(ModelError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
