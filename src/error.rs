//! Load-time errors.
//!
//! These halt the pipeline before routing starts. Routing outcomes
//! (infeasible bags, validation failures) are reported as data instead.

use thiserror::Error;

use crate::ids::{BagId, FlightId, GateId, HandlerId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown gate `{0}`")]
    UnknownGate(GateId),

    #[error("invalid airport graph: {0}")]
    InvalidGraph(String),

    #[error("invalid flight `{flight}`: {reason}")]
    InvalidFlight { flight: FlightId, reason: String },

    #[error("bag `{bag}` references unknown flight `{flight}`")]
    UnknownFlight { bag: BagId, flight: FlightId },

    #[error("duplicate bag id `{0}`")]
    DuplicateBag(BagId),

    #[error("duplicate handler id `{0}`")]
    DuplicateHandler(HandlerId),

    #[error("invalid handler `{handler}`: {reason}")]
    InvalidHandler { handler: HandlerId, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
