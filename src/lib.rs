//! bag-transfer-planner core
//!
//! Plans handler routes that move transferring bags between connecting
//! flights before the outbound flight leaves.

pub mod ids;
pub mod error;
pub mod config;
pub mod traits;
pub mod metric;
pub mod graph;
pub mod model;
pub mod task;
pub mod route;
pub mod cost;
pub mod incumbent;
pub mod search;
pub mod solution;
pub mod solver;
pub mod validator;
