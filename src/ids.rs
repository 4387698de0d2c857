//! String identifiers for planner entities.
//!
//! Identifiers are ordered lexicographically; the router relies on that
//! order for every tie-break.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds on the planning clock (e.g. seconds since midnight).
pub type Timestamp = i64;

/// A duration in seconds.
pub type Seconds = i64;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Gate or stand identifier.
    GateId
);
string_id!(
    /// Flight number.
    FlightId
);
string_id!(
    /// Bag tag. Also identifies the task derived from the bag.
    BagId
);
string_id!(
    /// Handler identifier.
    HandlerId
);
