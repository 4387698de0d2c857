//! Core seams: travel-time sources for the airport graph and ranking for
//! the shared best slot.

use crate::graph::Gate;
use crate::ids::Seconds;

/// Fills in travel times the airport's explicit table does not list.
///
/// Returning `None` means the metric cannot estimate this pair either, and
/// graph construction fails for it.
pub trait TravelMetric {
    fn travel_time(&self, from: &Gate, to: &Gate) -> Option<Seconds>;
}

impl<F> TravelMetric for F
where
    F: Fn(&Gate, &Gate) -> Option<Seconds>,
{
    fn travel_time(&self, from: &Gate, to: &Gate) -> Option<Seconds> {
        self(from, to)
    }
}

/// Anything the shared best slot can compare. Lower keys are better.
pub trait Ranked {
    type Key: Ord + Copy;

    fn rank(&self) -> Self::Key;
}
