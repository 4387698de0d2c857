//! Straight-line travel-time metric (fallback when the airport table is
//! incomplete).
//!
//! Uses planar distance between gate positions and an assumed handler speed.
//! Ignores apron lanes and one-way service roads.

use crate::graph::Gate;
use crate::ids::Seconds;
use crate::traits::TravelMetric;

/// Average tug/cart speed assumption, in metres per second (~18 km/h).
const DEFAULT_SPEED_MPS: f64 = 5.0;

/// Euclidean travel-time metric.
#[derive(Debug, Clone)]
pub struct EuclideanMetric {
    /// Assumed handler speed in metres per second.
    pub speed_mps: f64,
}

impl Default for EuclideanMetric {
    fn default() -> Self {
        Self {
            speed_mps: DEFAULT_SPEED_MPS,
        }
    }
}

impl EuclideanMetric {
    pub fn new(speed_mps: f64) -> Self {
        Self { speed_mps }
    }

    fn distance_m(from: &Gate, to: &Gate) -> f64 {
        let (x1, y1) = from.location;
        let (x2, y2) = to.location;
        (x2 - x1).hypot(y2 - y1)
    }

    fn metres_to_seconds(&self, metres: f64) -> Option<Seconds> {
        if self.speed_mps.is_nan() || self.speed_mps <= 0.0 || !metres.is_finite() {
            return None;
        }
        Some((metres / self.speed_mps).round() as Seconds)
    }
}

impl TravelMetric for EuclideanMetric {
    fn travel_time(&self, from: &Gate, to: &Gate) -> Option<Seconds> {
        self.metres_to_seconds(Self::distance_m(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(id: &str, x: f64, y: f64) -> Gate {
        Gate::new(id, x, y)
    }

    #[test]
    fn test_same_point() {
        let metric = EuclideanMetric::default();
        assert_eq!(metric.travel_time(&gate("a", 3.0, 4.0), &gate("b", 3.0, 4.0)), Some(0));
    }

    #[test]
    fn test_known_distance() {
        // 3-4-5 triangle at 1 m/s
        let metric = EuclideanMetric::new(1.0);
        assert_eq!(metric.travel_time(&gate("a", 0.0, 0.0), &gate("b", 3.0, 4.0)), Some(5));
    }

    #[test]
    fn test_symmetric() {
        let metric = EuclideanMetric::default();
        let a = gate("a", 0.0, 10.0);
        let b = gate("b", 120.0, -35.0);
        assert_eq!(metric.travel_time(&a, &b), metric.travel_time(&b, &a));
    }

    #[test]
    fn test_zero_speed_yields_nothing() {
        let metric = EuclideanMetric::new(0.0);
        assert_eq!(metric.travel_time(&gate("a", 0.0, 0.0), &gate("b", 1.0, 0.0)), None);
    }

    #[test]
    fn test_reasonable_travel_time() {
        // 900 m at 5 m/s = 180 s
        let metric = EuclideanMetric::default();
        assert_eq!(metric.metres_to_seconds(900.0), Some(180));
    }
}
