//! Airport layout: gates and the travel-time table between them.
//!
//! The graph is built once per planning run and is read-only afterwards.
//! Travel times are stored as a dense matrix indexed by gate registration
//! order so the router's inner loops never hash.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{GateId, Seconds};
use crate::traits::TravelMetric;

/// A gate or stand where flights park.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub id: GateId,
    /// Planar position in metres.
    pub location: (f64, f64),
}

impl Gate {
    pub fn new(id: impl Into<GateId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            location: (x, y),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AirportGraph {
    gates: Vec<Gate>,
    index: HashMap<GateId, usize>,
    /// Row-major `gates.len() x gates.len()` travel times.
    matrix: Vec<Seconds>,
}

impl AirportGraph {
    pub fn builder() -> AirportGraphBuilder {
        AirportGraphBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate(&self, index: usize) -> &Gate {
        &self.gates[index]
    }

    pub fn contains(&self, id: &GateId) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &GateId) -> Result<usize, ModelError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ModelError::UnknownGate(id.clone()))
    }

    /// Travel time from `from` to `to`.
    pub fn time(&self, from: &GateId, to: &GateId) -> Result<Seconds, ModelError> {
        let from = self.index_of(from)?;
        let to = self.index_of(to)?;
        Ok(self.time_between(from, to))
    }

    /// Travel time by dense gate index. Panics on out-of-range indices.
    #[inline]
    pub fn time_between(&self, from: usize, to: usize) -> Seconds {
        self.matrix[from * self.gates.len() + to]
    }
}

/// Collects gates and travel entries, then materializes the full matrix.
#[derive(Default)]
pub struct AirportGraphBuilder {
    gates: Vec<Gate>,
    entries: Vec<(GateId, GateId, Seconds)>,
    assume_symmetric: bool,
    metric: Option<Box<dyn TravelMetric>>,
}

impl AirportGraphBuilder {
    pub fn gate(mut self, id: impl Into<GateId>, x: f64, y: f64) -> Self {
        self.gates.push(Gate::new(id, x, y));
        self
    }

    pub fn gates(mut self, gates: impl IntoIterator<Item = Gate>) -> Self {
        self.gates.extend(gates);
        self
    }

    /// Directed travel time from `from` to `to`.
    pub fn travel_time(mut self, from: impl Into<GateId>, to: impl Into<GateId>, seconds: Seconds) -> Self {
        self.entries.push((from.into(), to.into(), seconds));
        self
    }

    /// Same travel time in both directions.
    pub fn symmetric_travel_time(
        mut self,
        a: impl Into<GateId>,
        b: impl Into<GateId>,
        seconds: Seconds,
    ) -> Self {
        let a = a.into();
        let b = b.into();
        self.entries.push((a.clone(), b.clone(), seconds));
        self.entries.push((b, a, seconds));
        self
    }

    /// When set, a missing `b -> a` entry mirrors a listed `a -> b`.
    pub fn assume_symmetric(mut self, symmetric: bool) -> Self {
        self.assume_symmetric = symmetric;
        self
    }

    /// Metric used for any ordered pair still missing after the table and
    /// the symmetry rule are applied.
    pub fn default_metric(mut self, metric: impl TravelMetric + 'static) -> Self {
        self.metric = Some(Box::new(metric));
        self
    }

    pub fn build(self) -> Result<AirportGraph, ModelError> {
        let mut index = HashMap::with_capacity(self.gates.len());
        for (i, gate) in self.gates.iter().enumerate() {
            if index.insert(gate.id.clone(), i).is_some() {
                return Err(ModelError::InvalidGraph(format!("duplicate gate `{}`", gate.id)));
            }
        }

        let n = self.gates.len();
        let mut table: Vec<Option<Seconds>> = vec![None; n * n];
        for (from, to, seconds) in &self.entries {
            let i = *index.get(from).ok_or_else(|| ModelError::UnknownGate(from.clone()))?;
            let j = *index.get(to).ok_or_else(|| ModelError::UnknownGate(to.clone()))?;
            if *seconds < 0 {
                return Err(ModelError::InvalidGraph(format!(
                    "negative travel time {} from `{}` to `{}`",
                    seconds, from, to
                )));
            }
            table[i * n + j] = Some(*seconds);
        }

        if self.assume_symmetric {
            for i in 0..n {
                for j in 0..n {
                    if table[i * n + j].is_none() {
                        table[i * n + j] = table[j * n + i];
                    }
                }
            }
        }

        let mut matrix = vec![0; n * n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let seconds = match table[i * n + j] {
                    Some(seconds) => seconds,
                    None => self
                        .metric
                        .as_ref()
                        .and_then(|metric| metric.travel_time(&self.gates[i], &self.gates[j]))
                        .ok_or_else(|| {
                            ModelError::InvalidGraph(format!(
                                "no travel time from `{}` to `{}`",
                                self.gates[i].id, self.gates[j].id
                            ))
                        })?,
                };
                if seconds < 0 {
                    return Err(ModelError::InvalidGraph(format!(
                        "negative travel time {} from `{}` to `{}`",
                        seconds, self.gates[i].id, self.gates[j].id
                    )));
                }
                matrix[i * n + j] = seconds;
            }
        }

        Ok(AirportGraph {
            gates: self.gates,
            index,
            matrix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::EuclideanMetric;

    #[test]
    fn test_explicit_table() {
        let graph = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .gate("A2", 0.0, 0.0)
            .travel_time("A1", "A2", 90)
            .travel_time("A2", "A1", 120)
            .build()
            .unwrap();

        assert_eq!(graph.time(&"A1".into(), &"A2".into()), Ok(90));
        assert_eq!(graph.time(&"A2".into(), &"A1".into()), Ok(120));
        assert_eq!(graph.time(&"A1".into(), &"A1".into()), Ok(0));
    }

    #[test]
    fn test_missing_pair_without_metric() {
        let result = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .gate("A2", 10.0, 0.0)
            .travel_time("A1", "A2", 90)
            .build();
        assert!(matches!(result, Err(ModelError::InvalidGraph(_))));
    }

    #[test]
    fn test_assume_symmetric_mirrors_entries() {
        let graph = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .gate("A2", 10.0, 0.0)
            .travel_time("A1", "A2", 90)
            .assume_symmetric(true)
            .build()
            .unwrap();
        assert_eq!(graph.time(&"A2".into(), &"A1".into()), Ok(90));
    }

    #[test]
    fn test_default_metric_fills_gaps() {
        let graph = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .gate("A2", 50.0, 0.0)
            .gate("B1", 0.0, 100.0)
            .symmetric_travel_time("A1", "B1", 300)
            .default_metric(EuclideanMetric::new(5.0))
            .build()
            .unwrap();

        assert_eq!(graph.time(&"A1".into(), &"A2".into()), Ok(10));
        // Explicit entries win over the metric.
        assert_eq!(graph.time(&"B1".into(), &"A1".into()), Ok(300));
    }

    #[test]
    fn test_unknown_gate_lookup() {
        let graph = AirportGraph::builder().gate("A1", 0.0, 0.0).build().unwrap();
        assert_eq!(
            graph.time(&"A1".into(), &"Z9".into()),
            Err(ModelError::UnknownGate("Z9".into()))
        );
    }

    #[test]
    fn test_entry_for_unregistered_gate() {
        let result = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .travel_time("A1", "Z9", 30)
            .build();
        assert_eq!(result.err(), Some(ModelError::UnknownGate("Z9".into())));
    }

    #[test]
    fn test_duplicate_gate_rejected() {
        let result = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .gate("A1", 5.0, 0.0)
            .build();
        assert!(matches!(result, Err(ModelError::InvalidGraph(_))));
    }

    #[test]
    fn test_negative_time_rejected() {
        let result = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .gate("A2", 0.0, 0.0)
            .symmetric_travel_time("A1", "A2", -5)
            .build();
        assert!(matches!(result, Err(ModelError::InvalidGraph(_))));
    }

    #[test]
    fn test_closure_metric() {
        let graph = AirportGraph::builder()
            .gate("A1", 0.0, 0.0)
            .gate("A2", 3.0, 0.0)
            .default_metric(|a: &Gate, b: &Gate| Some(((a.location.0 - b.location.0).abs() * 60.0) as Seconds))
            .build()
            .unwrap();
        assert_eq!(graph.time(&"A1".into(), &"A2".into()), Ok(180));
    }
}
