//! Flow accumulation over a drainage graph.
//!
//! Accumulation is owned by the flow-routing engine; [`FlowAccumulator`] is
//! the seam it plugs into. [`TopologicalAccumulator`] is the in-crate
//! kernel: every cell starts with its own weight and hands its running total
//! to its downstream cell once all of its donors have reported.
use tracing::debug;

use super::flow_routing::DrainageGraph;
use crate::error::{Error, Result};

pub trait FlowAccumulator {
    /// Weighted upstream total per cell (grid-linear order), including the
    /// cell's own weight.
    fn accumulate(&self, graph: &DrainageGraph, weights: &[f32]) -> Result<Vec<f32>>;
}

/// Kahn-order accumulation: headwaters first, outlets last.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologicalAccumulator;

impl FlowAccumulator for TopologicalAccumulator {
    fn accumulate(&self, graph: &DrainageGraph, weights: &[f32]) -> Result<Vec<f32>> {
        let n = graph.geometry().len();
        if weights.len() != n {
            return Err(Error::shape_mismatch("accumulation weights", &[n], &[weights.len()]));
        }
        let downstream = graph.downstream();

        let mut in_degree = vec![0u32; n];
        for t in downstream.iter().flatten() {
            in_degree[*t] += 1;
        }

        let mut acc = weights.to_vec();
        let mut stack: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0usize;
        while let Some(cell) = stack.pop() {
            visited += 1;
            if let Some(t) = downstream[cell] {
                acc[t] += acc[cell];
                in_degree[t] -= 1;
                if in_degree[t] == 0 {
                    stack.push(t);
                }
            }
        }

        if visited != n {
            return Err(Error::MalformedGraph(format!(
                "{} cells lie on a flow cycle",
                n - visited
            )));
        }
        debug!(cells = n, "flow accumulation complete");
        Ok(acc)
    }
}

impl DrainageGraph {
    /// Upstream cell count per cell (unit weights), own cell included.
    pub fn flow_accumulation(&self) -> Result<Vec<f32>> {
        TopologicalAccumulator.accumulate(self, &vec![1.0; self.geometry().len()])
    }
}
