//! Stream network extraction.
//!
//! A [`StreamNetwork`] is the subgraph of a [`DrainageGraph`] restricted to
//! member cells, renumbered so that node ids are dense and ascend with the
//! grid-linear index of their cell. Edges refer to node ids, never to cells.
use std::ops::Index;

use serde::Serialize;
use tracing::{debug, warn};

use super::accumulation::{FlowAccumulator, TopologicalAccumulator};
use super::flow_routing::DrainageGraph;
use super::membership::{select_members, MembershipMask, StreamConfig};
use super::traversal::upstream_order;
use crate::error::{Error, Result};
use crate::grid::{Grid, GridGeometry};
use crate::values::Values;

/// Grid-linear index → dense node id, defined for member cells only.
///
/// Built once per network construction and dropped afterwards.
struct RankLookup {
    ranks: Vec<usize>,
}

impl RankLookup {
    const UNRANKED: usize = usize::MAX;

    fn new(nodes: &[usize], cells: usize) -> Self {
        let mut ranks = vec![Self::UNRANKED; cells];
        for (id, &cell) in nodes.iter().enumerate() {
            ranks[cell] = id;
        }
        Self { ranks }
    }

    #[inline]
    fn get(&self, cell: usize) -> Option<usize> {
        self.ranks.get(cell).copied().filter(|&r| r != Self::UNRANKED)
    }
}

/// Channel network extracted from a drainage graph. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamNetwork {
    geometry: GridGeometry,
    /// Grid-linear index of every member cell, strictly ascending.
    nodes: Vec<usize>,
    edge_source: Vec<usize>,
    edge_target: Vec<usize>,
    edge_direction: Vec<u8>,
}

impl StreamNetwork {
    /// Restrict `graph` to the cells in `mask`.
    ///
    /// An edge survives when its source cell is a member and it has a
    /// target. Target membership is not required up front: threshold
    /// membership already implies it. With a hand-made mask, an edge whose
    /// target is not a member has no node to point at and is dropped.
    pub fn new(graph: &DrainageGraph, mask: &MembershipMask) -> Result<Self> {
        let geometry = *graph.geometry();
        geometry.check_shape("membership mask", mask.shape())?;
        let members = mask.as_slice();

        let nodes: Vec<usize> = members
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m)
            .map(|(cell, _)| cell)
            .collect();
        let ranks = RankLookup::new(&nodes, geometry.len());

        let mut edge_source = Vec::new();
        let mut edge_target = Vec::new();
        let mut edge_direction = Vec::new();
        let mut dropped = 0usize;
        let edges = graph.source().iter().zip(graph.target()).zip(graph.direction());
        for ((&u, &v), &d) in edges {
            let (Some(v), Some(s)) = (v, ranks.get(u)) else {
                continue;
            };
            match ranks.get(v) {
                Some(t) => {
                    edge_source.push(s);
                    edge_target.push(t);
                    edge_direction.push(d);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(
                dropped,
                "stream edges whose downstream cell is not a member were dropped"
            );
        }
        debug!(nodes = nodes.len(), edges = edge_source.len(), "stream network built");

        Ok(Self { geometry, nodes, edge_source, edge_target, edge_direction })
    }

    /// Select members from `config` (default accumulation kernel) and build.
    pub fn from_flow(graph: &DrainageGraph, config: &StreamConfig) -> Result<Self> {
        Self::from_flow_with(graph, config, &TopologicalAccumulator)
    }

    /// As [`StreamNetwork::from_flow`], with a caller-supplied accumulator.
    pub fn from_flow_with<A: FlowAccumulator + ?Sized>(
        graph: &DrainageGraph,
        config: &StreamConfig,
        accumulator: &A,
    ) -> Result<Self> {
        let mask = select_members(graph, config, accumulator)?;
        Self::new(graph, &mask)
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    #[inline]
    pub fn cellsize(&self) -> f64 {
        self.geometry.cellsize
    }

    /// Grid-linear index per node id.
    #[inline]
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, usize> {
        self.nodes.iter()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_source.len()
    }

    #[inline]
    pub fn edge_source(&self) -> &[usize] {
        &self.edge_source
    }

    #[inline]
    pub fn edge_target(&self) -> &[usize] {
        &self.edge_target
    }

    #[inline]
    pub fn edge_direction(&self) -> &[u8] {
        &self.edge_direction
    }

    /// Outgoing edge of every node, `None` at outlets.
    pub fn out_edges(&self) -> Vec<Option<usize>> {
        let mut out = vec![None; self.len()];
        for (e, &s) in self.edge_source.iter().enumerate() {
            out[s] = Some(e);
        }
        out
    }

    /// Downstream node of every node, `None` at outlets.
    pub fn downstream(&self) -> Vec<Option<usize>> {
        let mut down = vec![None; self.len()];
        for (&s, &t) in self.edge_source.iter().zip(&self.edge_target) {
            down[s] = Some(t);
        }
        down
    }

    /// Node ids with no outgoing edge, ascending.
    pub fn outlets(&self) -> Vec<usize> {
        self.downstream()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_none())
            .map(|(n, _)| n)
            .collect()
    }

    /// Node ids in dependency order: outlets first, every node after its
    /// downstream neighbour.
    pub fn upstream_order(&self) -> Result<Vec<usize>> {
        upstream_order(&self.downstream())
    }

    /// Outlet node id that each node drains to.
    pub fn drainage_basins(&self) -> Result<Vec<usize>> {
        let down = self.downstream();
        let mut outlet = vec![0usize; self.len()];
        for node in upstream_order(&down)? {
            outlet[node] = match down[node] {
                Some(d) => outlet[d],
                None => node,
            };
        }
        Ok(outlet)
    }

    /// Scatter a node attribute list onto the full grid; non-stream cells
    /// get `fill`.
    pub fn to_grid(&self, values: &Values, fill: f64) -> Result<Grid<f64>> {
        if values.len() != self.len() {
            return Err(Error::shape_mismatch("node attribute list", &[self.len()], &[values.len()]));
        }
        let mut data = vec![fill; self.geometry.len()];
        for (id, &cell) in self.nodes.iter().enumerate() {
            if let Some(v) = values.get_f64(id) {
                data[cell] = v;
            }
        }
        Grid::from_col_major(self.geometry.rows, self.geometry.cols, data)
    }
}

impl Index<usize> for StreamNetwork {
    type Output = usize;

    fn index(&self, node: usize) -> &usize {
        &self.nodes[node]
    }
}

impl<'a> IntoIterator for &'a StreamNetwork {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
