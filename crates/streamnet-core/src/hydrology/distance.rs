//! Planar length of stream edges.
use std::f64::consts::SQRT_2;

use super::stream_network::StreamNetwork;
use crate::maybe_rayon::*;

impl StreamNetwork {
    /// Length of every edge, in map units.
    ///
    /// Orthogonal neighbours (index offset equal to a stride) are one
    /// `cellsize` apart; every other pair is taken as diagonal.
    pub fn distance(&self) -> Vec<f64> {
        let cs = self.cellsize();
        let (row_stride, col_stride) = self.geometry().strides();
        let nodes = self.nodes();
        let (src, tgt) = (self.edge_source(), self.edge_target());

        (0..self.edge_count())
            .into_par_iter()
            .map(|e| {
                let d = nodes[src[e]].abs_diff(nodes[tgt[e]]);
                if d == row_stride || d == col_stride {
                    cs
                } else {
                    cs * SQRT_2
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::grid::{Grid, GridGeometry};
    use crate::hydrology::flow_routing::DrainageGraph;
    use crate::hydrology::membership::{MembershipMask, StreamConfig, Threshold};

    fn network(rows: usize, cols: usize, cellsize: f64, codes: &[u8]) -> StreamNetwork {
        let g = GridGeometry::new(rows, cols, cellsize);
        let dirs = Grid::from_row_major(rows, cols, codes).unwrap();
        let graph = DrainageGraph::from_d8(g, &dirs).unwrap();
        let config = StreamConfig { threshold: Threshold::Scalar(1.0), ..Default::default() };
        StreamNetwork::from_flow(&graph, &config).unwrap()
    }

    #[test]
    fn orthogonal_and_diagonal_steps() {
        // 3 × 3, row-major codes:
        //   SE  .  S
        //   .  SE  .
        //   E   .  .
        // Diagonal steps leave cells 0 and 4.
        let net = network(3, 3, 30.0, &[4, 0, 5, 0, 4, 0, 3, 0, 0]);
        let dist = net.distance();
        assert_eq!(dist.len(), 4);
        for (e, &s) in net.edge_source().iter().enumerate() {
            let expected = if matches!(net[s], 0 | 4) { 30.0 * SQRT_2 } else { 30.0 };
            assert_relative_eq!(dist[e], expected);
        }
    }

    #[test]
    fn distance_ignores_edge_direction() {
        // Same cells, flow reversed: (0,1) → W and (0,0) → E are mirror images.
        let east = network(1, 2, 5.0, &[3, 0]).distance();
        let west = network(1, 2, 5.0, &[0, 7]).distance();
        assert_eq!(east, west);
        assert_relative_eq!(east[0], 5.0);
    }

    #[test]
    fn row_stride_step_on_a_single_column() {
        // 3 × 1 column draining south: index offset 1 is a row move.
        let net = network(3, 1, 2.0, &[5, 5, 0]);
        assert_eq!(net.distance(), vec![2.0, 2.0]);
    }

    #[test]
    fn empty_network_has_no_distances() {
        let g = GridGeometry::new(2, 2, 1.0);
        let graph = DrainageGraph::from_d8(g, &Grid::new(2, 2, 0u8)).unwrap();
        let mask = MembershipMask::from_bools(2, 2, vec![false; 4]).unwrap();
        let net = StreamNetwork::new(&graph, &mask).unwrap();
        assert!(net.distance().is_empty());
    }
}
