//! Single-flow-direction drainage graph over every grid cell.
//!
//! This is the input contract shared with the flow-routing engine: one edge
//! record per cell, `source → target`, with a `-1` target for sinks and
//! outlets. Edge order is kept as supplied.
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::grid::{Grid, GridGeometry};

/// D8 neighbour offsets `(d_row, d_col)` for direction codes 1..=8:
/// N, NE, E, SE, S, SW, W, NW. Code 0 marks a sink.
pub const D8_OFFSETS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Target sentinel for sink/outlet cells in raw edge arrays.
pub const SINK: i64 = -1;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDrainageGraph")]
pub struct DrainageGraph {
    geometry: GridGeometry,
    /// Grid-linear source cell per edge.
    source: Vec<usize>,
    /// Grid-linear target cell per edge; `None` for sinks.
    target: Vec<Option<usize>>,
    /// Opaque flow-direction code, carried through unchanged.
    direction: Vec<u8>,
}

#[derive(Deserialize)]
struct RawDrainageGraph {
    geometry: GridGeometry,
    source: Vec<i64>,
    target: Vec<i64>,
    direction: Vec<u8>,
}

impl TryFrom<RawDrainageGraph> for DrainageGraph {
    type Error = Error;

    fn try_from(raw: RawDrainageGraph) -> Result<Self> {
        DrainageGraph::from_raw(raw.geometry, &raw.source, &raw.target, raw.direction)
    }
}

impl DrainageGraph {
    /// Validate raw edge arrays from the flow-routing engine.
    ///
    /// All three arrays must have one entry per grid cell, every source must
    /// be a distinct in-range cell, and every target must be an in-range cell
    /// other than its source or [`SINK`].
    pub fn from_raw(
        geometry: GridGeometry,
        source: &[i64],
        target: &[i64],
        direction: Vec<u8>,
    ) -> Result<Self> {
        let n = geometry.len();
        for (what, len) in [
            ("drainage source", source.len()),
            ("drainage target", target.len()),
            ("drainage direction", direction.len()),
        ] {
            if len != n {
                return Err(Error::shape_mismatch(what, &[n], &[len]));
            }
        }

        let cell = |v: i64| usize::try_from(v).ok().filter(|&c| c < n);
        let mut seen = vec![false; n];
        let mut src = Vec::with_capacity(n);
        let mut tgt = Vec::with_capacity(n);
        for (e, (&u, &v)) in source.iter().zip(target).enumerate() {
            let u = cell(u).ok_or_else(|| {
                Error::MalformedGraph(format!("edge {e}: source {u} outside 0..{n}"))
            })?;
            if std::mem::replace(&mut seen[u], true) {
                return Err(Error::MalformedGraph(format!(
                    "cell {u} has more than one downstream edge"
                )));
            }
            let v = if v == SINK {
                None
            } else {
                let t = cell(v).ok_or_else(|| {
                    Error::MalformedGraph(format!("edge {e}: target {v} outside 0..{n}"))
                })?;
                if t == u {
                    return Err(Error::MalformedGraph(format!("cell {u} drains to itself")));
                }
                Some(t)
            };
            src.push(u);
            tgt.push(v);
        }

        Ok(Self { geometry, source: src, target: tgt, direction })
    }

    /// Build the graph from a grid of D8 direction codes.
    ///
    /// Code 0 is a sink; a code whose neighbour falls off the grid makes the
    /// cell an outlet. Edges are emitted in grid-linear order.
    pub fn from_d8(geometry: GridGeometry, directions: &Grid<u8>) -> Result<Self> {
        geometry.check_shape("D8 direction grid", directions.shape())?;
        let rows = geometry.rows as isize;
        let cols = geometry.cols as isize;

        let mut target = Vec::with_capacity(geometry.len());
        for (i, &code) in directions.data().iter().enumerate() {
            let t = match code {
                0 => None,
                1..=8 => {
                    let (r, c) = geometry.row_col(i);
                    let (dr, dc) = D8_OFFSETS[code as usize - 1];
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows || nc >= cols {
                        None
                    } else {
                        Some(geometry.linear_index(nr as usize, nc as usize))
                    }
                }
                _ => {
                    return Err(Error::MalformedGraph(format!(
                        "cell {i}: D8 code {code} outside 0..=8"
                    )))
                }
            };
            target.push(t);
        }

        Ok(Self {
            source: (0..geometry.len()).collect(),
            target,
            direction: directions.data().to_vec(),
            geometry,
        })
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    #[inline]
    pub fn source(&self) -> &[usize] {
        &self.source
    }

    #[inline]
    pub fn target(&self) -> &[Option<usize>] {
        &self.target
    }

    #[inline]
    pub fn direction(&self) -> &[u8] {
        &self.direction
    }

    /// Number of edge records (one per cell).
    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Downstream cell of every cell, indexed by grid-linear index.
    pub fn downstream(&self) -> Vec<Option<usize>> {
        let mut down = vec![None; self.geometry.len()];
        for (&u, &v) in self.source.iter().zip(&self.target) {
            down[u] = v;
        }
        down
    }

    /// Grid-linear indices of cells with no downstream neighbour.
    pub fn outlets(&self) -> Vec<usize> {
        self.source
            .iter()
            .zip(&self.target)
            .filter(|(_, v)| v.is_none())
            .map(|(&u, _)| u)
            .collect()
    }
}
