//! Stream membership: which cells belong to the channel network.
//!
//! Membership is either supplied directly as a per-cell mask or derived by
//! comparing flow accumulation against an upslope-area threshold. Derived
//! membership is closed under "flows into", because accumulation never
//! decreases downstream.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::accumulation::FlowAccumulator;
use super::flow_routing::DrainageGraph;
use crate::error::{Error, Result};
use crate::grid::{Grid, GridGeometry, SpatialReference};
use crate::maybe_rayon::*;

/// Area unit a threshold is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Units {
    #[default]
    Pixels,
    MapUnits,
    SquareMeters,
    SquareKilometers,
}

impl Units {
    /// Area of one cell in this unit; thresholds are divided by it to get
    /// a cell count.
    ///
    /// `MapUnits` only converts for projected references; angular or
    /// unknown references fall back to one cell per unit.
    pub fn cell_area(self, geometry: &GridGeometry) -> f64 {
        let cs = geometry.cellsize;
        match self {
            Units::Pixels => 1.0,
            Units::SquareMeters => cs * cs,
            Units::SquareKilometers => (cs * 0.001) * (cs * 0.001),
            Units::MapUnits => match geometry.reference {
                Some(SpatialReference::Projected) => cs * cs,
                reference => {
                    warn!(
                        ?reference,
                        "mapunits threshold on a non-projected grid is not converted; treating it as pixels"
                    );
                    1.0
                }
            },
        }
    }

    fn token(self) -> &'static str {
        match self {
            Units::Pixels => "pixels",
            Units::MapUnits => "mapunits",
            Units::SquareMeters => "m2",
            Units::SquareKilometers => "km2",
        }
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pixels" => Ok(Units::Pixels),
            "mapunits" => Ok(Units::MapUnits),
            "m2" => Ok(Units::SquareMeters),
            "km2" => Ok(Units::SquareKilometers),
            other => Err(Error::InvalidUnit(other.to_string())),
        }
    }
}

impl TryFrom<String> for Units {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Units> for String {
    fn from(u: Units) -> Self {
        u.token().to_string()
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Upslope-area threshold: one value for every cell, or a per-cell grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    /// `0` selects the grid-size heuristic of [`default_threshold`].
    Scalar(f64),
    Grid(Grid<f32>),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Scalar(0.0)
    }
}

impl Threshold {
    fn is_unset(&self) -> bool {
        matches!(self, Threshold::Scalar(t) if *t == 0.0)
    }
}

/// Stream extraction settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub units: Units,
    pub threshold: Threshold,
    /// Explicit membership (nonzero ⇒ stream). Overrides `threshold`.
    pub stream_pixels: Option<Grid<u8>>,
}

/// Heuristic threshold for an unset (zero) scalar:
/// `floor(avg² · 0.01)` with `avg = (rows + cols) / 2` in integer division.
pub fn default_threshold(rows: usize, cols: usize) -> f64 {
    let avg = ((rows + cols) / 2) as f64;
    (avg * avg * 0.01).floor()
}

/// Per-cell membership, grid-linear order.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipMask {
    shape: (usize, usize),
    members: Vec<bool>,
}

impl MembershipMask {
    /// Members are the cells whose value differs from `T::default()`.
    pub fn from_nonzero<T: Copy + PartialEq + Default>(grid: &Grid<T>) -> Self {
        let zero = T::default();
        Self {
            shape: grid.shape(),
            members: grid.data().iter().map(|&v| v != zero).collect(),
        }
    }

    /// Column-major membership flags for a `rows × cols` grid.
    pub fn from_bools(rows: usize, cols: usize, members: Vec<bool>) -> Result<Self> {
        if members.len() != rows * cols {
            return Err(Error::shape_mismatch("membership mask", &[rows * cols], &[members.len()]));
        }
        Ok(Self { shape: (rows, cols), members })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    #[inline]
    pub fn as_slice(&self) -> &[bool] {
        &self.members
    }

    /// Number of member cells.
    pub fn count(&self) -> usize {
        self.members.iter().filter(|&&m| m).count()
    }
}

/// Decide stream membership for every cell of `graph`.
///
/// An explicit `stream_pixels` mask wins; a threshold supplied alongside it
/// is ignored with a warning. Otherwise accumulation from `accumulator`
/// (unit weights) is compared against the threshold converted to cells.
pub fn select_members<A: FlowAccumulator + ?Sized>(
    graph: &DrainageGraph,
    config: &StreamConfig,
    accumulator: &A,
) -> Result<MembershipMask> {
    let geometry = graph.geometry();

    if let Some(mask) = &config.stream_pixels {
        geometry.check_shape("stream_pixels", mask.shape())?;
        if !config.threshold.is_unset() {
            warn!("stream_pixels supplied; the threshold is ignored");
        }
        return Ok(MembershipMask::from_nonzero(mask));
    }

    let n = geometry.len();
    let cell_area = config.units.cell_area(geometry) as f32;
    let thresholds: Vec<f32> = match &config.threshold {
        Threshold::Scalar(t) => {
            let t = if *t == 0.0 {
                default_threshold(geometry.rows, geometry.cols)
            } else {
                *t
            };
            debug!(threshold = t, units = %config.units, "scalar stream threshold");
            vec![t as f32 / cell_area; n]
        }
        Threshold::Grid(grid) => {
            geometry.check_shape("threshold grid", grid.shape())?;
            grid.data().iter().map(|&t| t / cell_area).collect()
        }
    };

    let acc = accumulator.accumulate(graph, &vec![1.0; n])?;
    let members: Vec<bool> = (0..n)
        .into_par_iter()
        .map(|i| acc[i] >= thresholds[i])
        .collect();

    MembershipMask::from_bools(geometry.rows, geometry.cols, members)
}
