//! Node attribute lists: per-node values resolved from grids, node-shaped
//! arrays or scalars.
use serde_json::Value as Json;

use super::stream_network::StreamNetwork;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::values::{Scalar, Values};

/// Where node values come from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeSource {
    /// Broadcast to every node.
    Scalar(Scalar),
    /// Full-grid values, column-major, one per cell.
    Grid { shape: (usize, usize), values: Values },
    /// Already a node attribute list.
    Nodes(Values),
}

impl AttributeSource {
    pub fn grid<T>(grid: Grid<T>) -> Self
    where
        Values: From<Vec<T>>,
    {
        let shape = grid.shape();
        AttributeSource::Grid { shape, values: Values::from(grid.into_data()) }
    }

    /// Interpret a JSON value the way a dynamically typed caller would pass it:
    /// a number is a scalar, a flat array a node attribute list, an array of
    /// equal-length rows a grid (rows in order, row-major). Numbers are read
    /// as `f64`.
    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::Number(n) => n
                .as_f64()
                .map(|v| AttributeSource::Scalar(Scalar::F64(v)))
                .ok_or_else(|| Error::UnsupportedSourceType(n.to_string())),
            Json::Array(items) if items.iter().all(Json::is_array) && !items.is_empty() => {
                let rows = items
                    .iter()
                    .map(|row| json_numbers(row))
                    .collect::<Result<Vec<_>>>()?;
                Ok(AttributeSource::grid(Grid::from_rows(&rows)?))
            }
            Json::Array(_) => Ok(AttributeSource::Nodes(Values::F64(json_numbers(value)?))),
            other => Err(Error::UnsupportedSourceType(describe(other))),
        }
    }
}

impl From<f64> for AttributeSource {
    fn from(v: f64) -> Self {
        AttributeSource::Scalar(Scalar::F64(v))
    }
}

impl From<f32> for AttributeSource {
    fn from(v: f32) -> Self {
        AttributeSource::Scalar(Scalar::F32(v))
    }
}

impl From<Values> for AttributeSource {
    fn from(v: Values) -> Self {
        AttributeSource::Nodes(v)
    }
}

fn json_numbers(value: &Json) -> Result<Vec<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::UnsupportedSourceType(describe(value)))?;
    items
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| Error::UnsupportedSourceType(describe(v))))
        .collect()
}

fn describe(value: &Json) -> String {
    let kind = match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    };
    format!("{kind} {value}")
}

impl StreamNetwork {
    /// Node attribute list for `source`, one value per node.
    ///
    /// Grids must match the network's grid shape and node lists its node
    /// count; anything else is a `ShapeMismatch`.
    pub fn resolve_node_attributes(&self, source: &AttributeSource) -> Result<Values> {
        match source {
            AttributeSource::Scalar(s) => Ok(Values::filled(self.len(), *s)),
            AttributeSource::Grid { shape, values } => {
                self.geometry().check_shape("attribute grid", *shape)?;
                if values.len() != self.geometry().len() {
                    return Err(Error::shape_mismatch(
                        "attribute grid data",
                        &[self.geometry().len()],
                        &[values.len()],
                    ));
                }
                Ok(values.gather(self.nodes()))
            }
            AttributeSource::Nodes(values) => {
                if values.len() != self.len() {
                    return Err(Error::shape_mismatch(
                        "node attribute list",
                        &[self.len()],
                        &[values.len()],
                    ));
                }
                Ok(values.clone())
            }
        }
    }
}
