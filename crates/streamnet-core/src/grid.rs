use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of coordinate reference attached to a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialReference {
    /// Linear units (cellsize in metres).
    Projected,
    /// Angular units (cellsize in degrees).
    Geographic,
}

/// Shape and spacing of the raster that every grid-linear index refers to.
///
/// Cells are indexed column-major: `index = row + col * rows`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub rows: usize,
    pub cols: usize,
    /// Side length of one cell in map units.
    pub cellsize: f64,
    #[serde(default)]
    pub reference: Option<SpatialReference>,
}

impl GridGeometry {
    pub fn new(rows: usize, cols: usize, cellsize: f64) -> Self {
        Self { rows, cols, cellsize, reference: None }
    }

    pub fn with_reference(mut self, reference: SpatialReference) -> Self {
        self.reference = Some(reference);
        self
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear-index offsets of a one-row move and a one-column move.
    #[inline]
    pub fn strides(&self) -> (usize, usize) {
        (1, self.rows)
    }

    #[inline]
    pub fn linear_index(&self, row: usize, col: usize) -> usize {
        row + col * self.rows
    }

    /// Inverse of [`GridGeometry::linear_index`].
    ///
    /// Only meaningful on a non-empty geometry; `rows` must be nonzero.
    #[inline]
    pub fn row_col(&self, index: usize) -> (usize, usize) {
        debug_assert!(self.rows > 0, "row_col on a geometry with zero rows");
        (index % self.rows, index / self.rows)
    }

    /// Fails with `ShapeMismatch` unless `shape` equals this grid's shape.
    pub fn check_shape(&self, what: &'static str, shape: (usize, usize)) -> Result<()> {
        if shape == self.shape() {
            Ok(())
        } else {
            Err(Error::shape_mismatch(
                what,
                &[self.rows, self.cols],
                &[shape.0, shape.1],
            ))
        }
    }
}

/// Per-cell values over a `rows × cols` raster, stored column-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid<T>")]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

#[derive(Deserialize)]
struct RawGrid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = Error;

    fn try_from(raw: RawGrid<T>) -> Result<Self> {
        Grid::from_col_major(raw.rows, raw.cols, raw.data)
    }
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with `fill`.
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self { rows, cols, data: vec![fill; rows * cols] }
    }

    /// Build from row-major data (the usual in-memory image layout).
    pub fn from_row_major(rows: usize, cols: usize, data: &[T]) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::shape_mismatch("grid data", &[rows * cols], &[data.len()]));
        }
        let data = (0..cols)
            .flat_map(|c| (0..rows).map(move |r| r * cols + c))
            .map(|i| data[i].clone())
            .collect();
        Ok(Self { rows, cols, data })
    }

    /// Build from a list of rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(Error::shape_mismatch("grid row", &[cols], &[bad.len()]));
        }
        let flat: Vec<T> = rows.iter().flatten().cloned().collect();
        Self::from_row_major(rows.len(), cols, &flat)
    }
}

impl<T> Grid<T> {
    /// Build from data already in column-major order.
    pub fn from_col_major(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::shape_mismatch("grid data", &[rows * cols], &[data.len()]));
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Column-major cell values.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row + col * self.rows)
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: T) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::shape_mismatch(
                "grid index",
                &[self.rows, self.cols],
                &[row, col],
            ));
        }
        self.data[row + col * self.rows] = val;
        Ok(())
    }
}
