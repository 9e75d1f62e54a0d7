//! Dtype-tagged value arrays.
//!
//! Node attribute lists come from heterogeneous sources (accumulation
//! counts, float rasters, user scalars), so they carry their element type
//! at runtime. Operations that need floating point (chi integration, value
//! replacement) check the tag and fail with `UnsupportedNumericType`.
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Element type of a [`Values`] array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    U8,
    U32,
    I64,
    F32,
    F64,
}

impl DType {
    pub fn is_float(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// A single dtype-tagged value.
///
/// JSON integers deserialize as `I64`, every other number as `F64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    I64(i64),
    F64(f64),
    F32(f32),
}

impl Scalar {
    pub fn dtype(self) -> DType {
        match self {
            Scalar::I64(_) => DType::I64,
            Scalar::F32(_) => DType::F32,
            Scalar::F64(_) => DType::F64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::I64(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::F64(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::F32(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::I64(v)
    }
}

/// A dtype-tagged array of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "data", rename_all = "lowercase")]
pub enum Values {
    U8(Vec<u8>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Apply the same expression to whichever vector a `Values` holds,
/// rewrapping the result in the same variant.
macro_rules! map_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            Values::U8($v) => Values::U8($body),
            Values::U32($v) => Values::U32($body),
            Values::I64($v) => Values::I64($body),
            Values::F32($v) => Values::F32($body),
            Values::F64($v) => Values::F64($body),
        }
    };
}

impl Values {
    pub fn dtype(&self) -> DType {
        match self {
            Values::U8(_) => DType::U8,
            Values::U32(_) => DType::U32,
            Values::I64(_) => DType::I64,
            Values::F32(_) => DType::F32,
            Values::F64(_) => DType::F64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::U8(v) => v.len(),
            Values::U32(v) => v.len(),
            Values::I64(v) => v.len(),
            Values::F32(v) => v.len(),
            Values::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `len` copies of `value`, keeping its dtype.
    pub fn filled(len: usize, value: Scalar) -> Self {
        match value {
            Scalar::I64(v) => Values::I64(vec![v; len]),
            Scalar::F32(v) => Values::F32(vec![v; len]),
            Scalar::F64(v) => Values::F64(vec![v; len]),
        }
    }

    /// Pick `self[i]` for every `i` in `indices`.
    ///
    /// Panics on an out-of-range index; callers check shapes first.
    pub(crate) fn gather(&self, indices: &[usize]) -> Self {
        map_values!(self, v => indices.iter().map(|&i| v[i]).collect())
    }

    /// Element `i` widened to `f64`, or `None` when out of range.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            Values::U8(v) => v.get(i).map(|&x| x as f64),
            Values::U32(v) => v.get(i).map(|&x| x as f64),
            Values::I64(v) => v.get(i).map(|&x| x as f64),
            Values::F32(v) => v.get(i).map(|&x| x as f64),
            Values::F64(v) => v.get(i).copied(),
        }
    }

    /// Replace `range` with `value`, converted to this list's float type.
    ///
    /// Only float lists accept replacement; the value is converted to the
    /// list's precision rather than widening the list.
    pub fn fill_range(&mut self, range: Range<usize>, value: Scalar) -> Result<()> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(Error::shape_mismatch(
                "replacement range",
                &[len],
                &[range.start, range.end],
            ));
        }
        match self {
            Values::F32(v) => v[range].fill(value.as_f64() as f32),
            Values::F64(v) => v[range].fill(value.as_f64()),
            other => {
                return Err(Error::UnsupportedNumericType {
                    what: "node value replacement",
                    dtype: other.dtype().to_string(),
                })
            }
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Values {
    fn from(v: Vec<f32>) -> Self {
        Values::F32(v)
    }
}

impl From<Vec<f64>> for Values {
    fn from(v: Vec<f64>) -> Self {
        Values::F64(v)
    }
}

impl From<Vec<u32>> for Values {
    fn from(v: Vec<u32>) -> Self {
        Values::U32(v)
    }
}
