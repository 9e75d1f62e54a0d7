//! Chi transform: upstream integration of an area-derived integrand.
//!
//! Starting from zero at every outlet, each node accumulates the trapezoidal
//! integral of its integrand along the path to its outlet:
//!
//! ```text
//! chi[u] = chi[d] + dist(u → d) · (f[u] + f[d]) / 2
//! ```
//!
//! with `f = (a0 / A)^mn`, or `f = (1 / k) · (1 / A)^mn` when an
//! erosional efficiency `k` is given (response time to a knickpoint).
use std::ops::{Add, Div, Mul};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::attributes::AttributeSource;
use super::stream_network::StreamNetwork;
use crate::error::{Error, Result};
use crate::maybe_rayon::*;
use crate::values::{DType, Values};

/// Parameters of the chi transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChiParams {
    /// Reference drainage area (ignored when `k` is supplied).
    pub a0: f64,
    /// Concavity index m/n.
    pub mn: f64,
    /// Multiply upstream area by `cellsize²`, turning cell counts into
    /// map-unit areas.
    pub correct_cellsize: bool,
}

impl Default for ChiParams {
    fn default() -> Self {
        Self { a0: 1e6, mn: 0.45, correct_cellsize: true }
    }
}

/// Float type the integration runs in. Sums stay in the widest input precision.
trait ChiFloat:
    Copy + Send + Sync + Add<Output = Self> + Mul<Output = Self> + Div<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;
    const HALF: Self;
    fn from_f64(v: f64) -> Self;
    fn powf(self, e: Self) -> Self;
}

macro_rules! impl_chi_float {
    ($($t:ty),*) => {$(
        impl ChiFloat for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const HALF: Self = 0.5;

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn powf(self, e: Self) -> Self {
                <$t>::powf(self, e)
            }
        }
    )*};
}

impl_chi_float!(f32, f64);

/// Float node values converted to `T`; integer lists are rejected.
fn float_list<T: ChiFloat>(what: &'static str, values: &Values) -> Result<Vec<T>> {
    match values {
        Values::F32(v) => Ok(v.iter().map(|&x| T::from_f64(x as f64)).collect()),
        Values::F64(v) => Ok(v.iter().map(|&x| T::from_f64(x)).collect()),
        other => Err(Error::UnsupportedNumericType { what, dtype: other.dtype().to_string() }),
    }
}

/// Dtype of a float node list; integer lists are rejected.
fn float_dtype(what: &'static str, values: &Values) -> Result<DType> {
    match values.dtype() {
        dtype if dtype.is_float() => Ok(dtype),
        dtype => Err(Error::UnsupportedNumericType { what, dtype: dtype.to_string() }),
    }
}

impl StreamNetwork {
    /// Chi value of every node.
    ///
    /// Integration runs in `f32` only when the upstream area and `k` (if
    /// given) are both `f32`; an `f64` on either side gives `f64` chi.
    /// Anything but float data fails with `UnsupportedNumericType`.
    pub fn chi_transform(
        &self,
        upstream_area: &AttributeSource,
        k: Option<&AttributeSource>,
        params: &ChiParams,
    ) -> Result<Values> {
        let area = self.resolve_node_attributes(upstream_area)?;
        let k = k.map(|src| self.resolve_node_attributes(src)).transpose()?;

        let area_dtype = float_dtype("upstream area", &area)?;
        let k_dtype = k.as_ref().map(|k| float_dtype("erosional efficiency", k)).transpose()?;

        if area_dtype == DType::F64 || k_dtype == Some(DType::F64) {
            self.integrate::<f64>(&area, k.as_ref(), params).map(Values::F64)
        } else {
            self.integrate::<f32>(&area, k.as_ref(), params).map(Values::F32)
        }
    }

    fn integrate<T: ChiFloat>(
        &self,
        area: &Values,
        k: Option<&Values>,
        params: &ChiParams,
    ) -> Result<Vec<T>> {
        let mut area: Vec<T> = float_list("upstream area", area)?;
        let k: Option<Vec<T>> = k.map(|k| float_list("erosional efficiency", k)).transpose()?;
        // Fails on a cyclic network before any work is done.
        let order = self.upstream_order()?;

        if params.correct_cellsize {
            let cs = self.cellsize();
            let scale = T::from_f64(cs * cs);
            area.iter_mut().for_each(|a| *a = *a * scale);
        }

        let mn = T::from_f64(params.mn);
        let integrand: Vec<T> = match &k {
            Some(k) => (0..self.len())
                .into_par_iter()
                .map(|i| (T::ONE / k[i]) * (T::ONE / area[i]).powf(mn))
                .collect(),
            None => {
                let a0 = T::from_f64(params.a0);
                (0..self.len())
                    .into_par_iter()
                    .map(|i| (a0 / area[i]).powf(mn))
                    .collect()
            }
        };

        let dist: Vec<T> = self.distance().into_iter().map(T::from_f64).collect();
        let out = self.out_edges();
        let targets = self.edge_target();

        let mut chi = vec![T::ZERO; self.len()];
        for node in order {
            if let Some(e) = out[node] {
                let d = targets[e];
                chi[node] = chi[d] + dist[e] * (integrand[node] + integrand[d]) * T::HALF;
            }
        }

        debug!(
            nodes = self.len(),
            with_k = k.is_some(),
            mn = params.mn,
            "chi transform integrated"
        );
        Ok(chi)
    }
}
