//! Browser bindings: JSON in, JSON out.
//!
//! Both entry points take a drainage graph in its raw edge-array form:
//!
//! ```json
//! {
//!   "graph": {
//!     "geometry": {"rows": 2, "cols": 2, "cellsize": 30.0},
//!     "source": [0, 1, 2, 3], "target": [1, -1, 3, -1], "direction": [5, 0, 5, 0]
//!   },
//!   "config": {"units": "pixels", "threshold": 1}
//! }
//! ```
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use wasm_bindgen::prelude::*;

use streamnet_core::{
    analyze_channels, AttributeSource, ChiParams, DrainageGraph, StreamConfig, StreamNetwork,
};

#[derive(Deserialize)]
struct NetworkRequest {
    graph: DrainageGraph,
    #[serde(default)]
    config: StreamConfig,
}

#[derive(Deserialize)]
struct ChiRequest {
    graph: DrainageGraph,
    #[serde(default)]
    config: StreamConfig,
    /// Number, node list or nested rows; flow accumulation when absent.
    #[serde(default)]
    upstream_area: Option<Json>,
    #[serde(default)]
    k: Option<Json>,
    #[serde(default)]
    params: ChiParams,
}

#[derive(Serialize)]
struct NetworkResponse<'a> {
    network: &'a StreamNetwork,
    distance: Vec<f64>,
}

fn run_extract(input: &str) -> Result<String> {
    let req: NetworkRequest = serde_json::from_str(input).context("invalid network request")?;
    let network = StreamNetwork::from_flow(&req.graph, &req.config)?;
    let distance = network.distance();
    Ok(serde_json::to_string(&NetworkResponse { network: &network, distance })?)
}

fn run_chi(input: &str) -> Result<String> {
    let req: ChiRequest = serde_json::from_str(input).context("invalid chi request")?;
    let area = req
        .upstream_area
        .as_ref()
        .map(AttributeSource::from_json)
        .transpose()
        .context("upstream_area")?;
    let k = req.k.as_ref().map(AttributeSource::from_json).transpose().context("k")?;
    let analysis = analyze_channels(&req.graph, &req.config, area.as_ref(), k.as_ref(), &req.params)?;
    Ok(serde_json::to_string(&analysis)?)
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

/// Extract the stream network. Returns `{network, distance}` as JSON.
#[wasm_bindgen]
pub fn extract_network(input: &str) -> Result<String, JsValue> {
    run_extract(input).map_err(to_js)
}

/// Extract the network and integrate chi. Returns the full channel
/// analysis as JSON.
#[wasm_bindgen]
pub fn chi_transform(input: &str) -> Result<String, JsValue> {
    run_chi(input).map_err(to_js)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRIP: &str = r#"{
        "geometry": {"rows": 1, "cols": 3, "cellsize": 10.0},
        "source": [0, 1, 2], "target": [1, 2, -1], "direction": [3, 3, 0]
    }"#;

    #[test]
    fn extract_network_reports_nodes_and_distance() {
        let input = format!(r#"{{"graph": {STRIP}, "config": {{"threshold": 2}}}}"#);
        let out: Json = serde_json::from_str(&run_extract(&input).unwrap()).unwrap();
        assert_eq!(out["network"]["nodes"], serde_json::json!([1, 2]));
        assert_eq!(out["distance"], serde_json::json!([10.0]));
    }

    #[test]
    fn chi_transform_accepts_scalar_area() {
        let input = format!(
            r#"{{"graph": {STRIP}, "config": {{"threshold": 1}},
                "upstream_area": 1.0,
                "params": {{"a0": 1.0, "correct_cellsize": false}}}}"#
        );
        let out: Json = serde_json::from_str(&run_chi(&input).unwrap()).unwrap();
        assert_eq!(out["chi"]["dtype"], "f64");
        assert_eq!(out["chi"]["data"], serde_json::json!([20.0, 10.0, 0.0]));
    }

    #[test]
    fn bad_requests_surface_the_cause() {
        let err = run_extract(r#"{"graph": 3}"#).unwrap_err();
        assert!(format!("{err:#}").contains("invalid network request"));

        let input = format!(r#"{{"graph": {STRIP}, "upstream_area": "area"}}"#);
        let err = run_chi(&input).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported source"));
    }
}
