//! Stream network extraction and channel-profile analysis on raster
//! drainage graphs.
//!
//! The entry point is [`StreamNetwork`]: build one from a [`DrainageGraph`]
//! and a [`StreamConfig`], then query per-edge [`distance`](StreamNetwork::distance),
//! resolve per-node attributes, or integrate the
//! [`chi transform`](StreamNetwork::chi_transform).
//!
//! Enable the `threading` feature to run element-wise passes on rayon.
pub mod error;
pub mod grid;
pub mod hydrology;
mod maybe_rayon;
#[cfg(test)]
mod test_support;
pub mod values;

pub use error::{Error, Result};
pub use grid::{Grid, GridGeometry, SpatialReference};
pub use hydrology::accumulation::{FlowAccumulator, TopologicalAccumulator};
pub use hydrology::attributes::AttributeSource;
pub use hydrology::basins::DrainageBasin;
pub use hydrology::chi::ChiParams;
pub use hydrology::flow_routing::DrainageGraph;
pub use hydrology::membership::{default_threshold, MembershipMask, StreamConfig, Threshold, Units};
pub use hydrology::stream_network::StreamNetwork;
pub use hydrology::{analyze_channels, ChannelAnalysis};
pub use values::{DType, Scalar, Values};
