//! Channel-profile tool: D8 direction grid in, stream network and chi out.
//!
//! Input JSON:
//!
//! ```json
//! {
//!   "geometry": {"rows": 3, "cols": 3, "cellsize": 30.0, "reference": "projected"},
//!   "directions": [[5, 5, 5], [5, 5, 5], [3, 3, 0]],
//!   "upstream_area": [[1, 1, 1], [2, 2, 2], [3, 6, 9]],
//!   "k": 1e-5
//! }
//! ```
//!
//! `directions` uses D8 codes (0 sink, 1..=8 clockwise from north).
//! `upstream_area` and `k` are optional; without an area the flow
//! accumulation of `directions` is used.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use streamnet_core::{
    analyze_channels, AttributeSource, ChannelAnalysis, ChiParams, DrainageGraph, Grid,
    GridGeometry, StreamConfig,
};

#[derive(Parser, Debug)]
#[command(name = "chi_profile", about = "Extract a stream network and its chi transform from a D8 grid")]
struct Args {
    /// Input JSON with geometry, D8 directions and optional area / k.
    #[arg(short, long)]
    input: PathBuf,

    /// Config JSON: `{"stream": {...}, "chi": {...}}`; absent fields take defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON file (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write chi as a full grid (NaN off-network).
    #[arg(long)]
    grid: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Deserialize)]
struct Input {
    geometry: GridGeometry,
    directions: Vec<Vec<u8>>,
    #[serde(default)]
    upstream_area: Option<Json>,
    #[serde(default)]
    k: Option<Json>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Config {
    stream: StreamConfig,
    chi: ChiParams,
}

#[derive(Serialize)]
struct Output {
    #[serde(flatten)]
    analysis: ChannelAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    chi_grid: Option<Grid<f64>>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn source(value: Option<&Json>, what: &str) -> Result<Option<AttributeSource>> {
    value
        .map(AttributeSource::from_json)
        .transpose()
        .with_context(|| format!("reading {what}"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    let input: Input = read_json(&args.input)?;
    let config: Config = match &args.config {
        Some(path) => read_json(path)?,
        None => Config::default(),
    };

    let directions = Grid::from_rows(&input.directions).context("directions")?;
    let graph = DrainageGraph::from_d8(input.geometry, &directions).context("building drainage graph")?;
    info!(
        rows = input.geometry.rows,
        cols = input.geometry.cols,
        cellsize = input.geometry.cellsize,
        "drainage graph loaded"
    );

    let area = source(input.upstream_area.as_ref(), "upstream_area")?;
    let k = source(input.k.as_ref(), "k")?;
    let analysis = analyze_channels(&graph, &config.stream, area.as_ref(), k.as_ref(), &config.chi)?;

    let chi_grid = if args.grid {
        Some(analysis.network.to_grid(&analysis.chi, f64::NAN)?)
    } else {
        None
    };

    let json = serde_json::to_string_pretty(&Output { analysis, chi_grid })?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
