//! Drainage basin delineation: every cell labelled by the outlet it drains to.
use serde::Serialize;

use super::flow_routing::DrainageGraph;
use super::traversal::upstream_order;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrainageBasin {
    /// 1-based basin id, assigned in ascending outlet-cell order.
    pub id: u32,
    /// Grid-linear index of the outlet cell.
    pub outlet: usize,
    pub area_cells: u32,
}

/// Per-cell basin labels (grid-linear order) plus one record per basin.
pub fn delineate_basins(graph: &DrainageGraph) -> Result<(Vec<u32>, Vec<DrainageBasin>)> {
    let downstream = graph.downstream();
    let order = upstream_order(&downstream)?;

    let mut labels = vec![0u32; downstream.len()];
    let mut basins: Vec<DrainageBasin> = Vec::new();
    for cell in order {
        let id = match downstream[cell] {
            Some(d) => labels[d],
            None => {
                basins.push(DrainageBasin {
                    id: basins.len() as u32 + 1,
                    outlet: cell,
                    area_cells: 0,
                });
                basins.len() as u32
            }
        };
        labels[cell] = id;
        basins[id as usize - 1].area_cells += 1;
    }
    Ok((labels, basins))
}

impl DrainageGraph {
    /// Basin id (1-based) of every cell, grid-linear order.
    pub fn drainage_basins(&self) -> Result<Vec<u32>> {
        delineate_basins(self).map(|(labels, _)| labels)
    }
}
