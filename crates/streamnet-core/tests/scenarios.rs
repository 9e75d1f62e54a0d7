//! End-to-end checks on small hand-built grids and on randomly generated
//! acyclic D8 grids.
use std::f64::consts::SQRT_2;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use streamnet_core::hydrology::flow_routing::{D8_OFFSETS, SINK};
use streamnet_core::{
    default_threshold, AttributeSource, ChiParams, DrainageGraph, Grid, GridGeometry,
    MembershipMask, StreamConfig, StreamNetwork, Threshold, Values,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Random D8 grid without cycles: every cell gets a random priority and may
/// only drain to a neighbour of lower priority.
fn random_d8(rng: &mut StdRng, rows: usize, cols: usize, cellsize: f64) -> DrainageGraph {
    let geometry = GridGeometry::new(rows, cols, cellsize);
    let priority: Vec<f64> = (0..rows * cols).map(|_| rng.gen()).collect();
    let mut codes = Grid::new(rows, cols, 0u8);
    for r in 0..rows {
        for c in 0..cols {
            let here = priority[geometry.linear_index(r, c)];
            let lower: Vec<u8> = D8_OFFSETS
                .iter()
                .enumerate()
                .filter_map(|(i, &(dr, dc))| {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        return None;
                    }
                    let there = priority[geometry.linear_index(nr as usize, nc as usize)];
                    (there < here).then_some(i as u8 + 1)
                })
                .collect();
            if !lower.is_empty() && rng.gen_bool(0.9) {
                codes.set(r, c, lower[rng.gen_range(0..lower.len())]).unwrap();
            }
        }
    }
    DrainageGraph::from_d8(geometry, &codes).unwrap()
}

fn accumulation_area(graph: &DrainageGraph) -> AttributeSource {
    let g = graph.geometry();
    let acc: Vec<f64> = graph.flow_accumulation().unwrap().into_iter().map(f64::from).collect();
    AttributeSource::grid(Grid::from_col_major(g.rows, g.cols, acc).unwrap())
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn three_by_three_funnel_to_single_outlet() {
    // Columns drain south, bottom row drains east into (2, 2).
    let g = GridGeometry::new(3, 3, 10.0);
    let dirs = Grid::from_row_major(3, 3, &[5, 5, 5, 5, 5, 5, 3, 3, 0]).unwrap();
    let graph = DrainageGraph::from_d8(g, &dirs).unwrap();
    let config = StreamConfig { threshold: Threshold::Scalar(1.0), ..Default::default() };
    let net = StreamNetwork::from_flow(&graph, &config).unwrap();

    assert_eq!(net.len(), 9);
    assert_eq!(net.edge_count(), 8);

    let params = ChiParams::default();
    let chi = match net.chi_transform(&5.0f64.into(), None, &params).unwrap() {
        Values::F64(v) => v,
        other => panic!("expected f64 chi, got {:?}", other.dtype()),
    };
    let outlet = g.linear_index(2, 2);
    assert_eq!(net.outlets(), vec![outlet]);
    assert_eq!(chi[outlet], 0.0);

    // Uniform area ⇒ uniform integrand ⇒ one step of chi is distance · f.
    let f = (params.a0 / (5.0 * 10.0 * 10.0)).powf(params.mn);
    let neighbour = g.linear_index(2, 1);
    assert_relative_eq!(chi[neighbour], 10.0 * f, max_relative = 1e-12);
}

#[test]
fn disjoint_mask_cells_form_two_outlets() {
    let g = GridGeometry::new(2, 3, 1.0);
    let graph =
        DrainageGraph::from_raw(g, &[0, 1, 2, 3, 4, 5], &[2, 3, 4, 5, SINK, SINK], vec![1; 6])
            .unwrap();
    let mut members = vec![false; 6];
    members[0] = true;
    members[5] = true;
    let net = StreamNetwork::new(&graph, &MembershipMask::from_bools(2, 3, members).unwrap()).unwrap();

    assert_eq!(net.nodes(), &[0, 5]);
    assert_eq!(net.edge_count(), 0);
    assert_eq!(net.outlets(), vec![0, 1]);
    let chi = net.chi_transform(&1.0f64.into(), None, &ChiParams::default()).unwrap();
    assert_eq!(chi, Values::F64(vec![0.0, 0.0]));
}

#[test]
fn zero_threshold_on_100_square_uses_heuristic() {
    assert_eq!(default_threshold(100, 100), 100.0);

    // Every row drains east off the grid: accumulation in column c is c + 1,
    // so only the last column reaches 100 cells.
    let g = GridGeometry::new(100, 100, 1.0);
    let graph = DrainageGraph::from_d8(g, &Grid::new(100, 100, 3u8)).unwrap();
    let net = StreamNetwork::from_flow(&graph, &StreamConfig::default()).unwrap();
    assert_eq!(net.len(), 100);
    assert_eq!(net.edge_count(), 0);
    assert!(net.iter().all(|&cell| g.row_col(cell).1 == 99));
}

#[test]
fn config_from_json_drives_extraction() {
    let g = GridGeometry::new(1, 4, 1000.0);
    let graph = DrainageGraph::from_d8(g, &Grid::new(1, 4, 3u8)).unwrap();
    let config: StreamConfig = serde_json::from_str(r#"{"units": "km2", "threshold": 3}"#).unwrap();
    let net = StreamNetwork::from_flow(&graph, &config).unwrap();
    assert_eq!(net.nodes(), &[2, 3]);
    assert_eq!(net.edge_count(), 1);
}

// ── Properties over random grids ──────────────────────────────────────────────

#[test]
fn random_networks_keep_index_invariants() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..40 {
        let rows = rng.gen_range(2..12);
        let cols = rng.gen_range(2..12);
        let graph = random_d8(&mut rng, rows, cols, 30.0);
        let config = StreamConfig {
            threshold: Threshold::Scalar(rng.gen_range(1..6) as f64),
            ..Default::default()
        };
        let net = StreamNetwork::from_flow(&graph, &config).unwrap();

        assert!(net.nodes().windows(2).all(|w| w[0] < w[1]), "nodes must ascend");
        let down = graph.downstream();
        for (&s, &t) in net.edge_source().iter().zip(net.edge_target()) {
            assert!(s < net.len() && t < net.len());
            assert_eq!(down[net[s]], Some(net[t]), "edge must follow the drainage graph");
        }

        // Threshold membership is closed downstream, so no edge is lost.
        let sinks = net.iter().filter(|&&cell| down[cell].is_none()).count();
        assert_eq!(net.edge_count(), net.len() - sinks);
    }
}

#[test]
fn random_networks_distances_take_two_values() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
        let cs = rng.gen_range(1.0..100.0);
        let graph = random_d8(&mut rng, 9, 7, cs);
        let net = StreamNetwork::from_flow(
            &graph,
            &StreamConfig { threshold: Threshold::Scalar(1.0), ..Default::default() },
        )
        .unwrap();
        let dist = net.distance();
        assert_eq!(dist.len(), net.edge_count());
        for d in dist {
            assert!(d == cs || d == cs * SQRT_2, "unexpected distance {d} for cellsize {cs}");
        }
    }
}

#[test]
fn random_networks_resolve_identity_and_broadcast() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..20 {
        let graph = random_d8(&mut rng, 6, 8, 1.0);
        let net = StreamNetwork::from_flow(
            &graph,
            &StreamConfig { threshold: Threshold::Scalar(2.0), ..Default::default() },
        )
        .unwrap();

        let list = Values::F32((0..net.len()).map(|_| rng.gen()).collect());
        assert_eq!(net.resolve_node_attributes(&list.clone().into()).unwrap(), list);

        let s: f64 = rng.gen();
        let broadcast = net.resolve_node_attributes(&s.into()).unwrap();
        assert_eq!(broadcast, Values::F64(vec![s; net.len()]));
    }
}

#[test]
fn random_networks_chi_is_zero_at_outlets_and_grows_upstream() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..30 {
        let graph = random_d8(&mut rng, 10, 10, 25.0);
        let net = StreamNetwork::from_flow(
            &graph,
            &StreamConfig { threshold: Threshold::Scalar(3.0), ..Default::default() },
        )
        .unwrap();
        let chi = net
            .chi_transform(&accumulation_area(&graph), None, &ChiParams::default())
            .unwrap();
        let Values::F64(chi) = chi else {
            panic!("f64 area must give f64 chi");
        };

        for (n, d) in net.downstream().into_iter().enumerate() {
            match d {
                None => assert_eq!(chi[n], 0.0, "outlet {n} must have zero chi"),
                Some(d) => assert!(chi[n] > chi[d], "chi must grow upstream at node {n}"),
            }
        }
    }
}

#[test]
fn random_grid_basins_partition_cells() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..10 {
        let graph = random_d8(&mut rng, 7, 9, 1.0);
        let labels = graph.drainage_basins().unwrap();
        let outlets = graph.outlets().len() as u32;
        assert!(labels.iter().all(|&id| id >= 1 && id <= outlets));
        let down = graph.downstream();
        for (cell, d) in down.iter().enumerate() {
            if let Some(d) = d {
                assert_eq!(labels[cell], labels[*d], "a cell shares its basin with its target");
            }
        }
    }
}
