//! Outlet-rooted upstream traversal over a single-successor forest.
use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Every node in dependency order: outlets first, then breadth-first
/// upstream, so each node appears after its downstream neighbour.
///
/// `downstream[i]` is the single successor of node `i`, `None` at outlets.
/// Nodes that never reach an outlet sit on a cycle and make the forest
/// malformed.
pub(crate) fn upstream_order(downstream: &[Option<usize>]) -> Result<Vec<usize>> {
    let n = downstream.len();

    // Reverse graph: for each node, who drains into it.
    let mut drains_into: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (node, &down) in downstream.iter().enumerate() {
        if let Some(d) = down {
            drains_into[d].push(node);
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| downstream[i].is_none()).collect();
    while let Some(node) = queue.pop_front() {
        order.push(node);
        queue.extend(drains_into[node].iter().copied());
    }

    if order.len() != n {
        return Err(Error::MalformedGraph(format!(
            "{} nodes never reach an outlet",
            n - order.len()
        )));
    }
    Ok(order)
}
