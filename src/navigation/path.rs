//! A* search over a [`NavGraph`].
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use super::{EdgeId, NavGraph, NodeId};

/// Cheapest edge sequence from `start` to `goal`.
///
/// Returns `Some(vec![])` when `start == goal` and `None` when the goal is
/// unreachable or either node is unknown. The heuristic is the straight-line
/// distance scaled by the cheapest per-distance edge factor, so it never
/// overestimates and the first path found is optimal.
#[must_use]
pub fn find_path(graph: &NavGraph, start: NodeId, goal: NodeId) -> Option<Vec<EdgeId>> {
    let count = graph.nodes().len();
    if start.0 >= count || goal.0 >= count {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut best = vec![f32::INFINITY; count];
    let mut via: Vec<Option<EdgeId>> = vec![None; count];
    let mut closed = vec![false; count];
    let mut open = BinaryHeap::new();

    *best.get_mut(start.0)? = 0.0;
    open.push(Reverse((OrderedFloat(graph.heuristic(start, goal)), start)));

    while let Some(Reverse((_, node))) = open.pop() {
        if node == goal {
            return Some(unwind(graph, &via, goal));
        }
        let seen = closed.get_mut(node.0)?;
        if *seen {
            continue;
        }
        *seen = true;
        let base = *best.get(node.0)?;
        for edge in graph.edges_from(node) {
            let candidate = base + edge.cost;
            let Some(slot) = best.get_mut(edge.to.0) else { continue };
            if candidate < *slot {
                *slot = candidate;
                if let Some(entry) = via.get_mut(edge.to.0) {
                    *entry = Some(edge.id);
                }
                let priority = candidate + graph.heuristic(edge.to, goal);
                open.push(Reverse((OrderedFloat(priority), edge.to)));
            }
        }
    }
    None
}

fn unwind(graph: &NavGraph, via: &[Option<EdgeId>], goal: NodeId) -> Vec<EdgeId> {
    let mut path = Vec::new();
    let mut cursor = goal;
    while let Some(Some(edge_id)) = via.get(cursor.0) {
        path.push(*edge_id);
        match graph.edge(*edge_id) {
            Some(edge) => cursor = edge.from,
            None => break,
        }
    }
    path.reverse();
    path
}
