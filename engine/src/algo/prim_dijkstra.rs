use crate::tree::STree;
use rst_common::geom::gcell::GCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

#[derive(Copy, Clone, PartialEq)]
struct QueueEntry {
    node: GCell,
    uphill: GCell,
    path_dist: i32,
    cost: f32,
}

impl Eq for QueueEntry {}

// BinaryHeap is a max-heap; invert the comparison so the cheapest
// entry surfaces first, with the smaller cell winning cost ties.
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Builds the initial rooted spanning tree over the port set.
///
/// `alpha` blends accumulated source distance into the cost of
/// claiming a node: 0 yields a minimum spanning tree, 1 approaches a
/// shortest-path tree.
pub fn run(tree: &mut STree, alpha: f32) {
    let source = match tree.source {
        Some(s) => s,
        None => return,
    };
    let mut to_visit = BinaryHeap::new();
    let mut best_cost: BTreeMap<GCell, f32> = BTreeMap::new();
    best_cost.insert(source, 0.0);

    expand(tree, alpha, 0, source, &mut to_visit, &mut best_cost);
    while let Some(next) = to_visit.pop() {
        let Some(node) = tree.nodes.get_mut(&next.node) else {
            continue;
        };
        if node.uphill.is_some() {
            continue;
        }
        node.uphill = Some(next.uphill);
        expand(
            tree,
            alpha,
            next.path_dist,
            next.node,
            &mut to_visit,
            &mut best_cost,
        );
    }
}

fn expand(
    tree: &STree,
    alpha: f32,
    path_dist: i32,
    cell: GCell,
    to_visit: &mut BinaryHeap<QueueEntry>,
    best_cost: &mut BTreeMap<GCell, f32>,
) {
    tree.for_each_neighbour(cell, |n| {
        let edge = cell.mdist(n);
        let next_dist = path_dist + edge;
        let cost = alpha * next_dist as f32 + edge as f32;
        if best_cost.get(&n).is_some_and(|&c| c <= cost) {
            return;
        }
        if tree.nodes[&n].uphill.is_some() {
            return;
        }
        to_visit.push(QueueEntry {
            node: n,
            uphill: cell,
            path_dist: next_dist,
            cost,
        });
        best_cost.insert(n, cost);
    });
}
