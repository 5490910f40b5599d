use crate::tree::STree;
use rst_common::geom::gcell::GCell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SEdge {
    src: GCell,
    dst: GCell,
}

impl SEdge {
    fn new(src: GCell, dst: GCell) -> Self {
        Self { src, dst }
    }
    fn flip(self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
        }
    }
    fn dist(self) -> i32 {
        self.src.mdist(self.dst)
    }
}

type Leaves = BTreeMap<GCell, BTreeSet<GCell>>;

fn rem_edge(tree: &mut STree, leaves: &mut Leaves, e: SEdge) {
    let node = tree.nodes.get_mut(&e.dst).expect("edge endpoint not in tree");
    assert_eq!(node.uphill, Some(e.src), "removing an edge that is not in the tree");
    node.uphill = None;
    let removed = leaves
        .get_mut(&e.src)
        .map_or(false, |l| l.remove(&e.dst));
    assert!(removed, "leaf table out of sync with uphill pointers");
}

fn add_edge(tree: &mut STree, leaves: &mut Leaves, e: SEdge) {
    let node = tree.nodes.get_mut(&e.dst).expect("edge endpoint not in tree");
    assert_eq!(node.uphill, None, "adding an edge to an already-driven node");
    node.uphill = Some(e.src);
    leaves.entry(e.src).or_default().insert(e.dst);
}

/// Descendant counts (not counting the node itself), from reverse
/// topological order.
fn total_leaf_counts(tree: &STree) -> BTreeMap<GCell, i32> {
    let mut counts: BTreeMap<GCell, i32> = BTreeMap::new();
    for &cell in tree.topo_sorted().iter().rev() {
        let below = *counts.entry(cell).or_insert(0);
        if let Some(up) = tree.nodes[&cell].uphill {
            *counts.entry(up).or_insert(0) += below + 1;
        }
    }
    counts
}

/// Single-flip local improvement (the D = 1 move class): repeatedly
/// finds the move of largest negative delta and commits it, until no
/// improving move remains or `move_limit` is hit. Returns the number
/// of committed moves.
///
/// A move detaches a node `v` from its parent `u`, re-attaches one of
/// v's children `new_dst` below a sibling `new_src`, and reverses the
/// `v -> new_dst` edge so v hangs off its former child.
pub fn run(tree: &mut STree, alpha: f32, move_limit: usize) -> usize {
    if tree.source.is_none() {
        return 0;
    }
    let mut leaves = tree.leaves();
    let mut total_leaf_count = total_leaf_counts(tree);
    let mut moves_made = 0;

    loop {
        let mut best_delta = 0.0f32;
        let mut best_move: Option<(SEdge, SEdge, SEdge)> = None;

        for (&cell, node) in &tree.nodes {
            let Some(uphill) = node.uphill else { continue };
            let (Some(src_candidates), Some(dst_candidates)) =
                (leaves.get(&uphill), leaves.get(&cell))
            else {
                continue;
            };
            let weight_v = 1 + total_leaf_count[&cell];
            for &new_src in src_candidates {
                if new_src == cell {
                    continue;
                }
                for &new_dst in dst_candidates {
                    let remd = SEdge::new(uphill, cell);
                    let added = SEdge::new(new_src, new_dst);
                    let flipped = SEdge::new(cell, new_dst);
                    let weight_nd = 1 + total_leaf_count[&new_dst];
                    // An edge's length counts once for every node at
                    // or below its lower endpoint, so path-cost terms
                    // are dist * (1 + descendant count).
                    let orig_path = remd.dist() * weight_v + flipped.dist() * weight_nd;
                    let new_path = (added.dist() + flipped.dist()) * (weight_v - weight_nd)
                        + added.dist() * weight_nd;
                    let delta = alpha * (new_path - orig_path) as f32
                        + (1.0 - alpha) * (added.dist() - remd.dist()) as f32;
                    if delta < best_delta {
                        best_delta = delta;
                        best_move = Some((remd, added, flipped));
                    }
                }
            }
        }

        let Some((remd, added, flipped)) = best_move else {
            break;
        };
        rem_edge(tree, &mut leaves, remd);
        rem_edge(tree, &mut leaves, flipped);
        add_edge(tree, &mut leaves, added);
        add_edge(tree, &mut leaves, flipped.flip());
        total_leaf_count = total_leaf_counts(tree);
        moves_made += 1;
        if moves_made >= move_limit {
            log::warn!("edge flipping hit the {} move limit", move_limit);
            break;
        }
    }
    log::debug!("edge flipping made {} moves", moves_made);
    moves_made
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNode;

    // (parent, child) pairs; the first parent is the source.
    fn manual_tree(edges: &[((i16, i16), (i16, i16))]) -> STree {
        let mut tree = STree::default();
        let source = GCell::new(edges[0].0 .0, edges[0].0 .1);
        tree.source = Some(source);
        tree.nodes.insert(
            source,
            TreeNode {
                uphill: None,
                port_count: 1,
            },
        );
        tree.bounds.extend(source);
        tree.ports.push(source);
        for &((px, py), (cx, cy)) in edges {
            let parent = GCell::new(px, py);
            let child = GCell::new(cx, cy);
            tree.nodes.insert(
                child,
                TreeNode {
                    uphill: Some(parent),
                    port_count: 1,
                },
            );
            tree.bounds.extend(child);
            tree.ports.push(child);
        }
        tree.ports.sort();
        tree
    }

    fn objective(tree: &STree, alpha: f32) -> f32 {
        let path: i64 = tree
            .nodes
            .keys()
            .filter(|&&c| Some(c) != tree.source)
            .map(|&c| tree.path_dist(c))
            .sum();
        alpha * path as f32 + (1.0 - alpha) * tree.total_wire_length() as f32
    }

    fn assert_rooted(tree: &STree) {
        assert_eq!(tree.topo_sorted().len(), tree.nodes.len());
        let roots = tree
            .nodes
            .values()
            .filter(|n| n.uphill.is_none())
            .count();
        assert_eq!(roots, 1);
    }

    #[test]
    fn test_chain_has_no_moves() {
        let mut tree = manual_tree(&[((0, 0), (5, 0)), ((5, 0), (10, 0))]);
        assert_eq!(run(&mut tree, 0.5, 1000), 0);
    }

    #[test]
    fn test_improving_flip() {
        // v's child d is much closer to the sibling w than v is to
        // the source; flipping hangs v off d below w.
        let mut tree = manual_tree(&[
            ((0, 0), (10, 0)),
            ((0, 0), (9, 3)),
            ((10, 0), (9, 1)),
        ]);
        let before = objective(&tree, 0.0);
        let moves = run(&mut tree, 0.0, 1000);
        assert_eq!(moves, 1);
        assert_rooted(&tree);
        let w = GCell::new(9, 3);
        let d = GCell::new(9, 1);
        let v = GCell::new(10, 0);
        assert_eq!(tree.nodes[&d].uphill, Some(w));
        assert_eq!(tree.nodes[&v].uphill, Some(d));
        assert_eq!(tree.total_wire_length(), 16);
        assert!(objective(&tree, 0.0) < before);
    }

    #[test]
    fn test_objective_never_increases() {
        let mut tree = manual_tree(&[
            ((0, 0), (10, 0)),
            ((0, 0), (9, 3)),
            ((10, 0), (9, 1)),
        ]);
        let before = objective(&tree, 0.5);
        run(&mut tree, 0.5, 1000);
        assert!(objective(&tree, 0.5) <= before);
    }

    #[test]
    fn test_second_pass_makes_no_moves() {
        let mut tree = manual_tree(&[
            ((0, 0), (10, 0)),
            ((0, 0), (9, 3)),
            ((10, 0), (9, 1)),
        ]);
        run(&mut tree, 0.5, 1000);
        assert_eq!(run(&mut tree, 0.5, 1000), 0);
    }

    #[test]
    fn test_move_limit() {
        let mut tree = manual_tree(&[
            ((0, 0), (10, 0)),
            ((0, 0), (9, 3)),
            ((10, 0), (9, 1)),
        ]);
        assert_eq!(run(&mut tree, 0.0, 1), 1);
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = STree::default();
        assert_eq!(run(&mut tree, 0.5, 1000), 0);
    }
}
