use crate::tree::{STree, TreeNode};
use rst_common::geom::gcell::GCell;
use std::collections::{BTreeMap, BTreeSet};

// 2^k orientation candidates are enumerated per node; beyond this
// fan-out the search is refused rather than attempted.
const MAX_FLEX_EDGES: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EdgeDir {
    XInc,
    XDec,
    YInc,
    YDec,
}

/// Direction and length of the axis-aligned segment `from -> to`.
/// Panics on a diagonal segment.
fn dir_extent(from: GCell, to: GCell) -> (EdgeDir, i32) {
    if from.y == to.y {
        if to.x < from.x {
            (EdgeDir::XDec, (from.x - to.x) as i32)
        } else {
            (EdgeDir::XInc, (to.x - from.x) as i32)
        }
    } else if from.x == to.x {
        if to.y < from.y {
            (EdgeDir::YDec, (from.y - to.y) as i32)
        } else {
            (EdgeDir::YInc, (to.y - from.y) as i32)
        }
    } else {
        panic!("non-rectilinear segment {:?} -> {:?}", from, to);
    }
}

/// Adds the segment `a -> b` to the set, folding it into an existing
/// co-directional segment starting at `a` if one exists. Returns the
/// length the shorter of the two segments shares with the longer.
fn merge_seg(segs: &mut Vec<(GCell, GCell)>, a: GCell, b: GCell) -> i32 {
    let (dir, len) = dir_extent(a, b);
    for seg in segs.iter_mut() {
        if seg.0 != a {
            continue;
        }
        let (seg_dir, seg_len) = dir_extent(seg.0, seg.1);
        if seg_dir != dir {
            continue;
        }
        if len > seg_len {
            seg.1 = b;
            return seg_len;
        }
        return len;
    }
    segs.push((a, b));
    0
}

/// Total shared length between co-directional segments incident at
/// `node`, for one orientation choice. Bit e of `choice` picks the
/// vertical-then-horizontal L for flexible edge e.
fn overlap_for_choice(node: GCell, fixed: &[GCell], flex: &[GCell], choice: u32) -> i32 {
    let mut segs: Vec<(GCell, GCell)> = fixed.iter().map(|&e| (node, e)).collect();
    let mut overlap = 0;
    for (e, &other) in flex.iter().enumerate() {
        let mid = midpoint(node, other, choice & (1 << e) != 0);
        overlap += merge_seg(&mut segs, node, mid);
        overlap += merge_seg(&mut segs, mid, other);
    }
    overlap
}

fn midpoint(node: GCell, other: GCell, vertical_first: bool) -> GCell {
    if vertical_first {
        GCell::new(node.x, other.y)
    } else {
        GCell::new(other.x, node.y)
    }
}

struct HvwWorker<'a> {
    tree: &'a mut STree,
    leaves: BTreeMap<GCell, BTreeSet<GCell>>,
    steiners_added: usize,
}

/// Replaces every diagonal edge with an L-shape through a new Steiner
/// point, choosing L orientations node-by-node (leaf-most first) to
/// maximise overlap between the segments meeting at each node, then
/// collapsing collinear overlap into chains. Returns the number of
/// Steiner points inserted, or an error if a node's flexible fan-out
/// exceeds the search cap.
pub fn run(tree: &mut STree) -> Result<usize, String> {
    if tree.source.is_none() {
        return Ok(0);
    }
    let (altitudes, _) = tree.altitudes();
    let leaves = tree.leaves();
    let mut worker = HvwWorker {
        tree,
        leaves,
        steiners_added: 0,
    };

    // Leaves have no orientation choice to make; everything else is
    // visited in (altitude, cell) order for determinism.
    let mut queue: Vec<(i32, GCell)> = altitudes
        .iter()
        .filter(|&(_, &alt)| alt > 0)
        .map(|(&c, &alt)| (alt, c))
        .collect();
    queue.sort();

    for &(_, node) in &queue {
        worker.steinerise_node(node)?;
    }
    Ok(worker.steiners_added)
}

impl HvwWorker<'_> {
    /// Snapshot of the edges at `cell` as (other endpoint, backward)
    /// pairs; the parent edge, if any, comes first.
    fn incident_edges(&self, cell: GCell) -> Vec<(GCell, bool)> {
        let mut edges = Vec::new();
        if let Some(up) = self.tree.nodes[&cell].uphill {
            edges.push((up, true));
        }
        if let Some(children) = self.leaves.get(&cell) {
            edges.extend(children.iter().map(|&c| (c, false)));
        }
        edges
    }

    fn steinerise_node(&mut self, node: GCell) -> Result<(), String> {
        let uphill = self.tree.nodes[&node].uphill;
        let mut fixed = Vec::new();
        let mut flex = Vec::new();
        for (other, _) in self.incident_edges(node) {
            if other.x == node.x || other.y == node.y {
                fixed.push(other);
            } else {
                flex.push(other);
            }
        }
        if flex.is_empty() {
            return Ok(());
        }
        if flex.len() >= MAX_FLEX_EDGES {
            return Err(format!(
                "node ({}, {}) has {} flexible edges, L-shape search cap is {}",
                node.x,
                node.y,
                flex.len(),
                MAX_FLEX_EDGES
            ));
        }

        let mut best_overlap = -1;
        let mut best_choice = 0u32;
        for choice in 0..(1u32 << flex.len()) {
            let overlap = overlap_for_choice(node, &fixed, &flex, choice);
            if overlap > best_overlap {
                best_overlap = overlap;
                best_choice = choice;
            }
        }

        for (e, &other) in flex.iter().enumerate() {
            let mid = midpoint(node, other, best_choice & (1 << e) != 0);
            if Some(other) == uphill {
                // splitting the driving edge: mid takes node's place
                self.insert_mid(mid, other);
                self.tree.nodes.get_mut(&node).unwrap().uphill = Some(mid);
                self.leaves.get_mut(&other).unwrap().remove(&node);
                self.leaves.entry(mid).or_default().insert(node);
            } else {
                self.insert_mid(mid, node);
                self.tree.nodes.get_mut(&other).unwrap().uphill = Some(mid);
                self.leaves.get_mut(&node).unwrap().remove(&other);
                self.leaves.entry(mid).or_default().insert(other);
            }
        }
        self.cleanup_overlap(node);
        Ok(())
    }

    /// Creates the Steiner point `mid` below `parent` unless a node
    /// already sits there, in which case it is reused as-is.
    fn insert_mid(&mut self, mid: GCell, parent: GCell) {
        if self.tree.nodes.contains_key(&mid) {
            return;
        }
        self.tree.nodes.insert(
            mid,
            TreeNode {
                uphill: Some(parent),
                port_count: 0,
            },
        );
        self.leaves.entry(parent).or_default().insert(mid);
        self.steiners_added += 1;
    }

    /// Collapses pairs of co-directional edges at `node` into chains:
    /// the farther endpoint re-hangs off the nearer one. When the
    /// farther edge is the parent edge the segment between is
    /// inverted, making the nearer endpoint drive the node instead.
    fn cleanup_overlap(&mut self, node: GCell) {
        let mut processed: BTreeSet<GCell> = BTreeSet::new();
        for (a, bwd_a) in self.incident_edges(node) {
            let (dir_a, ext_a) = dir_extent(node, a);
            for (b, bwd_b) in self.incident_edges(node) {
                if a == b || processed.contains(&a) || processed.contains(&b) {
                    continue;
                }
                assert!(!bwd_a || !bwd_b, "two driving edges at one node");
                let (dir_b, ext_b) = dir_extent(node, b);
                // handle only the a-nearer case; the pair also comes
                // round the other way
                if dir_a != dir_b || ext_a >= ext_b {
                    continue;
                }
                if !bwd_b {
                    self.tree.nodes.get_mut(&b).unwrap().uphill = Some(a);
                    self.leaves.get_mut(&node).unwrap().remove(&b);
                    self.leaves.entry(a).or_default().insert(b);
                } else {
                    assert!(!bwd_a);
                    self.tree.nodes.get_mut(&a).unwrap().uphill = Some(b);
                    self.leaves.get_mut(&b).unwrap().remove(&node);
                    self.leaves.entry(b).or_default().insert(a);
                    self.tree.nodes.get_mut(&node).unwrap().uphill = Some(a);
                    self.leaves.get_mut(&node).unwrap().remove(&a);
                    self.leaves.entry(a).or_default().insert(node);
                }
                processed.insert(b);
            }
        }
    }
}
