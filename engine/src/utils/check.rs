use crate::tree::STree;
use rayon::prelude::*;
use rst_common::geom::gcell::GCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Verifies the outbound contract of one finished tree: a single root
/// at the source, everything reachable from it, all pins retained,
/// Steiner nodes portless, every edge axis-aligned, every node inside
/// the bounding box.
pub fn check_tree(tree: &STree) -> Result<(), String> {
    let source = match tree.source {
        Some(s) => s,
        None => {
            if tree.nodes.is_empty() {
                return Ok(());
            }
            return Err("tree without a source still has nodes".to_string());
        }
    };

    let roots: Vec<GCell> = tree
        .nodes
        .iter()
        .filter(|(_, n)| n.uphill.is_none())
        .map(|(&c, _)| c)
        .collect();
    if roots != [source] {
        return Err(format!(
            "expected the source ({}, {}) to be the only root, found {:?}",
            source.x, source.y, roots
        ));
    }

    for (&cell, node) in &tree.nodes {
        if !tree.bounds.contains(cell) {
            return Err(format!(
                "node ({}, {}) lies outside the bounding box",
                cell.x, cell.y
            ));
        }
        if let Some(up) = node.uphill {
            if !tree.nodes.contains_key(&up) {
                return Err(format!(
                    "uphill of ({}, {}) is not in the tree",
                    cell.x, cell.y
                ));
            }
            if up.x != cell.x && up.y != cell.y {
                return Err(format!(
                    "edge ({}, {}) -> ({}, {}) is not axis-aligned",
                    up.x, up.y, cell.x, cell.y
                ));
            }
        }
    }

    // with one root and all parents present, a full downhill walk
    // proves acyclicity and reachability in one go
    let leaves = tree.leaves();
    let mut stack = vec![source];
    let mut reached = 0usize;
    while let Some(cell) = stack.pop() {
        reached += 1;
        if let Some(children) = leaves.get(&cell) {
            stack.extend(children.iter().copied());
        }
    }
    if reached != tree.nodes.len() {
        return Err(format!(
            "{} of {} nodes unreachable from the source (cycle?)",
            tree.nodes.len() - reached,
            tree.nodes.len()
        ));
    }

    for cell in tree.ports.iter() {
        match tree.nodes.get(&cell) {
            Some(n) if n.port_count >= 1 => {}
            Some(_) => {
                return Err(format!(
                    "pin cell ({}, {}) lost its port count",
                    cell.x, cell.y
                ));
            }
            None => {
                return Err(format!(
                    "pin cell ({}, {}) missing from the tree",
                    cell.x, cell.y
                ));
            }
        }
    }
    for (&cell, node) in &tree.nodes {
        if node.port_count == 0 && tree.ports.contains(cell) {
            return Err(format!(
                "steiner node ({}, {}) is listed as a port",
                cell.x, cell.y
            ));
        }
    }
    Ok(())
}

/// Verifies a batch of trees, logging one FAIL line per bad tree.
pub fn run(trees: &[STree]) -> Result<(), String> {
    log::info!("Verifying {} steiner trees...", trees.len());
    let valid = AtomicBool::new(true);

    trees.par_iter().enumerate().for_each(|(i, tree)| {
        if let Err(e) = check_tree(tree) {
            log::error!("FAIL: tree {}: {}", i, e);
            valid.store(false, Ordering::Relaxed);
        }
    });

    if valid.load(Ordering::Relaxed) {
        log::info!("\x1b[32mPASS\x1b[0m: all trees are valid.");
        Ok(())
    } else {
        Err("steiner tree verification failed".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeNode;

    fn two_pin_tree() -> STree {
        let mut tree = STree::default();
        let s = GCell::new(0, 0);
        let mid = GCell::new(3, 0);
        let t = GCell::new(3, 2);
        tree.source = Some(s);
        tree.nodes.insert(
            s,
            TreeNode {
                uphill: None,
                port_count: 1,
            },
        );
        tree.nodes.insert(
            mid,
            TreeNode {
                uphill: Some(s),
                port_count: 0,
            },
        );
        tree.nodes.insert(
            t,
            TreeNode {
                uphill: Some(mid),
                port_count: 1,
            },
        );
        tree.bounds.extend(s);
        tree.bounds.extend(t);
        tree.ports.push(s);
        tree.ports.push(t);
        tree.ports.sort();
        tree
    }

    #[test]
    fn test_valid_tree_passes() {
        assert!(check_tree(&two_pin_tree()).is_ok());
    }

    #[test]
    fn test_empty_tree_passes() {
        assert!(check_tree(&STree::default()).is_ok());
    }

    #[test]
    fn test_diagonal_edge_fails() {
        let mut tree = two_pin_tree();
        tree.nodes.get_mut(&GCell::new(3, 2)).unwrap().uphill = Some(GCell::new(0, 0));
        let err = check_tree(&tree).unwrap_err();
        assert!(err.contains("axis-aligned"));
    }

    #[test]
    fn test_cycle_fails() {
        let mut tree = two_pin_tree();
        tree.nodes.get_mut(&GCell::new(3, 0)).unwrap().uphill = Some(GCell::new(3, 2));
        let err = check_tree(&tree).unwrap_err();
        assert!(err.contains("unreachable"));
    }

    #[test]
    fn test_missing_pin_fails() {
        let mut tree = two_pin_tree();
        tree.nodes.get_mut(&GCell::new(3, 2)).unwrap().port_count = 0;
        assert!(check_tree(&tree).is_err());
    }

    #[test]
    fn test_second_root_fails() {
        let mut tree = two_pin_tree();
        tree.nodes.get_mut(&GCell::new(3, 2)).unwrap().uphill = None;
        assert!(check_tree(&tree).is_err());
    }
}
