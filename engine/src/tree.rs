use rst_common::db::core::{NetDB, PinRole};
use rst_common::db::indices::{NetId, PinId};
use rst_common::geom::cell_set::GCellSet;
use rst_common::geom::gbox::GBox;
use rst_common::geom::gcell::GCell;
use std::collections::{BTreeMap, BTreeSet};

/// One node of the rooted tree. `port_count == 0` marks a Steiner
/// point; pin cells carry the number of pin instances mapped there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub uphill: Option<GCell>,
    pub port_count: u32,
}

/// A rooted {spanning, Steiner} tree over grid cells. Ordered maps
/// keep every traversal deterministic, so identical inputs always
/// produce identical trees.
#[derive(Clone, Debug, Default)]
pub struct STree {
    pub source: Option<GCell>,
    pub nodes: BTreeMap<GCell, TreeNode>,
    pub ports: GCellSet,
    pub bounds: GBox,
}

impl STree {
    /// Populates a tree from a net's pins. `skip` is the caller's
    /// pin veto; a net whose driver is absent or vetoed stays empty.
    pub fn init_nodes<F>(db: &NetDB, net: NetId, mut skip: F) -> STree
    where
        F: FnMut(PinId) -> bool,
    {
        let mut tree = STree::default();
        if let Some(driver) = db.driver(net) {
            if !skip(driver) {
                for &cell in &db.pin_cells[driver.index()] {
                    tree.source = Some(cell);
                    tree.add_port(cell);
                }
                let users: Vec<PinId> = db.users(net).collect();
                for pin in users {
                    if skip(pin) {
                        continue;
                    }
                    for &cell in &db.pin_cells[pin.index()] {
                        tree.add_port(cell);
                    }
                }
            }
        }
        tree.ports.sort();
        tree
    }

    fn add_port(&mut self, cell: GCell) {
        self.nodes.entry(cell).or_default().port_count += 1;
        self.bounds.extend(cell);
        self.ports.push(cell);
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }

    /// Visits the ports that are neighbours of `cell`: ports whose
    /// minimal bounding box with `cell` encloses no other port. The
    /// enumeration walks populated rows away from the cell, keeping a
    /// left and a right window that shrink as ports are found, so the
    /// candidate set is never materialised. Visit order is
    /// unspecified; each neighbour is visited once.
    pub fn for_each_neighbour<F: FnMut(GCell)>(&self, cell: GCell, mut f: F) {
        let prev = self.ports.prev_cell(cell).filter(|p| p.y == cell.y);
        let next = self.ports.next_cell(cell).filter(|n| n.y == cell.y);
        if let Some(p) = prev {
            f(p);
        }
        if let Some(n) = next {
            f(n);
        }
        self.sweep_rows(cell, prev, next, false, &mut f);
        self.sweep_rows(cell, prev, next, true, &mut f);
    }

    fn sweep_rows<F: FnMut(GCell)>(
        &self,
        cell: GCell,
        prev: Option<GCell>,
        next: Option<GCell>,
        upwards: bool,
        f: &mut F,
    ) {
        // x0 is the left window's inner edge, x1 the right window's;
        // a window closes once it has shrunk past the cell's column.
        let mut x0 = prev.map_or(self.bounds.x0 as i32, |p| p.x as i32);
        let mut x1 = next.map_or(self.bounds.x1 as i32, |n| n.x as i32);
        let cx = cell.x as i32;
        let mut row = if upwards {
            self.ports.next_y(cell.y)
        } else {
            self.ports.prev_y(cell.y)
        };
        while let Some(y) = row {
            if x0 > cx && x1 <= cx {
                break;
            }
            if x0 <= cx {
                let probe = GCell::new(cell.x.saturating_add(1), y);
                if let Some(l) = self.ports.prev_cell(probe) {
                    if l.y == y && (l.x as i32) >= x0 {
                        f(l);
                        x0 = l.x as i32 + 1;
                    }
                }
            }
            if x1 > cx {
                if let Some(r) = self.ports.next_cell(GCell::new(cell.x, y)) {
                    if r.y == y && (r.x as i32) <= x1 {
                        f(r);
                        x1 = r.x as i32 - 1;
                    }
                }
            }
            row = if upwards {
                self.ports.next_y(y)
            } else {
                self.ports.prev_y(y)
            };
        }
    }

    /// Child sets, keyed by parent.
    pub fn leaves(&self) -> BTreeMap<GCell, BTreeSet<GCell>> {
        let mut leaves: BTreeMap<GCell, BTreeSet<GCell>> = BTreeMap::new();
        for (&cell, node) in &self.nodes {
            if let Some(up) = node.uphill {
                leaves.entry(up).or_default().insert(cell);
            }
        }
        leaves
    }

    /// Node cells in parent-before-child order. Panics if the uphill
    /// relation contains a cycle.
    pub fn topo_sorted(&self) -> Vec<GCell> {
        let leaves = self.leaves();
        let mut sorted = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<GCell> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.uphill.is_none())
            .map(|(&c, _)| c)
            .collect();
        while let Some(cell) = stack.pop() {
            sorted.push(cell);
            if let Some(children) = leaves.get(&cell) {
                stack.extend(children.iter().copied());
            }
        }
        assert_eq!(
            sorted.len(),
            self.nodes.len(),
            "cycle in tree: reached {} of {} nodes",
            sorted.len(),
            self.nodes.len()
        );
        sorted
    }

    /// Longest downward path, in edges, from each node to a reachable
    /// leaf (0 for leaves). Returns the map and the maximum altitude.
    pub fn altitudes(&self) -> (BTreeMap<GCell, i32>, i32) {
        let mut alts: BTreeMap<GCell, i32> = BTreeMap::new();
        let mut max_alt = 0;
        for &cell in self.topo_sorted().iter().rev() {
            let alt = *alts.entry(cell).or_insert(0);
            max_alt = max_alt.max(alt);
            if let Some(up) = self.nodes[&cell].uphill {
                let up_alt = alts.entry(up).or_insert(0);
                *up_alt = (*up_alt).max(alt + 1);
            }
        }
        (alts, max_alt)
    }

    /// Sum of the Manhattan lengths of all edges.
    pub fn total_wire_length(&self) -> i64 {
        self.nodes
            .iter()
            .filter_map(|(&c, n)| n.uphill.map(|u| c.mdist(u) as i64))
            .sum()
    }

    /// Path length from `cell` up to the source.
    pub fn path_dist(&self, cell: GCell) -> i64 {
        let mut dist = 0;
        let mut cur = cell;
        while let Some(up) = self.nodes[&cur].uphill {
            dist += cur.mdist(up) as i64;
            cur = up;
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(driver: (i16, i16), users: &[(i16, i16)]) -> STree {
        let mut db = NetDB::new();
        let net = db.add_net("t".to_string());
        db.add_pin(net, PinRole::Driver, vec![GCell::new(driver.0, driver.1)]);
        for &(x, y) in users {
            db.add_pin(net, PinRole::User, vec![GCell::new(x, y)]);
        }
        STree::init_nodes(&db, net, |_| false)
    }

    fn neighbours_of(tree: &STree, cell: GCell) -> BTreeSet<GCell> {
        let mut out = BTreeSet::new();
        tree.for_each_neighbour(cell, |n| {
            assert!(out.insert(n), "neighbour {:?} visited twice", n);
        });
        out
    }

    #[test]
    fn test_init_nodes() {
        let tree = tree_of((0, 0), &[(3, 2), (3, 2), (5, 1)]);
        assert_eq!(tree.source, Some(GCell::new(0, 0)));
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.nodes[&GCell::new(3, 2)].port_count, 2);
        assert_eq!(tree.ports.len(), 3);
        assert_eq!(tree.bounds, GBox::new(0, 0, 5, 2));
    }

    #[test]
    fn test_init_nodes_skipped_driver() {
        let mut db = NetDB::new();
        let net = db.add_net("t".to_string());
        let drv = db.add_pin(net, PinRole::Driver, vec![GCell::new(1, 1)]);
        db.add_pin(net, PinRole::User, vec![GCell::new(2, 2)]);
        let tree = STree::init_nodes(&db, net, |p| p == drv);
        assert!(tree.is_empty());
        assert!(tree.nodes.is_empty());
        assert!(tree.ports.is_empty());
    }

    #[test]
    fn test_neighbours_l_pattern() {
        let tree = tree_of((0, 0), &[(5, 0), (0, 5)]);
        let n00 = neighbours_of(&tree, GCell::new(0, 0));
        assert_eq!(
            n00,
            BTreeSet::from([GCell::new(5, 0), GCell::new(0, 5)])
        );
        let n50 = neighbours_of(&tree, GCell::new(5, 0));
        assert_eq!(
            n50,
            BTreeSet::from([GCell::new(0, 0), GCell::new(0, 5)])
        );
    }

    #[test]
    fn test_neighbours_square() {
        // Corner ports only shadow each other along rows; the far
        // corner stays visible because the windows shrink per side.
        let tree = tree_of((0, 0), &[(10, 0), (0, 10), (10, 10)]);
        let n = neighbours_of(&tree, GCell::new(0, 0));
        assert_eq!(
            n,
            BTreeSet::from([
                GCell::new(10, 0),
                GCell::new(0, 10),
                GCell::new(10, 10)
            ])
        );
    }

    #[test]
    fn test_neighbours_shadowing() {
        // (2, 1) sits inside the box spanned by (0, 0) and (4, 2), so
        // (4, 2) is shadowed on that side.
        let tree = tree_of((0, 0), &[(2, 1), (4, 2)]);
        let n = neighbours_of(&tree, GCell::new(0, 0));
        assert!(n.contains(&GCell::new(2, 1)));
        assert!(!n.contains(&GCell::new(4, 2)));
    }

    #[test]
    fn test_topo_and_altitudes() {
        let mut tree = tree_of((0, 0), &[(5, 0), (10, 0), (10, 3)]);
        tree.nodes.get_mut(&GCell::new(5, 0)).unwrap().uphill = Some(GCell::new(0, 0));
        tree.nodes.get_mut(&GCell::new(10, 0)).unwrap().uphill = Some(GCell::new(5, 0));
        tree.nodes.get_mut(&GCell::new(10, 3)).unwrap().uphill = Some(GCell::new(10, 0));

        let sorted = tree.topo_sorted();
        assert_eq!(sorted[0], GCell::new(0, 0));
        assert_eq!(sorted.len(), 4);
        let pos = |c: GCell| sorted.iter().position(|&s| s == c).unwrap();
        assert!(pos(GCell::new(5, 0)) < pos(GCell::new(10, 0)));
        assert!(pos(GCell::new(10, 0)) < pos(GCell::new(10, 3)));

        let (alts, max_alt) = tree.altitudes();
        assert_eq!(max_alt, 3);
        assert_eq!(alts[&GCell::new(10, 3)], 0);
        assert_eq!(alts[&GCell::new(10, 0)], 1);
        assert_eq!(alts[&GCell::new(0, 0)], 3);

        assert_eq!(tree.total_wire_length(), 13);
        assert_eq!(tree.path_dist(GCell::new(10, 3)), 13);
        assert_eq!(tree.path_dist(GCell::new(0, 0)), 0);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn test_topo_detects_cycle() {
        let mut tree = tree_of((0, 0), &[(1, 0), (2, 0)]);
        tree.nodes.get_mut(&GCell::new(1, 0)).unwrap().uphill = Some(GCell::new(2, 0));
        tree.nodes.get_mut(&GCell::new(2, 0)).unwrap().uphill = Some(GCell::new(1, 0));
        tree.topo_sorted();
    }
}
