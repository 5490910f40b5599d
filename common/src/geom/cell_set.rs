use super::gcell::GCell;

/// An append-then-sort set of grid cells with predecessor/successor
/// queries.
///
/// Cells are pushed freely, which marks the set dirty; `sort` must run
/// before any query. Querying a dirty set is a programmer error and
/// panics.
#[derive(Clone, Debug, Default)]
pub struct GCellSet {
    cells: Vec<GCell>,
    dirty: bool,
}

impl GCellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.dirty = false;
        self.cells.clear();
    }

    pub fn push(&mut self, cell: GCell) {
        self.dirty = true;
        self.cells.push(cell);
    }

    /// Sorts and deduplicates, making the set queryable again.
    pub fn sort(&mut self) {
        self.cells.sort();
        self.cells.dedup();
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GCell> + '_ {
        self.cells.iter().copied()
    }

    pub fn contains(&self, c: GCell) -> bool {
        assert!(!self.dirty, "query on a dirty GCellSet");
        self.cells.binary_search(&c).is_ok()
    }

    /// Greatest cell strictly less than `c`.
    pub fn prev_cell(&self, c: GCell) -> Option<GCell> {
        assert!(!self.dirty, "query on a dirty GCellSet");
        let idx = self.cells.partition_point(|&a| a < c);
        if idx > 0 {
            Some(self.cells[idx - 1])
        } else {
            None
        }
    }

    /// Least cell strictly greater than `c`.
    pub fn next_cell(&self, c: GCell) -> Option<GCell> {
        assert!(!self.dirty, "query on a dirty GCellSet");
        let idx = self.cells.partition_point(|&a| a <= c);
        self.cells.get(idx).copied()
    }

    /// Nearest populated row strictly below `y`. Probing with the
    /// minimum x exploits the row-major cell order: everything before
    /// that probe lies in an earlier row.
    pub fn prev_y(&self, y: i16) -> Option<i16> {
        self.prev_cell(GCell::new(i16::MIN, y)).map(|c| c.y)
    }

    /// Nearest populated row strictly above `y`.
    pub fn next_y(&self, y: i16) -> Option<i16> {
        self.next_cell(GCell::new(i16::MAX, y)).map(|c| c.y)
    }
}
