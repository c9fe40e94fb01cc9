use serde::Serialize;
use std::fmt;

/// A tile position in the output grid: `row` in `[0, m_tiles)`, `col` in `[0, n_tiles)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WorkgroupCoord {
    pub row: usize,
    pub col: usize,
}

impl WorkgroupCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for WorkgroupCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Where the dispatcher placed a workgroup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClusterAssignment {
    pub cluster_id: usize,
    pub unit_id: usize,
}

/// Output grid measured in tiles.
///
/// Launch order is column-major: the linear id of `(row, col)` is
/// `col * m_tiles + row`, so consecutive launches walk down a column first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    pub m_tiles: usize,
    pub n_tiles: usize,
}

impl GridShape {
    pub const fn new(m_tiles: usize, n_tiles: usize) -> Self {
        Self { m_tiles, n_tiles }
    }

    pub fn len(&self) -> usize {
        self.m_tiles * self.n_tiles
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, coord: WorkgroupCoord) -> bool {
        coord.row < self.m_tiles && coord.col < self.n_tiles
    }

    pub fn linear_id(&self, coord: WorkgroupCoord) -> usize {
        coord.col * self.m_tiles + coord.row
    }

    pub fn coord_of(&self, linear_id: usize) -> WorkgroupCoord {
        WorkgroupCoord::new(linear_id % self.m_tiles, linear_id / self.m_tiles)
    }

    /// Every coordinate in launch order.
    pub fn launch_order(&self) -> impl Iterator<Item = WorkgroupCoord> + '_ {
        (0..self.len()).map(move |id| self.coord_of(id))
    }
}
