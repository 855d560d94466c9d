//! Uniform spatial hash grid for broad-phase collision detection in a
//! wrapping world.

/// A uniform 2D grid spanning the world. Objects are inserted by position
/// and index, then nearby objects are queried through a 3x3 neighborhood
/// lookup that wraps at the world edges.
///
/// The cell size must be >= the maximum interaction distance between any
/// two colliding objects so that every potential collision is found within
/// the 3x3 neighborhood.
#[derive(Debug)]
pub struct SpatialGrid {
    inv_cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Creates a grid covering the given world dimensions. `cell_size`
    /// should be >= the maximum collision distance of the inserted objects.
    pub fn new(world_w: f64, world_h: f64, cell_size: f64) -> Self {
        let cols = ((world_w / cell_size).ceil() as usize).max(1);
        let rows = ((world_h / cell_size).ceil() as usize).max(1);

        Self {
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    /// Removes all items without deallocating per-cell storage.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Adds an item (identified by index) at the given world position.
    pub fn insert(&mut self, x: f64, y: f64, index: usize) {
        let (col, row) = self.pos_to_cell(x, y);
        self.cells[row * self.cols + col].push(index);
    }

    /// Calls `f` for each item index in the 3x3 cell neighborhood around
    /// the given world position, wrapping rows and columns at the world
    /// edges. If `f` returns true, iteration stops early.
    pub fn query_around(&self, x: f64, y: f64, mut f: impl FnMut(usize) -> bool) {
        let (col, row) = self.pos_to_cell(x, y);

        for dr in -1i64..=1 {
            let mut r = row as i64 + dr;
            if r < 0 {
                r += self.rows as i64;
            } else if r >= self.rows as i64 {
                r -= self.rows as i64;
            }
            let row_offset = r as usize * self.cols;

            for dc in -1i64..=1 {
                let mut c = col as i64 + dc;
                if c < 0 {
                    c += self.cols as i64;
                } else if c >= self.cols as i64 {
                    c -= self.cols as i64;
                }

                for &item in &self.cells[row_offset + c as usize] {
                    if f(item) {
                        return;
                    }
                }
            }
        }
    }

    /// Converts world coordinates to cell coordinates, clamping to the
    /// valid range so out-of-bounds positions land in edge cells.
    fn pos_to_cell(&self, x: f64, y: f64) -> (usize, usize) {
        let col = ((x * self.inv_cell_size) as i64).clamp(0, self.cols as i64 - 1) as usize;
        let row = ((y * self.inv_cell_size) as i64).clamp(0, self.rows as i64 - 1) as usize;
        (col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_around(grid: &SpatialGrid, x: f64, y: f64) -> Vec<usize> {
        let mut found = Vec::new();
        grid.query_around(x, y, |i| {
            found.push(i);
            false
        });
        found
    }

    #[test]
    fn test_query_finds_item_in_same_cell() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.insert(15.0, 15.0, 7);
        assert_eq!(collect_around(&grid, 14.0, 14.0), vec![7]);
    }

    #[test]
    fn test_query_finds_items_in_neighbor_cells() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.insert(5.0, 5.0, 0);
        grid.insert(15.0, 5.0, 1);
        grid.insert(5.0, 15.0, 2);
        grid.insert(35.0, 35.0, 3); // two cells away, not a neighbor

        let mut found = collect_around(&grid, 12.0, 12.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn test_query_wraps_at_world_edges() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.insert(95.0, 95.0, 0); // bottom-right corner cell
        grid.insert(5.0, 95.0, 1); // bottom-left corner cell

        // A query at the top-left corner must see both corner items through
        // the toroidal neighborhood.
        let mut found = collect_around(&grid, 2.0, 2.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn test_query_stops_early() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.insert(5.0, 5.0, 0);
        grid.insert(5.0, 5.0, 1);

        let mut seen = 0;
        grid.query_around(5.0, 5.0, |_| {
            seen += 1;
            true
        });
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_out_of_range_positions_clamp_to_edge_cells() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        grid.insert(-50.0, -50.0, 0);
        grid.insert(500.0, 500.0, 1);

        assert_eq!(collect_around(&grid, 0.0, 0.0), vec![0]);
        assert_eq!(collect_around(&grid, 99.0, 99.0), vec![1]);
    }

    #[test]
    fn test_clear_reuses_storage() {
        let mut grid = SpatialGrid::new(100.0, 100.0, 10.0);
        for i in 0..32 {
            grid.insert(55.0, 55.0, i);
        }
        grid.clear();
        assert!(collect_around(&grid, 55.0, 55.0).is_empty());

        grid.insert(55.0, 55.0, 3);
        assert_eq!(collect_around(&grid, 55.0, 55.0), vec![3]);
    }

    #[test]
    fn test_overlapping_circles_are_always_neighbors() {
        // Completeness: with cell size >= r_i + r_j, any overlapping pair is
        // visible from each other's query.
        let cell = 10.0;
        let mut grid = SpatialGrid::new(100.0, 100.0, cell);
        let items = [
            (9.9, 9.9),
            (10.1, 10.1),
            (0.5, 99.5),
            (99.5, 0.5),
            (50.0, 50.0),
            (54.9, 50.0),
        ];
        for (i, &(x, y)) in items.iter().enumerate() {
            grid.insert(x, y, i);
        }

        for (i, &(xi, yi)) in items.iter().enumerate() {
            for (j, &(xj, yj)) in items.iter().enumerate() {
                if i == j {
                    continue;
                }
                let mut dx = (xi - xj).abs();
                let mut dy = (yi - yj).abs();
                dx = dx.min(100.0 - dx);
                dy = dy.min(100.0 - dy);
                if (dx * dx + dy * dy).sqrt() < cell {
                    let found = collect_around(&grid, xi, yi);
                    assert!(
                        found.contains(&j),
                        "item {j} not visible from item {i}'s query"
                    );
                }
            }
        }
    }
}
