use crate::bot::action::UnitId;
use crate::bot::grid::Cell;

/// Bucketed unit positions for radius queries.
///
/// The map is divided into square buckets of `bucket_size` cells; a query
/// only visits the buckets overlapping the query square and then filters
/// by exact squared distance.
#[derive(Clone, Debug)]
pub struct SpatialHash {
    bucket_size: i32,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<(UnitId, Cell)>>,
}

impl SpatialHash {
    pub fn new(width: usize, height: usize, bucket_size: i32) -> Self {
        let bucket_size = bucket_size.max(1);
        let cols = (width as i32 + bucket_size - 1) as usize / bucket_size as usize;
        let rows = (height as i32 + bucket_size - 1) as usize / bucket_size as usize;
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self { bucket_size, cols, rows, buckets: vec![Vec::new(); cols * rows] }
    }

    fn bucket_of(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let col = (cell.x / self.bucket_size) as usize;
        let row = (cell.y / self.bucket_size) as usize;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    pub fn insert(&mut self, unit: UnitId, cell: Cell) {
        if let Some(idx) = self.bucket_of(cell) {
            self.buckets[idx].push((unit, cell));
        }
    }

    pub fn remove(&mut self, unit: UnitId, cell: Cell) {
        if let Some(idx) = self.bucket_of(cell) {
            self.buckets[idx].retain(|(id, _)| *id != unit);
        }
    }

    pub fn relocate(&mut self, unit: UnitId, from: Cell, to: Cell) {
        self.remove(unit, from);
        self.insert(unit, to);
    }

    /// Units within `radius_sq` of `center`, in ascending id order.
    pub fn query_radius(&self, center: Cell, radius_sq: i64) -> Vec<(UnitId, Cell)> {
        let mut result = Vec::new();
        if radius_sq < 0 {
            return result;
        }
        let reach = (radius_sq as f64).sqrt().ceil() as i32;

        let min_col = ((center.x - reach).max(0) / self.bucket_size) as usize;
        let min_row = ((center.y - reach).max(0) / self.bucket_size) as usize;
        let max_x = center.x + reach;
        let max_y = center.y + reach;
        if max_x < 0 || max_y < 0 {
            return result;
        }
        let max_col = ((max_x / self.bucket_size) as usize).min(self.cols - 1);
        let max_row = ((max_y / self.bucket_size) as usize).min(self.rows - 1);

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                for &(unit, cell) in &self.buckets[row * self.cols + col] {
                    if cell.distance_squared_to(center) <= radius_sq {
                        result.push((unit, cell));
                    }
                }
            }
        }

        result.sort_unstable_by_key(|(unit, _)| *unit);
        result
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
