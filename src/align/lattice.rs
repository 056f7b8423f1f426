//! Column-major score storage with three biased sub-scores packed into one `i64` per cell.
//!
//! Cell `(col, row)` lives at `col * rows + row`. Each cell holds the insert score in the
//! high bits, the diagonal score in the middle [`SCORE_BITS`] and the delete score in the
//! low [`SCORE_BITS`]. Scores are stored with [`ZERO_SCORE`] added so they never go negative.

/// Width of each packed sub-score
pub const SCORE_BITS: u32 = 20;

/// Mask selecting one sub-score
pub const SCORE_MASK: i32 = (1 << SCORE_BITS) - 1;

/// Bias added to every stored score
pub const ZERO_SCORE: i32 = SCORE_MASK / 2;

/// A score no real alignment reaches, used for the band fences
pub const LARGE_SCORE: i32 = ZERO_SCORE + ZERO_SCORE / 2;

/// Packs three biased scores into one cell
#[inline]
fn pack(insert: i32, diagonal: i32, delete: i32) -> i64 {
    (i64::from(insert) << (2 * SCORE_BITS))
        .wrapping_add(i64::from(diagonal) << SCORE_BITS)
        .wrapping_add(i64::from(delete))
}

#[inline]
pub fn insert_of(cell: i64) -> i32 {
    (cell >> (2 * SCORE_BITS)) as i32
}

#[inline]
pub fn diagonal_of(cell: i64) -> i32 {
    SCORE_MASK & (cell >> SCORE_BITS) as i32
}

#[inline]
pub fn delete_of(cell: i64) -> i32 {
    SCORE_MASK & cell as i32
}

/// Smallest of the three scores in a cell
#[inline]
pub fn min_of(cell: i64) -> i32 {
    insert_of(cell).min(diagonal_of(cell)).min(delete_of(cell))
}

/// Reusable dynamic-programming matrix.
///
/// The backing storage only grows. A resize to a larger area reallocates zeroed cells;
/// a resize to a smaller area reuses the existing cells and leaves their old contents.
#[derive(Debug, Clone, Default)]
pub struct ScoreLattice {
    cells: Vec<i64>,
    rows: usize,
    cols: usize,
}

impl ScoreLattice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working dimensions, growing the storage if needed
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let area = rows * cols;
        if self.cells.len() < area {
            self.cells = vec![0; area];
        }
        self.rows = rows;
        self.cols = cols;
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Bytes held by the backing storage
    #[must_use]
    pub fn capacity_bytes(&self) -> usize {
        self.cells.len() * std::mem::size_of::<i64>()
    }

    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> i64 {
        self.cells[col * self.rows + row]
    }

    #[inline]
    pub fn insert(&self, col: usize, row: usize) -> i32 {
        insert_of(self.cell(col, row))
    }

    #[inline]
    pub fn diagonal(&self, col: usize, row: usize) -> i32 {
        diagonal_of(self.cell(col, row))
    }

    #[inline]
    pub fn delete(&self, col: usize, row: usize) -> i32 {
        delete_of(self.cell(col, row))
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, insert: i32, diagonal: i32, delete: i32) {
        let rows = self.rows;
        self.cells[col * rows + row] = pack(insert, diagonal, delete);
    }

    /// Replaces the insert score, keeping the other two
    #[inline]
    pub fn set_insert(&mut self, col: usize, row: usize, insert: i32) {
        let cell = self.cell(col, row);
        self.set(col, row, insert, diagonal_of(cell), delete_of(cell));
    }
}
