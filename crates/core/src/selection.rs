use serde::{Deserialize, Serialize};

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl CellRange {
    /// Create a new range, automatically normalizing so start <= end.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        }
    }

    /// Create a single-cell range.
    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    /// Check if this range contains a cell.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row &&
        col >= self.start_col && col <= self.end_col
    }

    /// Number of cells in this range.
    pub fn cell_count(&self) -> usize {
        (self.end_row - self.start_row + 1) * (self.end_col - self.start_col + 1)
    }

    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    /// Parse an A1-style reference ("B7") or range ("A1:C3").
    pub fn parse_a1(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.split_once(':') {
            Some((a, b)) => {
                let (r1, c1) = parse_cell_ref(a)?;
                let (r2, c2) = parse_cell_ref(b)?;
                Some(Self::new(r1, c1, r2, c2))
            }
            None => parse_cell_ref(text).map(|(r, c)| Self::single(r, c)),
        }
    }
}

/// Parse "B7" into zero-based (row, col).
fn parse_cell_ref(text: &str) -> Option<(usize, usize)> {
    let text = text.trim();
    let split = text.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = text.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col = 0usize;
    for ch in letters.chars() {
        col = col.checked_mul(26)?.checked_add((ch.to_ascii_uppercase() as u8 - b'A') as usize + 1)?;
    }
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Ordered list of selected ranges. The last range is the one the user
/// touched most recently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ranges: Vec<CellRange>,
}

impl Selection {
    /// Create a selection with a single cell.
    pub fn new(row: usize, col: usize) -> Self {
        Self { ranges: vec![CellRange::single(row, col)] }
    }

    pub fn from_ranges(ranges: Vec<CellRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The most recent range, if any.
    pub fn last(&self) -> Option<&CellRange> {
        self.ranges.last()
    }

    /// Top-left cell of the most recent range.
    pub fn active_cell(&self) -> Option<(usize, usize)> {
        self.last().map(|r| (r.start_row, r.start_col))
    }

    /// Bottom-right cell of the most recent range.
    pub fn end_cell(&self) -> Option<(usize, usize)> {
        self.last().map(|r| (r.end_row, r.end_col))
    }

    /// Set selection to a single cell (click).
    pub fn select_cell(&mut self, row: usize, col: usize) {
        self.ranges = vec![CellRange::single(row, col)];
    }

    /// Add a new range (ctrl+click).
    pub fn add_range(&mut self, range: CellRange) {
        self.ranges.push(range);
    }
}
