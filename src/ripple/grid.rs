//! Background grid geometry
//!
//! The grid always covers the viewport exactly: the column/row count is
//! chosen from a target cell size, then cells are stretched to fit.

use glam::Vec2;

/// (row, col) address of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: u32,
    pub col: u32,
}

impl CellKey {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Row-major index into a grid with `cols` columns
    #[inline]
    pub fn index(&self, cols: u32) -> usize {
        self.row as usize * cols as usize + self.col as usize
    }
}

/// Grid dimensions in cells and pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl GridSpec {
    pub const EMPTY: Self = Self {
        rows: 0,
        cols: 0,
        cell_width: 0.0,
        cell_height: 0.0,
    };

    /// Size a grid to a viewport, aiming for `target_cell` pixel cells
    pub fn from_viewport(width: f32, height: f32, target_cell: f32) -> Self {
        let usable = |v: f32| v.is_finite() && v > 0.0;
        if !usable(width) || !usable(height) || !usable(target_cell) {
            return Self::EMPTY;
        }

        let cols = (width / target_cell).ceil().max(1.0) as u32;
        let rows = (height / target_cell).ceil().max(1.0) as u32;
        Self {
            rows,
            cols,
            cell_width: width / cols as f32,
            cell_height: height / rows as f32,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Cell under a viewport-space point, if any
    pub fn cell_at(&self, point: Vec2) -> Option<CellKey> {
        if self.is_empty() || !point.is_finite() {
            return None;
        }
        let col = (point.x / self.cell_width).floor();
        let row = (point.y / self.cell_height).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f32 || row >= self.rows as f32 {
            return None;
        }
        Some(CellKey::new(row as u32, col as u32))
    }

    /// Pixel centre of a cell
    pub fn cell_center(&self, key: CellKey) -> Vec2 {
        Vec2::new(
            (key.col as f32 + 0.5) * self.cell_width,
            (key.row as f32 + 0.5) * self.cell_height,
        )
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellKey> + use<> {
        let (rows, cols) = (self.rows, self.cols);
        (0..rows).flat_map(move |row| (0..cols).map(move |col| CellKey::new(row, col)))
    }
}
