//! Grid Detector: read a page's lines as table rows.
//!
//! Within each line, a horizontal gap wider than `gap_threshold` between the
//! right edge of one fragment and the left edge of the next starts a new
//! cell; narrower gaps join fragments into the current cell with a single
//! space. One line becomes one row.
//!
//! Rows are left ragged. A row with fewer detected gaps has fewer cells, and
//! padding is the caller's explicit decision ([`Grid::padded`]) so detection
//! errors stay visible.

use crate::model::{Grid, Line, TextFragment};
use crate::pipeline::normalize::join_fragments;
use tracing::debug;

/// Default column gap threshold in page units.
pub const COLUMN_GAP_THRESHOLD: f64 = 20.0;

/// Reinterpret lines (top-to-bottom) as rows of a table.
pub fn detect_grid(lines: &[Line], gap_threshold: f64) -> Grid {
    let rows: Vec<Vec<String>> = lines
        .iter()
        .map(|line| split_cells(&line.fragments, gap_threshold))
        .collect();

    let grid = Grid::new(rows);
    debug!(
        "Detected grid: {} rows, up to {} columns (gap threshold {})",
        grid.rows.len(),
        grid.column_count(),
        gap_threshold
    );
    grid
}

/// Split one line's fragments (sorted by x) into cell strings.
fn split_cells(fragments: &[TextFragment], gap_threshold: f64) -> Vec<String> {
    let mut cells: Vec<Vec<&TextFragment>> = Vec::new();
    let mut prev_right: Option<f64> = None;

    for fragment in fragments {
        let new_cell = match prev_right {
            None => true,
            Some(right) => fragment.x - right > gap_threshold,
        };
        if new_cell {
            cells.push(vec![fragment]);
        } else if let Some(cell) = cells.last_mut() {
            cell.push(fragment);
        }
        prev_right = Some(fragment.right());
    }

    cells.into_iter().map(join_fragments).collect()
}
