//! Raw row records shared by both extraction strategies

/// One extracted row: an ordered set of string cells
///
/// Both source strategies (live table, bulk export) produce this shape, so
/// the normalizer never knows where a row came from. Missing trailing cells
/// and empty cells both read as absent.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Returns the cell at a column index, or None when the cell is missing
    /// or blank
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells
            .get(index)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Returns the cell as an owned string, empty when absent
    ///
    /// For plain text columns where the sink stores empty strings rather
    /// than NULLs.
    pub fn cell_or_empty(&self, index: usize) -> String {
        self.cell(index).unwrap_or_default().to_string()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
