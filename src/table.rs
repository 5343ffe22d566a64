//! Raw tabular input: header labels plus untyped string rows.
//!
//! A [`RawTable`] is immutable once constructed. Role-to-column binding is
//! resolved once against it by [`crate::roles::infer_roles`]; no component
//! re-discovers columns per access.

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell at a physical column index; empty string when the row is short.
    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }

    /// Iterates the cells of one physical column, top to bottom.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row.cell(column))
    }

    /// Average character length of the cells in a column, used by the
    /// description fallback heuristics.
    pub fn average_cell_length(&self, column: usize) -> f64 {
        let mut total = 0usize;
        let mut counted = 0usize;
        for value in self.column_values(column) {
            total += value.trim().chars().count();
            counted += 1;
        }
        if counted == 0 {
            0.0
        } else {
            total as f64 / counted as f64
        }
    }
}
