use crate::explorer::*;
use snafu::prelude::*;

/// A cell of an input table, as read from a CSV or an Excel file.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn content(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(x) => x.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TableFormat {
    Csv,
    Excel,
}

/// Guesses the format of a table from the extension of the file.
pub fn table_format(path: &str) -> Option<TableFormat> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(TableFormat::Csv),
        "xlsx" => Some(TableFormat::Excel),
        _ => None,
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// A table with a header row. The columns are looked up by name.
#[derive(PartialEq, Debug, Clone)]
pub struct RawTable {
    pub path: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// The line number of a data row in the source file. The header is on line 1.
    fn lineno(row: usize) -> usize {
        row + 2
    }

    pub fn column(&self, name: &str) -> BExplorerResult<usize> {
        let idx = self
            .optional_column(name)
            .context(MissingColumnSnafu {
                path: simplify_file_name(&self.path),
                column: name,
            })?;
        Ok(idx)
    }

    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    fn bad_cell(&self, row: usize, col: usize) -> Box<ExplorerError> {
        Box::new(ExplorerError::BadCell {
            path: simplify_file_name(&self.path),
            lineno: Self::lineno(row),
            column: self.header[col].clone(),
            content: format!("{:?}", self.text(row, col)),
        })
    }

    /// A text cell. Numbers are formatted and empty cells are empty strings.
    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(|c| c.content()).unwrap_or_default()
    }

    /// A text cell that must not be empty.
    pub fn required_text(&self, row: usize, col: usize) -> BExplorerResult<String> {
        let s = self.text(row, col);
        if s.is_empty() {
            return Err(self.bad_cell(row, col));
        }
        Ok(s)
    }

    /// A non-negative integer. Excel stores all the numbers as floats, so integral floats
    /// are accepted.
    pub fn count(&self, row: usize, col: usize) -> BExplorerResult<u64> {
        let parsed = match self.cell(row, col) {
            Some(Cell::Text(s)) => s.trim().parse::<u64>().ok(),
            Some(Cell::Number(x)) if *x >= 0.0 && x.fract() == 0.0 && *x <= u64::MAX as f64 => {
                Some(*x as u64)
            }
            _ => None,
        };
        parsed.ok_or_else(|| self.bad_cell(row, col))
    }

    pub fn ordinal(&self, row: usize, col: usize) -> BExplorerResult<u32> {
        let x = self.count(row, col)?;
        u32::try_from(x).map_err(|_| self.bad_cell(row, col))
    }
}
