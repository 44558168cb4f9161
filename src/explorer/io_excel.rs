// Primitives for reading Excel files.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::explorer::io_common::{Cell, RawTable};
use crate::explorer::*;
use snafu::prelude::*;

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> BExplorerResult<Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let wrange = match worksheet_name_o {
        // A worksheet name was provided, use it.
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

fn to_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) if s.trim().is_empty() => Cell::Empty,
        DataType::String(s) => Cell::Text(s.trim().to_string()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::Empty => Cell::Empty,
        other => {
            warn!("read_excel_table: unexpected cell {:?}", other);
            Cell::Text(format!("{:?}", other))
        }
    }
}

/// Reads a worksheet. The first row is the header.
pub fn read_excel_table(path: &str, worksheet_name_o: Option<&str>) -> BExplorerResult<RawTable> {
    let wrange = get_range(path, worksheet_name_o)?;
    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(MissingHeaderSnafu { path })?
        .iter()
        .map(|c| match to_cell(c) {
            Cell::Text(s) => s,
            Cell::Number(x) => x.to_string(),
            Cell::Empty => String::new(),
        })
        .collect();
    debug!("read_excel_table: header: {:?}", header);

    let rows: Vec<Vec<Cell>> = iter
        .map(|row| row.iter().map(to_cell).collect())
        .collect();
    Ok(RawTable {
        path: path.to_string(),
        header,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(to_cell(&DataType::Float(12.0)), Cell::Number(12.0));
        assert_eq!(to_cell(&DataType::Int(3)), Cell::Number(3.0));
        assert_eq!(
            to_cell(&DataType::String(" ALP ".to_string())),
            Cell::Text("ALP".to_string())
        );
        assert_eq!(to_cell(&DataType::String("  ".to_string())), Cell::Empty);
        assert_eq!(to_cell(&DataType::Empty), Cell::Empty);
        assert_eq!(to_cell(&DataType::Bool(true)), Cell::Text("true".to_string()));
    }

    #[test]
    fn missing_file() {
        let path = format!("{}/testdata/broken/nowhere.xlsx", env!("CARGO_MANIFEST_DIR"));
        let res = read_excel_table(&path, None);
        assert!(matches!(res.map_err(|e| *e), Err(ExplorerError::OpeningExcel { .. })));
    }
}
