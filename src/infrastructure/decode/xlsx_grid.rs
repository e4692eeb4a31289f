// ============================================================
// SPREADSHEET GRID DECODER
// ============================================================
// Decode workbook bytes (.xlsx / .xls) into a cell grid via calamine.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

use crate::domain::error::{IngestError, Result};
use crate::domain::table::CellGrid;

/// Decode the first worksheet of a workbook into a cell grid.
pub fn decode_workbook_grid(bytes: &[u8]) -> Result<CellGrid> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| IngestError::Decode(format!("Failed to open spreadsheet: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Decode("No worksheet found in spreadsheet".to_string()))?
        .map_err(|e| IngestError::Decode(format!("Failed to read worksheet range: {}", e)))?;

    let grid = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(grid)
}

fn cell_to_string(cell: &Data) -> String {
    cell.as_string()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{}", cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_a_decode_error() {
        let err = decode_workbook_grid(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, IngestError::Decode(_)));
    }
}
