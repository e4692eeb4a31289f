// ============================================================
// FILE DECODING
// ============================================================
// Turn raw upload bytes into a cell grid, dispatching on file kind.

mod csv_grid;
mod xlsx_grid;

pub use csv_grid::{decode_csv_grid, tokenize_line};
pub use xlsx_grid::decode_workbook_grid;

use crate::domain::error::{IngestError, Result};
use crate::domain::table::{CellGrid, FileKind, UploadedFile};

/// Decode an uploaded file into a cell grid based on its inferred kind.
pub fn read_grid(upload: &UploadedFile) -> Result<CellGrid> {
    let kind = upload.kind().ok_or_else(|| {
        IngestError::Validation(
            "Please upload an Excel file (.xlsx, .xls) or CSV file".to_string(),
        )
    })?;

    match kind {
        FileKind::Csv => Ok(decode_csv_grid(&upload.bytes)),
        FileKind::Spreadsheet => decode_workbook_grid(&upload.bytes),
    }
}
