// ============================================================
// ROW MATERIALIZER
// ============================================================
// Combine the located header and normalized columns with the data
// rows below the header to produce the ordered row records.

use std::sync::Arc;

use tracing::warn;

use crate::domain::error::{IngestError, Result};
use crate::domain::table::{
    CellGrid, FileKind, HeaderInfo, NormalizedColumns, ParsedDataset, RowRecord,
};

/// Materialize the rows strictly after the header row.
///
/// Zero-length and all-blank grid rows are skipped. On the CSV path a
/// row whose field count differs from the header row's is discarded:
/// the best-effort tokenizer never fails on malformed quoting, so a
/// width mismatch is the signal that fields got merged or shifted.
/// Workbook ranges legitimately vary in width and are kept ragged.
/// Cells are read at the surviving column positions (out-of-range
/// reads as empty) and trimmed. Records whose every value is blank are
/// dropped, guarding against the trailing blank rows spreadsheet
/// readers like to emit.
pub fn materialize_rows(
    grid: &CellGrid,
    header: &HeaderInfo,
    columns: &NormalizedColumns,
    kind: FileKind,
) -> Result<ParsedDataset> {
    let labels = Arc::new(columns.final_labels.clone());
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for grid_row in grid.iter().skip(header.row_index + 1) {
        if grid_row.is_empty() || grid_row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if kind == FileKind::Csv && grid_row.len() != header.raw_labels.len() {
            dropped += 1;
            continue;
        }

        let values: Vec<String> = columns
            .valid_indices
            .iter()
            .map(|&i| {
                grid_row
                    .get(i)
                    .map(|cell| cell.trim().to_string())
                    .unwrap_or_default()
            })
            .collect();

        let record = RowRecord::new(labels.clone(), values);
        if record.is_blank() {
            continue;
        }
        rows.push(record);
    }

    if dropped > 0 {
        warn!(dropped, "Discarded rows with a field count mismatching the header");
    }

    if rows.is_empty() {
        return Err(IngestError::Parse(
            "No data rows found in file after parsing".to_string(),
        ));
    }

    Ok(ParsedDataset { labels, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::column_normalizer::normalize_columns;

    fn grid(rows: &[&[&str]]) -> CellGrid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn header(row_index: usize, labels: &[&str]) -> HeaderInfo {
        HeaderInfo {
            row_index,
            raw_labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_materializes_rows_below_header() {
        let grid = grid(&[
            &["Title row"],
            &["ID", "Qty"],
            &["T-1", "10"],
            &["T-2", "20"],
        ]);
        let header = header(1, &["ID", "Qty"]);
        let columns = normalize_columns(&header.raw_labels).unwrap();

        let dataset = materialize_rows(&grid, &header, &columns, FileKind::Csv).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0].get("ID"), Some("T-1"));
        assert_eq!(dataset.rows[1].get("Qty"), Some("20"));
    }

    #[test]
    fn test_workbook_blank_and_short_rows() {
        let grid = grid(&[
            &["ID", "Qty"],
            &["T-1", "10"],
            &[],
            &["", "  "],
            &["T-2"], // ragged workbook row: missing cell reads as empty
        ]);
        let header = header(0, &["ID", "Qty"]);
        let columns = normalize_columns(&header.raw_labels).unwrap();

        let dataset = materialize_rows(&grid, &header, &columns, FileKind::Spreadsheet).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[1].get("ID"), Some("T-2"));
        assert_eq!(dataset.rows[1].get("Qty"), Some(""));
    }

    #[test]
    fn test_csv_field_count_mismatch_dropped() {
        // An unclosed quote merges fields, so the row comes out narrow.
        let grid = grid(&[
            &["ID", "Qty", "Date"],
            &["T-1", "10,2026-01-01"],
            &["T-2", "20", "2026-01-02"],
        ]);
        let header = header(0, &["ID", "Qty", "Date"]);
        let columns = normalize_columns(&header.raw_labels).unwrap();

        let dataset = materialize_rows(&grid, &header, &columns, FileKind::Csv).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows[0].get("ID"), Some("T-2"));

        // The same grid from a workbook keeps the narrow row, padded.
        let dataset = materialize_rows(&grid, &header, &columns, FileKind::Spreadsheet).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0].get("Date"), Some(""));
    }

    #[test]
    fn test_values_only_read_at_valid_indices() {
        // Column 0 is a placeholder: values under it must not leak through.
        let grid = grid(&[
            &["Unnamed: 0", "ID", "Qty"],
            &["junk", "T-1", "10"],
        ]);
        let header = header(0, &["Unnamed: 0", "ID", "Qty"]);
        let columns = normalize_columns(&header.raw_labels).unwrap();

        let dataset = materialize_rows(&grid, &header, &columns, FileKind::Csv).unwrap();
        assert_eq!(dataset.labels.as_slice(), ["ID", "Qty"]);
        assert_eq!(dataset.rows[0].values(), ["T-1", "10"]);
    }

    #[test]
    fn test_record_blank_at_valid_columns_dropped() {
        // The row has content, but only under the excluded column.
        let grid = grid(&[
            &["Unnamed: 0", "ID"],
            &["junk", ""],
            &["junk", "T-1"],
        ]);
        let header = header(0, &["Unnamed: 0", "ID"]);
        let columns = normalize_columns(&header.raw_labels).unwrap();

        let dataset = materialize_rows(&grid, &header, &columns, FileKind::Csv).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_no_data_rows_is_fatal() {
        let grid = grid(&[&["ID", "Qty"], &["", ""]]);
        let header = header(0, &["ID", "Qty"]);
        let columns = normalize_columns(&header.raw_labels).unwrap();

        let err = materialize_rows(&grid, &header, &columns, FileKind::Csv).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }
}
