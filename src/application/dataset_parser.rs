// ============================================================
// DATASET PARSER
// ============================================================
// Orchestrate header location, column normalization and row
// materialization over one decoded cell grid.

use std::collections::BTreeSet;

use tracing::info;

use crate::application::column_normalizer::normalize_columns;
use crate::application::header_locator::locate_header;
use crate::application::row_materializer::materialize_rows;
use crate::domain::error::Result;
use crate::domain::ingest_config::IngestConfig;
use crate::domain::table::{CellGrid, FileKind, ParsedDataset};

/// Parse a cell grid into an ordered dataset of row records. The file
/// kind decides how strictly row widths are checked against the header.
pub fn parse_grid(grid: &CellGrid, kind: FileKind, config: &IngestConfig) -> Result<ParsedDataset> {
    let header = locate_header(grid, config)?;
    let columns = normalize_columns(&header.raw_labels)?;
    let dataset = materialize_rows(grid, &header, &columns, kind)?;

    info!(
        header_row = header.row_index,
        columns = dataset.labels.len(),
        rows = dataset.len(),
        "Parsed tabular file"
    );

    Ok(dataset)
}

/// Collect the unique values of a column named `source`
/// (case-insensitive) from a bounded sample of the dataset, sorted.
/// Returns an empty list when no such column exists.
pub fn detect_sources(dataset: &ParsedDataset, max_rows: usize) -> Vec<String> {
    let Some(source_label) = dataset
        .labels
        .iter()
        .find(|label| label.trim().eq_ignore_ascii_case("source"))
    else {
        return Vec::new();
    };

    let mut unique = BTreeSet::new();
    for row in dataset.rows.iter().take(max_rows) {
        if let Some(value) = row.get(source_label) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                unique.insert(trimmed.to_string());
            }
        }
    }

    unique.into_iter().collect()
}
