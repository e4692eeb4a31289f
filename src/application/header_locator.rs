// ============================================================
// HEADER LOCATOR
// ============================================================
// Find the true header row in a cell grid, tolerating title and
// preamble rows above it.

use tracing::warn;

use crate::domain::error::{IngestError, Result};
use crate::domain::ingest_config::IngestConfig;
use crate::domain::table::{CellGrid, HeaderInfo};

/// Locate the header row within the first `header_scan_rows` rows.
///
/// A candidate qualifies when its cells, joined and lowercased, contain
/// every configured keyword. When nothing in the scan window qualifies,
/// row 0 is used as a fallback with a warning; downstream column
/// validation still rejects the result if it yields no usable columns.
pub fn locate_header(grid: &CellGrid, config: &IngestConfig) -> Result<HeaderInfo> {
    if grid.is_empty() {
        return Err(IngestError::Parse(
            "The file appears to be empty".to_string(),
        ));
    }

    let bound = config.header_scan_rows.min(grid.len());
    for index in 0..bound {
        let joined = grid[index].join(" ").to_lowercase();
        let qualifies = config
            .header_keywords
            .iter()
            .all(|keyword| joined.contains(&keyword.to_lowercase()));

        if qualifies {
            return Ok(HeaderInfo {
                row_index: index,
                raw_labels: grid[index].clone(),
            });
        }
    }

    warn!(
        scanned_rows = bound,
        "No header row matched the keyword set, falling back to row 0"
    );
    Ok(HeaderInfo {
        row_index: 0,
        raw_labels: grid[0].clone(),
    })
}
