// ============================================================
// COLUMN NORMALIZER
// ============================================================
// Turn a raw header row into a deduplicated, blank-filtered,
// ordered list of final column labels. Pure function, no file
// handling involved.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::domain::error::{IngestError, Result};
use crate::domain::table::NormalizedColumns;

// Auto-labels spreadsheet readers emit for blank header cells.
static PLACEHOLDER_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^unnamed:").unwrap());

/// Normalize raw header labels.
///
/// Blank and placeholder labels are dropped. Duplicates are renamed the
/// way pandas does it: the first occurrence keeps its bare name, the
/// Nth duplicate gets a `.{N-1}` suffix, order-stable left to right.
pub fn normalize_columns(raw_labels: &[String]) -> Result<NormalizedColumns> {
    let mut valid_indices = Vec::new();
    let mut final_labels = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, raw) in raw_labels.iter().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || PLACEHOLDER_LABEL.is_match(trimmed) {
            continue;
        }

        let final_label = match seen.get_mut(trimmed) {
            None => {
                seen.insert(trimmed.to_string(), 0);
                trimmed.to_string()
            }
            Some(count) => {
                *count += 1;
                format!("{}.{}", trimmed, count)
            }
        };

        valid_indices.push(index);
        final_labels.push(final_label);
    }

    if final_labels.is_empty() {
        return Err(IngestError::Parse(
            "No valid column headers found. Ensure the file has a header row with column names."
                .to_string(),
        ));
    }

    Ok(NormalizedColumns {
        valid_indices,
        final_labels,
    })
}
