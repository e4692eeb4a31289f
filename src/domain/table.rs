// ============================================================
// TABLE MODEL
// ============================================================
// Data structures carried through the parsing stage, from raw
// upload bytes down to the ordered row records handed to the
// submission stage. No I/O here.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Kind of tabular file, inferred from the declared file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    /// Infer the file kind from the file name extension.
    /// Returns `None` for anything that is not `.csv`, `.xlsx` or `.xls`.
    pub fn from_name(name: &str) -> Option<FileKind> {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            Some(FileKind::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Some(FileKind::Spreadsheet)
        } else {
            None
        }
    }
}

/// A user-supplied file, alive only until it has been parsed.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_name(&self.name)
    }
}

/// Raw cell grid as decoded from the file. Rows may differ in length.
pub type CellGrid = Vec<Vec<String>>;

/// The chosen header row: its 0-based index in the grid and its
/// unprocessed cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderInfo {
    pub row_index: usize,
    pub raw_labels: Vec<String>,
}

/// Result of header normalization. `final_labels` has no duplicates and
/// no blank entries; `valid_indices[i]` is the original column position
/// that produced `final_labels[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumns {
    pub valid_indices: Vec<usize>,
    pub final_labels: Vec<String>,
}

/// One data row: string values in column order, sharing the final label
/// list with every other record of the same dataset. Serializes as a
/// JSON object whose keys appear in label order, so every record in a
/// dataset carries an identical, identically ordered key set.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    labels: Arc<Vec<String>>,
    values: Vec<String>,
}

impl RowRecord {
    pub fn new(labels: Arc<Vec<String>>, values: Vec<String>) -> Self {
        debug_assert_eq!(labels.len(), values.len());
        Self { labels, values }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Look up a value by its final column label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i].as_str())
    }

    /// True when every value in the record is blank.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (label, value) in self.labels.iter().zip(self.values.iter()) {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// The fully parsed dataset. Non-empty by construction: an empty result
/// is a parse failure, not a valid dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDataset {
    pub labels: Arc<Vec<String>>,
    pub rows: Vec<RowRecord>,
}

impl ParsedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
