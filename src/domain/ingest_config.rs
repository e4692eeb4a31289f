// ============================================================
// INGEST CONFIGURATION
// ============================================================
// Tunables for parsing and submission. Everything the algorithms
// treat as a constant lives here, not in the code paths.

use serde::{Deserialize, Serialize};

/// Configuration for the ingestion and submission pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Keywords that must ALL appear (case-insensitive) in a row for it
    /// to qualify as the header row. Domain-specific, injected.
    pub header_keywords: Vec<String>,

    /// How many leading grid rows to scan for the header (default: 5).
    /// Headers are rarely buried deeper, and an unbounded scan risks
    /// false positives on data rows.
    pub header_scan_rows: usize,

    /// Rows per batch when adaptive sizing is off (default: 500).
    pub batch_size: usize,

    /// Grow the batch size for large datasets to cut round-trips.
    pub adaptive_batch_size: bool,

    /// Upload size bound in megabytes (default: 50).
    pub max_file_size_mb: u64,

    /// Reject datasets with more rows than this (default: 400_000).
    pub max_total_rows: usize,

    /// How many parsed rows to scan when detecting source values.
    pub source_detect_max_rows: usize,

    /// Bounded verification polls after the final batch (default: 3).
    pub verify_attempts: u32,

    /// Base inter-poll delay; attempt k waits k times this.
    pub verify_base_delay_ms: u64,

    /// Portion of the percent range consumed by batch sending; the
    /// remainder is reserved for verification (default: 50).
    pub sending_percent_span: u8,

    /// Percent reported while awaiting verification (default: 90).
    pub waiting_percent: u8,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            header_keywords: vec![
                "transaction".to_string(),
                "asset".to_string(),
                "date".to_string(),
            ],
            header_scan_rows: 5,
            batch_size: 500,
            adaptive_batch_size: true,
            max_file_size_mb: 50,
            max_total_rows: 400_000,
            source_detect_max_rows: 5_000,
            verify_attempts: 3,
            verify_base_delay_ms: 2_000,
            sending_percent_span: 50,
            waiting_percent: 90,
        }
    }
}

impl IngestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.header_keywords.is_empty() {
            return Err("header_keywords must not be empty".to_string());
        }
        if self.header_scan_rows == 0 {
            return Err("header_scan_rows must be > 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        if self.max_total_rows == 0 {
            return Err("max_total_rows must be > 0".to_string());
        }
        if self.verify_attempts == 0 {
            return Err("verify_attempts must be > 0".to_string());
        }
        if self.sending_percent_span > 100 {
            return Err("sending_percent_span must be <= 100".to_string());
        }
        if self.waiting_percent < self.sending_percent_span || self.waiting_percent > 100 {
            return Err(
                "waiting_percent must be between sending_percent_span and 100".to_string(),
            );
        }
        Ok(())
    }

    /// Batch size for one submission. Larger files get larger batches
    /// to reduce round-trips while keeping single payloads bounded.
    pub fn batch_size_for(&self, total_rows: usize) -> usize {
        if !self.adaptive_batch_size {
            return self.batch_size;
        }
        if total_rows > 50_000 {
            3_500
        } else if total_rows > 10_000 {
            1_000
        } else {
            self.batch_size
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}
