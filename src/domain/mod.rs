// ============================================================
// DOMAIN LAYER
// ============================================================
// Core types and value objects for tabular ingestion.
// No I/O, no async, no external services.

pub mod batch;
pub mod error;
pub mod ingest_config;
pub mod table;

pub use batch::{
    snapshot_state, update_state, CancelToken, RowBatch, SharedSubmissionState, SubmissionPhase,
    SubmissionState,
};
pub use error::{IngestError, Result};
pub use ingest_config::IngestConfig;
pub use table::{
    CellGrid, FileKind, HeaderInfo, NormalizedColumns, ParsedDataset, RowRecord, UploadedFile,
};
