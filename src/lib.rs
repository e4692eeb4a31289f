//! rowgate: tabular-file ingestion and chunked batch submission.
//!
//! Takes a user-supplied CSV or Excel export, locates the real header
//! row, normalizes columns, materializes the data rows, then streams
//! them to a review service in ordered batches with progress tracking,
//! bounded completion verification and cooperative cancellation.
//!
//! The usual entry point is [`IngestPipeline`]:
//!
//! ```no_run
//! use std::sync::Arc;
//! use rowgate::{CancelToken, HttpReviewApi, IngestConfig, IngestPipeline, SubmissionState, UploadedFile};
//!
//! # async fn example() -> rowgate::Result<()> {
//! let api = Arc::new(HttpReviewApi::new("https://review.example.com"));
//! let pipeline = IngestPipeline::new(IngestConfig::default(), api)?;
//!
//! let file = UploadedFile::new("january.csv", std::fs::read("january.csv")?);
//! let state = SubmissionState::shared();
//! let cancel = CancelToken::new();
//!
//! let outcome = pipeline.run(&file, &state, &cancel).await?;
//! println!("{}: {:?}", outcome.message, outcome.result_location);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::IngestPipeline;
pub use domain::batch::{
    snapshot_state, update_state, CancelToken, RowBatch, SharedSubmissionState, SubmissionPhase,
    SubmissionState,
};
pub use domain::error::{IngestError, Result};
pub use domain::ingest_config::IngestConfig;
pub use domain::table::{FileKind, ParsedDataset, RowRecord, UploadedFile};
pub use infrastructure::bootstrap::init_tracing;
pub use infrastructure::review_api::{HttpReviewApi, ReviewApi};
