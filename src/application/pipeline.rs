// ============================================================
// INGEST PIPELINE
// ============================================================
// The public entry point: upload validation, parsing, source
// detection and chunked submission behind one facade.

use std::sync::Arc;

use tracing::info;

use crate::application::chunker::{chunk_rows, new_batch_id};
use crate::application::dataset_parser;
use crate::application::submission::drive_submission;
use crate::domain::batch::{
    snapshot_state, update_state, CancelToken, SharedSubmissionState, SubmissionPhase,
    SubmissionState,
};
use crate::domain::error::{IngestError, Result};
use crate::domain::ingest_config::IngestConfig;
use crate::domain::table::{FileKind, ParsedDataset, UploadedFile};
use crate::infrastructure::decode::read_grid;
use crate::infrastructure::review_api::ReviewApi;

/// Orchestrates one upload from raw bytes to a terminal submission
/// state. Stateless across uploads; per-submission state lives in the
/// `SharedSubmissionState` the caller owns.
pub struct IngestPipeline {
    config: IngestConfig,
    api: Arc<dyn ReviewApi>,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig, api: Arc<dyn ReviewApi>) -> Result<Self> {
        config.validate().map_err(IngestError::Validation)?;
        Ok(Self { config, api })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Check the upload against the accepted extensions and the size
    /// bound before any decoding work happens.
    pub fn validate_upload(&self, file: &UploadedFile) -> Result<FileKind> {
        let Some(kind) = file.kind() else {
            return Err(IngestError::Validation(
                "Please upload an Excel file (.xlsx, .xls) or CSV file".to_string(),
            ));
        };
        if file.size() > self.config.max_file_size_bytes() {
            return Err(IngestError::Validation(format!(
                "File size must be less than {}MB",
                self.config.max_file_size_mb
            )));
        }
        Ok(kind)
    }

    /// Decode and parse an upload into an ordered dataset.
    ///
    /// Fails fast, before any submission state exists: an invalid file
    /// never produces a batch id or a progress update.
    pub fn parse_upload(&self, file: &UploadedFile) -> Result<ParsedDataset> {
        let kind = self.validate_upload(file)?;

        let grid = read_grid(file)?;
        let dataset = dataset_parser::parse_grid(&grid, kind, &self.config)?;

        if dataset.len() > self.config.max_total_rows {
            return Err(IngestError::Validation(format!(
                "File has too many rows ({}). Maximum allowed is {}. Please split the file and upload it in parts.",
                dataset.len(),
                self.config.max_total_rows
            )));
        }

        info!(file = %file.name, rows = dataset.len(), "Upload parsed");
        Ok(dataset)
    }

    /// Unique values of the dataset's `source` column, if present.
    pub fn detect_sources(&self, dataset: &ParsedDataset) -> Vec<String> {
        dataset_parser::detect_sources(dataset, self.config.source_detect_max_rows)
    }

    /// Chunk the dataset and drive the batch submission to a terminal
    /// state. Consumes the dataset; a failed submission is retried by
    /// re-parsing and resubmitting the whole file under a fresh id.
    pub async fn submit(
        &self,
        dataset: ParsedDataset,
        sources: &[String],
        file_name: &str,
        state: &SharedSubmissionState,
        cancel: &CancelToken,
    ) -> Result<Option<String>> {
        let batch_size = self.config.batch_size_for(dataset.len());
        let batch_id = new_batch_id();
        let batches = chunk_rows(dataset, batch_size, &batch_id);

        drive_submission(
            self.api.as_ref(),
            &self.config,
            &batches,
            sources,
            file_name,
            state,
            cancel,
        )
        .await
    }

    /// Parse and submit in one call, returning the terminal state.
    pub async fn run(
        &self,
        file: &UploadedFile,
        state: &SharedSubmissionState,
        cancel: &CancelToken,
    ) -> Result<SubmissionState> {
        update_state(state, |s| {
            s.phase = SubmissionPhase::Parsing;
            s.message = format!("Parsing {}...", file.name);
        });

        let dataset = match self.parse_upload(file) {
            Ok(dataset) => dataset,
            Err(err) => {
                update_state(state, |s| {
                    s.phase = SubmissionPhase::Failed;
                    s.failed = true;
                    s.message = err.to_string();
                });
                return Err(err);
            }
        };
        update_state(state, |s| {
            s.message = format!("Parsed {} rows. Submitting...", dataset.len());
        });

        let sources = self.detect_sources(&dataset);
        self.submit(dataset, &sources, &file.name, state, cancel)
            .await?;
        Ok(snapshot_state(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::SubmissionPhase;
    use crate::infrastructure::review_api::{BatchAck, BatchRequest, CompletionStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        final_location: Option<String>,
        batch_calls: AtomicU32,
        seen_sources: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReviewApi for RecordingApi {
        async fn submit_batch(&self, request: &BatchRequest<'_>) -> Result<BatchAck> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_sources.lock().unwrap() = request.sources.to_vec();
            Ok(BatchAck {
                progress: None,
                result_location: if request.is_final {
                    self.final_location.clone()
                } else {
                    None
                },
            })
        }

        async fn fetch_status(&self, _batch_id: &str) -> Result<CompletionStatus> {
            Ok(CompletionStatus {
                ready: true,
                result_location: self.final_location.clone(),
            })
        }
    }

    fn pipeline_with(api: Arc<RecordingApi>, config: IngestConfig) -> IngestPipeline {
        IngestPipeline::new(config, api).unwrap()
    }

    fn csv_upload(name: &str, body: &str) -> UploadedFile {
        UploadedFile::new(name, body.as_bytes().to_vec())
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = IngestConfig::default();
        config.batch_size = 0;
        let err = IngestPipeline::new(config, Arc::new(RecordingApi::default()))
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn test_validate_upload_rejects_unknown_extension() {
        let pipeline = pipeline_with(Arc::new(RecordingApi::default()), IngestConfig::default());
        let err = pipeline
            .validate_upload(&csv_upload("report.pdf", "x"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
        assert!(err.to_string().contains("Excel"));
    }

    #[test]
    fn test_validate_upload_rejects_oversized_file() {
        let mut config = IngestConfig::default();
        config.max_file_size_mb = 0;
        let pipeline = pipeline_with(Arc::new(RecordingApi::default()), config);
        let err = pipeline
            .validate_upload(&csv_upload("data.csv", "a,b,c"))
            .unwrap_err();
        assert!(err.to_string().contains("File size must be less than"));
    }

    #[test]
    fn test_parse_upload_rejects_too_many_rows() {
        let mut config = IngestConfig::default();
        config.max_total_rows = 1;
        let pipeline = pipeline_with(Arc::new(RecordingApi::default()), config);

        let file = csv_upload(
            "data.csv",
            "Transaction ID,Asset Number,Date\nT-1,A-9,2026-01-01\nT-2,A-9,2026-01-02\n",
        );
        let err = pipeline.parse_upload(&file).unwrap_err();
        assert!(err.to_string().contains("too many rows"));
    }

    #[test]
    fn test_parse_upload_discards_malformed_csv_rows() {
        let pipeline = pipeline_with(Arc::new(RecordingApi::default()), IngestConfig::default());

        // The unclosed quote swallows the rest of its line.
        let file = csv_upload(
            "data.csv",
            "Transaction ID,Asset Number,Date\nT-1,\"A-9,2026-01-01\nT-2,A-9,2026-01-02\n",
        );
        let dataset = pipeline.parse_upload(&file).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows[0].get("Transaction ID"), Some("T-2"));
    }

    #[tokio::test]
    async fn test_empty_file_fails_before_any_submission() {
        let api = Arc::new(RecordingApi::default());
        let pipeline = pipeline_with(api.clone(), IngestConfig::default());
        let state = SubmissionState::shared();

        let err = pipeline
            .run(&csv_upload("empty.csv", ""), &state, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Parse(_)));
        assert_eq!(api.batch_calls.load(Ordering::SeqCst), 0);
        // No batch id was ever assigned: the failure predates chunking.
        let snap = snapshot_state(&state);
        assert_eq!(snap.phase, SubmissionPhase::Failed);
        assert!(snap.failed);
        assert!(snap.batch_id.is_empty());
        assert!(snap.message.contains("empty"));
    }

    #[tokio::test]
    async fn test_run_end_to_end_csv() {
        let api = Arc::new(RecordingApi {
            final_location: Some("/out/report.xlsx".to_string()),
            ..Default::default()
        });
        let pipeline = pipeline_with(api.clone(), IngestConfig::default());
        let state = SubmissionState::shared();

        let file = csv_upload(
            "jan.csv",
            "Transaction ID,Asset Number,Date,Source\n\
             T-1,A-9,2026-01-01,Depot B\n\
             T-2,A-10,2026-01-02,Depot A\n",
        );
        let snap = pipeline
            .run(&file, &state, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(snap.phase, SubmissionPhase::Done);
        assert_eq!(snap.percent, 100);
        assert_eq!(snap.result_location.as_deref(), Some("/out/report.xlsx"));
        assert!(!snap.failed);
        assert!(snap.batch_id.starts_with("sub_"));

        assert_eq!(api.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *api.seen_sources.lock().unwrap(),
            vec!["Depot A".to_string(), "Depot B".to_string()]
        );
    }
}
