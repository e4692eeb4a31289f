// ============================================================
// BATCH & SUBMISSION MODEL
// ============================================================
// One size-bounded slice of parsed rows, plus the mutable state a
// caller observes while a submission is in flight.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::table::RowRecord;

/// One bounded-size slice of the parsed rows, tagged with its position
/// in the full sequence for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    pub batch_id: String,
    /// 1-based position in the batch sequence.
    pub batch_number: u32,
    pub total_batches: u32,
    pub rows: Vec<RowRecord>,
    pub is_final: bool,
}

/// Where a submission currently is. Transitions happen only inside the
/// submission driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionPhase {
    Idle,
    Parsing,
    SendingBatch(u32),
    AwaitingVerification(u32),
    Done,
    Failed,
}

/// Progress/result state for one submission. Created when the
/// submission starts, mutated only by the submission driver, read-only
/// once terminal. This is the only thing a UI layer should observe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionState {
    pub batch_id: String,
    pub phase: SubmissionPhase,
    pub percent: u8,
    pub message: String,
    pub result_location: Option<String>,
    pub failed: bool,
}

impl SubmissionState {
    pub fn new() -> Self {
        Self {
            batch_id: String::new(),
            phase: SubmissionPhase::Idle,
            percent: 0,
            message: String::new(),
            result_location: None,
            failed: false,
        }
    }

    pub fn shared() -> SharedSubmissionState {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, SubmissionPhase::Done | SubmissionPhase::Failed)
    }
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedSubmissionState = Arc<Mutex<SubmissionState>>;

/// Apply a mutation to the shared state. A poisoned lock is ignored:
/// the observer side only ever reads snapshots.
pub fn update_state(state: &SharedSubmissionState, f: impl FnOnce(&mut SubmissionState)) {
    if let Ok(mut guard) = state.lock() {
        f(&mut guard);
    }
}

/// Snapshot the shared state for reporting.
pub fn snapshot_state(state: &SharedSubmissionState) -> SubmissionState {
    state
        .lock()
        .map(|guard| guard.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
}

/// Cooperative cancellation flag, checked at every suspension point of
/// a submission (batch sends, verification polls, inter-poll delays).
/// Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
