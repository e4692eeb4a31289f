// ============================================================
// BATCH CHUNKER
// ============================================================
// Split the parsed rows into fixed-size batches tagged with
// sequence metadata. Pure, no I/O.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::batch::RowBatch;
use crate::domain::table::ParsedDataset;

/// Generate a fresh submission id: a millisecond timestamp plus a
/// random component, unique with overwhelming probability.
pub fn new_batch_id() -> String {
    let random: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("sub_{}_{}", Utc::now().timestamp_millis(), random)
}

/// Chunk the dataset into batches of `batch_size` rows.
///
/// Batch numbers are 1-based and strictly increasing; exactly the last
/// batch is marked final; the concatenation of all batches' rows, in
/// batch order, equals the dataset's rows.
pub fn chunk_rows(dataset: ParsedDataset, batch_size: usize, batch_id: &str) -> Vec<RowBatch> {
    debug_assert!(batch_size > 0);

    let total_rows = dataset.rows.len();
    let total_batches = (total_rows + batch_size - 1) / batch_size;

    let mut batches = Vec::with_capacity(total_batches);
    let mut remaining = dataset.rows.into_iter();

    for number in 1..=total_batches {
        let rows: Vec<_> = remaining.by_ref().take(batch_size).collect();
        batches.push(RowBatch {
            batch_id: batch_id.to_string(),
            batch_number: number as u32,
            total_batches: total_batches as u32,
            is_final: number == total_batches,
            rows,
        });
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::RowRecord;
    use std::sync::Arc;

    fn dataset(n: usize) -> ParsedDataset {
        let labels = Arc::new(vec!["ID".to_string()]);
        let rows = (0..n)
            .map(|i| RowRecord::new(labels.clone(), vec![format!("T-{}", i)]))
            .collect();
        ParsedDataset { labels, rows }
    }

    #[test]
    fn test_round_trip_row_count() {
        let batches = chunk_rows(dataset(1_250), 500, "sub_test");
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].rows.len(), 500);
        assert_eq!(batches[1].rows.len(), 500);
        assert_eq!(batches[2].rows.len(), 250);
        assert_eq!(batches.iter().map(|b| b.rows.len()).sum::<usize>(), 1_250);
        assert!(batches.iter().all(|b| b.total_batches == 3));
    }

    #[test]
    fn test_batch_numbers_and_final_marker() {
        let batches = chunk_rows(dataset(1_250), 500, "sub_test");
        let numbers: Vec<u32> = batches.iter().map(|b| b.batch_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(batches.iter().filter(|b| b.is_final).count(), 1);
        assert!(batches.last().unwrap().is_final);
    }

    #[test]
    fn test_concatenation_preserves_row_order() {
        let original = dataset(7);
        let expected = original.rows.clone();
        let batches = chunk_rows(original, 3, "sub_test");

        let rejoined: Vec<_> = batches.into_iter().flat_map(|b| b.rows).collect();
        assert_eq!(rejoined, expected);
    }

    #[test]
    fn test_single_batch_when_rows_fit() {
        let batches = chunk_rows(dataset(10), 500, "sub_test");
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_final);
        assert_eq!(batches[0].batch_number, 1);
        assert_eq!(batches[0].total_batches, 1);
    }

    #[test]
    fn test_exact_multiple_of_batch_size() {
        let batches = chunk_rows(dataset(1_000), 500, "sub_test");
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].rows.len(), 500);
    }

    #[test]
    fn test_batch_ids_are_distinct_across_submissions() {
        assert_ne!(new_batch_id(), new_batch_id());
        assert!(new_batch_id().starts_with("sub_"));
    }
}
