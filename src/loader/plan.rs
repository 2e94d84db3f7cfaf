//! Partitioning of the discovered file list into batches and worker chunks.

use std::ops::Range;

/// One batch of files and the chunks it is split into for the workers.
///
/// All ranges index into the discovered file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Zero-based batch number
    pub index: usize,
    /// Files covered by this batch
    pub files: Range<usize>,
    /// Consecutive, non-empty sub-ranges of `files`, one per worker task
    pub chunks: Vec<Range<usize>>,
}

impl BatchPlan {
    /// Number of files in the batch.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Split `total_files` into batches of `batch_size`, then split every batch
/// into chunks of `ceil(batch_len / num_workers)` files.
///
/// Returns no batches when there are no files. Both sizes must be non-zero.
pub fn plan_batches(total_files: usize, batch_size: usize, num_workers: usize) -> Vec<BatchPlan> {
    debug_assert!(batch_size > 0 && num_workers > 0);

    let mut plans = Vec::with_capacity(total_files.div_ceil(batch_size));
    let mut start = 0;

    while start < total_files {
        let end = (start + batch_size).min(total_files);
        let chunk_size = (end - start).div_ceil(num_workers);

        let chunks = (start..end)
            .step_by(chunk_size)
            .map(|chunk_start| chunk_start..(chunk_start + chunk_size).min(end))
            .collect();

        plans.push(BatchPlan {
            index: plans.len(),
            files: start..end,
            chunks,
        });
        start = end;
    }

    plans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_files() {
        assert!(plan_batches(0, 1000, 8).is_empty());
    }

    #[test]
    fn test_large_run_layout() {
        let plans = plan_batches(2500, 1000, 8);
        assert_eq!(plans.len(), 3);
        assert_eq!(
            plans.iter().map(BatchPlan::file_count).collect::<Vec<_>>(),
            vec![1000, 1000, 500]
        );
        for plan in &plans {
            assert_eq!(plan.chunks.len(), 8);
        }
        assert_eq!(plans[2].files, 2000..2500);
        assert_eq!(plans[2].chunks[0], 2000..2063);
        assert_eq!(plans[2].chunks[7], 2441..2500);
    }

    #[test]
    fn test_chunks_cover_batch_in_order() {
        for (total, batch, workers) in [(17, 5, 3), (9, 9, 4), (3, 10, 8), (100, 7, 2)] {
            let plans = plan_batches(total, batch, workers);
            let flattened: Vec<usize> = plans
                .iter()
                .flat_map(|p| p.chunks.iter().cloned().flatten())
                .collect();
            assert_eq!(flattened, (0..total).collect::<Vec<_>>());

            for plan in &plans {
                assert!(plan.chunks.len() <= workers);
                assert!(plan.chunks.iter().all(|c| !c.is_empty()));
            }
        }
    }

    #[test]
    fn test_fewer_files_than_workers() {
        let plans = plan_batches(3, 1000, 8);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].chunks, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_batch_indices() {
        let plans = plan_batches(25, 10, 4);
        assert_eq!(plans.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(plans[1].chunks, vec![10..13, 13..16, 16..19, 19..20]);
    }
}
