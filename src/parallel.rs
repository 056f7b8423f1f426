use log::debug;

use crate::{
    actions::PackedActions,
    align::{AlignmentStats, BoundaryMode, GotohAligner, Penalties},
    error::ParallelError,
    Result,
};

/// One alignment request with borrowed sequences
///
/// The read window is `read[read_start..read_end]`. `template_end` is only read when
/// the end is fixed; otherwise it equals `template_start`.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentTask<'a> {
    pub read: &'a [u8],
    pub read_start: usize,
    pub read_end: usize,
    pub template: &'a [u8],
    pub template_start: i32,
    pub template_end: i32,
    pub max_score: i32,
    pub max_shift: usize,
    pub mode: BoundaryMode,
}

impl<'a> AlignmentTask<'a> {
    /// Both ends free around `expected_start`, aligning `read[..rlen]`
    #[must_use]
    pub fn free(
        read: &'a [u8],
        rlen: usize,
        template: &'a [u8],
        expected_start: i32,
        max_score: i32,
        max_shift: usize,
    ) -> Self {
        Self {
            read,
            read_start: 0,
            read_end: rlen,
            template,
            template_start: expected_start,
            template_end: expected_start,
            max_score,
            max_shift,
            mode: BoundaryMode::FREE,
        }
    }

    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn fixed_start(
        read: &'a [u8],
        read_start: usize,
        read_end: usize,
        template: &'a [u8],
        template_start: i32,
        max_score: i32,
        max_shift: usize,
    ) -> Self {
        Self {
            read,
            read_start,
            read_end,
            template,
            template_start,
            template_end: template_start,
            max_score,
            max_shift,
            mode: BoundaryMode::FIXED_START,
        }
    }

    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn fixed_end(
        read: &'a [u8],
        read_start: usize,
        read_end: usize,
        template: &'a [u8],
        expected_start: i32,
        template_end: i32,
        max_score: i32,
        max_shift: usize,
    ) -> Self {
        Self {
            read,
            read_start,
            read_end,
            template,
            template_start: expected_start,
            template_end,
            max_score,
            max_shift,
            mode: BoundaryMode::FIXED_END,
        }
    }

    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn fixed_both(
        read: &'a [u8],
        read_start: usize,
        read_end: usize,
        template: &'a [u8],
        template_start: i32,
        template_end: i32,
        max_score: i32,
        max_shift: usize,
    ) -> Self {
        Self {
            read,
            read_start,
            read_end,
            template,
            template_start,
            template_end,
            max_score,
            max_shift,
            mode: BoundaryMode::FIXED_BOTH,
        }
    }
}

/// Aligns a batch of tasks across worker threads
///
/// The tasks are split into contiguous chunks, one per thread, and each worker owns its
/// own [`GotohAligner`]. Results come back in task order.
///
/// # Arguments
///
/// * `penalties` - The cost model shared by every worker
/// * `stop_when_template_runs_out` - Passed to each worker's aligner
/// * `tasks` - The alignments to run
/// * `num_threads` - The number of threads to spawn (0 uses every CPU)
///
/// # Returns
///
/// * `Ok((results, stats))` - One action array per task and the merged traceback statistics
/// * `Err(Error)` - If a worker thread panicked
pub fn align_parallel(
    penalties: Penalties,
    stop_when_template_runs_out: bool,
    tasks: &[AlignmentTask<'_>],
    num_threads: usize,
) -> Result<(Vec<PackedActions>, AlignmentStats)> {
    // Calculate the number of threads to use
    let num_threads = if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads.min(num_cpus::get())
    };

    let mut stats = AlignmentStats::new();
    if tasks.is_empty() {
        return Ok((Vec::new(), stats));
    }
    let tasks_per_thread = tasks.len().div_ceil(num_threads);
    debug!(
        "Aligning {} tasks on {} threads ({} per thread)",
        tasks.len(),
        num_threads,
        tasks_per_thread
    );

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        // Build thread handles
        let handles: Vec<_> = tasks
            .chunks(tasks_per_thread)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut aligner = GotohAligner::new(penalties, stop_when_template_runs_out);
                    let results: Vec<_> = chunk
                        .iter()
                        .map(|task| aligner.align_task(task).copy())
                        .collect();
                    (results, aligner.stats().clone())
                })
            })
            .collect();

        // Join every worker before inspecting any outcome
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    let mut results = Vec::with_capacity(tasks.len());
    for (tid, outcome) in outcomes.into_iter().enumerate() {
        let (chunk_results, chunk_stats) = outcome.map_err(|_| ParallelError::WorkerPanicked(tid))?;
        results.extend(chunk_results);
        stats.merge(&chunk_stats);
    }
    Ok((results, stats))
}
