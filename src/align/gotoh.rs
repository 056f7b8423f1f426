use log::{debug, trace};

use super::{
    lattice::{delete_of, diagonal_of, insert_of, min_of, ScoreLattice, LARGE_SCORE, ZERO_SCORE},
    AlignmentStats, Penalties,
};
use crate::{
    actions::{Action, PackedActions},
    parallel::AlignmentTask,
    residue::UNKNOWN_RESIDUE,
};

/// Which ends of the template window are pinned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundaryMode {
    pub fixed_start: bool,
    pub fixed_end: bool,
}

impl BoundaryMode {
    /// Both ends may drift within the band
    pub const FREE: Self = Self {
        fixed_start: false,
        fixed_end: false,
    };
    pub const FIXED_START: Self = Self {
        fixed_start: true,
        fixed_end: false,
    };
    pub const FIXED_END: Self = Self {
        fixed_start: false,
        fixed_end: true,
    };
    pub const FIXED_BOTH: Self = Self {
        fixed_start: true,
        fixed_end: true,
    };
}

/// Residue at a possibly out-of-range position
#[inline]
fn residue_at(sequence: &[u8], pos: i64) -> Option<u8> {
    usize::try_from(pos)
        .ok()
        .and_then(|pos| sequence.get(pos).copied())
}

/// True if neither residue is unknown and they are equal
#[inline]
fn is_same(a: u8, b: u8) -> bool {
    a != UNKNOWN_RESIDUE && b != UNKNOWN_RESIDUE && a == b
}

/// Geometry of one alignment within the lattice.
///
/// Column `c` of the lattice corresponds to template position
/// `c - 1 + zero_start - offset`; row `r` to read position `r - 1 + read_start`.
#[derive(Debug, Clone, Copy)]
struct Frame {
    mode: BoundaryMode,
    read_start: i64,
    zero_start: i64,
    offset: i64,
    max_shift: i64,
    gray: i64,
    rlen: i64,
    b_length: i64,
}

/// Cell where the traceback begins
#[derive(Debug, Clone, Copy)]
struct Terminal {
    score: i32,
    read_pos: i64,
    template_pos: i64,
}

impl Terminal {
    fn evaluate(&mut self, score: i32, read_pos: i64, template_pos: i64, closer: bool) {
        if score < self.score || (score == self.score && closer) {
            self.score = score;
            self.read_pos = read_pos;
            self.template_pos = template_pos;
        }
    }
}

/// How the forward sweep ended
#[derive(Debug, Clone, Copy)]
struct Sweep {
    /// Last column evaluated
    last_column: i64,
    /// Rightmost column worth scanning for the free end
    termination_column: i64,
    /// The template ran out before the band did
    template_exhausted: bool,
}

/// Banded Needleman-Wunsch aligner with Gotoh's affine gap recurrences.
///
/// Three scores are tracked per cell: the best alignment ending in an insert (arriving
/// from the left), in a diagonal step, and in a delete (arriving from above). Only cells
/// within `max_shift` plus a gray margin of the expected diagonal are evaluated.
///
/// The lattice and the returned action array are owned by the aligner and reused across
/// calls, so one aligner is needed per thread. Results borrow the internal workspace;
/// [`copy`](PackedActions::copy) them to keep them past the next call.
#[derive(Debug, Clone)]
pub struct GotohAligner {
    penalties: Penalties,
    stop_when_template_runs_out: bool,
    supports_early_termination: bool,
    lattice: ScoreLattice,
    workspace: PackedActions,
    stats: AlignmentStats,
}

impl GotohAligner {
    /// Creates an aligner.
    ///
    /// # Arguments
    ///
    /// * `penalties` - The affine-gap cost model
    /// * `stop_when_template_runs_out` - Stop the sweep (and the traceback) at the template
    ///   edge instead of aligning against unknown residues beyond it
    #[must_use]
    pub fn new(penalties: Penalties, stop_when_template_runs_out: bool) -> Self {
        Self {
            penalties,
            stop_when_template_runs_out,
            supports_early_termination: penalties.supports_early_termination(),
            lattice: ScoreLattice::new(),
            workspace: PackedActions::new(),
            stats: AlignmentStats::new(),
        }
    }

    #[must_use]
    pub fn penalties(&self) -> Penalties {
        self.penalties
    }

    /// True if columns whose best score exceeds `max_score` end the sweep early
    #[must_use]
    pub fn supports_early_termination(&self) -> bool {
        self.supports_early_termination
    }

    /// Traceback statistics accumulated over every call so far
    #[must_use]
    pub fn stats(&self) -> &AlignmentStats {
        &self.stats
    }

    /// Logs the lattice footprint and the traceback offset histogram at debug level
    pub fn log_stats(&self) {
        debug!(
            "Gotoh lattice maxbytes={}, currsize={}x{}",
            self.lattice.capacity_bytes(),
            self.lattice.rows(),
            self.lattice.cols()
        );
        debug!("{}", self.stats);
    }

    /// Aligns `read[..rlen]` with both ends free to move around `zero_based_start`
    pub fn align(
        &mut self,
        read: &[u8],
        rlen: usize,
        template: &[u8],
        zero_based_start: i32,
        max_score: i32,
        max_shift: usize,
    ) -> &PackedActions {
        self.calculate(
            BoundaryMode::FREE,
            read,
            0,
            rlen,
            template,
            zero_based_start,
            zero_based_start,
            max_score,
            max_shift,
        )
    }

    /// Aligns `read[read_start..read_end]` starting exactly at `template_start`
    #[allow(clippy::too_many_arguments)]
    pub fn align_fixed_start(
        &mut self,
        read: &[u8],
        read_start: usize,
        read_end: usize,
        template: &[u8],
        template_start: i32,
        max_score: i32,
        max_shift: usize,
    ) -> &PackedActions {
        self.calculate(
            BoundaryMode::FIXED_START,
            read,
            read_start,
            read_end,
            template,
            template_start,
            template_start,
            max_score,
            max_shift,
        )
    }

    /// Aligns `read[read_start..read_end]` ending exactly at `template_end` (exclusive),
    /// with the start free to move around `expected_start`
    #[allow(clippy::too_many_arguments)]
    pub fn align_fixed_end(
        &mut self,
        read: &[u8],
        read_start: usize,
        read_end: usize,
        template: &[u8],
        expected_start: i32,
        template_end: i32,
        max_score: i32,
        max_shift: usize,
    ) -> &PackedActions {
        self.calculate(
            BoundaryMode::FIXED_END,
            read,
            read_start,
            read_end,
            template,
            expected_start,
            template_end,
            max_score,
            max_shift,
        )
    }

    /// Aligns `read[read_start..read_end]` to exactly `template[template_start..template_end]`
    #[allow(clippy::too_many_arguments)]
    pub fn align_fixed_both(
        &mut self,
        read: &[u8],
        read_start: usize,
        read_end: usize,
        template: &[u8],
        template_start: i32,
        template_end: i32,
        max_score: i32,
        max_shift: usize,
    ) -> &PackedActions {
        self.calculate(
            BoundaryMode::FIXED_BOTH,
            read,
            read_start,
            read_end,
            template,
            template_start,
            template_end,
            max_score,
            max_shift,
        )
    }

    /// Runs the alignment described by a task
    pub fn align_task(&mut self, task: &AlignmentTask<'_>) -> &PackedActions {
        self.calculate(
            task.mode,
            task.read,
            task.read_start,
            task.read_end,
            task.template,
            task.template_start,
            task.template_end,
            task.max_score,
            task.max_shift,
        )
    }

    /// Aligns `read[read_start..read_end]` against the template under a boundary mode.
    ///
    /// `template_end` is only read when the end is fixed and must equal `template_start`
    /// otherwise. The result is the infeasible sentinel (positioned at `template_start`)
    /// when the best score exceeds `max_score`, when the lattice would be too large, or
    /// when the traceback leaves the band.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate(
        &mut self,
        mode: BoundaryMode,
        read: &[u8],
        read_start: usize,
        read_end: usize,
        template: &[u8],
        template_start: i32,
        template_end: i32,
        max_score: i32,
        max_shift: usize,
    ) -> &PackedActions {
        debug_assert!(mode.fixed_end || template_end == template_start);
        // clamped so the band arithmetic below cannot overflow; oversized lattices fail later
        let rlen = i64::try_from(read_end.saturating_sub(read_start))
            .unwrap_or(i64::MAX)
            .min(i64::from(i32::MAX));
        let tlen = i64::from(template_end) - i64::from(template_start);
        let max_shift = i64::try_from(max_shift)
            .unwrap_or(i64::MAX)
            .min(i64::from(i32::MAX));
        let gray = max_shift / 2 + 1;
        if tlen < 0 {
            return self.fail(template_start);
        }

        let mut b_length = rlen.max(tlen);
        let offset;
        if mode.fixed_start {
            offset = 0;
            if !mode.fixed_end {
                b_length += max_shift + gray;
            } else if (tlen - rlen).abs() > max_shift {
                return self.fail(template_start);
            }
        } else {
            // truncation of the float product is part of the band geometry
            offset = if rlen == 0 {
                0
            } else {
                ((rlen as f64 * 0.7) as i64).min(max_shift + gray)
            };
            b_length += if mode.fixed_end { offset } else { 2 * offset };
        }

        let dpm_size = i128::from(1 + rlen) * i128::from(1 + b_length);
        if dpm_size < 1 || dpm_size > i128::from(i32::MAX) {
            debug!(
                "Can not create DPM for parameters rlen={} bLength={} dpmLength={}",
                rlen + 1,
                b_length + 1,
                dpm_size
            );
            return self.fail(template_start);
        }

        let frame = Frame {
            mode,
            read_start: read_start as i64,
            zero_start: i64::from(template_start),
            offset,
            max_shift,
            gray,
            rlen,
            b_length,
        };
        self.init_matrices(&frame);
        let sweep = self.sweep(&frame, read, template, max_score);

        let terminal = if mode.fixed_end {
            self.fixed_terminal(&frame, tlen)
        } else {
            let mut terminal = self.find_best_read_end(&frame, sweep.termination_column);
            if sweep.template_exhausted {
                self.find_best_template_end(&frame, sweep.last_column, &mut terminal);
            }
            terminal
        };

        let mut score = terminal.score - ZERO_SCORE;
        if score > max_score || !self.traceback(&frame, read, template, terminal, &mut score) {
            return self.fail(template_start);
        }
        self.workspace.set_score(score);
        &self.workspace
    }

    fn fail(&mut self, template_start: i32) -> &PackedActions {
        self.workspace.set_infeasible(template_start);
        &self.workspace
    }

    /// Sizes the lattice and seeds row 0 and column 0
    fn init_matrices(&mut self, frame: &Frame) {
        let open = self.penalties.gap_open;
        let extend = self.penalties.gap_extend;
        let rows = (frame.rlen + 1) as usize;
        let cols = (frame.b_length + 1) as usize;
        self.lattice.resize(rows, cols);

        let start_score = if frame.mode.fixed_start {
            LARGE_SCORE
        } else {
            ZERO_SCORE
        };
        // +2 covers column 0 and the fence beyond the band
        let top_row_end = ((frame.offset + frame.max_shift + frame.gray + 2) as usize).min(cols);
        for col in 0..top_row_end {
            self.lattice
                .set(col, 0, start_score, start_score, start_score + open);
        }
        if frame.mode.fixed_start {
            let origin = frame.offset as usize;
            self.lattice
                .set(origin, 0, ZERO_SCORE + open, ZERO_SCORE, ZERO_SCORE + open);
            for col in origin + 1..cols {
                let insert = self.lattice.insert(col - 1, 0) + extend;
                self.lattice.set_insert(col, 0, insert);
            }
        }

        let insert = self.lattice.insert(0, 0);
        let mut delete = self.lattice.delete(0, 0);
        self.lattice.set_insert(0, 0, insert + open + extend);
        // one row past the band so the first column never reads an unset cell
        let column_end = rows.min((frame.max_shift + 2 * frame.gray + 1) as usize);
        for row in 1..column_end {
            delete += extend;
            self.lattice.set(0, row, LARGE_SCORE, LARGE_SCORE, delete);
        }
    }

    /// Fills the band column by column
    fn sweep(&mut self, frame: &Frame, read: &[u8], template: &[u8], max_score: i32) -> Sweep {
        let open = self.penalties.gap_open;
        let extend = self.penalties.gap_extend;
        let reach = frame.max_shift + frame.gray;

        let mut template_exhausted = false;
        let mut termination_column = i64::MAX;
        let mut ref_pos = 1;
        while ref_pos <= frame.b_length {
            let origin = ref_pos - frame.offset;
            let template_residue = residue_at(template, origin - 1 + frame.zero_start);
            if template_residue.is_none()
                && self.stop_when_template_runs_out
                && !frame.mode.fixed_end
            {
                template_exhausted = true;
                termination_column = ref_pos - 1;
                break;
            }
            let tb = template_residue.unwrap_or(UNKNOWN_RESIDUE);
            let col = ref_pos as usize;

            let min_read = (origin - reach).max(1);
            if min_read > 1 && min_read <= frame.rlen {
                self.lattice.set(
                    col,
                    (min_read - 1) as usize,
                    LARGE_SCORE,
                    LARGE_SCORE,
                    LARGE_SCORE,
                );
            }
            let max_read = (origin + reach).min(frame.rlen);
            if max_read >= 0 && max_read < frame.rlen {
                self.lattice.set(
                    col,
                    (max_read + 1) as usize,
                    LARGE_SCORE,
                    LARGE_SCORE,
                    LARGE_SCORE,
                );
            }

            let mut column_min = i32::MAX;
            for read_pos in min_read..=max_read {
                let row = read_pos as usize;
                let rb = residue_at(read, frame.read_start + read_pos - 1).unwrap_or(UNKNOWN_RESIDUE);
                let diagonal_cost = self.penalties.diagonal_cost(rb, tb);

                let left = self.lattice.cell(col - 1, row);
                let upper_left = self.lattice.cell(col - 1, row - 1);
                let above = self.lattice.cell(col, row - 1);

                let insert = extend
                    + insert_of(left)
                        .min(diagonal_of(left) + open)
                        .min(delete_of(left) + open);
                let diagonal = diagonal_cost + min_of(upper_left);
                let delete = extend
                    + (insert_of(above) + open)
                        .min(diagonal_of(above) + open)
                        .min(delete_of(above));
                self.lattice.set(col, row, insert, diagonal, delete);

                if self.supports_early_termination {
                    column_min = column_min.min(insert.min(diagonal).min(delete));
                }
            }

            if self.supports_early_termination
                && column_min - ZERO_SCORE > max_score
                && !frame.mode.fixed_end
            {
                termination_column = ref_pos;
                break;
            }
            ref_pos += 1;
        }

        Sweep {
            last_column: ref_pos - 1,
            termination_column,
            template_exhausted,
        }
    }

    /// Reads the terminal cell at the pinned template end
    fn fixed_terminal(&self, frame: &Frame, tlen: i64) -> Terminal {
        let read_pos = frame.rlen;
        let template_pos = tlen + frame.offset;
        let (col, row) = (template_pos as usize, read_pos as usize);
        let score = if template_pos == 0 && read_pos == 0 {
            self.lattice.diagonal(0, 0)
        } else if template_pos == 0 {
            // column 0 is only reachable from above
            self.lattice.delete(col, row)
        } else if read_pos == 0 {
            // row 0 is only reachable from the left
            self.lattice.insert(col, row)
        } else {
            min_of(self.lattice.cell(col, row))
        };
        Terminal {
            score,
            read_pos,
            template_pos,
        }
    }

    /// Scans the last row for the lowest score, ties going to the column nearest the diagonal
    fn find_best_read_end(&self, frame: &Frame, termination_column: i64) -> Terminal {
        let reach = frame.max_shift + frame.gray;
        let diagonal_end = frame.offset + frame.rlen;
        let row = frame.rlen as usize;
        let mut best = Terminal {
            score: i32::MAX / 2,
            read_pos: frame.rlen,
            template_pos: i64::from(i32::MAX / 2),
        };

        let mut i = frame
            .b_length
            .min(diagonal_end + reach)
            .min(termination_column);
        while i >= diagonal_end - reach && i >= 0 {
            let cell = self.lattice.cell(i as usize, row);
            let closer = (best.template_pos - diagonal_end).abs() > (i - diagonal_end).abs();
            if diagonal_of(cell) == LARGE_SCORE {
                if i == 0 {
                    best.evaluate(delete_of(cell), frame.rlen, i, closer);
                }
                break;
            }
            best.evaluate(diagonal_of(cell), frame.rlen, i, closer);
            best.evaluate(delete_of(cell), frame.rlen, i, closer);
            best.evaluate(insert_of(cell), frame.rlen, i, closer);
            i -= 1;
        }
        best
    }

    /// Scans the last evaluated column when the template ran out before the read did
    fn find_best_template_end(&self, frame: &Frame, column: i64, best: &mut Terminal) {
        let diagonal_end = frame.offset + frame.rlen;
        let col = column as usize;
        let mut i = frame.rlen.min(diagonal_end + frame.max_shift + frame.gray);
        while i >= 0 {
            let cell = self.lattice.cell(col, i as usize);
            let closer = (best.read_pos - diagonal_end).abs() > (i - diagonal_end).abs();
            if diagonal_of(cell) == LARGE_SCORE {
                if i == 0 {
                    best.evaluate(insert_of(cell), i, column, closer);
                }
                break;
            }
            best.evaluate(diagonal_of(cell), i, column, closer);
            best.evaluate(delete_of(cell), i, column, closer);
            best.evaluate(insert_of(cell), i, column, closer);
            i -= 1;
        }
    }

    /// Walks back from the terminal cell, writing actions newest first.
    ///
    /// Returns false if the path drifts more than `max_shift` from the diagonal or
    /// runs off the start of the read. `score` is corrected when the walk stops at the
    /// template edge.
    fn traceback(
        &mut self,
        frame: &Frame,
        read: &[u8],
        template: &[u8],
        terminal: Terminal,
        score: &mut i32,
    ) -> bool {
        let open = self.penalties.gap_open;
        let extend = self.penalties.gap_extend;
        self.workspace.clear();

        let mut read_pos = terminal.read_pos;
        let mut ref_pos = terminal.template_pos;
        let costs = |lattice: &ScoreLattice, col: i64, row: i64| {
            let cell = lattice.cell(col as usize, row as usize);
            (diagonal_of(cell), delete_of(cell), insert_of(cell))
        };
        let (mut diag_cost, mut del_cost, mut ins_cost) = costs(&self.lattice, ref_pos, read_pos);
        let mut min_cost = diag_cost.min(del_cost).min(ins_cost);

        // Set while inside a gap run whose opening penalty has not been reached yet
        let mut must_indel: Option<Action> = None;
        let mut max_offset = 0;
        let mut valid = true;

        while read_pos > 0 || (frame.mode.fixed_start && ref_pos != frame.offset) {
            let real_ref = ref_pos - 1 + frame.zero_start - frame.offset;
            if self.stop_when_template_runs_out && real_ref < 0 {
                // the unaligned prefix off the template is not charged
                *score += ZERO_SCORE - min_of(self.lattice.cell(ref_pos as usize, read_pos as usize));
                break;
            }

            let action;
            if min_cost == diag_cost && ref_pos > 0 && must_indel.is_none() {
                let real_read = read_pos - 1 + frame.read_start;
                if real_read < 0 || read_pos == 0 {
                    return false;
                }
                action = match (residue_at(template, real_ref), residue_at(read, real_read)) {
                    (Some(t), Some(r)) if is_same(r, t) => Action::Same,
                    _ => Action::Mismatch,
                };
                read_pos -= 1;
                ref_pos -= 1;
                (diag_cost, del_cost, ins_cost) = costs(&self.lattice, ref_pos, read_pos);
                min_cost = diag_cost.min(del_cost).min(ins_cost);
            } else if (must_indel == Some(Action::DeletionFromReference)
                || (min_cost == ins_cost && must_indel != Some(Action::InsertionIntoReference)))
                && ref_pos > 0
            {
                action = Action::DeletionFromReference;
                ref_pos -= 1;
                let previous = min_cost;
                (diag_cost, del_cost, ins_cost) = costs(&self.lattice, ref_pos, read_pos);
                min_cost = diag_cost.min(del_cost).min(ins_cost);
                if previous == min_cost + open + extend {
                    must_indel = None;
                } else {
                    must_indel = Some(action);
                    min_cost = ins_cost;
                }
            } else {
                if read_pos == 0 {
                    return false;
                }
                action = Action::InsertionIntoReference;
                read_pos -= 1;
                let previous = min_cost;
                (diag_cost, del_cost, ins_cost) = costs(&self.lattice, ref_pos, read_pos);
                min_cost = diag_cost.min(del_cost).min(ins_cost);
                if previous == min_cost + open + extend {
                    must_indel = None;
                } else {
                    must_indel = Some(action);
                    min_cost = del_cost;
                }
            }
            self.workspace.push_oldest(action);

            let this_offset = (read_pos + frame.offset - ref_pos).abs();
            if this_offset > frame.max_shift {
                trace!(
                    "Traceback offset {this_offset} exceeds max shift {} at read position {read_pos}",
                    frame.max_shift
                );
                valid = false;
                break;
            }
            max_offset = max_offset.max(this_offset);
        }

        if valid {
            self.stats.record_offset(max_offset as usize);
        } else {
            self.stats.record_offset_too_big();
        }
        self.workspace
            .set_template_start((ref_pos + frame.zero_start - frame.offset) as i32);
        valid
    }
}
