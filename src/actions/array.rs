use super::{iter::ActionIter, Action};

/// Number of bits used by one action code
pub const BITS_PER_ACTION: usize = 4;

/// Number of action codes packed into one `u32` word
pub const ACTIONS_PER_WORD: usize = 8;

/// Number of header fields (template start, score, action count) counted as words
pub const HEADER_WORDS: usize = 3;

/// Score of an alignment that could not be found within the score or band limits
pub const INFEASIBLE_SCORE: i32 = i32::MAX;

const ACTIONS_PER_WORD_SHIFT: usize = 3;
const ACTION_POSITION_MASK: usize = ACTIONS_PER_WORD - 1;
const ACTION_MASK: u32 = (1 << BITS_PER_ACTION) - 1;

/// Bit shift of the nibble holding storage position `pos` within its word
#[inline]
fn nibble_shift(pos: usize) -> u32 {
    (BITS_PER_ACTION * (ACTIONS_PER_WORD - 1 - (pos & ACTION_POSITION_MASK))) as u32
}

/// Scores are summed, but an infeasible operand makes the sum infeasible
#[inline]
fn combine_scores(a: i32, b: i32) -> i32 {
    if a == INFEASIBLE_SCORE || b == INFEASIBLE_SCORE {
        INFEASIBLE_SCORE
    } else {
        a.saturating_add(b)
    }
}

/// A bit-packed alignment path.
///
/// Holds the template start, the score, and a sequence of 4-bit [`Action`] codes
/// stored newest first. See the [module documentation](crate::actions) for the layout.
///
/// The backing words are never exposed mutably; every operator keeps the padding bits
/// beyond [`len`](Self::len) zeroed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedActions {
    template_start: i32,
    score: i32,
    count: usize,
    words: Vec<u32>,
}
impl PackedActions {
    /// Creates an empty array starting at template position 0 with score 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty array with room for `actions` codes
    #[must_use]
    pub fn with_capacity(actions: usize) -> Self {
        Self {
            words: Vec::with_capacity(actions.div_ceil(ACTIONS_PER_WORD)),
            ..Self::default()
        }
    }

    /// Creates the infeasible sentinel: score `i32::MAX`, no actions
    #[must_use]
    pub fn infeasible(template_start: i32) -> Self {
        Self {
            template_start,
            score: INFEASIBLE_SCORE,
            ..Self::default()
        }
    }

    pub(crate) fn from_raw_parts(template_start: i32, score: i32, count: usize, words: Vec<u32>) -> Self {
        debug_assert_eq!(words.len(), count.div_ceil(ACTIONS_PER_WORD));
        Self {
            template_start,
            score,
            count,
            words,
        }
    }

    /// Zero-based template position where the alignment begins
    #[must_use]
    pub fn template_start(&self) -> i32 {
        self.template_start
    }

    pub fn set_template_start(&mut self, start: i32) {
        self.template_start = start;
    }

    /// Alignment score, [`INFEASIBLE_SCORE`] if no alignment was found
    #[must_use]
    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn set_score(&mut self, score: i32) {
        self.score = score;
    }

    /// Number of actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Checks for the infeasible sentinel
    #[must_use]
    pub fn is_infeasible(&self) -> bool {
        self.score == INFEASIBLE_SCORE && self.count == 0
    }

    /// Turns this array into the infeasible sentinel at `template_start`
    pub fn set_infeasible(&mut self, template_start: i32) {
        self.clear();
        self.template_start = template_start;
        self.score = INFEASIBLE_SCORE;
    }

    /// Resets to an empty array at template position 0 with score 0, keeping the allocation
    pub fn clear(&mut self) {
        self.template_start = 0;
        self.score = 0;
        self.count = 0;
        self.words.clear();
    }

    /// Number of words needed to hold the header plus the packed actions
    #[must_use]
    pub fn length_in_words(&self) -> usize {
        HEADER_WORDS + self.count.div_ceil(ACTIONS_PER_WORD)
    }

    /// Returns a copy holding exactly the packed words, without spare capacity
    #[must_use]
    pub fn copy(&self) -> Self {
        let words = self.words[..self.count.div_ceil(ACTIONS_PER_WORD)].to_vec();
        Self::from_raw_parts(self.template_start, self.score, self.count, words)
    }

    pub(crate) fn words(&self) -> &[u32] {
        &self.words
    }

    /// Raw code at storage position `pos` (0 is the newest action)
    #[inline]
    pub(crate) fn code_at(&self, pos: usize) -> u32 {
        (self.words[pos >> ACTIONS_PER_WORD_SHIFT] >> nibble_shift(pos)) & ACTION_MASK
    }

    /// Appends an action chronologically before every stored action
    #[inline]
    pub(crate) fn push_oldest(&mut self, action: Action) {
        let word = self.count >> ACTIONS_PER_WORD_SHIFT;
        if word == self.words.len() {
            self.words.push(0);
        }
        self.words[word] |= u32::from(action.code()) << nibble_shift(self.count);
        self.count += 1;
    }

    /// Iterates actions from the start of the alignment to its end
    #[must_use]
    pub fn iter(&self) -> ActionIter<'_> {
        ActionIter::new(self)
    }

    /// Iterates actions from the end of the alignment back to its start
    pub fn iter_reverse(&self) -> std::iter::Rev<ActionIter<'_>> {
        ActionIter::new(self).rev()
    }

    fn nibble_counts(&self, f: impl Fn(u32) -> u32) -> usize {
        self.words
            .iter()
            .map(|&w| (f(w) & 0x1111_1111).count_ones() as usize)
            .sum()
    }

    /// Number of `Same` actions
    #[must_use]
    pub fn match_count(&self) -> usize {
        // padding nibbles are zero so only real codes contribute to the non-zero count
        self.count - self.nibble_counts(|w| w | (w >> 1) | (w >> 2) | (w >> 3))
    }

    /// Number of `InsertionIntoReference` and `CgOverlapInRead` actions
    #[must_use]
    pub fn deletion_from_read_and_overlap_count(&self) -> usize {
        self.nibble_counts(|w| {
            let v = w & 0x7777_7777;
            v & (v >> 1) & (!v >> 2) & (!v >> 3)
        })
    }

    /// Number of `DeletionFromReference` and `CgGapInRead` actions
    #[must_use]
    pub fn insertion_into_read_and_gap_count(&self) -> usize {
        self.nibble_counts(|w| {
            let v = w & 0x7777_7777;
            (!v >> 3) & (!v >> 2) & (v >> 1) & !v
        })
    }

    /// Net template length change caused by indels
    #[must_use]
    pub fn indel_length(&self) -> isize {
        self.insertion_into_read_and_gap_count() as isize
            - self.deletion_from_read_and_overlap_count() as isize
    }

    /// True if any action uses a code of 8 or above (the CG-specific and unknown codes)
    #[must_use]
    pub fn is_cg(&self) -> bool {
        self.words.iter().any(|&w| w & 0x8888_8888 != 0)
    }

    /// Number of template positions covered by the alignment
    #[must_use]
    pub fn template_length(&self) -> i32 {
        self.iter().map(Action::template_delta).sum()
    }

    /// Number of read positions covered by the alignment
    #[must_use]
    pub fn read_length(&self) -> usize {
        self.iter().filter(|a| a.read_delta() > 0).count()
    }

    /// Zero-based template position one past the end of the alignment
    #[must_use]
    pub fn zero_based_template_end(&self) -> i32 {
        self.template_start + self.template_length()
    }

    /// Splices `prefix` in front of the existing actions.
    ///
    /// The template start becomes the prefix's start and the scores are summed,
    /// becoming infeasible if either side is infeasible.
    ///
    /// The gap penalties are not re-derived at the join. If the prefix ends inside a gap
    /// that the existing actions continue, the combined score charges that gap's open
    /// penalty twice; callers extending a gap across the join must correct the score.
    pub fn prepend(&mut self, prefix: &PackedActions) {
        self.score = combine_scores(self.score, prefix.score);
        for pos in 0..prefix.count {
            self.push_oldest(Action::from_nibble(prefix.code_at(pos)));
        }
        self.template_start = prefix.template_start;
    }

    /// Prepends `count` copies of `action`, charged as a single `score`.
    ///
    /// The template start moves back by `count` unless the action is an insertion
    /// into the reference.
    pub fn prepend_run(&mut self, count: usize, action: Action, score: i32) {
        debug_assert!(count > 0, "illegal prepend {count}");
        self.score = combine_scores(self.score, score);
        for _ in 0..count {
            self.push_oldest(action);
        }
        if action != Action::InsertionIntoReference {
            self.template_start -= count as i32;
        }
    }

    /// Reverses the action order in place. Score and template start are untouched.
    pub fn reverse(&mut self) {
        let actions: Vec<Action> = self.iter().collect();
        self.count = 0;
        self.words.clear();
        for action in actions {
            self.push_oldest(action);
        }
    }

    /// Overwrites actions at one end of the alignment.
    ///
    /// The first `num_noop` overwritten actions (counting inwards from the chosen end)
    /// become `Noop`, the next `num_clip` become `SoftClip`. The template start is not moved.
    pub fn soft_clip(&mut self, from_front: bool, num_clip: usize, num_noop: usize) {
        debug_assert!(num_clip + num_noop <= self.count);
        let total = (num_clip + num_noop).min(self.count);
        let mut position = if from_front { self.count } else { 0 };
        for i in 0..total {
            if from_front {
                position -= 1;
            }
            let action = if i < num_noop {
                Action::Noop
            } else {
                Action::SoftClip
            };
            let shift = nibble_shift(position);
            let word = &mut self.words[position >> ACTIONS_PER_WORD_SHIFT];
            *word = (*word & !(ACTION_MASK << shift)) | (u32::from(action.code()) << shift);
            if !from_front {
                position += 1;
            }
        }
    }
}
