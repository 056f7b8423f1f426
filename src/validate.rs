use log::trace;

use crate::{
    actions::{Action, PackedActions, INFEASIBLE_SCORE},
    align::Penalties,
    residue::{reverse_complement, window_string, UNKNOWN_RESIDUE},
};

/// Residue at a possibly out-of-range position, unknown when outside the sequence
fn residue_or_unknown(sequence: &[u8], pos: i64) -> u8 {
    usize::try_from(pos)
        .ok()
        .and_then(|pos| sequence.get(pos).copied())
        .unwrap_or(UNKNOWN_RESIDUE)
}

/// Independently replays an action array against its read and template.
///
/// A replay checks that every match really matches, every mismatch really differs,
/// the actions consume exactly the read, and the recomputed affine-gap score equals the
/// claimed one. The reason for the last failure is kept for [`error_details`](Self::error_details).
#[derive(Debug, Clone)]
pub struct ActionsValidator {
    penalties: Penalties,
    error: Option<String>,
}

impl ActionsValidator {
    #[must_use]
    pub fn new(penalties: Penalties) -> Self {
        Self {
            penalties,
            error: None,
        }
    }

    /// Reason the last validation failed, `None` after a success
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn reject(&mut self, message: String) -> bool {
        trace!("Rejected actions: {message}");
        self.error = Some(message);
        false
    }

    /// Checks that `actions` is a valid alignment of `read[..rlen]` to `template`.
    ///
    /// The infeasible sentinel is always valid. An array claiming [`INFEASIBLE_SCORE`]
    /// with actions is valid only if their real score exceeds `max_score`.
    pub fn is_valid(
        &mut self,
        actions: &PackedActions,
        read: &[u8],
        rlen: usize,
        template: &[u8],
        max_score: i32,
    ) -> bool {
        let claimed = actions.score();
        if claimed == INFEASIBLE_SCORE && actions.is_empty() {
            self.error = None;
            return true;
        }

        let rlen = rlen as i64;
        let mut rpos: i64 = 0;
        let mut tpos = i64::from(actions.template_start());
        let mut score: i64 = 0;
        let mut previous: Option<Action> = None;

        for (index, action) in actions.iter().enumerate() {
            let number = index + 1;
            if rpos > rlen {
                return self.reject("too many actions - past end of read".to_string());
            }
            if rpos == rlen && action != Action::DeletionFromReference {
                return self.reject("non-insert action at end of the read".to_string());
            }
            match action {
                Action::Same => {
                    let r = residue_or_unknown(read, rpos);
                    let t = residue_or_unknown(template, tpos);
                    if r != t && r != UNKNOWN_RESIDUE && t != UNKNOWN_RESIDUE {
                        return self.reject(format!(
                            "action {number}: read[{rpos}] ({r}) != template[{tpos}] ({t}) score=0"
                        ));
                    }
                    rpos += 1;
                    tpos += 1;
                }
                Action::InsertionIntoReference => {
                    score += i64::from(self.gap_cost(previous, action));
                    rpos += 1;
                }
                Action::DeletionFromReference => {
                    score += i64::from(self.gap_cost(previous, action));
                    tpos += 1;
                }
                // every other code is replayed as a mismatch
                _ => {
                    let r = residue_or_unknown(read, rpos);
                    let t = residue_or_unknown(template, tpos);
                    let substitution = if r == UNKNOWN_RESIDUE || t == UNKNOWN_RESIDUE {
                        self.penalties.unknown
                    } else {
                        self.penalties.substitution
                    };
                    // an unknown residue never counts as identical, not even to itself
                    if r == t && r != UNKNOWN_RESIDUE {
                        return self.reject(format!(
                            "action {number}: read[{rpos}] ({r}) == template[{tpos}] ({t}) score={substitution}"
                        ));
                    }
                    score += i64::from(substitution);
                    rpos += 1;
                    tpos += 1;
                }
            }
            previous = Some(action);
        }

        if rpos < rlen {
            return self.reject(format!(
                "actions cover only {rpos} residues, but the read has {rlen}"
            ));
        }
        if claimed == INFEASIBLE_SCORE && score <= i64::from(max_score) {
            return self.reject(format!(
                "actual score {score} < max ({max_score}) but score was MAX_VALUE"
            ));
        }
        if claimed != INFEASIBLE_SCORE && score != i64::from(claimed) {
            return self.reject(format!("actual score {score} != claimed score {claimed}"));
        }
        self.error = None;
        true
    }

    /// Validates against the reverse complement of `template`
    pub fn is_valid_rc(
        &mut self,
        actions: &PackedActions,
        read: &[u8],
        rlen: usize,
        template: &[u8],
        max_score: i32,
    ) -> bool {
        let reversed = reverse_complement(template);
        self.is_valid(actions, read, rlen, &reversed, max_score)
    }

    /// Opening is charged unless the previous action continues the same gap
    fn gap_cost(&self, previous: Option<Action>, action: Action) -> i32 {
        if previous == Some(action) {
            self.penalties.gap_extend
        } else {
            self.penalties.gap_open + self.penalties.gap_extend
        }
    }

    /// Multi-line report of the last failure with the read and template laid out
    /// under a position ruler starting at `expected_start`
    #[must_use]
    pub fn error_details(
        &self,
        actions: &PackedActions,
        read: &[u8],
        rlen: usize,
        template: &[u8],
        expected_start: i32,
    ) -> String {
        let mut details = format!(
            "ValidatingEditDistance action problem: {}\n",
            self.error.as_deref().unwrap_or_default()
        );
        let real_start = actions.template_start();
        let start = i64::from(expected_start);
        if real_start < expected_start {
            let lead = (expected_start - real_start) as usize;
            details.push_str(&format!(
                " tmpl[{real_start}..]: {}\n",
                window_string(template, i64::from(real_start), lead)
            ));
        }
        details.push_str(&format!("{expected_start:>10}|"));
        for i in 1..10 {
            details.push_str(&format!("{:>9}|", (start + 10 * i) % 1000));
        }
        details.push('\n');
        details.push_str(&format!(" tmpl:    {}\n", window_string(template, start, rlen)));
        details.push_str(&format!(" read:    {}\n", window_string(read, 0, rlen)));
        details.push_str(&format!(" actions: {actions} score={}", actions.score()));
        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{align::GotohAligner, residue::encode};
    use anyhow::Result;

    fn validator() -> ActionsValidator {
        ActionsValidator::new(Penalties::new(1, 1, 1, 0))
    }

    #[test]
    fn test_infeasible_is_valid() {
        let mut av = validator();
        assert!(av.is_valid(&PackedActions::infeasible(0), &[], 0, &[], 0));
        assert!(av.error_message().is_none());
    }

    #[test]
    fn test_same_fail() -> Result<()> {
        let mut av = validator();
        let read = encode(b"aaaa")?;
        let template = encode(b"aata")?;
        let actions = PackedActions::build("====", 0, 0)?;
        assert!(!av.is_valid(&actions, &read, read.len(), &template, i32::MAX));

        let details = av.error_details(&actions, &read, read.len(), &template, 0);
        for expected in [
            "ValidatingEditDistance action problem: action 3: read[2] (1) != template[2] (4) score=0",
            "0|       10|       20|       30|       40|       50|       60|       70|       80|       90|",
            "tmpl:    AATA",
            "read:    AAAA",
            "actions: ==== score=0",
        ] {
            assert!(details.contains(expected), "{details}");
        }

        let details = av.error_details(&actions, &read, read.len(), &template, 1);
        for expected in [
            "tmpl[0..]: A",
            "tmpl:    ATAN",
            "read:    AAAA",
            "actions: ==== score=0",
        ] {
            assert!(details.contains(expected), "{details}");
        }
        Ok(())
    }

    #[test]
    fn test_end_insert() -> Result<()> {
        let mut av = validator();
        let read = encode(b"aaaa")?;
        let template = encode(b"aata")?;
        let actions = PackedActions::build("====", 0, 0)?;
        assert!(!av.is_valid(&actions, &read, 0, &template, i32::MAX));
        assert_eq!(
            av.error_message(),
            Some("non-insert action at end of the read")
        );
        Ok(())
    }

    #[test]
    fn test_failure_messages() -> Result<()> {
        let read = encode(b"aaaa")?;
        let template = encode(b"aaaa")?;
        let cases = [
            (
                "==X=",
                0,
                i32::MAX,
                "action 3: read[2] (1) == template[2] (1) score=1",
            ),
            (
                "===",
                0,
                i32::MAX,
                "actions cover only 3 residues, but the read has 4",
            ),
            (
                "====",
                i32::MAX,
                63,
                "actual score 0 < max (63) but score was MAX_VALUE",
            ),
            ("====", 5, 63, "actual score 0 != claimed score 5"),
            (
                "=====",
                0,
                i32::MAX,
                "non-insert action at end of the read",
            ),
        ];
        for (display, score, max_score, message) in cases {
            let mut av = validator();
            let actions = PackedActions::build(display, 0, score)?;
            assert!(!av.is_valid(&actions, &read, read.len(), &template, max_score));
            let details = av.error_details(&actions, &read, read.len(), &template, 0);
            assert!(
                details.starts_with(&format!("ValidatingEditDistance action problem: {message}\n")),
                "{details}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_claimed_score_pass() -> Result<()> {
        let mut av = validator();
        let read = encode(b"aaaa")?;
        let template = encode(b"aaaa")?;
        assert!(av.is_valid(&PackedActions::build("====", 0, 0)?, &read, read.len(), &template, 63));

        let mut av = ActionsValidator::new(Penalties::new(1, 1, 1, 2));
        let template = encode(b"agNa")?;
        let actions = PackedActions::build("=XX=", 0, 3)?;
        assert!(av.is_valid(&actions, &read, read.len(), &template, 63));
        Ok(())
    }

    #[test]
    fn test_unknown_against_unknown() -> Result<()> {
        let mut av = ActionsValidator::new(Penalties::new(1, 1, 1, 1));
        let read = encode(b"angt")?;
        let actions = PackedActions::build("=X==", 0, 1)?;
        assert!(av.is_valid(&actions, &read, read.len(), &read, 63), "{:?}", av.error_message());
        assert!(!av.is_valid(&PackedActions::build("=X==", 0, 0)?, &read, read.len(), &read, 63));
        assert_eq!(av.error_message(), Some("actual score 1 != claimed score 0"));

        // the aligner charges the same pair as a mismatch
        let mut aligner = GotohAligner::new(Penalties::new(1, 1, 1, 1), false);
        let aligned = aligner.align(&read, read.len(), &read, 0, i32::MAX, 7);
        assert_eq!(aligned.to_string(), "=X==");
        assert!(av.is_valid(aligned, &read, read.len(), &read, 63));
        Ok(())
    }

    #[test]
    fn test_gap_runs() -> Result<()> {
        let mut av = ActionsValidator::new(Penalties::new(2, 1, 1, 0));
        let read = encode(b"acgt")?;
        let template = encode(b"acccgt")?;
        // one run of two deletions: open once, extend twice
        let actions = PackedActions::build("==DD==", 0, 4)?;
        assert!(av.is_valid(&actions, &read, read.len(), &template, i32::MAX));
        // two separate gaps are each opened
        let template = encode(b"aaccgt")?;
        let actions = PackedActions::build("=D=D==", 0, 6)?;
        assert!(av.is_valid(&actions, &read, read.len(), &template, i32::MAX));
        let actions = PackedActions::build("=D=D==", 0, 4)?;
        assert!(!av.is_valid(&actions, &read, read.len(), &template, i32::MAX));
        assert_eq!(av.error_message(), Some("actual score 6 != claimed score 4"));
        Ok(())
    }

    /// Rejects every one-step perturbation of a valid alignment
    fn assert_perturbations_rejected<F>(actions: &PackedActions, mut valid: F)
    where
        F: FnMut(&PackedActions) -> bool,
    {
        assert!(valid(actions));
        for delta in [-1, 1] {
            let mut shifted = actions.copy();
            shifted.set_template_start(actions.template_start() + delta);
            assert!(!valid(&shifted), "template start {delta:+}");

            let mut rescored = actions.copy();
            rescored.set_score(actions.score() + delta);
            assert!(!valid(&rescored), "score {delta:+}");

            let count = actions.len().wrapping_add_signed(delta as isize);
            if let Ok(recounted) = PackedActions::from_words(
                actions.template_start(),
                actions.score(),
                count,
                actions.words(),
            ) {
                assert!(!valid(&recounted), "count {delta:+}");
            }

            for i in 0..actions.words().len() {
                let mut words = actions.words().to_vec();
                words[i] = words[i].wrapping_add_signed(delta);
                if let Ok(mutated) = PackedActions::from_words(
                    actions.template_start(),
                    actions.score(),
                    actions.len(),
                    &words,
                ) {
                    assert!(!valid(&mutated), "word {i} {delta:+}");
                }
            }
        }
        assert!(valid(actions));
    }

    fn check_is_valid(read_string: &str, template_string: &str) -> Result<()> {
        let penalties = Penalties::new(1, 1, 1, 1);
        let mut aligner = GotohAligner::new(penalties, false);
        let mut av = ActionsValidator::new(penalties);
        let read = encode(read_string.as_bytes())?;
        let template = encode(template_string.as_bytes())?;
        let max_shift = ((read.len() as f64 * 0.5) as usize).max(7);

        let actions = aligner
            .align(&read, read.len(), &template, 0, i32::MAX, max_shift)
            .copy();
        assert_perturbations_rejected(&actions, |a| {
            av.is_valid(a, &read, read.len(), &template, i32::MAX)
        });
        Ok(())
    }

    #[test]
    fn test_perturbed_alignments() -> Result<()> {
        check_is_valid("acgt", "acgt")?;
        check_is_valid("acgacgtttcgcgcgc", "cgacgcgcgcg")?;
        check_is_valid(
            "tactcgaacccttcaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaatatgggtactgcat",
            "tactcgattcaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaatattactgcat",
        )?;
        check_is_valid("gatacgaactcgtacgcact", "gatacgaacccctcgtacgcactcg")?;
        check_is_valid("gatacgaactcgtcgcact", "gatacgaaaccctcgtcgcactcg")?;
        check_is_valid(
            "actcactaagggggtttctatagtttttcactcgg",
            "gggactcactaatttctatagcactcggggg",
        )?;
        Ok(())
    }

    fn check_is_valid_rc(read_string: &str, template: &[u8]) -> Result<()> {
        let penalties = Penalties::new(1, 1, 1, 1);
        let mut aligner = GotohAligner::new(penalties, false);
        let mut av = ActionsValidator::new(penalties);
        let read = encode(read_string.as_bytes())?;
        let template_rc = reverse_complement(template);
        let max_shift = ((read.len() as f64 * 0.5) as usize).max(7);

        let expected_start = template_rc.len() as i32 - read.len() as i32;
        let mut actions = aligner
            .align(&read, read.len(), &template_rc, expected_start, i32::MAX, max_shift)
            .copy();
        if actions.score() != INFEASIBLE_SCORE {
            actions.set_template_start(template_rc.len() as i32 - actions.zero_based_template_end());
        }
        assert_perturbations_rejected(&actions, |a| {
            av.is_valid_rc(a, &read, read.len(), template, i32::MAX)
        });
        Ok(())
    }

    #[test]
    fn test_reverse_complement() -> Result<()> {
        let read = "tactcgaaccccttctatggggtactgcat";
        check_is_valid_rc(read, &reverse_complement(&encode(read.as_bytes())?))?;
        check_is_valid_rc(
            "acgacgtttcgcgcgc",
            &reverse_complement(&encode(b"cgacgcgcgcg")?),
        )?;
        Ok(())
    }
}
