//! # bandalign
//!
//! Banded affine-gap alignment of short reads against a template, reporting each alignment
//! as a bit-packed array of edit actions.
//!
//! - [`PackedActions`] holds the template start, the score and 4-bit action codes.
//! - [`GotohAligner`] finds the cheapest alignment within a band around the expected diagonal.
//! - [`ActionsValidator`] replays an action array against its sequences and re-derives the score.
//!
//! Sequences are residue codes (`N`=0, `A`=1, `C`=2, `G`=3, `T`=4); see [`residue`].

pub mod actions;
mod align;
mod error;
mod parallel;
mod policy;
pub mod residue;
mod validate;

pub use actions::{Action, ActionIter, Alphabet, PackedActions, INFEASIBLE_SCORE};
pub use align::{
    AlignmentStats, BoundaryMode, GotohAligner, Penalties, PenaltiesBuilder, HISTOGRAM_BINS,
};
pub use error::{ActionsError, ConfigError, Error, ParallelError, ResidueError, Result};
pub use parallel::{align_parallel, AlignmentTask};
pub use policy::Policy;
pub use validate::ActionsValidator;

/// Default seed for the random number generator used by [`Policy::RandomDraw`]
pub const RNG_SEED: u64 = 42;

#[cfg(test)]
mod testing {

    use super::*;
    use anyhow::Result;
    use std::io::Cursor;

    #[test]
    fn test_align_validate_serialize() -> Result<()> {
        let penalties = Penalties::builder()
            .gap_open(1)
            .gap_extend(1)
            .substitution(1)
            .unknown(1)
            .build()?;
        let read = residue::encode(b"acgacgtttcgcgcgc")?;
        let template = residue::encode(b"cgacgcgcgcg")?;

        let mut aligner = GotohAligner::new(penalties, false);
        let actions = aligner.align(&read, read.len(), &template, 0, 10, 7).copy();
        assert_eq!(actions.score(), 6);
        assert_eq!(actions.template_start(), -1);

        let mut validator = ActionsValidator::new(penalties);
        assert!(validator.is_valid(&actions, &read, read.len(), &template, 10));

        let mut cursor = Cursor::new(Vec::new());
        actions.write_bytes(&mut cursor)?;
        let decoded = PackedActions::from_bytes(&cursor.into_inner())?;
        assert_eq!(decoded, actions);
        assert!(validator.is_valid(&decoded, &read, read.len(), &template, 10));
        Ok(())
    }

    #[test]
    fn test_encoder_feeds_aligner() -> Result<()> {
        let mut encoder = residue::ResidueEncoder::with_policy(Policy::SetToUnknown);
        let template = residue::encode(b"nnnnnctaca")?;
        let read = encoder
            .encode(b"ctaga")?
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        let mut aligner = GotohAligner::new(Penalties::new(1, 1, 1, 0), false);
        let actions = aligner.align(&read, read.len(), &template, 5, 10, 5);
        assert_eq!(actions.to_string(), "===X=");
        assert_eq!(actions.to_display_string(Alphabet::Readsim), "...X.");
        assert_eq!(actions.score(), 1);
        Ok(())
    }

    #[test]
    fn test_infeasible_round_trip() -> Result<()> {
        let penalties = Penalties::new(1, 1, 1, 1);
        let read = residue::encode(b"acgt")?;
        let template = residue::encode(b"actt")?;
        let mut aligner = GotohAligner::new(penalties, false);
        let actions = aligner.align(&read, read.len(), &template, 0, 0, 5).copy();
        assert!(actions.is_infeasible());

        let decoded = PackedActions::from_bytes(&actions.to_bytes())?;
        assert!(decoded.is_infeasible());
        assert!(ActionsValidator::new(penalties).is_valid(&decoded, &read, read.len(), &template, 0));
        Ok(())
    }
}
