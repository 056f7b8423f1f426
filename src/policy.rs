use rand::Rng;

use crate::{
    error::ResidueError,
    residue::{encode_base, UNKNOWN_RESIDUE},
    Result,
};

/// Policy for handling characters outside the `ACGTN` alphabet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    IgnoreSequence,
    #[default]
    BreakOnInvalid,
    SetToUnknown,
    RandomDraw,
}
impl Policy {
    fn fill_with_unknown(sequence: &[u8], ibuf: &mut Vec<u8>) {
        for &c in sequence {
            ibuf.push(encode_base(c).unwrap_or(UNKNOWN_RESIDUE));
        }
    }

    fn fill_with_random<R: Rng>(sequence: &[u8], rng: &mut R, ibuf: &mut Vec<u8>) {
        for &c in sequence {
            ibuf.push(match encode_base(c) {
                Some(code) => code,
                None => rng.random_range(1..=4),
            });
        }
    }

    /// Encode the sequence according to the policy
    ///
    /// First clears the input buffer to ensure that it is empty.
    ///
    /// Returns a boolean indicating whether the sequence should be processed further.
    /// Returns an error naming the first invalid character if the policy breaks on invalid input.
    ///
    /// # Arguments
    /// * `sequence` - The sequence to be converted
    /// * `ibuf` - The buffer to store the residue codes
    /// * `rng` - The random number generator
    pub fn handle<R: Rng>(&self, sequence: &[u8], ibuf: &mut Vec<u8>, rng: &mut R) -> Result<bool> {
        ibuf.clear();
        match self {
            Self::IgnoreSequence => Ok(false),
            Self::BreakOnInvalid => {
                let invalid = sequence
                    .iter()
                    .find(|&&c| encode_base(c).is_none())
                    .map_or('?', |&c| char::from(c));
                Err(ResidueError::InvalidResidue(invalid).into())
            }
            Self::SetToUnknown => {
                Self::fill_with_unknown(sequence, ibuf);
                Ok(true)
            }
            Self::RandomDraw => {
                Self::fill_with_random(sequence, rng, ibuf);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_set_to_unknown() -> anyhow::Result<()> {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut ibuf = Vec::new();
        assert!(Policy::SetToUnknown.handle(b"AC-T", &mut ibuf, &mut rng)?);
        assert_eq!(ibuf, vec![1, 2, 0, 4]);
        Ok(())
    }

    #[test]
    fn test_random_draw_stays_known() -> anyhow::Result<()> {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut ibuf = Vec::new();
        assert!(Policy::RandomDraw.handle(b"**A**", &mut ibuf, &mut rng)?);
        assert_eq!(ibuf.len(), 5);
        assert_eq!(ibuf[2], 1);
        assert!(ibuf.iter().all(|&c| (1..=4).contains(&c)));
        Ok(())
    }

    #[test]
    fn test_break_and_ignore() {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut ibuf = vec![9];
        assert!(matches!(
            Policy::IgnoreSequence.handle(b"A*", &mut ibuf, &mut rng),
            Ok(false)
        ));
        assert!(ibuf.is_empty());
        let err = Policy::BreakOnInvalid
            .handle(b"AC*T", &mut ibuf, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ResidueError(ResidueError::InvalidResidue('*'))
        ));
    }
}
