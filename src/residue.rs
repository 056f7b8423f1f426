//! Residue alphabet used by the aligner and validator
//!
//! Sequences are arrays of small integer codes with one reserved sentinel for an unknown residue.
//!
//! | Code | Base |
//! | ---- | ---- |
//! | 0    | N    |
//! | 1    | A    |
//! | 2    | C    |
//! | 3    | G    |
//! | 4    | T    |
//!
//! Encoding is case-insensitive. Characters outside `ACGTN` are handled by a [`Policy`].

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    error::{Error, ResidueError},
    Policy, Result, RNG_SEED,
};

/// Code of the unknown residue (`N`)
pub const UNKNOWN_RESIDUE: u8 = 0;

/// Display characters indexed by residue code
const RESIDUE_CHARS: &[u8; 5] = b"NACGT";

/// Encodes a single nucleotide character, or `None` if it is outside `ACGTN`
#[must_use]
pub fn encode_base(c: u8) -> Option<u8> {
    match c {
        b'N' | b'n' => Some(0),
        b'A' | b'a' => Some(1),
        b'C' | b'c' => Some(2),
        b'G' | b'g' => Some(3),
        b'T' | b't' => Some(4),
        _ => None,
    }
}

/// Character for a residue code, or `None` if the code is outside the alphabet
#[must_use]
pub fn residue_char(code: u8) -> Option<char> {
    RESIDUE_CHARS.get(usize::from(code)).map(|&c| char::from(c))
}

/// Encodes a nucleotide sequence, failing on the first invalid character
pub fn encode(sequence: &[u8]) -> Result<Vec<u8>> {
    sequence
        .iter()
        .map(|&c| {
            encode_base(c).ok_or_else(|| Error::from(ResidueError::InvalidResidue(char::from(c))))
        })
        .collect()
}

/// Decodes residue codes back into an uppercase `NACGT` string
pub fn decode(codes: &[u8]) -> Result<String> {
    codes
        .iter()
        .map(|&code| {
            residue_char(code).ok_or_else(|| Error::from(ResidueError::InvalidCode(code)))
        })
        .collect()
}

/// Renders `len` residues starting at `start`.
///
/// Positions outside the slice render as `N`; codes outside the alphabet render as `?`.
#[must_use]
pub fn window_string(codes: &[u8], start: i64, len: usize) -> String {
    (0..len as i64)
        .map(|i| {
            usize::try_from(start + i)
                .ok()
                .and_then(|p| codes.get(p))
                .map_or('N', |&code| residue_char(code).unwrap_or('?'))
        })
        .collect()
}

/// Complement of a residue code. `N` and out-of-alphabet codes map to themselves.
#[must_use]
pub fn complement(code: u8) -> u8 {
    match code {
        1 => 4,
        2 => 3,
        3 => 2,
        4 => 1,
        c => c,
    }
}

/// Reverse complement of a residue code sequence
#[must_use]
pub fn reverse_complement(codes: &[u8]) -> Vec<u8> {
    codes.iter().rev().map(|&c| complement(c)).collect()
}

/// Encodes nucleotide sequences into residue codes
///
/// The encoder keeps its buffers between calls so repeated encoding does not reallocate.
/// Invalid characters are handled according to its [`Policy`].
#[derive(Clone)]
pub struct ResidueEncoder {
    /// Encoded residues of the last sequence
    ebuf: Vec<u8>,

    /// Policy for handling invalid characters
    policy: Policy,

    /// Random number generator for the `RandomDraw` policy
    /// Seeded with `RNG_SEED` for reproducibility
    rng: SmallRng,
}
impl Default for ResidueEncoder {
    fn default() -> Self {
        Self::new()
    }
}
impl ResidueEncoder {
    /// Creates a new encoder with the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(Policy::default())
    }

    /// Creates a new encoder with a specific invalid character policy
    #[must_use]
    pub fn with_policy(policy: Policy) -> Self {
        Self {
            ebuf: Vec::default(),
            policy,
            rng: SmallRng::seed_from_u64(RNG_SEED),
        }
    }

    /// Encodes a single sequence.
    ///
    /// Will return `None` if the sequence is invalid and the policy says to skip it.
    pub fn encode(&mut self, sequence: &[u8]) -> Result<Option<&[u8]>> {
        self.ebuf.clear();
        if sequence.iter().all(|&c| encode_base(c).is_some()) {
            self.ebuf.extend(sequence.iter().filter_map(|&c| encode_base(c)));
            return Ok(Some(self.ebuf.as_slice()));
        }
        if self.policy.handle(sequence, &mut self.ebuf, &mut self.rng)? {
            Ok(Some(self.ebuf.as_slice()))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() -> anyhow::Result<()> {
        let codes = encode(b"acgtnACGTN")?;
        assert_eq!(codes, vec![1, 2, 3, 4, 0, 1, 2, 3, 4, 0]);
        assert_eq!(decode(&codes)?, "ACGTNACGTN");
        Ok(())
    }

    #[test]
    fn test_encode_invalid() {
        let err = encode(b"ACXT").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ResidueError(ResidueError::InvalidResidue('X'))
        ));
        assert!(decode(&[1, 7]).is_err());
    }

    #[test]
    fn test_reverse_complement() -> anyhow::Result<()> {
        let codes = encode(b"AACGTN")?;
        assert_eq!(decode(&reverse_complement(&codes))?, "NACGTT");
        Ok(())
    }

    #[test]
    fn test_window_string() -> anyhow::Result<()> {
        let codes = encode(b"ACGT")?;
        assert_eq!(window_string(&codes, -2, 4), "NNAC");
        assert_eq!(window_string(&codes, 2, 4), "GTNN");
        Ok(())
    }

    #[test]
    fn test_encoder_policies() -> anyhow::Result<()> {
        let mut strict = ResidueEncoder::new();
        assert_eq!(strict.encode(b"ACGT")?, Some(&[1, 2, 3, 4][..]));
        assert!(strict.encode(b"AC.T").is_err());

        let mut lenient = ResidueEncoder::with_policy(Policy::SetToUnknown);
        assert_eq!(lenient.encode(b"AC.T")?, Some(&[1, 2, 0, 4][..]));

        let mut skipping = ResidueEncoder::with_policy(Policy::IgnoreSequence);
        assert_eq!(skipping.encode(b"AC.T")?, None);
        Ok(())
    }
}
