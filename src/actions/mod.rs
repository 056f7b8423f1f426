//! # actions
//!
//! A packed action array describes one alignment: where it starts on the template,
//! what it scored, and the sequence of edit operations that walk the read along the template.
//!
//! ## Layout
//!
//! | Field            | Type  | Description                                               |
//! | ---------------- | ----- | --------------------------------------------------------- |
//! | `template_start` | int32 | Zero-based template position of the first action          |
//! | `score`          | int32 | Alignment score, `i32::MAX` when the alignment is infeasible |
//! | `action_count`   | uint32 | Number of meaningful 4-bit codes                          |
//! | words            | uint32 | `ceil(action_count / 8)` words of packed codes            |
//!
//! ## Encoding
//!
//! - Each action is a 4-bit code, eight per `u32` word.
//! - Within a word the most significant nibble holds the lowest storage position.
//! - Actions are stored in **reverse chronological order**: storage position 0 holds the
//!   action closest to the end of the alignment.
//! - Bits beyond `action_count` in the final word are always zero.
//! - An infeasible alignment has `score == i32::MAX` and `action_count == 0`.
//!
//! | Code | Action                    | Read | Template | CIGAR |
//! | ---- | ------------------------- | ---- | -------- | ----- |
//! | 0    | match                     | +1   | +1       | `=`   |
//! | 1    | mismatch                  | +1   | +1       | `X`   |
//! | 2    | deletion from reference   | 0    | +1       | `D`   |
//! | 3    | insertion into reference  | +1   | 0        | `I`   |
//! | 4    | soft clip                 | +1   | 0        | `S`   |
//! | 7    | no-op                     | 0    | 0        |       |
//! | 10   | CG gap in read            | 0    | +1       | `N`   |
//! | 11   | CG overlap in read        | 0    | -1       | `B`   |
//! | 12   | unknown template          | +1   | +1       | `T`   |
//! | 13   | unknown read              | +1   | +1       | `R`   |
//!
//! ## Serialized form
//!
//! The header fields and words are written little-endian in the order listed above,
//! giving `12 + 4 * ceil(action_count / 8)` bytes.

mod array;
mod codec;
mod display;
mod iter;

pub use array::{PackedActions, ACTIONS_PER_WORD, BITS_PER_ACTION, HEADER_WORDS, INFEASIBLE_SCORE};
pub use codec::SIZE_HEADER;
pub use display::Alphabet;
pub use iter::ActionIter;

use crate::error::ActionsError;

/// One alignment step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    Same = 0,
    Mismatch = 1,
    DeletionFromReference = 2,
    InsertionIntoReference = 3,
    SoftClip = 4,
    Noop = 7,
    CgGapInRead = 10,
    CgOverlapInRead = 11,
    UnknownTemplate = 12,
    UnknownRead = 13,
}
impl Action {
    /// The 4-bit code of this action
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// How far this action moves the read cursor
    #[must_use]
    pub fn read_delta(self) -> i32 {
        match self {
            Self::Same
            | Self::Mismatch
            | Self::InsertionIntoReference
            | Self::SoftClip
            | Self::UnknownTemplate
            | Self::UnknownRead => 1,
            _ => 0,
        }
    }

    /// How far this action moves the template cursor
    #[must_use]
    pub fn template_delta(self) -> i32 {
        match self {
            Self::Same
            | Self::Mismatch
            | Self::DeletionFromReference
            | Self::CgGapInRead
            | Self::UnknownTemplate
            | Self::UnknownRead => 1,
            Self::CgOverlapInRead => -1,
            _ => 0,
        }
    }

    /// Decodes a nibble that is known to hold a valid code.
    pub(crate) fn from_nibble(nibble: u32) -> Self {
        match nibble {
            0 => Self::Same,
            1 => Self::Mismatch,
            2 => Self::DeletionFromReference,
            3 => Self::InsertionIntoReference,
            4 => Self::SoftClip,
            7 => Self::Noop,
            10 => Self::CgGapInRead,
            11 => Self::CgOverlapInRead,
            12 => Self::UnknownTemplate,
            13 => Self::UnknownRead,
            _ => unreachable!("nibble {nibble} is not an action code"),
        }
    }
}
impl TryFrom<u8> for Action {
    type Error = ActionsError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0..=4 | 7 | 10..=13 => Ok(Self::from_nibble(u32::from(code))),
            _ => Err(ActionsError::InvalidActionCode { code, position: 0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in 0..16u8 {
            match Action::try_from(code) {
                Ok(action) => assert_eq!(action.code(), code),
                Err(err) => {
                    assert!(matches!(code, 5 | 6 | 8 | 9 | 14 | 15));
                    assert_eq!(err, ActionsError::InvalidActionCode { code, position: 0 });
                }
            }
        }
    }

    #[test]
    fn test_cursor_deltas() {
        assert_eq!(Action::CgOverlapInRead.template_delta(), -1);
        assert_eq!(Action::CgOverlapInRead.read_delta(), 0);
        assert_eq!(Action::SoftClip.template_delta(), 0);
        assert_eq!(Action::SoftClip.read_delta(), 1);
        assert_eq!(Action::Noop.template_delta(), 0);
        assert_eq!(Action::Noop.read_delta(), 0);
        assert_eq!(Action::UnknownRead.template_delta(), 1);
    }
}
