use std::fmt;

use super::{Action, PackedActions};
use crate::error::{ActionsError, Result};

/// Character sets used to render actions as text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alphabet {
    /// `= X D I S N B T R`, the alphabet accepted by [`PackedActions::build`]
    #[default]
    Cigar,
    /// `. X D I S N B`, a terse alphabet for simulated-read debugging
    Readsim,
}

impl Action {
    /// CIGAR-style character, `None` for `Noop`
    #[must_use]
    pub fn cigar_char(self) -> Option<char> {
        match self {
            Self::Same => Some('='),
            Self::Mismatch => Some('X'),
            Self::DeletionFromReference => Some('D'),
            Self::InsertionIntoReference => Some('I'),
            Self::SoftClip => Some('S'),
            Self::Noop => None,
            Self::CgGapInRead => Some('N'),
            Self::CgOverlapInRead => Some('B'),
            Self::UnknownTemplate => Some('T'),
            Self::UnknownRead => Some('R'),
        }
    }

    /// Readsim-style character, `None` for `Noop`
    #[must_use]
    pub fn readsim_char(self) -> Option<char> {
        match self {
            Self::Same => Some('.'),
            other => other.cigar_char(),
        }
    }

    /// Parses a CIGAR-style character
    pub fn from_cigar_char(c: char) -> Result<Self> {
        Ok(match c {
            '=' => Self::Same,
            'X' => Self::Mismatch,
            'D' => Self::DeletionFromReference,
            'I' => Self::InsertionIntoReference,
            'S' => Self::SoftClip,
            'N' => Self::CgGapInRead,
            'B' => Self::CgOverlapInRead,
            'T' => Self::UnknownTemplate,
            'R' => Self::UnknownRead,
            _ => return Err(ActionsError::InvalidCharacter(c).into()),
        })
    }

    fn display_char(self, alphabet: Alphabet) -> Option<char> {
        match alphabet {
            Alphabet::Cigar => self.cigar_char(),
            Alphabet::Readsim => self.readsim_char(),
        }
    }
}

impl PackedActions {
    /// Renders the actions from start to end, one character each, eliding `Noop`
    #[must_use]
    pub fn to_display_string(&self, alphabet: Alphabet) -> String {
        self.iter()
            .filter_map(|action| action.display_char(alphabet))
            .collect()
    }

    /// Builds an array from a CIGAR-alphabet action string (one character per action)
    ///
    /// # Arguments
    ///
    /// * `actions` - The actions in chronological order, e.g. `"==XD=I"`
    /// * `template_start` - Zero-based template position of the first action
    /// * `score` - The alignment score to record
    ///
    /// # Errors
    ///
    /// Returns [`ActionsError::InvalidCharacter`] for a character outside the alphabet.
    pub fn build(actions: &str, template_start: i32, score: i32) -> Result<Self> {
        let codes = actions
            .chars()
            .map(Action::from_cigar_char)
            .collect::<Result<Vec<_>>>()?;
        let mut packed = Self::with_capacity(codes.len());
        for &action in codes.iter().rev() {
            packed.push_oldest(action);
        }
        packed.set_template_start(template_start);
        packed.set_score(score);
        Ok(packed)
    }
}

impl fmt::Display for PackedActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.iter().filter_map(Action::cigar_char) {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
