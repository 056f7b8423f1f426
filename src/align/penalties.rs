use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct PenaltiesBuilder {
    gap_open: Option<i32>,
    gap_extend: Option<i32>,
    substitution: Option<i32>,
    unknown: Option<i32>,
}

impl PenaltiesBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn gap_open(mut self, penalty: i32) -> Self {
        self.gap_open = Some(penalty);
        self
    }
    #[must_use]
    pub fn gap_extend(mut self, penalty: i32) -> Self {
        self.gap_extend = Some(penalty);
        self
    }
    #[must_use]
    pub fn substitution(mut self, penalty: i32) -> Self {
        self.substitution = Some(penalty);
        self
    }
    #[must_use]
    pub fn unknown(mut self, penalty: i32) -> Self {
        self.unknown = Some(penalty);
        self
    }
    pub fn build(self) -> Result<Penalties> {
        Ok(Penalties {
            gap_open: self
                .gap_open
                .ok_or(ConfigError::MissingPenalty("gap open"))?,
            gap_extend: self
                .gap_extend
                .ok_or(ConfigError::MissingPenalty("gap extend"))?,
            substitution: self
                .substitution
                .ok_or(ConfigError::MissingPenalty("substitution"))?,
            unknown: self.unknown.unwrap_or(0),
        })
    }
}

/// Affine-gap cost model shared by the aligner and the validator
///
/// A gap of length `n` costs `gap_open + n * gap_extend`.
/// A diagonal step costs 0 for equal residues, `substitution` for two different known residues,
/// and `unknown` when either residue is the unknown sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Penalties {
    pub gap_open: i32,
    pub gap_extend: i32,
    pub substitution: i32,
    pub unknown: i32,
}

impl Penalties {
    #[must_use]
    pub fn new(gap_open: i32, gap_extend: i32, substitution: i32, unknown: i32) -> Self {
        Self {
            gap_open,
            gap_extend,
            substitution,
            unknown,
        }
    }

    #[must_use]
    pub fn builder() -> PenaltiesBuilder {
        PenaltiesBuilder::new()
    }

    /// Column-minimum early termination relies on scores never decreasing along a path,
    /// which only holds when no penalty is negative.
    #[must_use]
    pub fn supports_early_termination(&self) -> bool {
        self.gap_open >= 0 && self.gap_extend >= 0 && self.substitution >= 0 && self.unknown >= 0
    }

    /// Cost of a diagonal step between two residues
    #[inline]
    #[must_use]
    pub fn diagonal_cost(&self, read: u8, template: u8) -> i32 {
        if read == crate::residue::UNKNOWN_RESIDUE || template == crate::residue::UNKNOWN_RESIDUE {
            self.unknown
        } else if read == template {
            0
        } else {
            self.substitution
        }
    }
}
