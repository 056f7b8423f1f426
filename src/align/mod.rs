//! # align
//!
//! Banded affine-gap alignment of a read against a template.
//!
//! [`GotohAligner`] fills a score lattice restricted to a band of `max_shift` residues
//! (plus a gray margin) around the expected diagonal, then traces back the cheapest path
//! into a [`PackedActions`](crate::PackedActions). Each end of the template window is
//! either pinned or free to move within the band, chosen through [`BoundaryMode`].
//!
//! Scores follow [`Penalties`]: `gap_open + n * gap_extend` for a gap of length `n`,
//! `substitution` for two different known residues and `unknown` whenever either side
//! is the unknown residue.

mod gotoh;
mod lattice;
mod penalties;
mod stats;

pub use gotoh::{BoundaryMode, GotohAligner};
pub use penalties::{Penalties, PenaltiesBuilder};
pub use stats::{AlignmentStats, HISTOGRAM_BINS};
