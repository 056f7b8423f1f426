/// Custom Result type for bandalign operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the bandalign library.
///
/// An alignment that cannot be found within the score or band limits is *not* an error;
/// it is reported through the infeasible sentinel on [`PackedActions`](crate::PackedActions).
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors related to building or decoding packed action arrays
    ActionsError(#[from] ActionsError),
    /// Errors related to residue encoding
    ResidueError(#[from] ResidueError),
    /// Errors related to aligner configuration
    ConfigError(#[from] ConfigError),
    /// Errors raised while aligning batches across threads
    ParallelError(#[from] ParallelError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
}

/// Structural and format errors of packed action arrays
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ActionsError {
    /// A display string contains a character that maps to no action
    ///
    /// # Arguments
    /// * `char` - The offending character
    #[error("Invalid action character: {0:?}")]
    InvalidCharacter(char),

    /// A decoded 4-bit value is not one of the known action codes
    ///
    /// # Fields
    /// * `code` - The unknown code
    /// * `position` - The storage position it was found at
    #[error("Invalid action code {code} at position {position}")]
    InvalidActionCode { code: u8, position: usize },

    /// Bits beyond the last action in the final word are set
    #[error("Bits were set beyond the number of actions")]
    PaddingBitsSet,

    /// The buffer is smaller than the header requires
    ///
    /// # Arguments
    /// * First `usize` - The actual number of bytes or words provided
    /// * Second `usize` - The number required by the header
    #[error("Invalid number of bytes provided: {0}. Expected: {1}")]
    InvalidSize(usize, usize),

    /// The header carries a negative action count
    #[error("Negative action count in header: {0}")]
    NegativeCount(i32),
}

/// Errors related to converting sequences into residue codes
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ResidueError {
    /// The sequence contains a character outside the nucleotide alphabet
    #[error("Invalid residue found in sequence: {0:?}")]
    InvalidResidue(char),

    /// A residue code is outside the encoded alphabet
    #[error("Invalid residue code: {0}")]
    InvalidCode(u8),
}

/// Errors raised while building aligner configuration
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required penalty was never set on the builder
    #[error("Missing {0} penalty in builder")]
    MissingPenalty(&'static str),
}

/// Errors raised by the parallel batch aligner
#[derive(thiserror::Error, Debug)]
pub enum ParallelError {
    /// A worker thread panicked before returning its results
    #[error("Alignment worker {0} panicked")]
    WorkerPanicked(usize),
}
