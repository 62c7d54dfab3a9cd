use std::fmt;

use thiserror::Error;

/// Strand restriction for scanning.
///
/// BED files may restrict a range to one strand with a `+`/`-` column;
/// a `.` (or a missing column) scans both strands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strand {
    /// Forward strand only (`+`)
    Forward,
    /// Reverse strand only (`-`)
    Reverse,
    /// Both strands (`.`)
    #[default]
    Both,
}

impl Strand {
    /// Parse a single BED strand character.
    pub fn from_bed_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Forward),
            '-' => Some(Self::Reverse),
            '.' => Some(Self::Both),
            _ => None,
        }
    }

    /// The character used when printing this strand in output lines.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
            Self::Both => '.',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// How chatty diagnostic output on stderr should be.
///
/// Mirrors the two stacking flags of the command line: `-v` enables
/// warnings and progress notes, `-w` additionally reports per-motif and
/// per-sequence details. Very verbose implies verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only hard warnings are printed.
    #[default]
    Quiet,
    /// Progress notes and soft warnings.
    Verbose,
    /// Per-motif and per-sequence detail.
    VeryVerbose,
}

impl Verbosity {
    /// True for `Verbose` and `VeryVerbose`.
    #[must_use]
    pub fn verbose(self) -> bool {
        self >= Self::Verbose
    }

    /// True for `VeryVerbose` only.
    #[must_use]
    pub fn very_verbose(self) -> bool {
        self >= Self::VeryVerbose
    }
}

/// Error types that can occur while scanning or shuffling.
#[derive(Error, Debug)]
pub enum SweepError {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing input data (motif, sequence or BED files)
    #[error("Parse error: {0}")]
    Parse(String),
    /// A motif violates a structural limit or is malformed
    #[error("Invalid motif: {0}")]
    InvalidMotif(String),
    /// Sequence input is unusable (empty, unreadable, all non-standard)
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),
    /// A BED range is malformed or inconsistent with the sequences
    #[error("Invalid BED range: {0}")]
    InvalidBed(String),
    /// Conflicting or out-of-range configuration values
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SweepError>;
