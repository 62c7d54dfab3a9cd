//! Configuration for scanning and shuffling runs.

use crate::background::Background;
use crate::constants::{
    DEFAULT_K, DEFAULT_NSITES, DEFAULT_PSEUDOCOUNT, DEFAULT_PVALUE, DEFAULT_SEED, MAX_K,
};
use crate::shuffle::ShuffleMode;
use crate::types::{Result, SweepError, Verbosity};

/// Configuration settings for a motif scanning run.
///
/// # Examples
///
/// ```rust
/// use motifsweep_core::config::ScanConfig;
///
/// let config = ScanConfig {
///     pvalue: 1e-5,
///     threads: 4,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// User-supplied background probabilities.
    ///
    /// When `None`, the background from the motif file is used (MEME
    /// only), falling back to uniform.
    ///
    /// **Default**: `None`
    pub background: Option<Background>,

    /// Threshold p-value for reporting hits.
    ///
    /// **Default**: `1e-4`
    pub pvalue: f64,

    /// Number of motif sites assumed when converting probabilities to
    /// log-odds scores.
    ///
    /// **Default**: `1000`
    pub nsites: i32,

    /// Pseudocount added during PWM generation.
    ///
    /// **Default**: `1`
    pub pseudocount: i32,

    /// Number of scanning threads. Capped at the motif count.
    ///
    /// **Default**: `1`
    pub threads: usize,

    /// Scan the reverse-complement strand as well as the forward strand.
    ///
    /// **Default**: `true`
    pub scan_rc: bool,

    /// Deduplicate repeated motif/sequence names by appending an ordinal
    /// suffix instead of aborting.
    ///
    /// **Default**: `false` (abort on duplicates)
    pub dedup: bool,

    /// Trim motif and sequence names to their first word.
    ///
    /// **Default**: `true`
    pub trim_names: bool,

    /// Keep only one sequence in memory at a time, re-reading the input
    /// once per motif. Automatically disabled for stdin input and
    /// multi-threaded scans.
    ///
    /// **Default**: `true`
    pub low_mem: bool,

    /// Report every hit with a score of zero or greater instead of using
    /// the p-value threshold.
    ///
    /// **Default**: `false`
    pub zero_threshold: bool,

    /// Treat lowercase (soft-masked) letters as ambiguous and skip them
    /// while scoring.
    ///
    /// **Default**: `false`
    pub mask_lower: bool,

    /// Draw a progress bar on stderr while scanning.
    ///
    /// **Default**: `false`
    pub progress: bool,

    /// Diagnostic output level.
    ///
    /// **Default**: [`Verbosity::Quiet`]
    pub verbosity: Verbosity,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            background: None,
            pvalue: DEFAULT_PVALUE,
            nsites: DEFAULT_NSITES,
            pseudocount: DEFAULT_PSEUDOCOUNT,
            threads: 1,
            scan_rc: true,
            dedup: false,
            trim_names: true,
            low_mem: true,
            zero_threshold: false,
            mask_lower: false,
            progress: false,
            verbosity: Verbosity::Quiet,
        }
    }
}

impl ScanConfig {
    /// Check value ranges before any heavy computation begins.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pvalue) {
            return Err(SweepError::Config(
                "threshold p-value cannot be less than 0 or more than 1".into(),
            ));
        }
        if self.pseudocount < 1 {
            return Err(SweepError::Config(
                "pseudocount must be a positive integer".into(),
            ));
        }
        if self.nsites < 1 {
            return Err(SweepError::Config(
                "site count must be a positive integer".into(),
            ));
        }
        if self.threads < 1 {
            return Err(SweepError::Config(
                "thread count must be a positive integer".into(),
            ));
        }
        Ok(())
    }

    /// Thread count actually used for a scan: never more than the motif
    /// count, and one for degenerate runs where parallelism cannot help.
    #[must_use]
    pub fn effective_threads(&self, n_motifs: usize) -> usize {
        if n_motifs <= 1 {
            return 1;
        }
        self.threads.min(n_motifs)
    }
}

/// Configuration settings for a shuffling run.
#[derive(Debug, Clone)]
pub struct ShuffleConfig {
    /// Size of the preserved k-mers.
    ///
    /// `k = 1` always performs a plain Fisher-Yates shuffle.
    ///
    /// **Default**: `3`
    pub k: usize,

    /// Seed for the random number generator.
    ///
    /// **Default**: `4`
    pub seed: u64,

    /// Shuffle algorithm. Ignored in favor of Fisher-Yates when `k = 1`.
    ///
    /// **Default**: [`ShuffleMode::Euler`]
    pub mode: ShuffleMode,

    /// Number of extra shuffles emitted per sequence; the repeat index is
    /// appended to the record name.
    ///
    /// **Default**: `0`
    pub repeats: u64,

    /// Reset the generator to the seed before each sequence, making every
    /// per-sequence shuffle independently reproducible.
    ///
    /// **Default**: `false` (one continuous stream for the whole input)
    pub reset_seed: bool,

    /// Emit rewritten letters as RNA (ACGU). Only applies to the Markov
    /// and Euler modes, which write letters from the index table; the
    /// other modes merely rearrange existing bytes.
    ///
    /// **Default**: `false`
    pub rna_out: bool,

    /// Diagnostic output level.
    ///
    /// **Default**: [`Verbosity::Quiet`]
    pub verbosity: Verbosity,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            seed: DEFAULT_SEED,
            mode: ShuffleMode::Euler,
            repeats: 0,
            reset_seed: false,
            rna_out: false,
            verbosity: Verbosity::Quiet,
        }
    }
}

impl ShuffleConfig {
    /// Check value ranges before shuffling begins.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(SweepError::Config("k must be a positive integer".into()));
        }
        if self.k > MAX_K && self.mode != ShuffleMode::Linear {
            return Err(SweepError::Config(format!(
                "k={} exceeds allowed max for Euler/Markov (max={MAX_K})",
                self.k
            )));
        }
        Ok(())
    }

    /// The algorithm actually used, accounting for the `k = 1` rule.
    #[must_use]
    pub fn effective_mode(&self) -> ShuffleMode {
        if self.k == 1 {
            ShuffleMode::FisherYates
        } else {
            self.mode
        }
    }
}
