/// Version string reported in output headers.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Motif limits
// =============================================================================

/// Maximum number of positions in a motif.
///
/// Bounds the worst-case total ambiguity penalty so that scores stay far
/// from `i32::MIN` (50 positions at -10,000,000 each is -500,000,000).
pub const MAX_MOTIF_WIDTH: usize = 50;

/// Maximum stored size of motif names.
pub const MAX_NAME_SIZE: usize = 256;

/// Maximum stored size of sequence and BED range names.
pub const MAX_SEQ_NAME_SIZE: usize = 512;

/// Score assigned to any non-ACGTU letter at every motif position.
///
/// Lives in the fifth lane of each score row, so a single window
/// containing an ambiguous base can never reach a real threshold.
pub const AMBIGUITY_SCORE: i32 = -10_000_000;

/// PWM scores are log2 odds scaled by this factor and kept as integers.
pub const SCORE_SCALE: f64 = 1000.0;

// =============================================================================
// Score distribution
// =============================================================================

/// Background probabilities are floored at this value to bound CDF size.
///
/// With the floor in place a single position score is confined to about
/// `(int) 1000*log2(1/0.001) = 9965` and `(int) 1000*log2(0.001/0.997)
/// = -9961`, keeping 50-position CDFs under a million entries.
pub const MIN_BKG_VALUE: f64 = 0.001;

/// Hard ceiling on the dense score-distribution array length.
pub const MAX_CDF_SIZE: usize = 2_097_152;

/// Allowed drift of the PDF total mass before renormalizing.
pub const PDF_SUM_TOLERANCE: f64 = 1e-4;

// =============================================================================
// Scan defaults
// =============================================================================

/// Default threshold p-value.
pub const DEFAULT_PVALUE: f64 = 0.0001;

/// Default number of motif sites assumed in PPM->PWM conversion.
pub const DEFAULT_NSITES: i32 = 1000;

/// Default pseudocount for PWM generation.
pub const DEFAULT_PSEUDOCOUNT: i32 = 1;

// =============================================================================
// Shuffler
// =============================================================================

/// Default k-mer size for shuffling.
pub const DEFAULT_K: usize = 3;

/// Default seed for the shuffler's random number generator.
pub const DEFAULT_SEED: u64 = 4;

/// Hard limit on k for the Euler/Markov table-based shuffles.
///
/// Complete k-mer tables grow as `5^k`; k=9 already needs a 17.9 MB
/// count table and the next steps grow fivefold each.
pub const MAX_K: usize = 9;

/// Column width for FASTA output.
pub const FASTA_LINE_LEN: usize = 60;

/// Powers of five for base-5 k-mer encoding, up to `5^MAX_K`.
pub const POW5: [u64; MAX_K + 1] = [
    1, 5, 25, 125, 625, 3_125, 15_625, 78_125, 390_625, 1_953_125,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow5_table_is_consistent() {
        for i in 1..POW5.len() {
            assert_eq!(POW5[i], POW5[i - 1] * 5);
        }
    }

    #[test]
    fn cdf_ceiling_covers_floored_background() {
        // Worst case per-position spread under the background floor.
        let max = (SCORE_SCALE * (1.0 / MIN_BKG_VALUE).log2()) as i64;
        let min = (SCORE_SCALE * (MIN_BKG_VALUE / (1.0 - 3.0 * MIN_BKG_VALUE)).log2()) as i64;
        let worst = (max - min) as usize * MAX_MOTIF_WIDTH + 1;
        assert!(worst <= MAX_CDF_SIZE, "worst case {worst} exceeds ceiling");
    }
}
