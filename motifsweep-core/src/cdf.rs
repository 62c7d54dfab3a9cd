//! Exact score distributions and p-value thresholds.
//!
//! For a motif of width `w` the distribution of the total score over all
//! `4^w` background-weighted strings is computed by convolving the four
//! per-position score/probability pairs into a dense array, then turned
//! into a survival function so `P(score >= x)` is a single lookup. This
//! convolution is where the scanner spends most of its motif-related
//! time, so the buffers are reused across the motifs of a worker instead
//! of being reallocated.

use crate::background::Background;
use crate::constants::{MAX_CDF_SIZE, MIN_BKG_VALUE, PDF_SUM_TOLERANCE};
use crate::motif::Motif;
use crate::types::{Result, SweepError, Verbosity};

/// Minimum score that counts as a hit for one motif under one scan
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Report windows scoring at least this much.
    Score(i32),
    /// The motif can never reach the requested p-value; skip it.
    Unreachable,
}

/// How the threshold is derived from the score distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdMode {
    /// Smallest score whose survival probability is below the target
    /// p-value.
    PValue(f64),
    /// Report every non-negative score.
    ZeroScore,
    /// Report only windows achieving the maximum score (consensus
    /// scanning).
    ExactMatch,
}

/// Per-worker convolution buffers, grown monotonically and shared by all
/// motifs assigned to that worker.
#[derive(Debug, Default)]
pub struct CdfScratch {
    pdf: Vec<f64>,
    snap: Vec<f64>,
}

impl CdfScratch {
    /// Fresh scratch space with no capacity yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, n: usize) {
        if self.pdf.len() < n {
            self.pdf.resize(n, 0.0);
            self.snap.resize(n, 0.0);
        }
    }

    /// Compute the survival function of `motif`'s score distribution
    /// under `bkg`.
    ///
    /// The returned slice has `motif.cdf_size()` entries; entry `i` is
    /// `P(score >= i + motif.cdf_offset())`. It borrows this scratch and
    /// is valid until the next call.
    pub fn fill_cdf(
        &mut self,
        motif: &Motif,
        bkg: &Background,
        verbosity: Verbosity,
    ) -> Result<&[f64]> {
        let size = motif.cdf_size();
        if size > MAX_CDF_SIZE {
            return Err(SweepError::InvalidMotif(format!(
                "internal error: requested CDF size for [{}] is too large ({size}>{MAX_CDF_SIZE}); \
                 make sure no background values are below {MIN_BKG_VALUE}",
                motif.name
            )));
        }
        if verbosity.very_verbose() {
            eprintln!("        Generating CDF for [{}] (n={size})", motif.name);
        }
        self.ensure(size);
        let cdf_max = motif.cdf_max() as usize;
        let min = motif.min();
        self.pdf[..size].fill(0.0);
        self.pdf[0] = 1.0;
        for pos in 0..motif.width() {
            // Offsets 0..=reach hold the distribution over the first
            // `pos` positions; one more position extends it by cdf_max.
            let reach = pos * cdf_max;
            self.snap[..=reach].copy_from_slice(&self.pdf[..=reach]);
            self.pdf[..reach + cdf_max + 1].fill(0.0);
            for letter in 0..4u8 {
                let shift = (motif.score(pos, letter) - min) as usize;
                let weight = bkg.prob(letter as usize);
                let (snap, pdf) = (&self.snap, &mut self.pdf);
                for k in 0..=reach {
                    pdf[k + shift] += snap[k] * weight;
                }
            }
        }
        let pdf_sum: f64 = self.pdf[..size].iter().sum();
        if (pdf_sum - 1.0).abs() > PDF_SUM_TOLERANCE {
            if verbosity.very_verbose() {
                eprintln!(
                    "Internal warning: sum(PDF) != 1.0 for [{}] (sum={pdf_sum:.2})",
                    motif.name
                );
            }
            for p in &mut self.pdf[..size] {
                *p /= pdf_sum;
            }
        }
        // PDF -> survival function, accumulating from the top score down.
        for i in (0..size.saturating_sub(1)).rev() {
            self.pdf[i] += self.pdf[i + 1];
        }
        Ok(&self.pdf[..size])
    }
}

/// Survival probability `P(score >= score)` looked up from a filled
/// survival function.
#[inline]
#[must_use]
pub fn score_to_pvalue(survival: &[f64], motif: &Motif, score: i32) -> f64 {
    survival[(score - motif.cdf_offset()) as usize]
}

/// Derive the hit threshold for one motif.
///
/// Override modes are applied after the reachability check, so a zero
/// threshold or consensus scan still reports hits from motifs whose
/// minimum p-value is above the target.
pub fn derive_threshold(
    motif: &Motif,
    survival: &[f64],
    mode: ThresholdMode,
    verbosity: Verbosity,
) -> Threshold {
    let pvalue = match mode {
        ThresholdMode::PValue(p) => p,
        ThresholdMode::ZeroScore => return Threshold::Score(0),
        ThresholdMode::ExactMatch => return Threshold::Score(motif.max_score()),
    };
    let index = survival
        .iter()
        .position(|&p| p < pvalue)
        .unwrap_or(survival.len());
    let min_pvalue = score_to_pvalue(survival, motif, motif.max_score());
    if min_pvalue / pvalue > 1.0001 {
        if verbosity.very_verbose() {
            eprintln!(
                "Warning: Min possible pvalue for [{}] is greater than the threshold, \
                 motif will not be scored ({min_pvalue:.3e}>{pvalue:.3e}).",
                motif.name
            );
        }
        return Threshold::Unreachable;
    }
    Threshold::Score(index as i32 + motif.cdf_offset())
}
