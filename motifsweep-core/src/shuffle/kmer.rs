//! Base-5 k-mer encoding for the shuffler's dense tables.
//!
//! A k-mer is read as a base-5 number with digits A=0, C=1, G=2, T/U=3
//! and 4 for everything else, so a complete count table has `5^k`
//! entries and the (k-1)-mer vertex tables `5^(k-1)`.

use crate::alphabet::base_index;
use crate::constants::{MAX_K, POW5};
use crate::types::{Result, SweepError};

/// Size of a complete k-mer table (`5^k`), guarding the k ceiling.
pub fn table_size(k: usize) -> Result<usize> {
    if k == 0 || k > MAX_K {
        return Err(SweepError::Config(format!(
            "k={k} is outside the supported range 1..={MAX_K}"
        )));
    }
    Ok(POW5[k] as usize)
}

/// Encode the k-mer starting at `offset` as a base-5 index.
#[inline]
#[must_use]
pub fn encode_kmer(seq: &[u8], k: usize, offset: usize) -> usize {
    let mut kmer = 0usize;
    for j in 0..k {
        kmer += POW5[k - 1 - j] as usize * base_index(seq[offset + j]) as usize;
    }
    kmer
}

/// Count every overlapping k-mer of `seq` into `table` (cleared first).
pub fn count_kmers(seq: &[u8], k: usize, table: &mut [u64]) {
    table.fill(0);
    for offset in 0..=seq.len() - k {
        table[encode_kmer(seq, k, offset)] += 1;
    }
}
