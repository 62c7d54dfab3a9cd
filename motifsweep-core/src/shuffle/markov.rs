//! Markov-chain shuffling.
//!
//! The k-mer count table is turned into per-prefix cumulative sums in
//! place, then the sequence is rewritten letter by letter: each next
//! letter is drawn proportionally to the observed transitions out of the
//! previous (k-1) letters. The result has approximately the input's
//! k-mer transition statistics but is not a permutation of it.

use crate::alphabet::base_index;
use crate::constants::POW5;
use crate::rng::SweepRng;

/// Turn each 5-wide prefix group of raw counts into cumulative sums.
fn cumsum_groups(table: &mut [u64]) {
    for group in table.chunks_exact_mut(5) {
        group[1] += group[0];
        group[2] += group[1];
        group[3] += group[2];
        group[4] += group[3];
    }
}

/// Draw the next letter from a cumulative-sum group, falling back to a
/// uniform ACGT draw when the prefix was never observed.
#[inline]
fn pick_next_letter(group: &[u64], rng: &mut SweepRng) -> usize {
    if group[4] == 0 {
        return rng.bounded(4) as usize;
    }
    let r = rng.bounded(group[4]);
    if r < group[0] {
        0
    } else if r < group[1] {
        1
    } else if r < group[2] {
        2
    } else if r < group[3] {
        3
    } else {
        4
    }
}

/// Rewrite `seq` as a Markov walk over its own k-mer transitions.
///
/// `kmer_tab` must hold the raw k-mer counts of `seq`; it is consumed
/// (converted to cumulative sums) by the call. The first k-1 letters are
/// kept, normalized through `letters` (`ACGTN` or `ACGUN`).
pub fn shuffle_markov(seq: &mut [u8], k: usize, kmer_tab: &mut [u64], letters: &[u8; 5], rng: &mut SweepRng) {
    cumsum_groups(kmer_tab);
    for i in 0..k - 1 {
        seq[i] = letters[base_index(seq[i]) as usize];
    }
    for i in k - 1..seq.len() {
        let mut prefix = 0usize;
        for j in 1..k {
            prefix += base_index(seq[i - j]) as usize * POW5[j] as usize;
        }
        seq[i] = letters[pick_next_letter(&kmer_tab[prefix..prefix + 5], rng)];
    }
}
