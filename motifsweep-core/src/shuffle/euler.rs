//! Randomized Eulerian-path shuffling.
//!
//! Each k-mer is a directed edge from its (k-1)-mer prefix to its
//! (k-1)-mer suffix. A shuffle is a new Eulerian walk over exactly the
//! input's edge multiset: first a randomized escape edge is chosen per
//! vertex (guaranteeing the walk can always finish), then the walk
//! spends the remaining edge pool, taking the escape edge only when a
//! vertex's pool runs dry. The first (k-1) letters and the final letter
//! stay fixed so the walk starts and ends at the original vertices.

use crate::alphabet::base_index;
use crate::constants::POW5;
use crate::rng::SweepRng;
use crate::shuffle::kmer::encode_kmer;

/// Vertex-table state reused across sequences and repeats.
#[derive(Debug)]
pub struct EulerTables {
    /// 1 when a vertex is resolved (no usable continuation).
    pub invalid: Vec<u8>,
    /// Chosen escape edge letter per vertex.
    pub euler_path: Vec<u64>,
    /// 1 when a vertex was actually assigned an escape edge.
    pub has_escape: Vec<u8>,
    /// Precomputed vertex-suffix shift: from vertex `u` and edge letter
    /// `e`, the next vertex is `euler_path + next_index[u]`.
    pub next_index: Vec<u64>,
}

impl EulerTables {
    /// Allocate vertex tables for (k-1)-mers.
    #[must_use]
    pub fn new(k: usize) -> Self {
        let n = POW5[k - 1] as usize;
        Self {
            invalid: vec![0; n],
            euler_path: vec![0; n],
            has_escape: vec![0; n],
            next_index: vec![0; n],
        }
    }

    fn reset(&mut self) {
        self.invalid.fill(0);
        self.euler_path.fill(0);
        self.has_escape.fill(0);
        self.next_index.fill(0);
    }
}

#[inline]
fn group_total(table: &[u64], offset: usize) -> u64 {
    table[offset] + table[offset + 1] + table[offset + 2] + table[offset + 3] + table[offset + 4]
}

/// Draw an edge letter from a raw-count group, weighted by remaining
/// counts. The caller guarantees the group is non-empty.
#[inline]
fn weighted_pick(group: &[u64], rng: &mut SweepRng) -> u64 {
    let c0 = group[0];
    let c1 = c0 + group[1];
    let c2 = c1 + group[2];
    let c3 = c2 + group[3];
    let c4 = c3 + group[4];
    let r = rng.bounded(c4);
    if r < c0 {
        0
    } else if r < c1 {
        1
    } else if r < c2 {
        2
    } else if r < c3 {
        3
    } else {
        4
    }
}

/// Shuffle `seq` in place via a randomized Eulerian walk.
///
/// `kmer_tab` must hold the raw k-mer counts of `seq` and is consumed as
/// the edge pool. The output contains exactly the same k-mer multiset as
/// the input.
pub fn shuffle_euler(
    seq: &mut [u8],
    k: usize,
    kmer_tab: &mut [u64],
    tables: &mut EulerTables,
    letters: &[u8; 5],
    rng: &mut SweepRng,
) {
    tables.reset();
    let size = seq.len();
    let n_vertices = POW5[k - 1] as usize;

    // Fix the starting vertex and the final letter.
    for i in 0..k - 1 {
        seq[i] = letters[base_index(seq[i]) as usize];
    }
    seq[size - 1] = letters[base_index(seq[size - 1]) as usize];

    // The edge ending at the last position is the walk's terminal edge.
    let last_edge = encode_kmer(seq, k, size - k);
    kmer_tab[last_edge] -= 1;

    for (i, invalid) in tables.invalid.iter_mut().enumerate() {
        if group_total(kmer_tab, i * 5) == 0 {
            *invalid = 1;
        }
    }

    // The walk must end at the terminal edge's prefix vertex, so every
    // escape trail is rooted there: it must not be used as a random
    // continuation point.
    tables.invalid[encode_kmer(seq, k - 1, size - k)] = 1;

    // For k = 2 an edge letter is already the next vertex index.
    if k > 2 {
        let wrap = POW5[k - 2] as usize;
        for (i, next) in tables.next_index.iter_mut().enumerate() {
            *next = ((i % wrap) * 5) as u64;
        }
    }

    // Choose one escape edge per reachable vertex by random walking
    // until an already-resolved vertex is hit, then resolve the trail.
    for i in 0..n_vertices {
        let mut u = i;
        while tables.invalid[u] == 0 {
            tables.euler_path[u] = weighted_pick(&kmer_tab[u * 5..u * 5 + 5], rng);
            u = (tables.euler_path[u] + tables.next_index[u]) as usize;
        }
        u = i;
        while tables.invalid[u] == 0 {
            tables.invalid[u] = 1;
            tables.has_escape[u] = 1;
            u = (tables.euler_path[u] + tables.next_index[u]) as usize;
        }
    }

    // Reserve the escape edges: they leave the pool and are spent only
    // as each vertex's final exit.
    for i in 0..n_vertices {
        if tables.has_escape[i] == 1 {
            let edge = i * 5 + tables.euler_path[i] as usize;
            if kmer_tab[edge] > 0 {
                kmer_tab[edge] -= 1;
            }
        }
    }

    // Walk, spending pool edges first and escape edges last.
    for i in k - 2..size.saturating_sub(2) {
        let vertex = encode_kmer(seq, k - 1, i - (k - 2));
        let group = vertex * 5;
        let next_edge = if group_total(kmer_tab, group) > 0 {
            let edge = weighted_pick(&kmer_tab[group..group + 5], rng);
            kmer_tab[group + edge as usize] -= 1;
            edge
        } else {
            debug_assert_eq!(tables.has_escape[vertex], 1);
            tables.euler_path[vertex]
        };
        seq[i + 1] = letters[next_edge as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{INDEX2DNA, INDEX2RNA};
    use crate::shuffle::kmer::{count_kmers, table_size};
    use std::collections::HashMap;

    fn kmer_multiset(seq: &[u8], k: usize) -> HashMap<Vec<u8>, usize> {
        let mut counts = HashMap::new();
        for window in seq.windows(k) {
            *counts.entry(window.to_vec()).or_insert(0) += 1;
        }
        counts
    }

    fn euler(seq: &[u8], k: usize, seed: u64) -> Vec<u8> {
        let mut out = seq.to_vec();
        let mut table = vec![0u64; table_size(k).unwrap()];
        count_kmers(&out, k, &mut table);
        let mut tables = EulerTables::new(k);
        let mut rng = SweepRng::with_seed(seed);
        shuffle_euler(&mut out, k, &mut table, &mut tables, &INDEX2DNA, &mut rng);
        out
    }

    #[test]
    fn kmer_multiset_is_preserved_exactly() {
        let seq = b"ACGGTCAGTACGGCATTGCAGCGGATATCCGGAAGCTT";
        for k in 2..=4 {
            for seed in [1u64, 4, 9, 123] {
                let out = euler(seq, k, seed);
                assert_eq!(
                    kmer_multiset(seq, k),
                    kmer_multiset(&out, k),
                    "k={k} seed={seed} out={}",
                    String::from_utf8_lossy(&out)
                );
            }
        }
    }

    #[test]
    fn endpoints_stay_fixed() {
        let seq = b"ACGGTCAGTACGGCATTGCA";
        let k = 3;
        let out = euler(seq, k, 4);
        assert_eq!(&out[..k - 1], &seq[..k - 1]);
        assert_eq!(out[seq.len() - 1], seq[seq.len() - 1]);
    }

    #[test]
    fn ambiguous_letters_are_bucketed_and_preserved_in_count() {
        let seq = b"ACGGTCNGTACGGCNTTGCAGCGGAT";
        let k = 2;
        let out = euler(seq, k, 4);
        assert_eq!(kmer_multiset(seq, k).len(), kmer_multiset(&out, k).len());
        let n_in = seq.iter().filter(|&&b| base_index(b) == 4).count();
        let n_out = out.iter().filter(|&&b| b == b'N').count();
        assert_eq!(n_in, n_out);
    }

    #[test]
    fn same_seed_same_walk() {
        let seq = b"ACGGTCAGTACGGCATTGCAGCGGATAT";
        assert_eq!(euler(seq, 3, 42), euler(seq, 3, 42));
    }

    #[test]
    fn different_seeds_usually_differ() {
        let seq = b"ACGGTCAGTACGGCATTGCAGCGGATATCCGGAAGCTTACGATCGTAGCTAGCAT";
        let outputs: Vec<Vec<u8>> = (0..8).map(|s| euler(seq, 2, s)).collect();
        let distinct: std::collections::HashSet<&Vec<u8>> = outputs.iter().collect();
        assert!(distinct.len() > 1, "eight seeds produced identical walks");
    }

    #[test]
    fn rna_letter_table_writes_u() {
        let seq = b"ACGTTGCATGCTAGCTTACG";
        let mut out = seq.to_vec();
        let k = 2;
        let mut table = vec![0u64; table_size(k).unwrap()];
        count_kmers(&out, k, &mut table);
        let mut tables = EulerTables::new(k);
        let mut rng = SweepRng::with_seed(4);
        shuffle_euler(&mut out, k, &mut table, &mut tables, &INDEX2RNA, &mut rng);
        assert!(out.iter().all(|b| b"ACGUN".contains(b)));
        assert!(!out.contains(&b'T'));
    }

    #[test]
    fn minimal_length_sequence_survives() {
        // size == 2k, the smallest input the driver shuffles.
        let seq = b"ACGTCA";
        let out = euler(seq, 3, 4);
        assert_eq!(kmer_multiset(seq, 3), kmer_multiset(&out, 3));
    }
}
