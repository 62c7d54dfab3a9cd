//! Sequence shuffling.
//!
//! Four algorithms with different preservation guarantees: Fisher-Yates
//! (exact base composition, forced for k = 1), linear block shuffling
//! (intact k-blocks rearranged), Markov chains (approximate k-mer
//! transition statistics) and randomized Eulerian walks (exact k-mer
//! multiset, the default). All randomness flows through one seedable
//! generator in a fixed draw order, so a seed pins the output bytes.

pub mod euler;
pub mod kmer;
pub mod markov;

use std::io::Write;

use crate::alphabet::{BaseCounts, INDEX2DNA, INDEX2RNA};
use crate::config::ShuffleConfig;
use crate::constants::FASTA_LINE_LEN;
use crate::rng::SweepRng;
use crate::sequence::SequenceSource;
use crate::types::{Result, SweepError};

use self::euler::{shuffle_euler, EulerTables};
use self::kmer::{count_kmers, table_size};
use self::markov::shuffle_markov;

/// Shuffle algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShuffleMode {
    /// Randomized Eulerian walk preserving the exact k-mer multiset.
    #[default]
    Euler,
    /// Markov walk preserving approximate k-mer transition statistics.
    Markov,
    /// Fisher-Yates over whole k-blocks.
    Linear,
    /// Plain Fisher-Yates over single bases (k = 1).
    FisherYates,
}

/// Uniform random permutation of the bases.
pub fn shuffle_fisher_yates(seq: &mut [u8], rng: &mut SweepRng) {
    let len = seq.len();
    if len < 2 {
        return;
    }
    for i in 0..len - 1 {
        let j = i + rng.bounded((len - i) as u64) as usize;
        seq.swap(i, j);
    }
}

fn swap_blocks(seq: &mut [u8], a: usize, b: usize, k: usize) {
    for offset in 0..k {
        seq.swap(a + offset, b + offset);
    }
}

/// Fisher-Yates over non-overlapping k-blocks; a trailing remainder
/// shorter than k stays in place.
pub fn shuffle_linear(seq: &mut [u8], k: usize, rng: &mut SweepRng) {
    let nblocks = seq.len() / k;
    if nblocks < 2 {
        return;
    }
    for b in 0..nblocks - 1 {
        let r = b + rng.bounded((nblocks - b) as u64) as usize;
        if r != b {
            swap_blocks(seq, b * k, r * k, k);
        }
    }
}

/// Write one FASTA record, wrapping at the fixed line width. A non-zero
/// repeat index is appended to the header.
fn write_fasta_record<W: Write>(
    w: &mut W,
    name: &str,
    comment: Option<&str>,
    rep: u64,
    seq: &[u8],
) -> Result<()> {
    match (comment, rep) {
        (Some(comment), 0) => writeln!(w, ">{name} {comment}")?,
        (Some(comment), n) => writeln!(w, ">{name} {comment}-{n}")?,
        (None, 0) => writeln!(w, ">{name}")?,
        (None, n) => writeln!(w, ">{name}-{n}")?,
    }
    for chunk in seq.chunks(FASTA_LINE_LEN) {
        w.write_all(chunk)?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// Working storage sized once per run and reused across sequences.
struct ShuffleTables {
    kmer: Vec<u64>,
    euler: Option<EulerTables>,
}

impl ShuffleTables {
    fn for_mode(mode: ShuffleMode, k: usize) -> Result<Self> {
        match mode {
            ShuffleMode::FisherYates | ShuffleMode::Linear => Ok(Self {
                kmer: Vec::new(),
                euler: None,
            }),
            ShuffleMode::Markov => Ok(Self {
                kmer: vec![0; table_size(k)?],
                euler: None,
            }),
            ShuffleMode::Euler => Ok(Self {
                kmer: vec![0; table_size(k)?],
                euler: Some(EulerTables::new(k)),
            }),
        }
    }
}

fn print_seq_detail(seq: &[u8]) {
    let mut counts = BaseCounts::new();
    counts.count(seq);
    let size = seq.len() as u64;
    let gaps = counts.count_of(b'.') + counts.count_of(b'-');
    let unknowns = size - gaps - counts.standard_bases();
    let gc = 100.0 * counts.gc_fraction();
    eprintln!(
        "  Sequence size: {size} ({:.2}% non-standard)",
        100.0 * unknowns as f64 / size as f64
    );
    eprintln!("  GC content: {gc:.2}%");
}

/// Shuffle every input sequence and write FASTA records.
///
/// FASTQ input is emitted as FASTA. Sequences shorter than `2k` are
/// skipped (with a note in verbose mode).
pub fn run_shuffle<W: Write>(
    writer: &mut W,
    source: &SequenceSource,
    config: &ShuffleConfig,
) -> Result<()> {
    config.validate()?;
    let mode = config.effective_mode();
    let k = config.k;
    let letters = if config.rna_out { &INDEX2RNA } else { &INDEX2DNA };
    if config.verbosity.verbose()
        && config.rna_out
        && matches!(mode, ShuffleMode::FisherYates | ShuffleMode::Linear)
    {
        eprintln!("Warning: RNA output is ignored when k is 1 or linear shuffling is used.");
    }
    let mut tables = ShuffleTables::for_mode(mode, k)?;
    let mut rng = SweepRng::with_seed(config.seed);
    let mut reader = source.reader()?;
    let mut n_seqs = 0u64;
    let mut markov_warning_emitted = false;
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| SweepError::Parse(format!("failed to read input: {e}")))?;
        n_seqs += 1;
        let header = String::from_utf8_lossy(record.id()).trim_end().to_string();
        let (name, comment) = match header.split_once(char::is_whitespace) {
            Some((name, comment)) => (name.to_string(), Some(comment.to_string())),
            None => (header, None),
        };
        let mut seq = record.seq().into_owned();
        if config.verbosity.verbose() {
            match &comment {
                Some(comment) => eprintln!("Shuffling sequence #{n_seqs}: {name} {comment}"),
                None => eprintln!("Shuffling sequence #{n_seqs}: {name}"),
            }
            if config.verbosity.very_verbose() {
                print_seq_detail(&seq);
            }
        }
        if config.reset_seed {
            rng = SweepRng::with_seed(config.seed);
        }
        if seq.len() < k * 2 {
            if config.verbosity.verbose() {
                eprintln!(
                    "! Warning: Sequence too short to shuffle (size = {}, k = {k})",
                    seq.len()
                );
            }
            continue;
        }
        if mode == ShuffleMode::Markov
            && seq.len() < 100
            && config.verbosity.verbose()
            && !markov_warning_emitted
        {
            eprintln!(
                "! Warning: Markov shuffling of small sequences may generate homopolymer repeats"
            );
            markov_warning_emitted = true;
        }
        for rep in 0..=config.repeats {
            match mode {
                ShuffleMode::FisherYates => shuffle_fisher_yates(&mut seq, &mut rng),
                ShuffleMode::Linear => shuffle_linear(&mut seq, k, &mut rng),
                ShuffleMode::Markov => {
                    count_kmers(&seq, k, &mut tables.kmer);
                    shuffle_markov(&mut seq, k, &mut tables.kmer, letters, &mut rng);
                }
                ShuffleMode::Euler => {
                    count_kmers(&seq, k, &mut tables.kmer);
                    let euler_tables = tables.euler.as_mut().ok_or_else(|| {
                        SweepError::Config("missing Euler tables".into())
                    })?;
                    shuffle_euler(&mut seq, k, &mut tables.kmer, euler_tables, letters, &mut rng);
                }
            }
            write_fasta_record(writer, &name, comment.as_deref(), rep, &seq)?;
        }
    }
    if n_seqs == 0 {
        return Err(SweepError::InvalidSequence(
            "failed to read any sequences from input".into(),
        ));
    }
    if config.verbosity.verbose() {
        eprintln!("Done.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write as _;

    fn sorted(bytes: &[u8]) -> Vec<u8> {
        let mut v = bytes.to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn fisher_yates_preserves_base_composition() {
        let original = b"ACGTACGTTTGCAGCATT".to_vec();
        let mut seq = original.clone();
        let mut rng = SweepRng::with_seed(4);
        shuffle_fisher_yates(&mut seq, &mut rng);
        assert_eq!(sorted(&seq), sorted(&original));
        assert_ne!(seq, original, "seed 4 should actually move something");
    }

    #[test]
    fn fisher_yates_is_seed_deterministic() {
        let mut a = b"ACGTACGTTTGCAGCATT".to_vec();
        let mut b = a.clone();
        shuffle_fisher_yates(&mut a, &mut SweepRng::with_seed(11));
        shuffle_fisher_yates(&mut b, &mut SweepRng::with_seed(11));
        assert_eq!(a, b);
    }

    #[test]
    fn linear_shuffle_moves_whole_blocks() {
        let original = b"AAACCCGGGTTTAT".to_vec();
        let mut seq = original.clone();
        let mut rng = SweepRng::with_seed(4);
        shuffle_linear(&mut seq, 3, &mut rng);
        // Trailing remainder (2 bases) untouched.
        assert_eq!(&seq[12..], b"AT");
        // The block multiset is preserved.
        let blocks = |s: &[u8]| {
            let mut m: HashMap<Vec<u8>, usize> = HashMap::new();
            for chunk in s[..12].chunks(3) {
                *m.entry(chunk.to_vec()).or_insert(0) += 1;
            }
            m
        };
        assert_eq!(blocks(&seq), blocks(&original));
    }

    fn run_to_string(fasta: &[u8], config: &ShuffleConfig) -> String {
        let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        file.write_all(fasta).unwrap();
        file.flush().unwrap();
        let source = SequenceSource::File(file.path().to_path_buf());
        let mut out = Vec::new();
        run_shuffle(&mut out, &source, config).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn fixed_seed_runs_are_byte_identical() {
        let fasta = b">s1\nACGGTCAGTACGGCATTGCAGCGGATAT\n>s2\nTTGCATGCAAGCTAGCTT\n";
        let config = ShuffleConfig::default();
        assert_eq!(run_to_string(fasta, &config), run_to_string(fasta, &config));
    }

    #[test]
    fn reset_seed_makes_identical_sequences_shuffle_identically() {
        let fasta = b">a\nACGGTCAGTACGGCATTGCA\n>b\nACGGTCAGTACGGCATTGCA\n";
        let config = ShuffleConfig {
            reset_seed: true,
            ..Default::default()
        };
        let out = run_to_string(fasta, &config);
        let records: Vec<&str> = out.split('>').filter(|s| !s.is_empty()).collect();
        let seq_of = |r: &str| r.lines().skip(1).collect::<String>();
        assert_eq!(seq_of(records[0]), seq_of(records[1]));
    }

    #[test]
    fn repeats_suffix_the_header() {
        let fasta = b">s1 width=20\nACGGTCAGTACGGCATTGCA\n";
        let config = ShuffleConfig {
            repeats: 2,
            ..Default::default()
        };
        let out = run_to_string(fasta, &config);
        assert!(out.contains(">s1 width=20\n"));
        assert!(out.contains(">s1 width=20-1\n"));
        assert!(out.contains(">s1 width=20-2\n"));
    }

    #[test]
    fn short_sequences_are_skipped() {
        let fasta = b">tiny\nACGT\n>ok\nACGGTCAGTACGGCATTGCA\n";
        let out = run_to_string(fasta, &ShuffleConfig::default());
        assert!(!out.contains(">tiny"));
        assert!(out.contains(">ok"));
    }

    #[test]
    fn fastq_input_becomes_fasta_output() {
        let mut file = tempfile::Builder::new().suffix(".fq").tempfile().unwrap();
        file.write_all(b"@read1\nACGGTCAGTACGGCATTGCA\n+\nIIIIIIIIIIIIIIIIIIII\n")
            .unwrap();
        file.flush().unwrap();
        let source = SequenceSource::File(file.path().to_path_buf());
        let mut out = Vec::new();
        run_shuffle(&mut out, &source, &ShuffleConfig::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(">read1\n"));
        assert!(!text.contains('+'));
    }

    #[test]
    fn output_wraps_at_sixty_columns() {
        let long = [b'A'; 150]
            .iter()
            .chain([b'C'; 50].iter())
            .copied()
            .collect::<Vec<u8>>();
        let mut fasta = b">long\n".to_vec();
        fasta.extend_from_slice(&long);
        fasta.push(b'\n');
        let config = ShuffleConfig {
            k: 1,
            ..Default::default()
        };
        let out = run_to_string(&fasta, &config);
        for line in out.lines().filter(|l| !l.starts_with('>')) {
            assert!(line.len() <= FASTA_LINE_LEN);
        }
    }

    #[test]
    fn euler_mode_preserves_kmers_end_to_end() {
        let seq = b"ACGGTCAGTACGGCATTGCAGCGGATATCCGGAAGCTT";
        let mut fasta = b">s\n".to_vec();
        fasta.extend_from_slice(seq);
        fasta.push(b'\n');
        let out = run_to_string(&fasta, &ShuffleConfig::default());
        let shuffled: String = out.lines().skip(1).collect();
        let multiset = |s: &[u8]| {
            let mut m: HashMap<Vec<u8>, usize> = HashMap::new();
            for w in s.windows(3) {
                *m.entry(w.to_vec()).or_insert(0) += 1;
            }
            m
        };
        assert_eq!(multiset(seq), multiset(shuffled.as_bytes()));
    }

    #[test]
    fn empty_input_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        file.write_all(b"").unwrap();
        file.flush().unwrap();
        let source = SequenceSource::File(file.path().to_path_buf());
        let mut out = Vec::new();
        assert!(run_shuffle(&mut out, &source, &ShuffleConfig::default()).is_err());
    }
}
