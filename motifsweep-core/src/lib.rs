//! # motifsweep core
//!
//! Motif scanning and k-mer-preserving sequence shuffling for DNA/RNA.
//!
//! ## Overview
//!
//! The scanner converts probabilistic motif models (MEME, JASPAR, HOMER,
//! HOCOMOCO-PCM or an IUPAC consensus string) into integer position
//! weight matrices, computes each motif's exact score distribution by
//! convolution to derive a p-value threshold, and slides the motif over
//! every input sequence on both strands, optionally restricted to BED
//! ranges and parallelized across motifs.
//!
//! The shuffler rearranges sequences while preserving k-mer structure,
//! from a plain Fisher-Yates permutation up to a randomized
//! Eulerian-path walk that reproduces the exact k-mer multiset of the
//! input.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use motifsweep_core::config::ScanConfig;
//! use motifsweep_core::motif::parse::MotifSet;
//! use motifsweep_core::scanner::run_scan;
//! use motifsweep_core::sequence::SequenceSource;
//!
//! let motifs = MotifSet::from_consensus("TGACGTCA")?;
//! let source = SequenceSource::File("genome.fa".into());
//! let mut out = std::io::stdout();
//! run_scan(&mut out, &motifs, &source, None, &ScanConfig::default(), "")?;
//! # Ok::<(), motifsweep_core::types::SweepError>(())
//! ```
//!
//! ## Module organization
//!
//! - [`alphabet`]: nucleotide encoding shared by scanner and shuffler
//! - [`background`]: background base distribution
//! - [`motif`]: motif model, format detection and parsing
//! - [`cdf`]: exact score distributions and thresholds
//! - [`scanner`]: scanning orchestration and parallelism
//! - [`sequence`]: sequence input and residency modes
//! - [`bed`]: BED range restrictions
//! - [`shuffle`]: the four shuffle algorithms
//! - [`rng`]: the seedable generator behind reproducible shuffles
//! - [`report`]: output formatting
//! - [`config`]: run configuration
//! - [`types`]: errors and shared enums

pub mod alphabet;
pub mod background;
pub mod bed;
pub mod cdf;
pub mod config;
pub mod constants;
pub mod motif;
pub mod report;
pub mod rng;
pub mod scanner;
pub mod sequence;
pub mod shuffle;
pub mod types;

pub use types::{Result, SweepError};
