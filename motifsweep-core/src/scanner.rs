//! Motif scanning over sequences.
//!
//! Each motif is processed independently: its score distribution is
//! convolved in a per-worker scratch buffer, a threshold is derived, and
//! a window slides over every sequence (or BED range) scoring both
//! strands in one pass. Motifs are statically sharded across workers;
//! hits are formatted into a local buffer per motif and sequence, then
//! appended to the shared output under a lock so lines never interleave.

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::alphabet::{CHAR2INDEX, CHAR2MASKINDEX};
use crate::bed::{read_bed, BedFile, BedRegion};
use crate::cdf::{derive_threshold, score_to_pvalue, CdfScratch, Threshold, ThresholdMode};
use crate::config::ScanConfig;
use crate::constants::SCORE_SCALE;
use crate::motif::parse::MotifSet;
use crate::motif::Motif;
use crate::report;
use crate::sequence::{
    self, load_resident, peek_summary, resolve_name_dupes, SequenceSet, SequenceSource,
};
use crate::types::{Result, Strand, SweepError};

fn threshold_mode(motif_set: &MotifSet, config: &ScanConfig) -> ThresholdMode {
    if config.zero_threshold {
        ThresholdMode::ZeroScore
    } else if motif_set.is_consensus {
        ThresholdMode::ExactMatch
    } else {
        ThresholdMode::PValue(config.pvalue)
    }
}

fn index_table(config: &ScanConfig) -> &'static [u8; 256] {
    if config.mask_lower {
        &CHAR2MASKINDEX
    } else {
        &CHAR2INDEX
    }
}

#[inline]
fn score_window_both(motif: &Motif, window: &[u8], table: &[u8; 256]) -> (i32, i32) {
    let mut fwd = 0i32;
    let mut rc = 0i32;
    for (pos, &b) in window.iter().enumerate() {
        let idx = table[b as usize];
        fwd += motif.score(pos, idx);
        rc += motif.score_rc(pos, idx);
    }
    (fwd, rc)
}

#[inline]
fn score_window_fwd(motif: &Motif, window: &[u8], table: &[u8; 256]) -> i32 {
    window
        .iter()
        .enumerate()
        .map(|(pos, &b)| motif.score(pos, table[b as usize]))
        .sum()
}

#[inline]
fn score_window_rc(motif: &Motif, window: &[u8], table: &[u8; 256]) -> i32 {
    window
        .iter()
        .enumerate()
        .map(|(pos, &b)| motif.score_rc(pos, table[b as usize]))
        .sum()
}

#[allow(clippy::too_many_arguments)]
fn push_hit(
    buf: &mut Vec<u8>,
    region: Option<&BedRegion>,
    seq_name: &str,
    offset: usize,
    motif: &Motif,
    strand: char,
    score: i32,
    survival: &[f64],
    window: &[u8],
) {
    if let Some(region) = region {
        let _ = write!(
            buf,
            "{}:{}-{}({})\t{}\t",
            region.seq_name,
            region.start + 1,
            region.end,
            region.strand,
            region.name
        );
    }
    let pvalue = score_to_pvalue(survival, motif, score);
    let _ = write!(
        buf,
        "{}\t{}\t{}\t{}\t{}\t{}\t{:.3}\t{:.1}\t",
        seq_name,
        offset + 1,
        offset + motif.width(),
        strand,
        motif.name,
        report::fmt_g(pvalue, 9),
        f64::from(score) / SCORE_SCALE,
        100.0 * f64::from(score) / f64::from(motif.max_score())
    );
    buf.extend_from_slice(window);
    buf.push(b'\n');
}

/// Slide one motif over a whole sequence, buffering hit lines.
#[allow(clippy::too_many_arguments)]
fn scan_sequence(
    motif: &Motif,
    survival: &[f64],
    threshold: i32,
    seq: &[u8],
    seq_name: &str,
    scan_rc: bool,
    table: &[u8; 256],
    buf: &mut Vec<u8>,
) {
    let width = motif.width();
    if seq.len() < width {
        return;
    }
    for offset in 0..=seq.len() - width {
        let window = &seq[offset..offset + width];
        if scan_rc {
            let (fwd, rc) = score_window_both(motif, window, table);
            if fwd >= threshold {
                push_hit(buf, None, seq_name, offset, motif, '+', fwd, survival, window);
            }
            if rc >= threshold {
                push_hit(buf, None, seq_name, offset, motif, '-', rc, survival, window);
            }
        } else {
            let fwd = score_window_fwd(motif, window, table);
            if fwd >= threshold {
                push_hit(buf, None, seq_name, offset, motif, '+', fwd, survival, window);
            }
        }
    }
}

/// Slide one motif over one BED range. Strand-restricted ranges only
/// compute the strand they need.
fn scan_region(
    motif: &Motif,
    survival: &[f64],
    threshold: i32,
    seq: &[u8],
    region: &BedRegion,
    table: &[u8; 256],
    buf: &mut Vec<u8>,
) {
    let width = motif.width();
    let start = region.start as usize;
    let end = region.end as usize;
    if end - start < width {
        return;
    }
    for offset in start..=end - width {
        let window = &seq[offset..offset + width];
        match region.strand {
            Strand::Both => {
                let (fwd, rc) = score_window_both(motif, window, table);
                if fwd >= threshold {
                    push_hit(
                        buf,
                        Some(region),
                        &region.seq_name,
                        offset,
                        motif,
                        '+',
                        fwd,
                        survival,
                        window,
                    );
                }
                if rc >= threshold {
                    push_hit(
                        buf,
                        Some(region),
                        &region.seq_name,
                        offset,
                        motif,
                        '-',
                        rc,
                        survival,
                        window,
                    );
                }
            }
            Strand::Forward => {
                let fwd = score_window_fwd(motif, window, table);
                if fwd >= threshold {
                    push_hit(
                        buf,
                        Some(region),
                        &region.seq_name,
                        offset,
                        motif,
                        '+',
                        fwd,
                        survival,
                        window,
                    );
                }
            }
            Strand::Reverse => {
                let rc = score_window_rc(motif, window, table);
                if rc >= threshold {
                    push_hit(
                        buf,
                        Some(region),
                        &region.seq_name,
                        offset,
                        motif,
                        '-',
                        rc,
                        survival,
                        window,
                    );
                }
            }
        }
    }
}

/// Scan one thresholded motif over the resident registry, flushing one
/// buffered block per sequence or range through the shared writer.
fn scan_motif_over_set<W: Write>(
    motif: &Motif,
    survival: &[f64],
    threshold: Threshold,
    set: &SequenceSet,
    bed: Option<&BedFile>,
    config: &ScanConfig,
    writer: &Mutex<W>,
) -> Result<()> {
    let Threshold::Score(threshold) = threshold else {
        return Ok(());
    };
    if motif.is_empty() {
        return Ok(());
    }
    let table = index_table(config);
    let mut buf = Vec::new();
    match bed {
        None => {
            for (j, seq) in set.seqs.iter().enumerate() {
                buf.clear();
                scan_sequence(
                    motif,
                    survival,
                    threshold,
                    seq,
                    &set.summary.names[j],
                    config.scan_rc,
                    table,
                    &mut buf,
                );
                if !buf.is_empty() {
                    let mut w = writer.lock().unwrap_or_else(|e| e.into_inner());
                    w.write_all(&buf)?;
                }
            }
        }
        Some(bed) => {
            for region in &bed.regions {
                buf.clear();
                scan_region(
                    motif,
                    survival,
                    threshold,
                    &set.seqs[region.seq_index],
                    region,
                    table,
                    &mut buf,
                );
                if !buf.is_empty() {
                    let mut w = writer.lock().unwrap_or_else(|e| e.into_inner());
                    w.write_all(&buf)?;
                }
            }
        }
    }
    Ok(())
}

/// Resident-mode scan: motifs statically sharded over a thread pool,
/// each worker owning its convolution scratch.
fn scan_resident<W: Write + Send>(
    motif_set: &MotifSet,
    set: &SequenceSet,
    bed: Option<&BedFile>,
    config: &ScanConfig,
    mode: ThresholdMode,
    nthreads: usize,
    writer: &mut W,
) -> Result<()> {
    let motifs = &motif_set.motifs;
    let n = motifs.len();
    let mut shards: Vec<Vec<usize>> = vec![Vec::new(); nthreads];
    for i in 0..n {
        shards[i * nthreads / n].push(i);
    }
    let writer = Mutex::new(writer);
    let progress = Mutex::new(0u64);
    if config.progress {
        report::print_progress(0.0);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nthreads)
        .build()
        .map_err(|e| SweepError::Config(format!("failed to build thread pool: {e}")))?;
    pool.install(|| {
        shards.par_iter().try_for_each(|shard| -> Result<()> {
            let mut scratch = CdfScratch::new();
            for &mi in shard {
                let motif = &motifs[mi];
                if config.verbosity.very_verbose() && !config.progress {
                    eprintln!("    Scanning motif: {}", motif.name);
                }
                let survival = scratch.fill_cdf(motif, &motif_set.background, config.verbosity)?;
                let threshold = derive_threshold(motif, survival, mode, config.verbosity);
                scan_motif_over_set(motif, survival, threshold, set, bed, config, &writer)?;
                if config.progress {
                    let mut count = progress.lock().unwrap_or_else(|e| e.into_inner());
                    *count += 1;
                    report::print_progress(*count as f64 / n as f64);
                }
            }
            Ok(())
        })
    })?;
    if config.progress {
        eprintln!();
    }
    Ok(())
}

/// Low-memory scan: single-threaded, re-reading the whole input once per
/// motif so only one sequence is ever resident.
fn scan_low_mem<W: Write>(
    motif_set: &MotifSet,
    source: &SequenceSource,
    names: &[String],
    bed: Option<&BedFile>,
    config: &ScanConfig,
    mode: ThresholdMode,
    writer: &mut W,
) -> Result<()> {
    let motifs = &motif_set.motifs;
    let table = index_table(config);
    let mut scratch = CdfScratch::new();
    if config.progress {
        report::print_progress(0.0);
    }
    for (mi, motif) in motifs.iter().enumerate() {
        if config.verbosity.very_verbose() && !config.progress {
            eprintln!("    Scanning motif: {}", motif.name);
        }
        let survival = scratch.fill_cdf(motif, &motif_set.background, config.verbosity)?;
        let threshold = derive_threshold(motif, survival, mode, config.verbosity);
        if let (Threshold::Score(threshold), false) = (threshold, motif.is_empty()) {
            let mut buf = Vec::new();
            sequence::for_each_record(source, |j, seq| {
                if j >= names.len() {
                    return Err(SweepError::InvalidSequence(
                        "input gained sequences while being re-read".into(),
                    ));
                }
                buf.clear();
                match bed {
                    None => scan_sequence(
                        motif,
                        survival,
                        threshold,
                        seq,
                        &names[j],
                        config.scan_rc,
                        table,
                        &mut buf,
                    ),
                    Some(bed) => {
                        for region in bed.regions.iter().filter(|r| r.seq_index == j) {
                            scan_region(motif, survival, threshold, seq, region, table, &mut buf);
                        }
                    }
                }
                if !buf.is_empty() {
                    writer.write_all(&buf)?;
                }
                Ok(())
            })?;
        }
        if config.progress {
            report::print_progress((mi + 1) as f64 / motifs.len() as f64);
        }
    }
    if config.progress {
        eprintln!();
    }
    Ok(())
}

/// Run a full scan: load sequences, resolve BED restrictions, write the
/// header block and emit hit records.
///
/// `args_line` is echoed into the output header so results are
/// self-describing.
pub fn run_scan<W: Write + Send>(
    writer: &mut W,
    motif_set: &MotifSet,
    source: &SequenceSource,
    bed_path: Option<&Path>,
    config: &ScanConfig,
    args_line: &str,
) -> Result<()> {
    config.validate()?;
    if config.dedup && bed_path.is_some() {
        return Err(SweepError::Config(
            "cannot deduplicate names when scanning within a BED file".into(),
        ));
    }
    let n = motif_set.motifs.len();
    let nthreads = if motif_set.is_consensus {
        1
    } else {
        config.effective_threads(n)
    };
    if config.threads > 1 && nthreads == 1 {
        eprintln!("Note: Multi-threading not available for current inputs.");
    }
    let mut low_mem = config.low_mem;
    if (source.is_stdin() || nthreads > 1) && low_mem {
        if config.verbosity.verbose() {
            eprintln!("Deactivating low-mem mode.");
        }
        low_mem = false;
    }
    if config.verbosity.verbose() && low_mem {
        eprintln!("Running in low-mem mode.");
    }

    let (mut summary, set) = if low_mem {
        (peek_summary(source, config)?, None)
    } else {
        let set = load_resident(source, config)?;
        (set.summary, Some(set.seqs))
    };
    let lookup = resolve_name_dupes(&mut summary.names, config.dedup, bed_path.is_some())?;

    let bed = match bed_path {
        Some(path) => {
            if config.verbosity.verbose() {
                eprintln!("Reading bed file ...");
            }
            let mut bed = read_bed(path, config.trim_names)?;
            bed.resolve_indices(&lookup)?;
            bed.clip_to_sizes(&summary.sizes, config.verbosity)?;
            if config.verbosity.verbose() {
                eprintln!(
                    "Found {} range(s) covering {} base(s) across {} sequence(s).",
                    bed.regions.len(),
                    bed.total_bases(),
                    bed.covered_seq_count(summary.len())
                );
            }
            if !config.scan_rc && config.verbosity.verbose() {
                eprintln!("Warning: Forward-only scanning is ignored with a BED file.");
            }
            Some(bed)
        }
        None => None,
    };

    report::write_scan_header(
        writer,
        args_line,
        &motif_set.motifs,
        &summary,
        bed.as_ref(),
        config.scan_rc,
    )?;

    let mode = threshold_mode(motif_set, config);
    if config.verbosity.verbose() {
        eprintln!("Scanning ...");
    }
    if let Some(seqs) = set {
        let set = SequenceSet { summary, seqs };
        scan_resident(motif_set, &set, bed.as_ref(), config, mode, nthreads, writer)?;
    } else {
        scan_low_mem(
            motif_set,
            source,
            &summary.names,
            bed.as_ref(),
            config,
            mode,
            writer,
        )?;
    }
    Ok(())
}

/// No sequences supplied: parse, threshold and pretty-print every motif.
pub fn run_motif_dump<W: Write>(
    writer: &mut W,
    motif_set: &MotifSet,
    config: &ScanConfig,
) -> Result<()> {
    config.validate()?;
    if config.verbosity.verbose() {
        eprintln!("No sequences provided, parsing + printing motifs before exit.");
    }
    let mode = threshold_mode(motif_set, config);
    let mut scratch = CdfScratch::new();
    for (i, motif) in motif_set.motifs.iter().enumerate() {
        let survival = scratch.fill_cdf(motif, &motif_set.background, config.verbosity)?;
        let threshold = derive_threshold(motif, survival, mode, config.verbosity);
        writeln!(writer, "----------------------------------------")?;
        report::write_motif_dump(writer, motif, i as u64 + 1, survival, threshold)?;
    }
    writeln!(writer, "----------------------------------------")?;
    Ok(())
}

/// No motifs supplied: print per-sequence (or per-BED-range) statistics.
pub fn run_seq_stats<W: Write>(
    writer: &mut W,
    source: &SequenceSource,
    bed_path: Option<&Path>,
    config: &ScanConfig,
) -> Result<()> {
    config.validate()?;
    if config.dedup && bed_path.is_some() {
        return Err(SweepError::Config(
            "cannot deduplicate names when scanning within a BED file".into(),
        ));
    }
    let low_mem = config.low_mem && !source.is_stdin();
    let (mut summary, seqs) = if low_mem {
        (peek_summary(source, config)?, None)
    } else {
        let set = load_resident(source, config)?;
        (set.summary, Some(set.seqs))
    };
    let lookup = resolve_name_dupes(&mut summary.names, config.dedup, bed_path.is_some())?;
    let bed = match bed_path {
        Some(path) => {
            let mut bed = read_bed(path, config.trim_names)?;
            bed.resolve_indices(&lookup)?;
            bed.clip_to_sizes(&summary.sizes, config.verbosity)?;
            Some(bed)
        }
        None => None,
    };
    if config.verbosity.verbose() {
        eprintln!("No motifs provided, printing sequence stats before exit.");
    }
    report::write_seq_stats_header(writer, bed.is_some())?;
    match (seqs, &bed) {
        (Some(seqs), None) => {
            for (j, seq) in seqs.iter().enumerate() {
                report::write_seq_stats_line(writer, j, &summary.names[j], seq)?;
            }
        }
        (Some(seqs), Some(bed)) => {
            for region in &bed.regions {
                report::write_bed_stats_line(
                    writer,
                    region,
                    &summary.names[region.seq_index],
                    &seqs[region.seq_index],
                )?;
            }
        }
        (None, _) => {
            sequence::for_each_record(source, |j, seq| {
                if j >= summary.len() {
                    return Err(SweepError::InvalidSequence(
                        "input gained sequences while being re-read".into(),
                    ));
                }
                match &bed {
                    None => report::write_seq_stats_line(writer, j, &summary.names[j], seq)?,
                    Some(bed) => {
                        for region in bed.regions.iter().filter(|r| r.seq_index == j) {
                            report::write_bed_stats_line(
                                writer,
                                region,
                                &summary.names[j],
                                seq,
                            )?;
                        }
                    }
                }
                Ok(())
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::Background;
    use crate::types::Verbosity;
    use std::io::Write as _;

    fn fasta(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn consensus_set(consensus: &str) -> MotifSet {
        MotifSet::from_consensus(consensus).unwrap()
    }

    fn scan_to_string(
        motif_set: &MotifSet,
        fasta_bytes: &[u8],
        bed: Option<&Path>,
        config: &ScanConfig,
    ) -> String {
        let file = fasta(fasta_bytes);
        let source = SequenceSource::File(file.path().to_path_buf());
        let mut out = Vec::new();
        run_scan(&mut out, motif_set, &source, bed, config, "test").unwrap();
        String::from_utf8(out).unwrap()
    }

    fn hit_lines(output: &str) -> Vec<&str> {
        output.lines().filter(|l| !l.starts_with("##")).collect()
    }

    #[test]
    fn consensus_exact_match_scores_100_percent() {
        let set = consensus_set("ACGT");
        let config = ScanConfig::default();
        let out = scan_to_string(&set, b">s\nTTTACGTTTT\n", None, &config);
        let hits = hit_lines(&out);
        // Forward exact match at 4..7 plus the reverse-complement ACGT
        // at the same offset (ACGT is its own reverse complement).
        assert_eq!(hits.len(), 2, "output:\n{out}");
        let fields: Vec<&str> = hits[0].split('\t').collect();
        assert_eq!(fields[0], "s");
        assert_eq!(fields[1], "4");
        assert_eq!(fields[2], "7");
        assert_eq!(fields[3], "+");
        assert_eq!(fields[4], "ACGT");
        assert_eq!(fields[7], "100.0");
        assert_eq!(fields[8], "ACGT");
    }

    #[test]
    fn forward_only_skips_reverse_hits() {
        let set = consensus_set("ACGT");
        let config = ScanConfig {
            scan_rc: false,
            ..Default::default()
        };
        let out = scan_to_string(&set, b">s\nTTTACGTTTT\n", None, &config);
        assert_eq!(hit_lines(&out).len(), 1);
    }

    #[test]
    fn reverse_complement_hits_are_reported_on_minus() {
        // Motif AAACCC; sequence contains its reverse complement GGGTTT.
        let set = consensus_set("AAACCC");
        let config = ScanConfig::default();
        let out = scan_to_string(&set, b">s\nTTGGGTTTCA\n", None, &config);
        let hits = hit_lines(&out);
        assert_eq!(hits.len(), 1, "output:\n{out}");
        let fields: Vec<&str> = hits[0].split('\t').collect();
        assert_eq!(fields[3], "-");
        assert_eq!(fields[8], "GGGTTT");
    }

    #[test]
    fn zero_threshold_reports_nonnegative_scores() {
        let set = consensus_set("AC");
        let config = ScanConfig {
            zero_threshold: true,
            ..Default::default()
        };
        let out = scan_to_string(&set, b">s\nACAC\n", None, &config);
        for line in hit_lines(&out) {
            let score: f64 = line.split('\t').nth(6).unwrap().parse().unwrap();
            assert!(score >= 0.0);
        }
        assert!(!hit_lines(&out).is_empty());
    }

    #[test]
    fn last_window_is_scanned() {
        let set = consensus_set("ACGT");
        let config = ScanConfig::default();
        let out = scan_to_string(&set, b">s\nTTTTACGT\n", None, &config);
        let hits = hit_lines(&out);
        assert!(
            hits.iter().any(|l| l.split('\t').nth(1) == Some("5")),
            "final offset must be scanned:\n{out}"
        );
    }

    #[test]
    fn ambiguous_bases_block_hits() {
        let set = consensus_set("ACGT");
        let config = ScanConfig::default();
        let out = scan_to_string(&set, b">s\nTTTACNTTTT\n", None, &config);
        assert!(hit_lines(&out).is_empty());
    }

    #[test]
    fn masked_lowercase_blocks_hits_only_with_flag() {
        let set = consensus_set("ACGT");
        let out = scan_to_string(&set, b">s\nTTTacgtTTT\n", None, &ScanConfig::default());
        assert_eq!(hit_lines(&out).len(), 2);
        let config = ScanConfig {
            mask_lower: true,
            ..Default::default()
        };
        let out = scan_to_string(&set, b">s\nTTTacgtTTT\n", None, &config);
        assert!(hit_lines(&out).is_empty());
    }

    #[test]
    fn low_mem_and_resident_agree() {
        let set = consensus_set("ACG");
        let fasta_bytes = b">a\nACGACGACG\n>b\nTTTCGTTT\n";
        let low = scan_to_string(
            &set,
            fasta_bytes,
            None,
            &ScanConfig {
                low_mem: true,
                ..Default::default()
            },
        );
        let resident = scan_to_string(
            &set,
            fasta_bytes,
            None,
            &ScanConfig {
                low_mem: false,
                ..Default::default()
            },
        );
        assert_eq!(hit_lines(&low), hit_lines(&resident));
    }

    #[test]
    fn bed_restriction_limits_hits_and_prefixes_columns() {
        let set = consensus_set("ACGT");
        let mut bed = tempfile::NamedTempFile::new().unwrap();
        bed.write_all(b"s\t0\t6\trange-a\t0\t+\n").unwrap();
        bed.flush().unwrap();
        let config = ScanConfig::default();
        // Exact match at offset 2 (inside range) and offset 8 (outside).
        let out = scan_to_string(
            &set,
            b">s\nTTACGTTTACGT\n",
            Some(bed.path()),
            &config,
        );
        let hits = hit_lines(&out);
        assert_eq!(hits.len(), 1, "output:\n{out}");
        let fields: Vec<&str> = hits[0].split('\t').collect();
        assert_eq!(fields[0], "s:1-6(+)");
        assert_eq!(fields[1], "range-a");
        assert_eq!(fields[2], "s");
        assert_eq!(fields[3], "3");
    }

    #[test]
    fn bed_minus_strand_only_reports_reverse() {
        let set = consensus_set("AAACCC");
        let mut bed = tempfile::NamedTempFile::new().unwrap();
        bed.write_all(b"s\t0\t12\tr\t0\t-\n").unwrap();
        bed.flush().unwrap();
        let out = scan_to_string(
            &set,
            b">s\nTTGGGTTTCAAA\n",
            Some(bed.path()),
            &ScanConfig::default(),
        );
        let hits = hit_lines(&out);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].contains("(-)"));
    }

    #[test]
    fn multithreaded_scan_matches_single_thread() {
        // Two motifs so sharding actually distributes work.
        let meme = "\
MEME version 4

MOTIF m1
letter-probability matrix:
 1.0 0.0 0.0 0.0
 0.0 1.0 0.0 0.0
 0.0 0.0 1.0 0.0

MOTIF m2
letter-probability matrix:
 0.0 0.0 0.0 1.0
 0.0 0.0 1.0 0.0
 0.0 1.0 0.0 0.0
";
        let config1 = ScanConfig {
            zero_threshold: true,
            low_mem: false,
            ..Default::default()
        };
        let set = crate::motif::parse::load_motifs(meme, &config1).unwrap();
        let fasta_bytes: &[u8] = b">s1\nACGTGCACGACG\n>s2\nTGCATGCTGCA\n";
        let single = scan_to_string(&set, fasta_bytes, None, &config1);
        let config2 = ScanConfig {
            threads: 2,
            ..config1.clone()
        };
        let multi = scan_to_string(&set, fasta_bytes, None, &config2);
        let mut single_hits = hit_lines(&single);
        let mut multi_hits = hit_lines(&multi);
        single_hits.sort_unstable();
        multi_hits.sort_unstable();
        assert_eq!(single_hits, multi_hits);
    }

    #[test]
    fn duplicate_sequence_names_abort_without_dedup() {
        let set = consensus_set("ACGT");
        let file = fasta(b">s\nACGTAA\n>s\nACGTTT\n");
        let source = SequenceSource::File(file.path().to_path_buf());
        let mut out = Vec::new();
        let err = run_scan(
            &mut out,
            &set,
            &source,
            None,
            &ScanConfig::default(),
            "test",
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        let config = ScanConfig {
            dedup: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        run_scan(&mut out, &set, &source, None, &config, "test").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("s__N2"), "output:\n{text}");
    }

    #[test]
    fn header_reports_counts_and_max_hits() {
        let set = consensus_set("ACGT");
        let out = scan_to_string(&set, b">s\nACGTACGT\n", None, &ScanConfig::default());
        let header: Vec<&str> = out.lines().filter(|l| l.starts_with("##")).collect();
        assert_eq!(header.len(), 3);
        assert!(header[0].starts_with("##motifsweep v"));
        // 8 bases, width 4: 5 windows, both strands.
        assert!(header[1].contains("MaxPossibleHits=10"), "{}", header[1]);
        assert!(header[1].contains("MotifCount=1"));
    }

    #[test]
    fn motif_dump_lists_pwm_and_anchors() {
        let set = consensus_set("ACGT");
        let mut out = Vec::new();
        run_motif_dump(&mut out, &set, &ScanConfig::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Motif: ACGT (N1 L0)"));
        assert!(text.contains("Motif PWM:"));
        assert!(text.contains("Score=0.00"));
        assert!(text.contains("p=1"));
    }

    #[test]
    fn seq_stats_mode_reports_sizes_and_gc() {
        let file = fasta(b">a\nGGCC\n>b\nAATTNN\n");
        let source = SequenceSource::File(file.path().to_path_buf());
        let mut out = Vec::new();
        run_seq_stats(&mut out, &source, None, &ScanConfig::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1\ta\t4\t100.00\t0"));
        assert!(text.contains("2\tb\t6\t0.00\t2"));
    }

    #[test]
    fn unreachable_motifs_emit_nothing() {
        // Width-1 motif cannot reach p=1e-4.
        let set = MotifSet {
            motifs: vec![
                Motif::from_consensus("A", &Background::uniform(), 1000, 1).unwrap(),
            ],
            background: Background::uniform(),
            format: None,
            is_consensus: false,
        };
        let config = ScanConfig {
            verbosity: Verbosity::Quiet,
            ..Default::default()
        };
        let out = scan_to_string(&set, b">s\nAAAAAAAA\n", None, &config);
        assert!(hit_lines(&out).is_empty(), "output:\n{out}");
    }
}
