//! Output formatting: headers, statistics tables and the motif dump.
//!
//! P-values are printed in the shortest-form significant-digit style of
//! C's `%g`, so downstream tooling written against the original scanner
//! output keeps parsing.

use std::io::{self, Write};

use crate::alphabet::BaseCounts;
use crate::bed::{BedFile, BedRegion};
use crate::cdf::{score_to_pvalue, Threshold};
use crate::constants::{SCORE_SCALE, VERSION};
use crate::motif::Motif;
use crate::sequence::SequenceSummary;

/// Format `x` with `sig` significant digits, choosing fixed or
/// scientific notation the way `printf("%g")` does and trimming
/// trailing zeros.
#[must_use]
pub fn fmt_g(x: f64, sig: usize) -> String {
    debug_assert!(sig >= 1);
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    // Round to `sig` digits first; the rounded exponent decides the style.
    let rounded = format!("{:.*e}", sig - 1, x);
    let Some((mantissa, exp_str)) = rounded.split_once('e') else {
        return rounded;
    };
    let Ok(exp) = exp_str.parse::<i32>() else {
        return rounded;
    };
    if exp < -4 || exp >= sig as i32 {
        format!(
            "{}e{}{:02}",
            trim_zeros(mantissa),
            if exp < 0 { '-' } else { '+' },
            exp.abs()
        )
    } else {
        let decimals = (sig as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{x:.decimals$}"))
    }
}

fn trim_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Draw the scanning progress bar on stderr.
pub fn print_progress(frac: f64) {
    let width = 60usize;
    let left = ((frac * width as f64) as usize).min(width);
    let bar = "=".repeat(left);
    eprint!("\r[{bar:<width$}] {:3}%", (frac * 100.0) as u32);
    let _ = io::stderr().flush();
}

/// Write the `##` comment block that precedes hit records.
pub fn write_scan_header<W: Write>(
    w: &mut W,
    args_line: &str,
    motifs: &[Motif],
    summary: &SequenceSummary,
    bed: Option<&BedFile>,
    scan_rc: bool,
) -> io::Result<()> {
    writeln!(w, "##motifsweep v{VERSION} [ {args_line} ]")?;
    let motif_size: u64 = motifs.iter().map(|m| m.width() as u64).sum();
    match bed {
        Some(bed) => {
            writeln!(
                w,
                "##MotifCount={} MotifSize={} BedCount={} BedSize={} SeqCount={} SeqSize={} \
                 GC={:.2}% Ns={}",
                motifs.len(),
                motif_size,
                bed.regions.len(),
                bed.total_bases(),
                summary.len(),
                summary.total_bases,
                summary.gc_pct,
                summary.unknowns
            )?;
            writeln!(
                w,
                "##bed_range\tbed_name\tseq_name\tstart\tend\tstrand\tmotif\tpvalue\tscore\t\
                 score_pct\tmatch"
            )
        }
        None => {
            let mut max_possible_hits: u64 = 0;
            for motif in motifs {
                for &size in &summary.sizes {
                    max_possible_hits += (size + 1).saturating_sub(motif.width() as u64);
                }
            }
            if scan_rc {
                max_possible_hits *= 2;
            }
            writeln!(
                w,
                "##MotifCount={} MotifSize={} SeqCount={} SeqSize={} GC={:.2}% Ns={} \
                 MaxPossibleHits={}",
                motifs.len(),
                motif_size,
                summary.len(),
                summary.total_bases,
                summary.gc_pct,
                summary.unknowns,
                max_possible_hits
            )?;
            writeln!(
                w,
                "##seq_name\tstart\tend\tstrand\tmotif\tpvalue\tscore\tscore_pct\tmatch"
            )
        }
    }
}

/// Column header for the sequence-statistics mode.
pub fn write_seq_stats_header<W: Write>(w: &mut W, bed: bool) -> io::Result<()> {
    if bed {
        writeln!(w, "##bed_range\tbed_name\tseq_num\tseq_name\tsize\tgc_pct\tn_count")
    } else {
        writeln!(w, "##seq_num\tseq_name\tsize\tgc_pct\tn_count")
    }
}

/// GC percentage as printed in the stats tables: `nan` when the record
/// or region has no standard bases to take a fraction of.
fn fmt_gc(counts: &BaseCounts) -> String {
    if counts.standard_bases() == 0 {
        "nan".to_string()
    } else {
        format!("{:.2}", counts.gc_fraction() * 100.0)
    }
}

/// One line of per-sequence statistics.
pub fn write_seq_stats_line<W: Write>(
    w: &mut W,
    index: usize,
    name: &str,
    seq: &[u8],
) -> io::Result<()> {
    let mut counts = BaseCounts::new();
    counts.count(seq);
    let size = seq.len() as u64;
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}",
        index + 1,
        name,
        size,
        fmt_gc(&counts),
        size - counts.standard_bases()
    )
}

/// One line of per-region statistics in BED-restricted mode.
pub fn write_bed_stats_line<W: Write>(
    w: &mut W,
    region: &BedRegion,
    seq_name: &str,
    seq: &[u8],
) -> io::Result<()> {
    let slice = &seq[region.start as usize..region.end as usize];
    let mut counts = BaseCounts::new();
    counts.count(slice);
    writeln!(
        w,
        "{}:{}-{}({})\t{}\t{}\t{}\t{}\t{}\t{}",
        region.seq_name,
        region.start + 1,
        region.end,
        region.strand,
        region.name,
        region.seq_index + 1,
        seq_name,
        region.len(),
        fmt_gc(&counts),
        region.len() - counts.standard_bases()
    )
}

/// Human-readable dump of one motif: the PWM table, the threshold and
/// five score-to-p-value anchor points.
pub fn write_motif_dump<W: Write>(
    w: &mut W,
    motif: &Motif,
    index: u64,
    survival: &[f64],
    threshold: Threshold,
) -> io::Result<()> {
    writeln!(w, "Motif: {} (N{} L{})", motif.name, index, motif.line_num)?;
    match threshold {
        Threshold::Unreachable => writeln!(
            w,
            "MaxScore={:.2}\tThreshold=[exceeds max]",
            f64::from(motif.max_score()) / SCORE_SCALE
        )?,
        Threshold::Score(t) => writeln!(
            w,
            "MaxScore={:.2}\tThreshold={:.2}",
            f64::from(motif.max_score()) / SCORE_SCALE,
            f64::from(t) / SCORE_SCALE
        )?,
    }
    writeln!(w, "Motif PWM:\n\tA\tC\tG\tT")?;
    for pos in 0..motif.width() {
        writeln!(
            w,
            "{}:\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
            pos + 1,
            f64::from(motif.score(pos, 0)) / SCORE_SCALE,
            f64::from(motif.score(pos, 1)) / SCORE_SCALE,
            f64::from(motif.score(pos, 2)) / SCORE_SCALE,
            f64::from(motif.score(pos, 3)) / SCORE_SCALE
        )?;
    }
    let anchor = |score: i32| score_to_pvalue(survival, motif, score);
    writeln!(
        w,
        "Score={:.2}\t-->     p=1",
        f64::from(motif.min_score()) / SCORE_SCALE
    )?;
    writeln!(
        w,
        "Score={:.2}\t-->     p={}",
        f64::from(motif.min_score() / 2) / SCORE_SCALE,
        fmt_g(anchor(motif.min_score() / 2), 2)
    )?;
    writeln!(w, "Score=0.00\t-->     p={}", fmt_g(anchor(0), 2))?;
    writeln!(
        w,
        "Score={:.2}\t-->     p={}",
        f64::from(motif.max_score() / 2) / SCORE_SCALE,
        fmt_g(anchor(motif.max_score() / 2), 2)
    )?;
    writeln!(
        w,
        "Score={:.2}\t-->     p={}",
        f64::from(motif.max_score()) / SCORE_SCALE,
        fmt_g(anchor(motif.max_score()), 2)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_g_fixed_notation() {
        assert_eq!(fmt_g(1.0, 2), "1");
        assert_eq!(fmt_g(0.25, 9), "0.25");
        assert_eq!(fmt_g(0.000122, 2), "0.00012");
        assert_eq!(fmt_g(123.0, 6), "123");
        assert_eq!(fmt_g(-0.5, 3), "-0.5");
    }

    #[test]
    fn fmt_g_scientific_notation() {
        assert_eq!(fmt_g(1.2e-5, 2), "1.2e-05");
        assert_eq!(fmt_g(1e-10, 2), "1e-10");
        assert_eq!(fmt_g(1234.0, 2), "1.2e+03");
        assert_eq!(fmt_g(2.5e12, 3), "2.5e+12");
    }

    #[test]
    fn fmt_g_boundary_rounding_picks_the_right_style() {
        // Rounds up into the fixed range.
        assert_eq!(fmt_g(9.9999e-5, 2), "0.0001");
        assert_eq!(fmt_g(0.0, 9), "0");
    }

    #[test]
    fn fmt_g_non_finite() {
        assert_eq!(fmt_g(f64::NAN, 2), "nan");
        assert_eq!(fmt_g(f64::INFINITY, 2), "inf");
    }

    #[test]
    fn seq_stats_line_content() {
        let mut out = Vec::new();
        write_seq_stats_line(&mut out, 0, "chr1", b"GGCCAANN").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\tchr1\t8\t66.67\t2\n");
    }

    #[test]
    fn seq_stats_line_empty_sequence() {
        let mut out = Vec::new();
        write_seq_stats_line(&mut out, 1, "empty", b"").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2\tempty\t0\tnan\t0\n");
    }

    #[test]
    fn seq_stats_line_all_ambiguous_sequence() {
        // A non-empty gap record has no standard bases, so GC% has a
        // zero denominator and prints as nan like the original scanner.
        let mut out = Vec::new();
        write_seq_stats_line(&mut out, 0, "gap", b"NNNNNN").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\tgap\t6\tnan\t6\n");
    }

    #[test]
    fn bed_stats_line_all_ambiguous_region() {
        use crate::types::Strand;
        let region = BedRegion {
            seq_name: "chr1".to_string(),
            seq_index: 0,
            start: 2,
            end: 6,
            strand: Strand::Both,
            name: ".".to_string(),
            line_num: 1,
        };
        let mut out = Vec::new();
        write_bed_stats_line(&mut out, &region, "chr1", b"ACNNNNGT").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1:3-6(.)\t.\t1\tchr1\t4\tnan\t4\n"
        );
    }

    #[test]
    fn bed_stats_line_mixed_region_keeps_percentages() {
        use crate::types::Strand;
        let region = BedRegion {
            seq_name: "chr1".to_string(),
            seq_index: 1,
            start: 0,
            end: 4,
            strand: Strand::Forward,
            name: "peak".to_string(),
            line_num: 2,
        };
        let mut out = Vec::new();
        write_bed_stats_line(&mut out, &region, "chr1", b"GGCANNNN").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1:1-4(+)\tpeak\t2\tchr1\t4\t75.00\t0\n"
        );
    }
}
