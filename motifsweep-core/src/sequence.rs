//! Sequence input and the in-memory registry.
//!
//! Sequences arrive as FASTA or FASTQ, plain or gzip-compressed, from a
//! file or standard input. Two residency modes exist: the default
//! low-memory mode records only names, lengths and composition on a
//! first pass and re-streams the bytes once per motif, while resident
//! mode (required for stdin and multi-threaded scans) keeps every
//! sequence in memory.

use std::collections::HashMap;
use std::path::PathBuf;

use needletail::{parse_fastx_file, parse_fastx_stdin, FastxReader};

use crate::alphabet::BaseCounts;
use crate::config::ScanConfig;
use crate::constants::MAX_SEQ_NAME_SIZE;
use crate::types::{Result, SweepError, Verbosity};

/// Where sequence records come from.
#[derive(Debug, Clone)]
pub enum SequenceSource {
    /// A FASTA/FASTQ file, optionally gzip-compressed.
    File(PathBuf),
    /// Standard input (forces resident mode; streams cannot rewind).
    Stdin,
}

impl SequenceSource {
    /// True for standard input.
    #[must_use]
    pub fn is_stdin(&self) -> bool {
        matches!(self, Self::Stdin)
    }

    /// Open a fresh reader over the source.
    pub fn reader(&self) -> Result<Box<dyn FastxReader>> {
        let reader = match self {
            Self::File(path) => parse_fastx_file(path),
            Self::Stdin => parse_fastx_stdin(),
        };
        reader.map_err(|e| SweepError::InvalidSequence(format!("failed to open input: {e}")))
    }
}

/// Names, sizes and composition of every input sequence.
///
/// This is everything the scanner needs besides the bytes themselves,
/// and all that low-memory mode keeps resident.
#[derive(Debug)]
pub struct SequenceSummary {
    /// Final (possibly deduplicated) record names, in input order.
    pub names: Vec<String>,
    /// Sequence lengths, in input order.
    pub sizes: Vec<u64>,
    /// Total bases across all records.
    pub total_bases: u64,
    /// Count of non-ACGTU bytes.
    pub unknowns: u64,
    /// GC percentage over standard bases.
    pub gc_pct: f64,
}

impl SequenceSummary {
    /// Number of sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no sequences were read (never survives loading).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Fully resident sequence registry.
#[derive(Debug)]
pub struct SequenceSet {
    /// Shared metadata.
    pub summary: SequenceSummary,
    /// Raw sequence bytes, parallel to `summary.names`.
    pub seqs: Vec<Vec<u8>>,
}

/// Assemble a record name from its header, applying the trimming policy
/// and the stored-name length limit.
fn record_name(id: &[u8], trim_names: bool) -> Result<String> {
    let full = String::from_utf8_lossy(id);
    let name = if trim_names {
        full.split_whitespace().next().unwrap_or("").to_string()
    } else {
        full.trim_end().to_string()
    };
    if name.len() > MAX_SEQ_NAME_SIZE {
        return Err(SweepError::Parse(format!(
            "sequence name is too large ({}>{MAX_SEQ_NAME_SIZE})",
            name.len()
        )));
    }
    Ok(name)
}

fn finish_summary(
    names: Vec<String>,
    sizes: Vec<u64>,
    counts: &BaseCounts,
    verbosity: Verbosity,
) -> Result<SequenceSummary> {
    if names.is_empty() {
        return Err(SweepError::InvalidSequence(
            "failed to read any sequences from input".into(),
        ));
    }
    let total_bases: u64 = sizes.iter().sum();
    if total_bases == 0 {
        return Err(SweepError::InvalidSequence(
            "only encountered empty sequences".into(),
        ));
    }
    let unknowns = total_bases - counts.standard_bases();
    if unknowns == total_bases {
        return Err(SweepError::InvalidSequence(
            "failed to read any standard DNA/RNA bases".into(),
        ));
    }
    let gc_pct = counts.gc_fraction() * 100.0;
    let unknowns_pct = 100.0 * unknowns as f64 / total_bases as f64;
    if unknowns_pct >= 90.0 {
        eprintln!("!!! Warning: Non-standard base count is extremely high !!! ({unknowns_pct:.2}%)");
    } else if unknowns_pct >= 50.0 && verbosity.verbose() {
        eprintln!("Warning: Non-standard base count is very high! ({unknowns_pct:.2}%)");
    } else if unknowns_pct >= 10.0 && verbosity.verbose() {
        eprintln!("Warning: Non-standard base count seems high. ({unknowns_pct:.2}%)");
    }
    if counts.spaces() > 0 && verbosity.verbose() {
        eprintln!(
            "Warning: Found spaces ({}) in sequences, these will be treated as gaps.",
            counts.spaces()
        );
    }
    if verbosity.verbose() {
        eprintln!(
            "Found {} base(s) across {} sequence(s) (GC={gc_pct:.2}%).",
            total_bases,
            names.len()
        );
        if unknowns > 0 {
            eprintln!("Found {unknowns} ({unknowns_pct:.2}%) non-standard bases.");
        }
    }
    Ok(SequenceSummary {
        names,
        sizes,
        total_bases,
        unknowns,
        gc_pct,
    })
}

/// Stream through the input once, recording names, lengths and base
/// composition but dropping the bytes. First pass of low-memory mode.
pub fn peek_summary(source: &SequenceSource, config: &ScanConfig) -> Result<SequenceSummary> {
    let mut reader = source.reader()?;
    let mut names = Vec::new();
    let mut sizes = Vec::new();
    let mut counts = BaseCounts::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| SweepError::Parse(format!("failed to read input: {e}")))?;
        names.push(record_name(record.id(), config.trim_names)?);
        let seq = record.seq();
        sizes.push(seq.len() as u64);
        counts.count(&seq);
    }
    finish_summary(names, sizes, &counts, config.verbosity)
}

/// Load every sequence into memory (resident mode).
pub fn load_resident(source: &SequenceSource, config: &ScanConfig) -> Result<SequenceSet> {
    let mut reader = source.reader()?;
    let mut names = Vec::new();
    let mut sizes = Vec::new();
    let mut seqs = Vec::new();
    let mut counts = BaseCounts::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| SweepError::Parse(format!("failed to read input: {e}")))?;
        names.push(record_name(record.id(), config.trim_names)?);
        let seq = record.seq().into_owned();
        sizes.push(seq.len() as u64);
        counts.count(&seq);
        seqs.push(seq);
    }
    let summary = finish_summary(names, sizes, &counts, config.verbosity)?;
    Ok(SequenceSet { summary, seqs })
}

/// Re-stream the input, handing each record's bytes to `f` in order.
/// Used once per motif in low-memory mode.
pub fn for_each_record<F>(source: &SequenceSource, mut f: F) -> Result<()>
where
    F: FnMut(usize, &[u8]) -> Result<()>,
{
    let mut reader = source.reader()?;
    let mut index = 0usize;
    while let Some(record) = reader.next() {
        let record =
            record.map_err(|e| SweepError::Parse(format!("failed to re-read input: {e}")))?;
        f(index, &record.seq())?;
        index += 1;
    }
    Ok(())
}

/// Resolve duplicate record names and build the name-to-index lookup
/// used for BED resolution.
///
/// Without deduplication any repeated name is fatal; with it, repeats
/// get an ordinal suffix. The lookup maps each final name to the index
/// of its record.
pub fn resolve_name_dupes(
    names: &mut [String],
    dedup: bool,
    used_with_bed: bool,
) -> Result<HashMap<String, usize>> {
    let mut lookup: HashMap<String, usize> = HashMap::with_capacity(names.len());
    let mut dupes = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if lookup.contains_key(name) {
            dupes.push(i);
        } else {
            lookup.insert(name.clone(), i);
        }
    }
    if dupes.is_empty() {
        return Ok(lookup);
    }
    if !dedup {
        let mut msg = if used_with_bed {
            String::from("encountered duplicate sequence name; these cannot exist with a BED file")
        } else {
            String::from("encountered duplicate sequence name (use -d to deduplicate)")
        };
        for &i in dupes.iter().take(5) {
            msg.push_str(&format!("\n    #{}: {}", i + 1, names[i]));
        }
        if dupes.len() > 5 {
            msg.push_str(&format!(
                "\n    ...\n    Found {} total non-unique names.",
                dupes.len()
            ));
        }
        return Err(SweepError::InvalidSequence(msg));
    }
    for &i in &dupes {
        let name = format!("{}__N{}", names[i], i + 1);
        if name.len() > MAX_SEQ_NAME_SIZE {
            return Err(SweepError::InvalidSequence(format!(
                "failed to deduplicate sequence #{}, name is too large",
                i + 1
            )));
        }
        lookup.insert(name.clone(), i);
        names[i] = name;
    }
    Ok(lookup)
}
