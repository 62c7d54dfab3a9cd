//! BED files restricting where scanning happens.
//!
//! Only the first six columns matter: chrom, start, end, an optional
//! range name, an ignored score column, and an optional strand. Ranges
//! are validated against the loaded sequence registry after parsing.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::constants::MAX_SEQ_NAME_SIZE;
use crate::types::{Result, Strand, SweepError, Verbosity};

/// One scanning restriction: a half-open `[start, end)` interval on a
/// named sequence, optionally limited to one strand.
#[derive(Debug, Clone)]
pub struct BedRegion {
    /// Sequence (chromosome) name from column 1.
    pub seq_name: String,
    /// Index into the sequence registry, filled by [`BedFile::resolve_indices`].
    pub seq_index: usize,
    /// 0-based inclusive start.
    pub start: u64,
    /// 0-based exclusive end.
    pub end: u64,
    /// Strand restriction from column 6 (both strands when absent).
    pub strand: Strand,
    /// Range name from column 4, `.` when absent.
    pub name: String,
    /// Source line, for error messages.
    pub line_num: u64,
}

impl BedRegion {
    /// Number of bases covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Ranges are never empty; `start < end` is enforced at parse time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A parsed BED file plus its line accounting.
#[derive(Debug)]
pub struct BedFile {
    /// Regions in file order.
    pub regions: Vec<BedRegion>,
    /// Total lines read.
    pub n_lines: u64,
    /// Comment/browser/track lines skipped.
    pub n_comments: u64,
    /// Blank lines skipped.
    pub n_empty: u64,
}

fn read_maybe_gzip(path: &Path) -> Result<String> {
    let mut raw = Vec::new();
    File::open(path)?.read_to_end(&mut raw)?;
    if raw.starts_with(&[0x1f, 0x8b]) {
        let mut text = String::new();
        MultiGzDecoder::new(&raw[..]).read_to_string(&mut text)?;
        Ok(text)
    } else {
        String::from_utf8(raw)
            .map_err(|_| SweepError::Parse("BED file is not valid UTF-8".into()))
    }
}

fn checked_name(field: &str, what: &str, line_num: u64, trim: bool) -> Result<String> {
    if field.is_empty() {
        return Err(SweepError::InvalidBed(format!(
            "line {line_num} in bed has an empty {what}"
        )));
    }
    if field.len() > MAX_SEQ_NAME_SIZE {
        return Err(SweepError::InvalidBed(format!(
            "{what} in bed on line {line_num} is too large ({}>{MAX_SEQ_NAME_SIZE})",
            field.len()
        )));
    }
    let name = if trim {
        field.split(' ').next().unwrap_or(field)
    } else {
        field
    };
    Ok(name.to_string())
}

fn parse_coord(field: &str, what: &str, line: &str, line_num: u64) -> Result<u64> {
    let cleaned = field.trim();
    if cleaned.is_empty() {
        return Err(SweepError::InvalidBed(format!(
            "line {line_num} in bed has an empty {what} field"
        )));
    }
    cleaned.parse::<u64>().map_err(|_| {
        SweepError::InvalidBed(format!(
            "failed to parse bed {what} value on line {line_num}\n  Line: {line}\n  Bad value: '{cleaned}'"
        ))
    })
}

/// Read and validate a BED file (plain or gzipped).
pub fn read_bed(path: &Path, trim_names: bool) -> Result<BedFile> {
    let text = read_maybe_gzip(path)?;
    let mut bed = BedFile {
        regions: Vec::new(),
        n_lines: 0,
        n_comments: 0,
        n_empty: 0,
    };
    for raw in text.lines() {
        bed.n_lines += 1;
        let line_num = bed.n_lines;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            bed.n_empty += 1;
            continue;
        }
        if line.starts_with('#') || line.starts_with("browser") || line.starts_with("track") {
            bed.n_comments += 1;
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(SweepError::InvalidBed(format!(
                "encountered line {line_num} in bed with fewer than 3 tab-separated fields"
            )));
        }
        let strand = if fields.len() >= 6 {
            let field = fields[5].trim();
            let mut chars = field.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Strand::from_bed_char(c).ok_or_else(|| {
                    SweepError::InvalidBed(format!(
                        "line {line_num} in bed has an incorrect strand character \
                         (found '{field}', need +/-/.)"
                    ))
                })?,
                _ => {
                    return Err(SweepError::InvalidBed(format!(
                        "line {line_num} in bed does not have a single character in the \
                         strand field (found '{field}')"
                    )))
                }
            }
        } else {
            Strand::Both
        };
        let start = parse_coord(fields[1], "start", line, line_num)?;
        let end = parse_coord(fields[2], "end", line, line_num)?;
        if start >= end {
            return Err(SweepError::InvalidBed(format!(
                "line {line_num} in bed has a start >= end value"
            )));
        }
        let name = if fields.len() >= 4 {
            checked_name(fields[3], "range name", line_num, trim_names)?
        } else {
            ".".to_string()
        };
        let seq_name = checked_name(fields[0], "sequence name", line_num, trim_names)?;
        bed.regions.push(BedRegion {
            seq_name,
            seq_index: 0,
            start,
            end,
            strand,
            name,
            line_num,
        });
    }
    if bed.regions.is_empty() {
        return Err(SweepError::InvalidBed(
            "failed to read any records in bed file".into(),
        ));
    }
    Ok(bed)
}

impl BedFile {
    /// Resolve every region's sequence name against the registry.
    pub fn resolve_indices(&mut self, lookup: &HashMap<String, usize>) -> Result<()> {
        for (i, region) in self.regions.iter_mut().enumerate() {
            match lookup.get(&region.seq_name) {
                Some(&index) => region.seq_index = index,
                None => {
                    return Err(SweepError::InvalidBed(format!(
                        "range #{} in bed file has a sequence name not in input sequences ({})",
                        i + 1,
                        region.seq_name
                    )))
                }
            }
        }
        Ok(())
    }

    /// Check ranges against sequence lengths: fully out-of-bounds ranges
    /// are fatal, partially overflowing ones are clipped with a warning.
    pub fn clip_to_sizes(&mut self, sizes: &[u64], verbosity: Verbosity) -> Result<()> {
        for (i, region) in self.regions.iter_mut().enumerate() {
            let size = sizes[region.seq_index];
            if region.start + 1 > size {
                return Err(SweepError::InvalidBed(format!(
                    "range #{} in bed file is out of bounds on sequence {} \
                     (bed range = {}-{}, sequence size = {size})",
                    i + 1,
                    region.seq_name,
                    region.start + 1,
                    region.end
                )));
            }
            if region.end > size {
                if verbosity.verbose() {
                    eprintln!(
                        "Warning: Trimming range #{} in bed file on sequence {} \
                         (bed range = {}-{}, sequence size = {size}).",
                        i + 1,
                        region.seq_name,
                        region.start + 1,
                        region.end
                    );
                }
                region.end = size;
            }
        }
        Ok(())
    }

    /// Total bases covered by all ranges (overlaps counted twice).
    #[must_use]
    pub fn total_bases(&self) -> u64 {
        self.regions.iter().map(BedRegion::len).sum()
    }

    /// Number of distinct sequences touched by at least one range.
    #[must_use]
    pub fn covered_seq_count(&self, n_seqs: usize) -> usize {
        let mut covered = vec![false; n_seqs];
        for region in &self.regions {
            covered[region.seq_index] = true;
        }
        covered.iter().filter(|&&c| c).count()
    }
}
