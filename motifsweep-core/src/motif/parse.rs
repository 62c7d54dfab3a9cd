//! Motif file format detection and parsing.
//!
//! Four text formats are recognized by structural sniffing: MEME,
//! JASPAR, HOMER and HOCOMOCO (PCM). The whole file is read into memory
//! once and parsed line by line from the same buffer.

use std::collections::HashSet;

use crate::background::Background;
use crate::config::ScanConfig;
use crate::constants::MAX_NAME_SIZE;
use crate::motif::{calc_score, check_name_len, Motif};
use crate::types::{Result, SweepError};

/// Recognized motif file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotifFormat {
    /// MEME minimal motif format (`MEME version ...`).
    Meme,
    /// JASPAR raw count matrices (`>name` + bracketed letter rows).
    Jaspar,
    /// HOMER probability matrices (tab-separated `>` headers).
    Homer,
    /// HOCOMOCO position count matrices (PCM only; PWMs are rejected).
    Hocomoco,
}

/// A fully parsed set of motifs plus the background they were scored
/// against.
#[derive(Debug)]
pub struct MotifSet {
    /// Parsed motifs in file order, completed and deduplicated.
    pub motifs: Vec<Motif>,
    /// Background actually used for score generation.
    pub background: Background,
    /// Source format. `None` for consensus-sequence motifs.
    pub format: Option<MotifFormat>,
    /// True when the single motif came from a consensus string.
    pub is_consensus: bool,
}

impl MotifSet {
    /// Build a one-motif set from an IUPAC consensus string.
    ///
    /// Consensus scanning always uses a uniform background and the
    /// default site count and pseudocount, regardless of configuration.
    pub fn from_consensus(consensus: &str) -> Result<Self> {
        let bkg = Background::uniform();
        let motif = Motif::from_consensus(consensus, &bkg, 1000, 1)?;
        Ok(Self {
            motifs: vec![motif],
            background: bkg,
            format: None,
            is_consensus: true,
        })
    }
}

fn clean(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Classify motif file contents by structural sniffing.
pub fn detect_format(text: &str) -> Result<MotifFormat> {
    let mut after_header = false;
    let mut has_tabs = false;
    for raw in text.lines() {
        let line = clean(raw);
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("MEME version") {
            return Ok(MotifFormat::Meme);
        }
        if after_header {
            let bracketed = line.contains('[') && line.contains(']');
            if line.starts_with('A') && bracketed {
                return Ok(MotifFormat::Jaspar);
            }
            if line.starts_with('A') || line.contains('[') || line.contains(']') {
                return Err(SweepError::Parse("detected malformed JASPAR format".into()));
            }
            if has_tabs {
                return Ok(MotifFormat::Homer);
            }
            if line.contains('-') {
                return Err(SweepError::Parse(
                    "cannot read HOCOMOCO PWMs, only PCMs (counts) are supported".into(),
                ));
            }
            return Ok(MotifFormat::Hocomoco);
        }
        if line.starts_with('>') {
            if line.contains('\t') {
                has_tabs = true;
            }
            after_header = true;
        }
    }
    Err(SweepError::Parse("failed to detect motif format".into()))
}

/// Parse a row of exactly four whitespace-separated numbers.
fn parse_value_row(line: &str, name: &str) -> Result<[f64; 4]> {
    let mut values = [0.0; 4];
    let mut n = 0usize;
    for token in line.split_whitespace() {
        if n == 4 {
            return Err(SweepError::Parse(format!(
                "motif [{name}] has too many columns (need 4)"
            )));
        }
        values[n] = token.parse::<f64>().map_err(|_| {
            SweepError::Parse(format!(
                "failed to parse value for motif [{name}] (line: {line}, bad value: {token})"
            ))
        })?;
        n += 1;
    }
    if n == 0 {
        return Err(SweepError::Parse(format!("motif [{name}] has an empty row")));
    }
    if n < 4 {
        return Err(SweepError::Parse(format!(
            "motif [{name}] has too few columns (need 4)"
        )));
    }
    Ok(values)
}

/// Enforce the sum-to-one rule on a probability row: more than 10% off
/// is fatal, more than 2% off is silently renormalized (with a note in
/// very verbose mode).
fn normalize_probs(mut probs: [f64; 4], name: &str, very_verbose: bool) -> Result<[f64; 4]> {
    let sum: f64 = probs.iter().sum();
    if (sum - 1.0).abs() > 0.1 {
        return Err(SweepError::InvalidMotif(format!(
            "position for [{name}] does not add up to 1 (sum={sum:.3})"
        )));
    }
    if (sum - 1.0).abs() > 0.02 {
        if very_verbose {
            eprintln!(
                "Warning: Position for [{name}] does not add up to 1, adjusting (sum={sum:.3})."
            );
        }
        for p in &mut probs {
            *p /= sum;
        }
    }
    Ok(probs)
}

fn push_ppm_row(motif: &mut Motif, line: &str, bkg: &Background, config: &ScanConfig) -> Result<()> {
    let probs = parse_value_row(line, &motif.name)?;
    let probs = normalize_probs(probs, &motif.name, config.verbosity.very_verbose())?;
    let mut row = [0i32; 4];
    for i in 0..4 {
        row[i] = calc_score(probs[i], bkg.prob(i), config.nsites, config.pseudocount);
    }
    motif.push_score_row(row)
}

fn read_meme(text: &str, config: &ScanConfig) -> Result<(Vec<Motif>, Background)> {
    let mut bkg = config.background.unwrap_or_default();
    let mut motifs: Vec<Motif> = Vec::new();
    let mut bkg_line: Option<u64> = None;
    let mut alph_seen = false;
    let mut strands_seen = false;
    let mut matrix_line: u64 = 0;
    let mut live_rows = false;
    for (i, raw) in text.lines().enumerate() {
        let line_num = i as u64 + 1;
        let line = clean(raw);
        if line.starts_with("Background letter frequencies") {
            if bkg_line.is_some() {
                return Err(SweepError::Parse(format!(
                    "detected multiple background definition lines in MEME file (L{line_num})"
                )));
            }
            if !motifs.is_empty() {
                return Err(SweepError::Parse(format!(
                    "found background definition line after motifs (L{line_num})"
                )));
            }
            bkg_line = Some(line_num);
        } else if bkg_line == Some(line_num - 1) {
            if config.background.is_none() {
                bkg = Background::parse_meme_line(line, line_num, config.verbosity)?;
                if config.verbosity.very_verbose() {
                    eprintln!(
                        "Found MEME background values: A={:.3} C={:.3} G={:.3} T={:.3}",
                        bkg.prob(0),
                        bkg.prob(1),
                        bkg.prob(2),
                        bkg.prob(3)
                    );
                }
            }
        } else if line.starts_with("ALPHABET") {
            if alph_seen {
                return Err(SweepError::Parse(format!(
                    "detected multiple alphabet definition lines in MEME file (L{line_num})"
                )));
            }
            if !motifs.is_empty() {
                return Err(SweepError::Parse(format!(
                    "found alphabet definition line after motifs (L{line_num})"
                )));
            }
            if line.starts_with("ALPHABET= ACDEFGHIKLMNPQRSTVWY") {
                return Err(SweepError::Parse(format!(
                    "detected protein alphabet (L{line_num})"
                )));
            }
            alph_seen = true;
        } else if line.starts_with("strands:") {
            if strands_seen {
                return Err(SweepError::Parse(format!(
                    "detected multiple strand information lines in MEME file (L{line_num})"
                )));
            }
            if !motifs.is_empty() {
                return Err(SweepError::Parse(format!(
                    "found strand information line after motifs (L{line_num})"
                )));
            }
            check_meme_strands(line, line_num, config);
            strands_seen = true;
        } else if line.starts_with("MOTIF") {
            let name = line[5..].split_whitespace().next().unwrap_or("").to_string();
            check_name_len(&name, "motif")?;
            if config.verbosity.very_verbose() {
                eprintln!("    Found motif: {name}");
            }
            motifs.push(Motif::new(name, line_num));
            live_rows = false;
            matrix_line = 0;
        } else if line.starts_with("letter-probability matrix") {
            let started = matches!(motifs.last(), Some(m) if m.is_empty());
            if !started || live_rows {
                return Err(SweepError::Parse(format!(
                    "possible malformed MEME motif (L{line_num})"
                )));
            }
            matrix_line = line_num;
            live_rows = true;
        } else if live_rows {
            let Some(motif) = motifs.last_mut() else {
                live_rows = false;
                continue;
            };
            if line.trim().is_empty() || line.contains('-') || line.contains('*') {
                live_rows = false;
            } else if line_num == matrix_line + motif.width() as u64 + 1 {
                push_ppm_row(motif, line, &bkg, config)?;
            } else {
                live_rows = false;
            }
        }
    }
    if motifs.is_empty() {
        return Err(SweepError::Parse(
            "failed to detect any motifs in MEME file".into(),
        ));
    }
    if config.verbosity.verbose() {
        eprintln!("Found {} MEME motif(s).", motifs.len());
    }
    Ok((motifs, bkg))
}

/// Advisory-only checks of the MEME `strands:` annotation.
fn check_meme_strands(line: &str, line_num: u64, config: &ScanConfig) {
    if !config.verbosity.verbose() {
        return;
    }
    let fwd = line.matches('+').count();
    let rev = line.matches('-').count();
    if fwd > 1 || rev > 1 || (fwd == 0 && rev == 0) {
        eprintln!("Warning: Possible malformed strand field (L{line_num}).");
    }
    if config.scan_rc && fwd > 0 && rev == 0 {
        eprintln!("Warning: MEME motifs are only for the forward strand (L{line_num}).");
    }
    if fwd == 0 && rev > 0 {
        eprintln!("Warning: MEME motifs are only for the reverse strand (L{line_num}).");
    }
    if !config.scan_rc && fwd > 0 && rev > 0 {
        eprintln!("Warning: MEME motifs are for both strands (L{line_num}).");
    }
}

/// HOMER motif names sit between the first two tabs of the `>` header.
fn parse_homer_name(line: &str, motif_i: usize, very_verbose: bool) -> String {
    let mut fields = line.split('\t');
    fields.next();
    match fields.next().filter(|name| !name.is_empty()) {
        Some(name) => {
            if fields.next().is_none() && very_verbose {
                eprintln!(
                    "Warning: HOMER motif is missing logodds score [#{}].",
                    motif_i + 1
                );
            }
            name.to_string()
        }
        None => {
            if very_verbose {
                eprintln!("Warning: Failed to parse motif name [#{}].", motif_i + 1);
            }
            "motif".to_string()
        }
    }
}

fn read_homer(text: &str, bkg: &Background, config: &ScanConfig) -> Result<Vec<Motif>> {
    let mut motifs: Vec<Motif> = Vec::new();
    let mut started = false;
    for (i, raw) in text.lines().enumerate() {
        let line_num = i as u64 + 1;
        let line = clean(raw);
        if line.starts_with('>') {
            started = true;
            let name = parse_homer_name(line, motifs.len(), config.verbosity.very_verbose());
            check_name_len(&name, "motif")?;
            motifs.push(Motif::new(name, line_num));
        } else if !line.trim().is_empty() && started {
            if let Some(motif) = motifs.last_mut() {
                push_ppm_row(motif, line, bkg, config)?;
            }
        }
    }
    if config.verbosity.verbose() {
        eprintln!("Found {} HOMER motif(s).", motifs.len());
    }
    Ok(motifs)
}

/// Parse one bracketed JASPAR count row into its letter index and counts.
fn add_jaspar_row(motif: &mut Motif, line: &str) -> Result<()> {
    let letter = line
        .bytes()
        .take_while(|&b| b != b'[')
        .find_map(|b| match b.to_ascii_uppercase() {
            b'A' => Some(0usize),
            b'C' => Some(1),
            b'G' => Some(2),
            b'T' | b'U' => Some(3),
            _ => None,
        })
        .ok_or_else(|| {
            SweepError::Parse(format!(
                "couldn't find ACGTU in motif [{}] row names",
                motif.name
            ))
        })?;
    let (left, right) = match (line.find('['), line.rfind(']')) {
        (Some(l), Some(r)) if l < r => (l, r),
        _ => {
            return Err(SweepError::Parse(format!(
                "couldn't find '[]' in motif [{}] row ({})",
                motif.name,
                letter + 1
            )))
        }
    };
    let mut counts = Vec::new();
    for token in line[left + 1..right].split_whitespace() {
        let value: i32 = token.parse().map_err(|_| {
            SweepError::Parse(format!(
                "failed to parse count value for motif [{}] (line: {line}, bad value: {token})",
                motif.name
            ))
        })?;
        counts.push(value);
    }
    if counts.is_empty() {
        return Err(SweepError::Parse(format!(
            "motif [{}] has an empty row",
            motif.name
        )));
    }
    if motif.width() != 0 && motif.width() != counts.len() {
        return Err(SweepError::Parse(format!(
            "motif [{}] has rows with differing numbers of counts",
            motif.name
        )));
    }
    motif.ensure_width(counts.len())?;
    for (pos, &value) in counts.iter().enumerate() {
        motif.set_score(pos, letter, value);
    }
    Ok(())
}

fn read_jaspar(text: &str, bkg: &Background, config: &ScanConfig) -> Result<Vec<Motif>> {
    let mut motifs: Vec<Motif> = Vec::new();
    let mut rows = 0usize;
    let mut started = false;
    let check_rows = |motifs: &[Motif], rows: usize| -> Result<()> {
        if let Some(last) = motifs.last() {
            if rows < 4 {
                return Err(SweepError::Parse(format!(
                    "motif [{}] has too few rows",
                    last.name
                )));
            }
            if rows > 4 {
                return Err(SweepError::Parse(format!(
                    "motif [{}] has too many rows",
                    last.name
                )));
            }
        }
        Ok(())
    };
    for (i, raw) in text.lines().enumerate() {
        let line_num = i as u64 + 1;
        let line = clean(raw);
        if line.starts_with('>') {
            started = true;
            check_rows(&motifs, rows)?;
            let name = line[1..].to_string();
            check_name_len(&name, "motif")?;
            motifs.push(Motif::new(name, line_num));
            rows = 0;
        } else if !line.trim().is_empty() && started {
            rows += 1;
            if let Some(motif) = motifs.last_mut() {
                add_jaspar_row(motif, line)?;
            }
        }
    }
    check_rows(&motifs, rows)?;
    for motif in &mut motifs {
        motif.pcm_to_pwm(
            bkg,
            config.nsites,
            config.pseudocount,
            config.verbosity.very_verbose(),
        )?;
    }
    if config.verbosity.verbose() {
        eprintln!("Found {} JASPAR motif(s).", motifs.len());
    }
    Ok(motifs)
}

/// HOCOMOCO PCM rows: raw per-position counts, smoothed against the row
/// total rather than a shared site count.
fn push_pcm_row(motif: &mut Motif, line: &str, bkg: &Background, config: &ScanConfig) -> Result<()> {
    let counts = parse_value_row(line, &motif.name)?;
    let row_sum: f64 = counts.iter().sum();
    if row_sum < 0.99 {
        return Err(SweepError::InvalidMotif(format!(
            "motif [{}] PCM row adds up to less than 1",
            motif.name
        )));
    }
    let pc = f64::from(config.pseudocount) / 4.0;
    let mut row = [0i32; 4];
    for i in 0..4 {
        row[i] = calc_score(
            (counts[i] + pc) / row_sum,
            bkg.prob(i),
            config.nsites,
            config.pseudocount,
        );
    }
    motif.push_score_row(row)
}

fn read_hocomoco(text: &str, bkg: &Background, config: &ScanConfig) -> Result<Vec<Motif>> {
    let mut motifs: Vec<Motif> = Vec::new();
    let mut started = false;
    for (i, raw) in text.lines().enumerate() {
        let line_num = i as u64 + 1;
        let line = clean(raw);
        if line.starts_with('>') {
            started = true;
            let name = line[1..].to_string();
            check_name_len(&name, "motif")?;
            if config.verbosity.very_verbose() {
                eprintln!("    Found motif: {name}");
            }
            motifs.push(Motif::new(name, line_num));
        } else if !line.trim().is_empty() && started {
            if let Some(motif) = motifs.last_mut() {
                push_pcm_row(motif, line, bkg, config)?;
            }
        }
    }
    if config.verbosity.verbose() {
        eprintln!("Found {} HOCOMOCO motif(s).", motifs.len());
    }
    Ok(motifs)
}

/// Abort on duplicate motif names, or uniquify them with an ordinal
/// suffix when deduplication is enabled.
fn handle_duplicates(motifs: &mut [Motif], dedup: bool) -> Result<()> {
    if motifs.len() < 2 {
        return Ok(());
    }
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for (i, motif) in motifs.iter().enumerate() {
        if !seen.insert(motif.name.clone()) {
            dupes.push(i);
        }
    }
    if dupes.is_empty() {
        return Ok(());
    }
    if dedup {
        for &i in &dupes {
            let name = format!("{}__N{}", motifs[i].name, i + 1);
            if name.len() > MAX_NAME_SIZE {
                return Err(SweepError::InvalidMotif(format!(
                    "failed to deduplicate motif #{}, name is too large",
                    i + 1
                )));
            }
            motifs[i].name = name;
        }
        return Ok(());
    }
    let mut msg = String::from("encountered duplicate motif name (use -d to deduplicate)");
    for &i in dupes.iter().take(5) {
        msg.push_str(&format!(
            "\n    L{} #{}: {}",
            motifs[i].line_num,
            i + 1,
            motifs[i].name
        ));
    }
    if dupes.len() > 5 {
        msg.push_str(&format!(
            "\n    ...\n    Found {} total non-unique names.",
            dupes.len()
        ));
    }
    Err(SweepError::InvalidMotif(msg))
}

/// Parse motif file contents: detect the format, run the matching
/// parser, complete every motif and resolve duplicate names.
pub fn load_motifs(text: &str, config: &ScanConfig) -> Result<MotifSet> {
    let format = detect_format(text)?;
    let default_bkg = config.background.unwrap_or_default();
    let (mut motifs, background) = match format {
        MotifFormat::Meme => read_meme(text, config)?,
        MotifFormat::Homer => (read_homer(text, &default_bkg, config)?, default_bkg),
        MotifFormat::Jaspar => (read_jaspar(text, &default_bkg, config)?, default_bkg),
        MotifFormat::Hocomoco => (read_hocomoco(text, &default_bkg, config)?, default_bkg),
    };
    for motif in &mut motifs {
        motif.complete(config.trim_names);
    }
    let empty = motifs.iter().filter(|m| m.is_empty()).count();
    if empty == motifs.len() {
        return Err(SweepError::InvalidMotif("all parsed motifs are empty".into()));
    }
    if empty > 0 {
        eprintln!("Warning: Found {empty} empty motifs.");
    }
    handle_duplicates(&mut motifs, config.dedup)?;
    Ok(MotifSet {
        motifs,
        background,
        format: Some(format),
        is_consensus: false,
    })
}
