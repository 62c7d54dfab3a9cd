//! # motifsweep - Command-Line Motif Scanner and Sequence Shuffler
//!
//! ## Usage
//!
//! ```bash
//! # Scan sequences for motifs from a file
//! motifsweep scan -m motifs.txt -s sequences.fa -o hits.tsv
//!
//! # Scan for a single consensus sequence
//! motifsweep scan -1 TGACGTCA -s sequences.fa
//!
//! # Restrict scanning to BED ranges, four threads
//! motifsweep scan -m motifs.txt -s genome.fa.gz -x peaks.bed -j 4
//!
//! # Print parsed motifs without scanning
//! motifsweep scan -m motifs.txt
//!
//! # Per-sequence statistics without motifs
//! motifsweep scan -s sequences.fa
//!
//! # Eulerian 3-mer shuffle with a fixed seed
//! motifsweep shuffle -i sequences.fa -k 3 -s 4 -o shuffled.fa
//! ```
//!
//! ## Scan options
//!
//! - `-m, --motifs <FILE>`: motif file (MEME, JASPAR, HOMER, HOCOMOCO-PCM)
//! - `-1, --consensus <SEQ>`: scan a single IUPAC consensus instead
//! - `-s, --seqs <FILE>`: FASTA/FASTQ file, gzipped ok, `-` for stdin
//! - `-x, --bed <FILE>`: restrict scanning to BED ranges
//! - `-o, --output <FILE>`: output file (default: stdout)
//! - `-b, --background <A,C,G,T>`: background probabilities
//! - `-t, --pvalue <DBL>`: threshold p-value (default: 0.0001)
//! - `-0, --zero-threshold`: report every non-negative score
//! - `-f, --forward-only`: skip the reverse strand
//! - `-j, --threads <N>`: scanning threads (default: 1)
//!
//! ## Shuffle options
//!
//! - `-i, --input <FILE>`: FASTA/FASTQ file, gzipped ok, `-` for stdin
//! - `-k, --kmer-size <N>`: preserved k-mer size (default: 3)
//! - `-s, --seed <N>`: RNG seed (default: 4)
//! - `-m, --markov` / `-l, --linear`: alternative shuffle algorithms
//! - `-r, --repeats <N>`: extra shuffles per sequence
//! - `-R, --reset-seed`: reseed before every sequence

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use motifsweep_core::background::Background;
use motifsweep_core::config::{ScanConfig, ShuffleConfig};
use motifsweep_core::motif::parse::{load_motifs, MotifSet};
use motifsweep_core::scanner::{run_motif_dump, run_scan, run_seq_stats};
use motifsweep_core::sequence::SequenceSource;
use motifsweep_core::shuffle::{run_shuffle, ShuffleMode};
use motifsweep_core::types::Verbosity;

fn cli() -> Command {
    Command::new("motifsweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("DNA/RNA motif scanning and k-mer-preserving sequence shuffling")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(scan_command())
        .subcommand(shuffle_command())
}

fn scan_command() -> Command {
    Command::new("scan")
        .about("Scan sequences for statistically significant motif matches")
        .arg(
            Arg::new("motifs")
                .short('m')
                .long("motifs")
                .value_name("FILE")
                .help("Motif file: MEME, JASPAR, HOMER or HOCOMOCO (PCM)"),
        )
        .arg(
            Arg::new("consensus")
                .short('1')
                .long("consensus")
                .value_name("SEQ")
                .conflicts_with("motifs")
                .help("Scan a single IUPAC consensus sequence instead of a motif file"),
        )
        .arg(
            Arg::new("seqs")
                .short('s')
                .long("seqs")
                .value_name("FILE")
                .help("FASTA/FASTQ sequences, gzipped ok, '-' for stdin; omit to dump motifs"),
        )
        .arg(
            Arg::new("bed")
                .short('x')
                .long("bed")
                .value_name("FILE")
                .help("BED file restricting scanning to ranges (disables -f)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file (default: stdout)"),
        )
        .arg(
            Arg::new("background")
                .short('b')
                .long("background")
                .value_name("A,C,G,T")
                .help("Comma-separated background probabilities for A,C,G,T|U"),
        )
        .arg(
            Arg::new("forward-only")
                .short('f')
                .long("forward-only")
                .action(ArgAction::SetTrue)
                .help("Only scan the forward strand"),
        )
        .arg(
            Arg::new("pvalue")
                .short('t')
                .long("pvalue")
                .value_name("DBL")
                .value_parser(value_parser!(f64))
                .conflicts_with_all(["zero-threshold", "consensus"])
                .help("Threshold P-value [default: 0.0001]"),
        )
        .arg(
            Arg::new("zero-threshold")
                .short('0')
                .long("zero-threshold")
                .action(ArgAction::SetTrue)
                .help("Report all hits with a score of zero or greater"),
        )
        .arg(
            Arg::new("pseudocount")
                .short('p')
                .long("pseudocount")
                .value_name("INT")
                .value_parser(value_parser!(i32))
                .help("Pseudocount for PWM generation [default: 1]"),
        )
        .arg(
            Arg::new("nsites")
                .short('n')
                .long("nsites")
                .value_name("INT")
                .value_parser(value_parser!(i32))
                .help("Number of motif sites used in PPM->PWM conversion [default: 1000]"),
        )
        .arg(
            Arg::new("mask")
                .short('M')
                .long("mask")
                .action(ArgAction::SetTrue)
                .help("Mask lower case letters and do not scan them"),
        )
        .arg(
            Arg::new("dedup")
                .short('d')
                .long("dedup")
                .action(ArgAction::SetTrue)
                .conflicts_with("bed")
                .help("Deduplicate motif/sequence names instead of aborting"),
        )
        .arg(
            Arg::new("raw-names")
                .short('r')
                .long("raw-names")
                .action(ArgAction::SetTrue)
                .help("Do not trim motif and sequence names to the first word"),
        )
        .arg(
            Arg::new("resident")
                .short('l')
                .long("resident")
                .action(ArgAction::SetTrue)
                .help("Deactivate low memory mode and keep all sequences in memory"),
        )
        .arg(
            Arg::new("threads")
                .short('j')
                .long("threads")
                .value_name("INT")
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Number of scanning threads, limited by the motif count"),
        )
        .arg(
            Arg::new("progress")
                .short('g')
                .long("progress")
                .action(ArgAction::SetTrue)
                .help("Print a progress bar during scanning"),
        )
        .arg(verbose_arg())
        .arg(very_verbose_arg())
}

fn shuffle_command() -> Command {
    Command::new("shuffle")
        .about("Generate randomized sequences preserving k-mer statistics")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .required(true)
                .help("FASTA/FASTQ sequences, gzipped ok, '-' for stdin"),
        )
        .arg(
            Arg::new("kmer-size")
                .short('k')
                .long("kmer-size")
                .value_name("INT")
                .value_parser(value_parser!(usize))
                .default_value("3")
                .help("Size of shuffled k-mers; k=1 is a Fisher-Yates shuffle"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file (default: stdout)"),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("INT")
                .value_parser(value_parser!(u64))
                .default_value("4")
                .help("Seed for the random number generator"),
        )
        .arg(
            Arg::new("markov")
                .short('m')
                .long("markov")
                .action(ArgAction::SetTrue)
                .conflicts_with("linear")
                .help("Markov shuffling instead of a random Eulerian walk"),
        )
        .arg(
            Arg::new("linear")
                .short('l')
                .long("linear")
                .action(ArgAction::SetTrue)
                .help("Fisher-Yates shuffle of whole k-mer blocks"),
        )
        .arg(
            Arg::new("repeats")
                .short('r')
                .long("repeats")
                .value_name("INT")
                .value_parser(value_parser!(u64))
                .default_value("0")
                .help("Extra shuffles per sequence, repeat number appended to the name"),
        )
        .arg(
            Arg::new("reset-seed")
                .short('R')
                .long("reset-seed")
                .action(ArgAction::SetTrue)
                .help("Reset the generator to the seed before each sequence"),
        )
        .arg(
            Arg::new("rna")
                .short('n')
                .long("rna")
                .action(ArgAction::SetTrue)
                .help("Output rewritten letters as RNA (Markov/Euler modes only)"),
        )
        .arg(verbose_arg())
        .arg(very_verbose_arg())
}

fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help("Verbose mode")
}

fn very_verbose_arg() -> Arg {
    Arg::new("very-verbose")
        .short('w')
        .long("very-verbose")
        .action(ArgAction::SetTrue)
        .help("Very verbose mode")
}

fn verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("very-verbose") {
        Verbosity::VeryVerbose
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    }
}

fn open_output(matches: &ArgMatches) -> io::Result<Box<dyn Write + Send>> {
    Ok(match matches.get_one::<String>("output") {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn sequence_source(arg: &str) -> SequenceSource {
    if arg == "-" {
        SequenceSource::Stdin
    } else {
        SequenceSource::File(PathBuf::from(arg))
    }
}

fn scan(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let verbosity = verbosity(matches);
    let mut config = ScanConfig {
        scan_rc: !matches.get_flag("forward-only"),
        dedup: matches.get_flag("dedup"),
        trim_names: !matches.get_flag("raw-names"),
        low_mem: !matches.get_flag("resident"),
        zero_threshold: matches.get_flag("zero-threshold"),
        mask_lower: matches.get_flag("mask"),
        progress: matches.get_flag("progress"),
        threads: *matches.get_one::<usize>("threads").unwrap_or(&1),
        verbosity,
        ..Default::default()
    };
    if let Some(bkg) = matches.get_one::<String>("background") {
        config.background = Some(Background::parse_user(bkg, verbosity)?);
    }
    if let Some(pvalue) = matches.get_one::<f64>("pvalue") {
        config.pvalue = *pvalue;
    }
    if let Some(pseudocount) = matches.get_one::<i32>("pseudocount") {
        config.pseudocount = *pseudocount;
    }
    if let Some(nsites) = matches.get_one::<i32>("nsites") {
        config.nsites = *nsites;
    }

    let motif_set = if let Some(consensus) = matches.get_one::<String>("consensus") {
        Some(MotifSet::from_consensus(consensus)?)
    } else if let Some(path) = matches.get_one::<String>("motifs") {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to open motif file \"{path}\": {e}"))?;
        Some(load_motifs(&text, &config)?)
    } else {
        None
    };
    let source = matches
        .get_one::<String>("seqs")
        .map(|s| sequence_source(s));
    let bed_path = matches.get_one::<String>("bed").map(PathBuf::from);

    let mut writer = open_output(matches)?;
    match (motif_set, source) {
        (Some(motif_set), Some(source)) => {
            let args_line: Vec<String> = std::env::args().skip(1).collect();
            run_scan(
                &mut writer,
                &motif_set,
                &source,
                bed_path.as_deref(),
                &config,
                &args_line.join(" "),
            )?;
        }
        (Some(motif_set), None) => run_motif_dump(&mut writer, &motif_set, &config)?,
        (None, Some(source)) => {
            run_seq_stats(&mut writer, &source, bed_path.as_deref(), &config)?;
        }
        (None, None) => return Err("missing one of -m, -1, -s args".into()),
    }
    writer.flush()?;
    Ok(())
}

fn shuffle(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if matches.get_flag("markov") {
        ShuffleMode::Markov
    } else if matches.get_flag("linear") {
        ShuffleMode::Linear
    } else {
        ShuffleMode::Euler
    };
    let config = ShuffleConfig {
        k: *matches.get_one::<usize>("kmer-size").unwrap_or(&3),
        seed: *matches.get_one::<u64>("seed").unwrap_or(&4),
        mode,
        repeats: *matches.get_one::<u64>("repeats").unwrap_or(&0),
        reset_seed: matches.get_flag("reset-seed"),
        rna_out: matches.get_flag("rna"),
        verbosity: verbosity(matches),
    };
    let source = sequence_source(matches.get_one::<String>("input").map(String::as_str).unwrap_or("-"));
    let mut writer = open_output(matches)?;
    run_shuffle(&mut writer, &source, &config)?;
    writer.flush()?;
    Ok(())
}

fn main() {
    let matches = cli().get_matches();
    let result = match matches.subcommand() {
        Some(("scan", sub)) => scan(sub),
        Some(("shuffle", sub)) => shuffle(sub),
        _ => unreachable!("subcommand is required"),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
