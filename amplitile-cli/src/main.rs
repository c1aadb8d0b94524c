//! # Amplitile CLI - Tiling Scheme Designer
//!
//! Command-line front end for the amplitile design engine.
//!
//! ## Usage
//!
//! ```bash
//! # design a scheme with default settings
//! amplitile alignment.fasta -o results/
//!
//! # looser consensus threshold and longer amplicons
//! amplitile alignment.fasta -o results/ -t 0.8 --max-length 3000
//! ```
//!
//! ## Output files
//!
//! - `ambiguous_consensus.fasta`, `majority_consensus.fasta`
//! - `primers.bed`: selected primers with penalties
//! - `scheme.tsv`: one row per amplicon
//! - `unresolved_dimers.tsv`: conflicts the resolution pass could not clear

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use tracing::warn;

use amplitile_core::config::DesignConfig;
use amplitile_core::output::{
    write_consensus_fasta, write_dimer_tsv, write_primer_bed, write_scheme_tsv,
};
use amplitile_core::results::DesignResults;
use amplitile_core::SchemeDesigner;

fn main() -> Result<()> {
    let matches = Command::new("amplitile")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tiling amplicon scheme design for variable genomes")
        .arg(
            Arg::new("alignment")
                .required(true)
                .value_name("FASTA")
                .help("Multiple-sequence alignment to design primers on"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .required(true)
                .value_name("DIR")
                .help("Directory for result files"),
        )
        .arg(
            Arg::new("threshold")
                .short('t')
                .long("threshold")
                .value_name("FRACTION")
                .help("Consensus frequency threshold (0-1)"),
        )
        .arg(
            Arg::new("ambiguous")
                .short('a')
                .long("ambiguous")
                .value_name("N")
                .help("Ambiguity codes allowed per primer"),
        )
        .arg(
            Arg::new("opt-length")
                .long("opt-length")
                .value_name("BP")
                .help("Optimal amplicon length"),
        )
        .arg(
            Arg::new("max-length")
                .long("max-length")
                .value_name("BP")
                .help("Maximum amplicon length"),
        )
        .arg(
            Arg::new("overlap")
                .long("overlap")
                .value_name("BP")
                .help("Required overlap between amplicons"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .help("Worker threads (default: all cores)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity"),
        )
        .get_matches();

    let level = match matches.get_count("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&matches)?;
    let alignment_path = matches.get_one::<String>("alignment").expect("required");
    let output_dir = matches.get_one::<String>("output").expect("required");

    let designer = SchemeDesigner::new(config)?;
    let results = designer
        .design_fasta(alignment_path)
        .with_context(|| format!("designing scheme for {alignment_path}"))?;

    for event in &results.report.events {
        warn!("{event}");
    }

    write_output_files(Path::new(output_dir), &results)
        .with_context(|| format!("writing results to {output_dir}"))?;

    eprintln!(
        "{} amplicons, {:.1}% coverage, {} unresolved dimers, {} warnings",
        results.scheme.len(),
        results.coverage() * 100.0,
        results.unresolved_dimers.len(),
        results.report.len(),
    );
    Ok(())
}

fn build_config(matches: &clap::ArgMatches) -> Result<DesignConfig> {
    let mut config = DesignConfig::default();

    if let Some(threshold) = matches.get_one::<String>("threshold") {
        config.frequency_threshold = threshold
            .parse()
            .context("invalid consensus threshold")?;
    }
    if let Some(ambiguous) = matches.get_one::<String>("ambiguous") {
        config.max_ambiguous_per_primer =
            ambiguous.parse().context("invalid ambiguity count")?;
    }
    if let Some(opt_length) = matches.get_one::<String>("opt-length") {
        config.amplicon_length.opt =
            opt_length.parse().context("invalid optimal length")?;
    }
    if let Some(max_length) = matches.get_one::<String>("max-length") {
        config.amplicon_length.max =
            max_length.parse().context("invalid maximum length")?;
    }
    if let Some(overlap) = matches.get_one::<String>("overlap") {
        config.min_overlap = overlap.parse().context("invalid overlap")?;
    }
    if let Some(threads) = matches.get_one::<String>("threads") {
        let threads: usize = threads.parse().context("invalid thread count")?;
        if threads == 0 {
            bail!("thread count must be positive");
        }
        config.num_threads = Some(threads);
    }

    Ok(config)
}

fn write_output_files(dir: &Path, results: &DesignResults) -> Result<()> {
    fs::create_dir_all(dir)?;

    let mut writer = BufWriter::new(File::create(dir.join("ambiguous_consensus.fasta"))?);
    write_consensus_fasta(&mut writer, "ambiguous_consensus", &results.ambiguous_consensus)?;

    let mut writer = BufWriter::new(File::create(dir.join("majority_consensus.fasta"))?);
    write_consensus_fasta(&mut writer, "majority_consensus", &results.majority_consensus)?;

    let mut writer = BufWriter::new(File::create(dir.join("primers.bed"))?);
    write_primer_bed(&mut writer, results)?;

    let mut writer = BufWriter::new(File::create(dir.join("scheme.tsv"))?);
    write_scheme_tsv(&mut writer, results)?;

    let mut writer = BufWriter::new(File::create(dir.join("unresolved_dimers.tsv"))?);
    write_dimer_tsv(&mut writer, results)?;

    Ok(())
}
