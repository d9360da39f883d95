use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use matefilter::{
    reconcile_paths, stream::DEFAULT_COMPRESSION_LEVEL, DrainTactic, IndexConfig, PairPaths,
    PairingConfig, Strategy, DEFAULT_BUCKETS,
};

/// Split two mate FASTQ files into paired and unpaired outputs.
///
/// Records are matched on their read name (the header up to the first whitespace,
/// without any /1 or /2 suffix). Inputs may be plain or compressed; outputs are
/// compressed according to their file extension.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// First mate file; this one is indexed
    fastq1: PathBuf,

    /// Second mate file
    fastq2: PathBuf,

    /// Output for records of the first file that have a mate
    paired1: PathBuf,

    /// Output for records of the second file that have a mate
    paired2: PathBuf,

    /// Output for records of either file without a mate
    unpaired: PathBuf,

    /// Legacy spelling of --sorted
    #[arg(value_parser = ["sorted"], hide = true)]
    legacy_sorted: Option<String>,

    /// Inputs are (loosely) in the same order: index both files and never seek
    #[arg(long)]
    sorted: bool,

    /// How unpaired records of the first file are emitted
    #[arg(long, value_enum, default_value_t = DrainTactic::Rescan)]
    drain: DrainTactic,

    /// Number of buckets in the read-name index
    #[arg(long, default_value_t = DEFAULT_BUCKETS)]
    buckets: usize,

    /// Approximate number of reads in the first file; reserves index space up front
    #[arg(long, default_value_t = 0)]
    expected_reads: usize,

    /// Compare read names including their /1 and /2 suffixes
    #[arg(long)]
    keep_mate_suffix: bool,

    /// Compression level for compressed outputs
    #[arg(
        long,
        default_value_t = DEFAULT_COMPRESSION_LEVEL,
        value_parser = clap::value_parser!(u32).range(1..=9)
    )]
    compression_level: u32,
}
impl Args {
    fn strategy(&self) -> Strategy {
        if self.sorted || self.legacy_sorted.is_some() {
            Strategy::CoOrdered
        } else {
            Strategy::Arbitrary
        }
    }

    fn config(&self) -> matefilter::Result<PairingConfig> {
        Ok(PairingConfig::builder()
            .strategy(self.strategy())
            .drain(self.drain)
            .strip_mate_suffix(!self.keep_mate_suffix)
            .index(
                IndexConfig::builder()
                    .buckets(self.buckets)
                    .expected_entries(self.expected_reads)
                    .build()?,
            )
            .compression_level(self.compression_level)
            .build())
    }

    fn paths(&self) -> PairPaths {
        PairPaths {
            first: self.fastq1.clone(),
            second: self.fastq2.clone(),
            paired1: self.paired1.clone(),
            paired2: self.paired2.clone(),
            unpaired: self.unpaired.clone(),
        }
    }
}

fn run(args: &Args) -> matefilter::Result<()> {
    let config = args.config()?;
    reconcile_paths(config, &args.paths())?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Strategy: {:?}, drain: {:?}", args.strategy(), args.drain);

    if let Err(err) = run(&args) {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
    Ok(())
}
