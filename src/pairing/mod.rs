//! Pair reconciliation
//!
//! The [`Reconciler`] splits two mate files into three outputs: records whose mate is
//! present in the other file (`paired1`, `paired2`) and records without one
//! (`unpaired`). The first file is always indexed by read name; the configured
//! [`Strategy`] decides how the second file is matched against it.
//!
//! Every input record reaches exactly one output and both paired outputs receive the
//! same number of records. The run fails if that accounting does not hold.

mod config;
mod summary;

use std::{io::Write, path::PathBuf};

use log::{debug, info, warn};

pub use config::{DrainTactic, PairingConfig, PairingConfigBuilder, Strategy};
pub use summary::PairingSummary;

use crate::{
    error::{PairError, Result},
    index::ReadNameIndex,
    progress::ProgressLogger,
    stream::{FastqReader, FastqWriter},
};

/// Input and output locations of one reconciliation
#[derive(Debug, Clone)]
pub struct PairPaths {
    pub first: PathBuf,
    pub second: PathBuf,
    pub paired1: PathBuf,
    pub paired2: PathBuf,
    pub unpaired: PathBuf,
}

/// The three output streams of a reconciliation
pub struct PairedOutputs<W: Write> {
    pub paired1: FastqWriter<W>,
    pub paired2: FastqWriter<W>,
    pub unpaired: FastqWriter<W>,
}
impl PairedOutputs<Box<dyn Write>> {
    /// Creates all three output files
    pub fn create(paths: &PairPaths, level: u32) -> Result<Self> {
        Ok(Self {
            paired1: FastqWriter::to_path(&paths.paired1, level)?,
            paired2: FastqWriter::to_path(&paths.paired2, level)?,
            unpaired: FastqWriter::to_path(&paths.unpaired, level)?,
        })
    }
}
impl<W: Write> PairedOutputs<W> {
    pub fn new(paired1: W, paired2: W, unpaired: W) -> Self {
        Self {
            paired1: FastqWriter::new(paired1),
            paired2: FastqWriter::new(paired2),
            unpaired: FastqWriter::new(unpaired),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.paired1.flush()?;
        self.paired2.flush()?;
        self.unpaired.flush()
    }

    /// Flushes and closes every output
    pub fn finish(self) -> Result<()> {
        self.paired1.finish()?;
        self.paired2.finish()?;
        self.unpaired.finish()
    }
}

/// Reconciles two mate files according to a [`PairingConfig`]
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: PairingConfig,
}
impl Reconciler {
    #[must_use]
    pub fn new(config: PairingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    fn progress(&self, message: String) -> ProgressLogger {
        ProgressLogger::new(message).with_interval(self.config.progress_interval)
    }

    /// Splits `first` and `second` into the three outputs
    ///
    /// Both readers are rewound as needed; on return the outputs are flushed but not
    /// closed. A run that finds no pairs still succeeds here; see [`reconcile_paths`].
    pub fn run<W: Write>(
        &self,
        first: &mut FastqReader,
        second: &mut FastqReader,
        outputs: &mut PairedOutputs<W>,
    ) -> Result<PairingSummary> {
        info!("Index buckets: {}", self.config.index.buckets);
        let index = ReadNameIndex::build(
            self.config.index,
            first,
            self.config.strip_mate_suffix,
            self.config.progress_interval,
        )?;

        let summary = match self.config.strategy {
            Strategy::CoOrdered => self.co_ordered(index, first, second, outputs)?,
            Strategy::Arbitrary => self.arbitrary(index, first, second, outputs)?,
        };
        outputs.flush()?;

        summary.check_accounting(
            outputs.paired1.records_written(),
            outputs.paired2.records_written(),
            outputs.unpaired.records_written(),
        )?;
        summary.log(first.label(), second.label());
        Ok(summary)
    }

    /// Two indexes, two forward passes, no seeking
    fn co_ordered<W: Write>(
        &self,
        mut first_index: ReadNameIndex,
        first: &mut FastqReader,
        second: &mut FastqReader,
        outputs: &mut PairedOutputs<W>,
    ) -> Result<PairingSummary> {
        info!("Assuming co-ordered fastq files");
        let strip = self.config.strip_mate_suffix;
        let mut second_index = ReadNameIndex::build(
            self.config.index,
            second,
            strip,
            self.config.progress_interval,
        )?;
        info!(
            "Memory used by both indexes: {} MB",
            (first_index.memory_usage() + second_index.memory_usage()) / 1024 / 1024
        );

        let mut summary = PairingSummary::default();
        first.rewind()?;
        second.rewind()?;

        info!("Filtering {}...", first.label());
        let mut progress = self.progress(format!("Filtered reads from {}", first.label()));
        while let Some(record) = first.next_record()? {
            summary.records_first += 1;
            if second_index.remove(record.name(strip)).is_some() {
                outputs.paired1.write_record(&record)?;
                summary.paired += 1;
            } else {
                outputs.unpaired.write_record(&record)?;
                summary.unpaired_first += 1;
            }
            progress.record();
        }
        progress.finish();

        info!("Filtering {}...", second.label());
        let mut progress = self.progress(format!("Filtered reads from {}", second.label()));
        while let Some(record) = second.next_record()? {
            summary.records_second += 1;
            if first_index.remove(record.name(strip)).is_some() {
                outputs.paired2.write_record(&record)?;
            } else {
                outputs.unpaired.write_record(&record)?;
                summary.unpaired_second += 1;
            }
            progress.record();
        }
        progress.finish();

        Ok(summary)
    }

    /// One index over the first file, mates recovered by offset
    fn arbitrary<W: Write>(
        &self,
        mut index: ReadNameIndex,
        first: &mut FastqReader,
        second: &mut FastqReader,
        outputs: &mut PairedOutputs<W>,
    ) -> Result<PairingSummary> {
        let strip = self.config.strip_mate_suffix;
        let mut summary = PairingSummary {
            records_first: index.scanned(),
            ..PairingSummary::default()
        };
        if first.is_compressed() {
            debug!(
                "{} is compressed; out-of-order mates are recovered by replaying decompression",
                first.label()
            );
        }

        second.rewind()?;
        info!("Processing {}", second.label());
        let mut progress = self.progress(format!("Processed reads from {}", second.label()));
        while let Some(record) = second.next_record()? {
            summary.records_second += 1;
            if let Some(offset) = index.remove(record.name(strip)) {
                outputs.paired2.write_record(&record)?;
                first.copy_record_at(offset, &mut outputs.paired1)?;
                summary.paired += 1;
            } else {
                outputs.unpaired.write_record(&record)?;
                summary.unpaired_second += 1;
            }
            progress.record();
        }
        progress.finish();

        info!(
            "Recording {} unpaired reads from {}",
            index.residual(),
            first.label()
        );
        summary.unpaired_first = match self.config.drain {
            DrainTactic::Rescan => self.drain_rescan(&index, first, &mut outputs.unpaired)?,
            DrainTactic::Traverse => Self::drain_traverse(&index, first, &mut outputs.unpaired)?,
        };
        Ok(summary)
    }

    /// Re-scans the first file and emits every record still held by the index
    fn drain_rescan<W: Write>(
        &self,
        index: &ReadNameIndex,
        first: &mut FastqReader,
        unpaired: &mut FastqWriter<W>,
    ) -> Result<u64> {
        let strip = self.config.strip_mate_suffix;
        let mut remaining = index.residual();
        let mut drained = 0;
        let mut progress = self.progress(format!("Re-scanned reads from {}", first.label()));

        first.rewind()?;
        while remaining > 0 {
            let Some(record) = first.next_record()? else {
                break;
            };
            let indexed = index
                .get(record.name(strip))
                .is_some_and(|entry| entry.offset == record.offset());
            if indexed || index.is_shadowed(record.offset()) {
                unpaired.write_record(&record)?;
                remaining -= 1;
                drained += 1;
            }
            progress.record();
        }
        progress.finish();

        if remaining > 0 {
            warn!(
                "{} ended with {remaining} unpaired reads unaccounted for",
                first.label()
            );
            return Err(PairError::DrainIncomplete(remaining).into());
        }
        Ok(drained)
    }

    /// Copies every record still held by the index straight from its offset
    fn drain_traverse<W: Write>(
        index: &ReadNameIndex,
        first: &mut FastqReader,
        unpaired: &mut FastqWriter<W>,
    ) -> Result<u64> {
        let mut drained = 0;
        for entry in index.traverse() {
            first.copy_record_at(entry.offset, unpaired)?;
            drained += 1;
        }
        for &offset in index.shadowed() {
            first.copy_record_at(offset, unpaired)?;
            drained += 1;
        }
        Ok(drained)
    }
}

/// Reconciles two files on disk, writing the three outputs
///
/// Outputs are created before any input is scanned, so unwritable destinations fail
/// fast. Returns [`PairError::NoPairs`] after closing the outputs if no mate was found.
pub fn reconcile_paths(config: PairingConfig, paths: &PairPaths) -> Result<PairingSummary> {
    let mut first = FastqReader::from_path(&paths.first)?;
    let mut second = FastqReader::from_path(&paths.second)?;
    let mut outputs = PairedOutputs::create(paths, config.compression_level)?;

    let summary = Reconciler::new(config).run(&mut first, &mut second, &mut outputs)?;
    outputs.finish()?;

    if summary.paired == 0 {
        warn!("!!!WARNING!!! 0 paired reads! are the headers ok?");
        return Err(PairError::NoPairs {
            first: summary.records_first,
            second: summary.records_second,
        }
        .into());
    }
    Ok(summary)
}
