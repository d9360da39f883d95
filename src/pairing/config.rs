use crate::{
    index::IndexConfig, progress::DEFAULT_PROGRESS_INTERVAL, stream::DEFAULT_COMPRESSION_LEVEL,
};

/// How the two inputs are reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Both files are indexed and each is streamed once against the other's index.
    ///
    /// Doubles index memory but never seeks; suited to loosely co-ordered inputs.
    CoOrdered,
    /// Only the first file is indexed; its mates are recovered by offset while the
    /// second file is streamed, and its singletons are drained afterwards.
    #[default]
    Arbitrary,
}

/// How the singletons left in the first file's index are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DrainTactic {
    /// Re-scan the first file from its start, stopping after the last singleton.
    ///
    /// Emits singletons in file order.
    #[default]
    Rescan,
    /// Walk the index and copy each singleton from its stored offset.
    ///
    /// Avoids a second linear scan; output follows index traversal order.
    Traverse,
}

/// Configuration handed to the reconciler at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingConfig {
    pub strategy: Strategy,
    pub drain: DrainTactic,
    /// Remove `/1` and `/2` suffixes before comparing names
    pub strip_mate_suffix: bool,
    pub index: IndexConfig,
    /// Records between progress messages (0 disables them)
    pub progress_interval: u64,
    /// Compression level for compressed outputs
    pub compression_level: u32,
}
impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            drain: DrainTactic::default(),
            strip_mate_suffix: true,
            index: IndexConfig::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}
impl PairingConfig {
    #[must_use]
    pub fn builder() -> PairingConfigBuilder {
        PairingConfigBuilder::default()
    }
}

/// Builder for [`PairingConfig`]
///
/// ```
/// use matefilter::{DrainTactic, PairingConfig, Strategy};
///
/// let config = PairingConfig::builder()
///     .strategy(Strategy::Arbitrary)
///     .drain(DrainTactic::Traverse)
///     .build();
/// assert!(config.strip_mate_suffix);
/// ```
#[derive(Debug, Default)]
pub struct PairingConfigBuilder {
    strategy: Option<Strategy>,
    drain: Option<DrainTactic>,
    strip_mate_suffix: Option<bool>,
    index: Option<IndexConfig>,
    progress_interval: Option<u64>,
    compression_level: Option<u32>,
}
impl PairingConfigBuilder {
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn drain(mut self, drain: DrainTactic) -> Self {
        self.drain = Some(drain);
        self
    }

    #[must_use]
    pub fn strip_mate_suffix(mut self, strip: bool) -> Self {
        self.strip_mate_suffix = Some(strip);
        self
    }

    #[must_use]
    pub fn index(mut self, index: IndexConfig) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }

    #[must_use]
    pub fn build(self) -> PairingConfig {
        let defaults = PairingConfig::default();
        PairingConfig {
            strategy: self.strategy.unwrap_or(defaults.strategy),
            drain: self.drain.unwrap_or(defaults.drain),
            strip_mate_suffix: self.strip_mate_suffix.unwrap_or(defaults.strip_mate_suffix),
            index: self.index.unwrap_or(defaults.index),
            progress_interval: self.progress_interval.unwrap_or(defaults.progress_interval),
            compression_level: self.compression_level.unwrap_or(defaults.compression_level),
        }
    }
}
