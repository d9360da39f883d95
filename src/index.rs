//! Read-name index
//!
//! Maps normalized read names to the byte offset of their record in the indexed file.
//! The bucket table is allocated once at construction and never rehashed, so the memory
//! held by the table is known up front and the rest grows linearly with the number of
//! entries. Entries live in a slot arena chained per bucket; deleted slots are recycled.
//!
//! ## Duplicate names
//!
//! The first occurrence of a name is the one indexed and eligible for pairing. Later
//! occurrences in the same file are recorded as *shadowed* offsets; they never pair and
//! are emitted as unpaired when the index is drained, which keeps record accounting
//! balanced.

use std::{
    hash::{BuildHasher, BuildHasherDefault},
    mem::size_of,
};

use log::info;
use rustc_hash::FxHasher;

use crate::{
    error::{IndexError, Result},
    progress::ProgressLogger,
    stream::FastqReader,
};

/// Default number of buckets (prime)
pub const DEFAULT_BUCKETS: usize = 10_000_019;

/// Marks an empty bucket or the end of a chain
const NIL: u32 = u32::MAX;

/// Sizing of a [`ReadNameIndex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Number of buckets in the fixed table
    pub buckets: usize,
    /// Number of entries to reserve slot space for up front
    pub expected_entries: usize,
}
impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS,
            expected_entries: 0,
        }
    }
}
impl IndexConfig {
    #[must_use]
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Expected entries per bucket once `expected_entries` names are indexed
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.expected_entries as f64 / self.buckets.max(1) as f64
    }
}

/// Builder for [`IndexConfig`]
#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    buckets: Option<usize>,
    expected_entries: Option<usize>,
}
impl IndexConfigBuilder {
    #[must_use]
    pub fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = Some(buckets);
        self
    }

    #[must_use]
    pub fn expected_entries(mut self, expected_entries: usize) -> Self {
        self.expected_entries = Some(expected_entries);
        self
    }

    pub fn build(self) -> Result<IndexConfig> {
        let buckets = self.buckets.unwrap_or(DEFAULT_BUCKETS);
        if buckets == 0 || buckets >= NIL as usize {
            return Err(IndexError::InvalidBucketCount(buckets).into());
        }
        Ok(IndexConfig {
            buckets,
            expected_entries: self.expected_entries.unwrap_or(0),
        })
    }
}

/// A live index entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry<'a> {
    pub name: &'a [u8],
    pub offset: u64,
}

#[derive(Debug)]
struct Slot {
    name: Box<[u8]>,
    offset: u64,
    next: u32,
}

/// Fixed-table hash index from read name to record offset
#[derive(Debug)]
pub struct ReadNameIndex {
    /// Head slot of each bucket chain
    buckets: Box<[u32]>,
    slots: Vec<Slot>,
    /// Recycled slots
    free: Vec<u32>,
    live: usize,
    name_bytes: usize,
    /// Offsets of later occurrences of already indexed names, ascending
    shadowed: Vec<u64>,
    /// Number of insert calls, i.e. records scanned into the index
    scanned: u64,
    hasher: BuildHasherDefault<FxHasher>,
}
impl ReadNameIndex {
    #[must_use]
    pub fn new(config: IndexConfig) -> Self {
        Self {
            buckets: vec![NIL; config.buckets.max(1)].into_boxed_slice(),
            slots: Vec::with_capacity(config.expected_entries),
            free: Vec::new(),
            live: 0,
            name_bytes: 0,
            shadowed: Vec::new(),
            scanned: 0,
            hasher: BuildHasherDefault::default(),
        }
    }

    /// Indexes every record of `reader` from the start of the stream
    ///
    /// Leaves the reader at the end of the stream.
    pub fn build(
        config: IndexConfig,
        reader: &mut FastqReader,
        strip_mate_suffix: bool,
        progress_interval: u64,
    ) -> Result<Self> {
        info!("Scanning and indexing all reads from {}", reader.label());
        if config.expected_entries > 0 {
            info!("Expected index load factor: {:.2}", config.load_factor());
        }
        let mut index = Self::new(config);
        let mut progress = ProgressLogger::new("Indexed reads").with_interval(progress_interval);
        reader.rewind()?;
        while let Some(record) = reader.next_record()? {
            index.insert(record.name(strip_mate_suffix), record.offset())?;
            progress.record();
        }
        progress.finish();
        info!("Reads indexed: {}", index.len());
        info!("Index load factor: {:.2}", index.load_factor());
        if !index.shadowed.is_empty() {
            info!("Duplicate read names: {}", index.shadowed.len());
        }
        info!(
            "Memory used in indexing: {} MB",
            index.memory_usage() / 1024 / 1024
        );
        Ok(index)
    }

    fn bucket_of(&self, name: &[u8]) -> usize {
        (self.hasher.hash_one(name) % self.buckets.len() as u64) as usize
    }

    /// Live entries per bucket
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.live as f64 / self.buckets.len() as f64
    }

    /// Finds the slot holding `name` and the slot linking to it, if any
    fn find(&self, bucket: usize, name: &[u8]) -> Option<(Option<u32>, u32)> {
        let mut prev = None;
        let mut cursor = self.buckets[bucket];
        while cursor != NIL {
            let slot = &self.slots[cursor as usize];
            if &*slot.name == name {
                return Some((prev, cursor));
            }
            prev = Some(cursor);
            cursor = slot.next;
        }
        None
    }

    /// Inserts `name` at `offset`, returning `false` if the name was already indexed
    ///
    /// A repeated name does not replace the existing entry; its offset is recorded as
    /// shadowed instead.
    pub fn insert(&mut self, name: &[u8], offset: u64) -> Result<bool> {
        self.scanned += 1;
        let bucket = self.bucket_of(name);
        if self.find(bucket, name).is_some() {
            let at = self.shadowed.partition_point(|&o| o <= offset);
            self.shadowed.insert(at, offset);
            return Ok(false);
        }

        let slot = Slot {
            name: name.into(),
            offset,
            next: self.buckets[bucket],
        };
        let id = if let Some(id) = self.free.pop() {
            self.slots[id as usize] = slot;
            id
        } else {
            let id = u32::try_from(self.slots.len())
                .ok()
                .filter(|&id| id != NIL)
                .ok_or(IndexError::CapacityExhausted(self.slots.len()))?;
            self.slots.push(slot);
            id
        };
        self.buckets[bucket] = id;
        self.live += 1;
        self.name_bytes += name.len();
        Ok(true)
    }

    /// Looks up a live entry by name
    #[must_use]
    pub fn get(&self, name: &[u8]) -> Option<IndexEntry<'_>> {
        let (_, id) = self.find(self.bucket_of(name), name)?;
        let slot = &self.slots[id as usize];
        Some(IndexEntry {
            name: &slot.name,
            offset: slot.offset,
        })
    }

    /// Removes an entry, returning its offset; absent names are a no-op
    pub fn remove(&mut self, name: &[u8]) -> Option<u64> {
        let bucket = self.bucket_of(name);
        let (prev, id) = self.find(bucket, name)?;
        let slot = &mut self.slots[id as usize];
        let next = slot.next;
        let offset = slot.offset;
        self.name_bytes -= slot.name.len();
        slot.name = Box::default();
        slot.next = NIL;
        match prev {
            Some(prev) => self.slots[prev as usize].next = next,
            None => self.buckets[bucket] = next,
        }
        self.free.push(id);
        self.live -= 1;
        Some(offset)
    }

    /// Number of live entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of buckets in the fixed table
    #[must_use]
    pub fn buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Offsets of repeated names, in ascending order
    #[must_use]
    pub fn shadowed(&self) -> &[u64] {
        &self.shadowed
    }

    /// Whether the record at `offset` is a repeated name
    #[must_use]
    pub fn is_shadowed(&self, offset: u64) -> bool {
        self.shadowed.binary_search(&offset).is_ok()
    }

    /// Number of records inserted, including repeated names
    #[must_use]
    pub fn scanned(&self) -> u64 {
        self.scanned
    }

    /// Records that are still unpaired: live entries plus repeated names
    #[must_use]
    pub fn residual(&self) -> usize {
        self.live + self.shadowed.len()
    }

    /// Bytes held by one slot, excluding its name
    #[must_use]
    pub const fn slot_size() -> usize {
        size_of::<Slot>()
    }

    /// Approximate number of bytes held by the index
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        size_of::<Self>()
            + self.buckets.len() * size_of::<u32>()
            + self.slots.capacity() * size_of::<Slot>()
            + self.free.capacity() * size_of::<u32>()
            + self.shadowed.capacity() * size_of::<u64>()
            + self.name_bytes
    }

    /// Lazily visits every live entry, bucket by bucket
    #[must_use]
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse {
            index: self,
            bucket: 0,
            cursor: NIL,
        }
    }
}

/// Iterator over the live entries of a [`ReadNameIndex`]
pub struct Traverse<'a> {
    index: &'a ReadNameIndex,
    /// Next bucket to enter
    bucket: usize,
    /// Next slot in the current chain
    cursor: u32,
}
impl<'a> Iterator for Traverse<'a> {
    type Item = IndexEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor == NIL {
            let head = *self.index.buckets.get(self.bucket)?;
            self.cursor = head;
            self.bucket += 1;
        }
        let slot = &self.index.slots[self.cursor as usize];
        self.cursor = slot.next;
        Some(IndexEntry {
            name: &slot.name,
            offset: slot.offset,
        })
    }
}

#[cfg(test)]
mod testing {
    use std::collections::HashSet;

    use anyhow::Result;

    use super::*;

    fn small_index(buckets: usize) -> Result<ReadNameIndex> {
        Ok(ReadNameIndex::new(
            IndexConfig::builder().buckets(buckets).build()?,
        ))
    }

    #[test]
    fn test_insert_lookup_remove() -> Result<()> {
        let mut index = small_index(7)?;
        assert!(index.is_empty());
        assert!(index.insert(b"a", 0)?);
        assert!(index.insert(b"b", 10)?);
        assert!(index.insert(b"c", 20)?);
        assert_eq!(index.len(), 3);

        assert_eq!(index.get(b"b").map(|e| e.offset), Some(10));
        assert!(index.get(b"z").is_none());

        assert_eq!(index.remove(b"b"), Some(10));
        assert_eq!(index.remove(b"b"), None);
        assert_eq!(index.len(), 2);
        assert!(index.get(b"b").is_none());
        assert_eq!(index.get(b"a").map(|e| e.offset), Some(0));
        assert_eq!(index.get(b"c").map(|e| e.offset), Some(20));
        Ok(())
    }

    #[test]
    fn test_single_bucket_chains() -> Result<()> {
        // every name collides
        let mut index = small_index(1)?;
        for i in 0..100u64 {
            index.insert(format!("read{i}").as_bytes(), i)?;
        }
        // unlink from the head, middle and tail of the chain
        for i in [99u64, 50, 0] {
            assert_eq!(index.remove(format!("read{i}").as_bytes()), Some(i));
        }
        assert_eq!(index.len(), 97);
        for i in 0..100u64 {
            let hit = index.get(format!("read{i}").as_bytes()).map(|e| e.offset);
            if [99, 50, 0].contains(&i) {
                assert_eq!(hit, None);
            } else {
                assert_eq!(hit, Some(i));
            }
        }
        assert_eq!(index.traverse().count(), 97);
        Ok(())
    }

    #[test]
    fn test_slots_are_recycled() -> Result<()> {
        let mut index = small_index(3)?;
        index.insert(b"a", 1)?;
        index.insert(b"b", 2)?;
        assert_eq!(index.remove(b"a"), Some(1));
        index.insert(b"c", 3)?;
        assert_eq!(index.slots.len(), 2);
        assert_eq!(index.get(b"c").map(|e| e.offset), Some(3));
        Ok(())
    }

    #[test]
    fn test_duplicates_are_shadowed() -> Result<()> {
        let mut index = small_index(5)?;
        assert!(index.insert(b"dup", 0)?);
        assert!(index.insert(b"x", 30)?);
        assert!(!index.insert(b"dup", 60)?);
        assert_eq!(index.len(), 2);
        assert_eq!(index.scanned(), 3);
        assert_eq!(index.get(b"dup").map(|e| e.offset), Some(0));
        assert_eq!(index.shadowed(), &[60]);
        assert!(index.is_shadowed(60));
        assert!(!index.is_shadowed(0));
        assert_eq!(index.residual(), 3);
        Ok(())
    }

    #[test]
    fn test_traverse_visits_live_entries_once() -> Result<()> {
        let mut index = small_index(13)?;
        for i in 0..200u64 {
            index.insert(format!("r{i}").as_bytes(), i * 100)?;
        }
        for i in (0..200u64).step_by(3) {
            index.remove(format!("r{i}").as_bytes());
        }
        let seen: Vec<u64> = index.traverse().map(|e| e.offset).collect();
        let unique: HashSet<u64> = seen.iter().copied().collect();
        assert_eq!(seen.len(), index.len());
        assert_eq!(unique.len(), index.len());
        assert!(seen.iter().all(|o| (o / 100) % 3 != 0));
        Ok(())
    }

    #[test]
    fn test_memory_grows_linearly() -> Result<()> {
        let buckets = 1024;
        let mut index = small_index(buckets)?;
        let empty = index.memory_usage();
        let mut previous = empty;
        let mut name_bytes = 0;
        for i in 0..4000u64 {
            let name = format!("read{i:06}");
            name_bytes += name.len();
            index.insert(name.as_bytes(), i)?;
            let current = index.memory_usage();
            assert!(current >= previous);
            previous = current;
        }
        let per_entry = ReadNameIndex::slot_size() + name_bytes / 4000;
        let entries_bytes = previous - empty;
        assert!(entries_bytes >= 4000 * per_entry / 2);
        assert!(entries_bytes <= 3 * 4000 * per_entry);
        Ok(())
    }

    #[test]
    fn test_invalid_bucket_count() {
        assert!(IndexConfig::builder().buckets(0).build().is_err());
        assert!(IndexConfig::builder().buckets(8).build().is_ok());
    }

    #[test]
    fn test_build_from_reader() -> Result<()> {
        let mut reader = FastqReader::from_bytes(
            "mem",
            b"@a/1\nAC\n+\nII\n@b/1\nAC\n+\nII\n@a/1\nAC\n+\nII\n".to_vec(),
        );
        let config = IndexConfig::builder().buckets(11).build()?;
        let index = ReadNameIndex::build(config, &mut reader, true, 1000)?;
        assert_eq!(index.len(), 2);
        assert_eq!(index.scanned(), 3);
        assert_eq!(index.get(b"a").map(|e| e.offset), Some(0));
        assert_eq!(index.get(b"b").map(|e| e.offset), Some(13));
        assert_eq!(index.shadowed(), &[26]);
        Ok(())
    }

    #[test]
    fn test_load_factor() -> Result<()> {
        let config = IndexConfig::builder()
            .buckets(4)
            .expected_entries(10)
            .build()?;
        assert!((config.load_factor() - 2.5).abs() < f64::EPSILON);

        let mut index = ReadNameIndex::new(config);
        assert!(index.load_factor().abs() < f64::EPSILON);
        index.insert(b"a", 0)?;
        index.insert(b"b", 10)?;
        assert!((index.load_factor() - 0.5).abs() < f64::EPSILON);
        assert_eq!(index.remove(b"a"), Some(0));
        assert!((index.load_factor() - 0.25).abs() < f64::EPSILON);
        Ok(())
    }
}
