//! Sharded element store
//!
//! Maps the full signed 32-bit id space to optional element slots without a
//! single allocation sized for the whole domain. The space is split into 32
//! equal-width shards; each shard is a growable vector that extends by copy
//! only when an access lands beyond its current length.
//!
//! Structural writes are serialized by the engine-wide gate; the per-shard
//! locks below exist so shard growth and the parallel scan paths stay safe
//! on their own.

use rayon::prelude::*;
use std::sync::{Mutex, RwLock};

/// Number of equal-width shards covering the id space.
const SHARD_COUNT: usize = 32;
/// Width of one shard: 2^32 / 32 ids.
const SHARD_WIDTH: i64 = (1i64 << 32) / SHARD_COUNT as i64;
/// First allocation when a shard goes from empty to populated.
const INITIAL_SHARD_CAPACITY: usize = 128;

/// A growable, sharded array addressable over the full `i32` domain.
///
/// Slot location is a pure function of the id: ids are rebased from
/// `[i32::MIN, i32::MAX]` to `[0, 2^32)` so negative ids land on
/// nonnegative intra-shard offsets.
#[derive(Debug)]
pub struct ShardedStore<T> {
    shards: Vec<RwLock<Vec<Option<T>>>>,
}

impl<T: Clone + Send + Sync> ShardedStore<T> {
    /// Create a store with all shards empty.
    pub fn new() -> Self {
        ShardedStore {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(Vec::new())).collect(),
        }
    }

    /// Shard index and intra-shard offset for an id.
    fn locate(id: i32) -> (usize, usize) {
        let rebased = id as i64 - i32::MIN as i64;
        ((rebased / SHARD_WIDTH) as usize, (rebased % SHARD_WIDTH) as usize)
    }

    /// Grow a shard so `offset` is addressable. Growth is geometric and
    /// capped at the shard width; existing entries are preserved.
    fn ensure_offset(shard: &mut Vec<Option<T>>, offset: usize) {
        if offset < shard.len() {
            return;
        }
        let doubled = shard.len().saturating_mul(2);
        let wanted = doubled.max(offset + 1).max(INITIAL_SHARD_CAPACITY);
        shard.resize_with(wanted.min(SHARD_WIDTH as usize), || None);
    }

    /// Write `value` into the slot for `id`, growing the shard if needed.
    pub fn set(&self, id: i32, value: T) {
        let (index, offset) = Self::locate(id);
        let mut shard = self.shards[index].write().unwrap();
        Self::ensure_offset(&mut shard, offset);
        shard[offset] = Some(value);
    }

    /// Tombstone the slot for `id`.
    pub fn clear_slot(&self, id: i32) {
        let (index, offset) = Self::locate(id);
        let mut shard = self.shards[index].write().unwrap();
        Self::ensure_offset(&mut shard, offset);
        shard[offset] = None;
    }

    /// Read the slot for `id`. Returns `None` if the position lies beyond
    /// the shard's current length or the slot is empty.
    pub fn try_get(&self, id: i32) -> Option<T> {
        let (index, offset) = Self::locate(id);
        let shard = self.shards[index].read().unwrap();
        shard.get(offset).and_then(|slot| slot.clone())
    }

    /// Collect every live entry matching `predicate`.
    ///
    /// Shards are processed independently in parallel; per-shard partial
    /// results merge under one aggregation lock. Under concurrent mutation
    /// the result is a best-effort snapshot.
    pub fn for_each_matching<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool + Sync,
    {
        let merged = Mutex::new(Vec::new());
        self.shards.par_iter().for_each(|shard| {
            let guard = shard.read().unwrap();
            let mut partial = Vec::new();
            for slot in guard.iter() {
                if let Some(value) = slot {
                    if predicate(value) {
                        partial.push(value.clone());
                    }
                }
            }
            drop(guard);
            if !partial.is_empty() {
                merged.lock().unwrap().append(&mut partial);
            }
        });
        merged.into_inner().unwrap()
    }

    /// Count live entries matching `predicate`, shard-parallel.
    pub fn count_matching<F>(&self, predicate: F) -> u32
    where
        F: Fn(&T) -> bool + Sync,
    {
        let total = Mutex::new(0u32);
        self.shards.par_iter().for_each(|shard| {
            let guard = shard.read().unwrap();
            let mut partial = 0u32;
            for slot in guard.iter() {
                if let Some(value) = slot {
                    if predicate(value) {
                        partial += 1;
                    }
                }
            }
            drop(guard);
            *total.lock().unwrap() += partial;
        });
        total.into_inner().unwrap()
    }

    /// Visit every live entry whose id is below `cursor`, shard-parallel.
    /// Used by the trim sweep over the allocated id range.
    pub fn for_each_allocated<F>(&self, cursor: i32, f: F)
    where
        F: Fn(i32, &T) + Sync,
    {
        let end = cursor as i64 - i32::MIN as i64;
        self.shards.par_iter().enumerate().for_each(|(index, shard)| {
            let base = index as i64 * SHARD_WIDTH;
            let guard = shard.read().unwrap();
            let limit = (end - base).clamp(0, guard.len() as i64) as usize;
            for offset in 0..limit {
                if let Some(value) = &guard[offset] {
                    let id = (base + offset as i64 + i32::MIN as i64) as i32;
                    f(id, value);
                }
            }
        });
    }

    /// Return every shard to its initial empty state, dropping all entries.
    pub fn reset(&self) {
        for shard in &self.shards {
            *shard.write().unwrap() = Vec::new();
        }
    }
}

impl<T: Clone + Send + Sync> Default for ShardedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
