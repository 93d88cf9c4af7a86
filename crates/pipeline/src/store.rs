//! Bounded recency store of frame records.
//!
//! Index separation as in a packet buffer:
//! - HeapRb keeps insertion order as lightweight slab keys
//! - Slab owns the records
//! - HashMap maps `frame_id` to its slab key
//!
//! Eviction is FIFO by insertion, applied on every insert, so the store
//! never holds more than `capacity` records.

use std::collections::HashMap;
use std::fmt;

use contracts::{FrameId, FrameRecord};
use ringbuf::{traits::*, HeapRb};
use slab::Slab;

#[derive(Debug, Clone, Copy)]
struct Slot {
    slab_key: usize,
}

pub struct FrameStore {
    order: HeapRb<Slot>,
    records: Slab<FrameRecord>,
    keys: HashMap<FrameId, usize>,
    capacity: usize,
    evicted: u64,
}

impl fmt::Debug for FrameStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameStore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("evicted", &self.evicted)
            .finish()
    }
}

impl FrameStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: HeapRb::new(capacity),
            records: Slab::with_capacity(capacity),
            keys: HashMap::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Insert a record, evicting the oldest one if the store is full.
    ///
    /// Re-inserting an existing `frame_id` replaces the record in place and
    /// keeps its position. Returns the evicted record, if any.
    pub fn insert(&mut self, record: FrameRecord) -> Option<FrameRecord> {
        if let Some(&key) = self.keys.get(&record.frame_id) {
            self.records[key] = record;
            return None;
        }

        let evicted = if self.order.is_full() {
            self.order.try_pop().map(|slot| {
                let old = self.records.remove(slot.slab_key);
                self.keys.remove(&old.frame_id);
                self.evicted += 1;
                old
            })
        } else {
            None
        };

        let frame_id = record.frame_id.clone();
        let slab_key = self.records.insert(record);
        let _ = self.order.try_push(Slot { slab_key });
        self.keys.insert(frame_id, slab_key);

        evicted
    }

    pub fn get(&self, frame_id: &str) -> Option<&FrameRecord> {
        self.keys.get(frame_id).and_then(|&k| self.records.get(k))
    }

    pub fn get_mut(&mut self, frame_id: &str) -> Option<&mut FrameRecord> {
        self.keys.get(frame_id).and_then(|&k| self.records.get_mut(k))
    }

    pub fn contains(&self, frame_id: &str) -> bool {
        self.keys.contains_key(frame_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records evicted since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.records.clear();
        self.keys.clear();
    }

    /// Records in insertion order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &FrameRecord> + '_ {
        self.order
            .iter()
            .filter_map(|slot| self.records.get(slot.slab_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: u64) -> FrameRecord {
        FrameRecord::captured(FrameId::from_sequence(seq), seq, 1_000 + seq)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut store = FrameStore::new(4);
        assert!(store.is_empty());
        assert!(store.insert(record(0)).is_none());
        assert!(store.insert(record(1)).is_none());

        assert_eq!(store.len(), 2);
        assert!(store.contains("frame_1"));
        assert_eq!(store.get("frame_0").map(|r| r.capture_ts), Some(1_000));
        assert!(store.get("frame_9").is_none());
    }

    #[test]
    fn test_fifo_eviction() {
        let mut store = FrameStore::new(100);
        for seq in 0..100 {
            assert!(store.insert(record(seq)).is_none());
        }
        let evicted = store.insert(record(100)).unwrap();
        assert_eq!(evicted.frame_id, "frame_0");
        assert_eq!(store.len(), 100);
        assert!(!store.contains("frame_0"));
        assert!(store.contains("frame_1"));
        assert!(store.contains("frame_100"));
        assert_eq!(store.evicted(), 1);
    }

    #[test]
    fn test_eviction_ignores_timestamps() {
        let mut store = FrameStore::new(2);
        let mut late = record(0);
        late.capture_ts = 9_999;
        store.insert(late);
        store.insert(record(1));
        let evicted = store.insert(record(2)).unwrap();
        assert_eq!(evicted.frame_id, "frame_0");
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut store = FrameStore::new(2);
        store.insert(record(0));
        store.insert(record(1));

        let mut updated = record(0);
        updated.display_ts = Some(2_000);
        assert!(store.insert(updated).is_none());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("frame_0").and_then(|r| r.display_ts), Some(2_000));

        // frame_0 is still the oldest
        let evicted = store.insert(record(2)).unwrap();
        assert_eq!(evicted.frame_id, "frame_0");
    }

    #[test]
    fn test_iter_order_and_clear() {
        let mut store = FrameStore::new(3);
        for seq in 0..5 {
            store.insert(record(seq));
        }
        let ids: Vec<&str> = store.iter().map(|r| r.frame_id.as_str()).collect();
        assert_eq!(ids, ["frame_2", "frame_3", "frame_4"]);

        store.clear();
        assert!(store.is_empty());
        assert!(store.get("frame_4").is_none());
        store.insert(record(7));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_mut() {
        let mut store = FrameStore::new(2);
        store.insert(record(3));
        if let Some(r) = store.get_mut("frame_3") {
            r.inference_ts = Some(5);
        }
        assert_eq!(store.get("frame_3").and_then(|r| r.inference_ts), Some(5));
    }
}
