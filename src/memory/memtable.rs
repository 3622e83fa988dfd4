use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use crossbeam_skiplist::SkipMap;

use crate::iterator::OrderedKv;

use self::iterator::MemTableIterator;

pub mod iterator;

pub struct MemTable {
    entries: Arc<SkipMap<Bytes, Bytes>>,
    size_bytes: AtomicUsize,
}

impl MemTable {
    pub fn new() -> Self {
        let entries: SkipMap<Bytes, Bytes> = SkipMap::new();
        Self {
            entries: Arc::new(entries),
            size_bytes: AtomicUsize::new(0),
        }
    }

    /// Total key and value bytes of the live entries.
    pub fn get_size_bytes(&self) -> usize {
        self.size_bytes.load(Ordering::Relaxed)
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let previous = self
            .entries
            .get(key)
            .map_or(0, |entry| entry.key().len() + entry.value().len());
        self.entries
            .insert(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));
        self.size_bytes.fetch_add(key.len() + value.len(), Ordering::Relaxed);
        self.size_bytes.fetch_sub(previous, Ordering::Relaxed);
        Ok(())
    }

    /// Returns whether the key was present.
    pub fn delete(&self, key: &[u8]) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.size_bytes
                    .fetch_sub(entry.key().len() + entry.value().len(), Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderedKv for MemTable {
    type Cursor<'a> = MemTableIterator
    where
        Self: 'a;

    fn raw_cursor(&self, lower: Option<&[u8]>, upper: Option<&[u8]>) -> MemTableIterator {
        MemTableIterator::new(self, lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::memory::memtable::MemTable;

    #[test]
    fn test_memtable() {
        let memtable = MemTable::new();
        memtable
            .put("hello".as_bytes(), "world".as_bytes())
            .unwrap();

        assert_eq!(
            memtable.get("hello".as_bytes()).unwrap(),
            Bytes::from("world".as_bytes())
        );
        assert_eq!(memtable.len(), 1);
    }

    #[test]
    fn test_overwrite_and_delete() {
        let memtable = MemTable::new();
        memtable.put("k1".as_bytes(), "v1".as_bytes()).unwrap();
        memtable.put("k1".as_bytes(), "v2".as_bytes()).unwrap();
        assert_eq!(memtable.get("k1".as_bytes()).unwrap(), "v2");
        assert_eq!(memtable.len(), 1);

        assert!(memtable.delete("k1".as_bytes()));
        assert!(!memtable.delete("k1".as_bytes()));
        assert!(memtable.get("k1".as_bytes()).is_none());
        assert!(memtable.is_empty());
    }

    #[test]
    fn test_size_bytes() {
        let memtable = MemTable::new();
        assert_eq!(memtable.get_size_bytes(), 0);

        memtable.put("k1".as_bytes(), "v1".as_bytes()).unwrap();
        memtable.put("key2".as_bytes(), "".as_bytes()).unwrap();
        assert_eq!(memtable.get_size_bytes(), 4 + 4);

        // an overwrite replaces the old value's bytes
        memtable.put("k1".as_bytes(), "value1".as_bytes()).unwrap();
        assert_eq!(memtable.get_size_bytes(), 8 + 4);

        assert!(memtable.delete("k1".as_bytes()));
        assert_eq!(memtable.get_size_bytes(), 4);
        assert!(!memtable.delete("k1".as_bytes()));
        assert_eq!(memtable.get_size_bytes(), 4);
        assert!(memtable.delete("key2".as_bytes()));
        assert_eq!(memtable.get_size_bytes(), 0);
    }
}
