use std::convert::Infallible;
use std::ops::Bound;
use std::sync::Arc;

use bytes::Bytes;
use crossbeam_skiplist::{map::Entry, SkipMap};
use ouroboros::self_referencing;

use crate::{iterator::RawCursor, kv::kv_pair::KeyValuePair};

use super::MemTable;

/// Raw cursor over a memtable, restricted to `[lower, upper)`.
///
/// Stepping off either end of the range leaves the cursor exhausted.
pub struct MemTableIterator {
    internal: MemTableIteratorInternal,
    lower: Option<Bytes>,
    upper: Option<Bytes>,
    current_kv: Option<KeyValuePair>,
}

impl MemTableIterator {
    pub fn new(memtable: &MemTable, lower: Option<&[u8]>, upper: Option<&[u8]>) -> Self {
        Self {
            internal: MemTableIteratorInternal::new(memtable.entries.clone(), |_| None),
            lower: lower.map(Bytes::copy_from_slice),
            upper: upper.map(Bytes::copy_from_slice),
            current_kv: None,
        }
    }

    fn set_current_kv(&mut self) {
        self.current_kv = self.internal.with_position(|position| {
            position.as_ref().map(|entry| KeyValuePair {
                key: entry.key().clone(),
                value: entry.value().clone(),
            })
        });
    }

    fn current_kv(&self) -> &KeyValuePair {
        self.current_kv.as_ref().expect("memtable cursor is not positioned")
    }
}

fn above_lower(key: &Bytes, lower: Option<&Bytes>) -> bool {
    lower.map_or(true, |lower_key| key >= lower_key)
}

fn below_upper(key: &Bytes, upper: Option<&Bytes>) -> bool {
    upper.map_or(true, |upper_key| key < upper_key)
}

impl RawCursor for MemTableIterator {
    type Error = Infallible;

    fn seek_to_first(&mut self) {
        let (lower, upper) = (self.lower.as_ref(), self.upper.as_ref());
        self.internal.with_mut(|fields| {
            let first = match lower {
                Some(lower_key) => fields.map.lower_bound(Bound::Included(&lower_key[..])),
                None => fields.map.front(),
            };
            *fields.position = first.filter(|entry| below_upper(entry.key(), upper));
        });
        self.set_current_kv();
    }

    fn seek_to_last(&mut self) {
        let (lower, upper) = (self.lower.as_ref(), self.upper.as_ref());
        self.internal.with_mut(|fields| {
            let last = match upper {
                Some(upper_key) => fields.map.upper_bound(Bound::Excluded(&upper_key[..])),
                None => fields.map.back(),
            };
            *fields.position = last.filter(|entry| above_lower(entry.key(), lower));
        });
        self.set_current_kv();
    }

    fn is_valid(&self) -> bool {
        self.current_kv.is_some()
    }

    fn status(&self) -> Result<(), Infallible> {
        Ok(())
    }

    fn key(&self) -> &[u8] {
        &self.current_kv().key
    }

    fn value(&self) -> &[u8] {
        &self.current_kv().value
    }

    fn next(&mut self) {
        let upper = self.upper.as_ref();
        self.internal.with_position_mut(|position| {
            let next = position.as_ref().and_then(|entry| entry.next());
            *position = next.filter(|entry| below_upper(entry.key(), upper));
        });
        self.set_current_kv();
    }

    fn prev(&mut self) {
        let lower = self.lower.as_ref();
        self.internal.with_position_mut(|position| {
            let prev = position.as_ref().and_then(|entry| entry.prev());
            *position = prev.filter(|entry| above_lower(entry.key(), lower));
        });
        self.set_current_kv();
    }

    fn bounds(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        (self.lower.as_deref(), self.upper.as_deref())
    }

    fn close(self) -> Result<(), Infallible> {
        Ok(())
    }
}

#[self_referencing]
struct MemTableIteratorInternal {
    map: Arc<SkipMap<Bytes, Bytes>>,
    #[borrows(map)]
    #[not_covariant]
    position: Option<Entry<'this, Bytes, Bytes>>,
}
