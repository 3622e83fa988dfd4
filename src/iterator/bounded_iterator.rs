use std::cell::Cell;
use std::cmp::Ordering;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::iterator::{Direction, RawCursor};
use crate::kv::kv_pair::KeyValuePair;

/// Directional cursor over the `[lower, upper)` range of an engine's raw
/// cursor.
///
/// Once the cursor reports itself invalid it stays invalid: exhaustion and
/// engine failure both latch. Use [`BoundedIterator::error`] afterwards to
/// tell them apart. Reading or advancing an invalid cursor panics.
pub struct BoundedIterator<C: RawCursor> {
    cursor: C,
    direction: Direction,
    is_invalid: Cell<bool>,
}

impl<C: RawCursor> BoundedIterator<C> {
    /// Wrap `cursor` and position it at the start of the traversal. The
    /// range is whatever the engine opened the cursor over.
    pub fn new(mut cursor: C, direction: Direction) -> Self {
        match direction {
            Direction::Forward => cursor.seek_to_first(),
            Direction::Reverse => cursor.seek_to_last(),
        }
        let (lower, upper) = cursor.bounds();
        debug!(?direction, ?lower, ?upper, "opened bounded iterator");
        Self {
            cursor,
            direction,
            is_invalid: Cell::new(false),
        }
    }

    pub fn bounds(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        self.cursor.bounds()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_valid(&self) -> bool {
        // once invalid, forever invalid
        if self.is_invalid.get() {
            return false;
        }

        if let Err(err) = self.cursor.status() {
            warn!(%err, "engine reported an error, invalidating iterator");
            return self.invalidate("engine error");
        }

        if !self.cursor.is_valid() {
            return self.invalidate("engine exhausted");
        }

        // only the bound in the direction of travel can be crossed by stepping
        let (lower, upper) = self.cursor.bounds();
        let key = self.cursor.key();
        let past_bound = match self.direction {
            Direction::Reverse => match lower {
                Some(lower_key) => match key.cmp(lower_key) {
                    Ordering::Less => true,
                    Ordering::Equal | Ordering::Greater => false,
                },
                None => false,
            },
            Direction::Forward => match upper {
                Some(upper_key) => match key.cmp(upper_key) {
                    Ordering::Less => false,
                    Ordering::Equal | Ordering::Greater => true,
                },
                None => false,
            },
        };
        if past_bound {
            return self.invalidate("stepped past bound");
        }

        true
    }

    pub fn key(&self) -> &[u8] {
        self.assert_is_valid();
        self.cursor.key()
    }

    pub fn value(&self) -> &[u8] {
        self.assert_is_valid();
        self.cursor.value()
    }

    /// Step one entry in the iterator's direction. The new position is
    /// checked against the bounds on the next `is_valid`, `key` or `value`.
    pub fn advance(&mut self) {
        self.assert_is_valid();
        self.step();
    }

    /// Engine error, independent of whether the iterator has latched.
    pub fn error(&self) -> Result<(), C::Error> {
        self.cursor.status()
    }

    pub fn close(self) -> Result<(), C::Error> {
        debug!(direction = ?self.direction, "closing bounded iterator");
        self.cursor.close()
    }

    /// Release the cursor after a traversal, reporting an engine error if
    /// one stopped it. The cursor is released either way; the engine error
    /// takes precedence over a release error.
    pub fn finish(self) -> Result<(), C::Error> {
        let status = self.error();
        let closed = self.close();
        status.and(closed)
    }

    fn step(&mut self) {
        match self.direction {
            Direction::Forward => self.cursor.next(),
            Direction::Reverse => self.cursor.prev(),
        }
    }

    fn invalidate(&self, reason: &'static str) -> bool {
        trace!(reason, direction = ?self.direction, "iterator invalidated");
        self.is_invalid.set(true);
        false
    }

    fn assert_is_valid(&self) {
        if !self.is_valid() {
            panic!("iterator is invalid");
        }
    }
}

impl<C: RawCursor> Iterator for BoundedIterator<C> {
    type Item = KeyValuePair;

    fn next(&mut self) -> Option<KeyValuePair> {
        if !self.is_valid() {
            return None;
        }
        let current_kv = KeyValuePair {
            key: Bytes::copy_from_slice(self.cursor.key()),
            value: Bytes::copy_from_slice(self.cursor.value()),
        };
        self.step();
        Some(current_kv)
    }
}
