use std::cell::Cell;
use std::rc::Rc;

use bytes::Bytes;

use crate::{error::EngineError, kv::kv_pair::KeyValuePair};

use super::RawCursor;

/// Raw cursor over a fixed, sorted list of entries.
///
/// Seeks honor `[lower, upper)`, but `next` and `prev` walk the whole list,
/// so the cursor can step onto keys outside the range. Faults can be
/// scheduled after a number of steps and on close.
///
/// By default a failed cursor also reports itself invalid;
/// [`TestIterator::valid_despite_error`] keeps it positioned instead.
pub struct TestIterator {
    entries: Vec<KeyValuePair>,
    lower: Option<Bytes>,
    upper: Option<Bytes>,
    position: Option<usize>,
    steps: usize,
    fail_after: Option<(usize, EngineError)>,
    close_error: Option<EngineError>,
    error: Option<EngineError>,
    valid_despite_error: bool,
    status_calls: Cell<usize>,
    closed: Rc<Cell<bool>>,
}

impl TestIterator {
    /// Entries are `key -> "v" + key`; keys must be sorted.
    pub fn new(keys: &[&str], lower: Option<&[u8]>, upper: Option<&[u8]>) -> Self {
        let entries = keys
            .iter()
            .map(|key| KeyValuePair {
                key: Bytes::copy_from_slice(key.as_bytes()),
                value: Bytes::from(format!("v{}", key)),
            })
            .collect();
        Self {
            entries,
            lower: lower.map(Bytes::copy_from_slice),
            upper: upper.map(Bytes::copy_from_slice),
            position: None,
            steps: 0,
            fail_after: None,
            close_error: None,
            error: None,
            valid_despite_error: false,
            status_calls: Cell::new(0),
            closed: Rc::new(Cell::new(false)),
        }
    }

    /// Report `error` once the cursor has stepped `steps` times.
    pub fn fail_after(mut self, steps: usize, error: EngineError) -> Self {
        self.fail_after = Some((steps, error));
        self
    }

    pub fn fail_on_close(mut self, error: EngineError) -> Self {
        self.close_error = Some(error);
        self
    }

    /// Keep `is_valid` tied to the position alone, so an error can be
    /// reported while the cursor still sits on an entry.
    pub fn valid_despite_error(mut self) -> Self {
        self.valid_despite_error = true;
        self
    }

    /// Flag set once `close` has run, readable after the cursor is gone.
    pub fn closed_handle(&self) -> Rc<Cell<bool>> {
        self.closed.clone()
    }

    /// Move to `key` regardless of the bounds.
    pub fn position_at(&mut self, key: &[u8]) {
        self.position = self.entries.iter().position(|kv| kv.key == key);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.get()
    }

    fn in_range(&self, key: &[u8]) -> bool {
        self.lower.as_ref().map_or(true, |lower| key >= &lower[..])
            && self.upper.as_ref().map_or(true, |upper| key < &upper[..])
    }

    fn record_step(&mut self) {
        self.steps += 1;
        if let Some((steps, error)) = &self.fail_after {
            if self.steps >= *steps && self.error.is_none() {
                self.error = Some(error.clone());
            }
        }
    }

    fn current(&self) -> &KeyValuePair {
        let index = self.position.expect("test cursor is not positioned");
        &self.entries[index]
    }
}

impl RawCursor for TestIterator {
    type Error = EngineError;

    fn seek_to_first(&mut self) {
        self.position = self.entries.iter().position(|kv| self.in_range(&kv.key));
    }

    fn seek_to_last(&mut self) {
        self.position = self.entries.iter().rposition(|kv| self.in_range(&kv.key));
    }

    fn is_valid(&self) -> bool {
        self.position.is_some() && (self.valid_despite_error || self.error.is_none())
    }

    fn status(&self) -> Result<(), EngineError> {
        self.status_calls.set(self.status_calls.get() + 1);
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn key(&self) -> &[u8] {
        &self.current().key
    }

    fn value(&self) -> &[u8] {
        &self.current().value
    }

    fn next(&mut self) {
        let len = self.entries.len();
        self.position = self.position.map(|index| index + 1).filter(|index| *index < len);
        self.record_step();
    }

    fn prev(&mut self) {
        self.position = self.position.and_then(|index| index.checked_sub(1));
        self.record_step();
    }

    fn bounds(&self) -> (Option<&[u8]>, Option<&[u8]>) {
        (self.lower.as_deref(), self.upper.as_deref())
    }

    fn close(self) -> Result<(), EngineError> {
        self.closed.set(true);
        match self.close_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
