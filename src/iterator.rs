use bounded_iterator::BoundedIterator;

pub mod bounded_iterator;
pub mod test_iterator;

/// Traversal direction of a [`BoundedIterator`], fixed when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Cursor primitives a storage engine hands out for a `[lower, upper)` range.
///
/// `key` and `value` may only be called while `is_valid` returns true.
pub trait RawCursor {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Position at the first entry at or above the lower bound.
    fn seek_to_first(&mut self);

    /// Position at the last entry below the upper bound.
    fn seek_to_last(&mut self);

    fn is_valid(&self) -> bool;

    /// Error the engine hit while positioning, if any.
    fn status(&self) -> Result<(), Self::Error>;

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];

    fn next(&mut self);

    fn prev(&mut self);

    /// The `[lower, upper)` range this cursor was opened over.
    fn bounds(&self) -> (Option<&[u8]>, Option<&[u8]>);

    /// Release the engine resources held by this cursor.
    fn close(self) -> Result<(), Self::Error>;
}

/// An ordered key-value engine that can open raw cursors over byte ranges.
pub trait OrderedKv {
    type Cursor<'a>: RawCursor
    where
        Self: 'a;

    /// Open an unpositioned raw cursor over `[lower, upper)`. `None` leaves
    /// that side unbounded.
    fn raw_cursor(&self, lower: Option<&[u8]>, upper: Option<&[u8]>) -> Self::Cursor<'_>;

    fn iterator(
        &self,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
    ) -> BoundedIterator<Self::Cursor<'_>> {
        BoundedIterator::new(self.raw_cursor(lower, upper), Direction::Forward)
    }

    fn reverse_iterator(
        &self,
        lower: Option<&[u8]>,
        upper: Option<&[u8]>,
    ) -> BoundedIterator<Self::Cursor<'_>> {
        BoundedIterator::new(self.raw_cursor(lower, upper), Direction::Reverse)
    }
}
