use bytes::{Bytes, BytesMut};

/// Exclusive upper bound covering every key that starts with `prefix`.
///
/// Returns `None` when no such bound exists (empty prefix, or all bytes are
/// `0xff`), in which case the range is unbounded above.
pub fn prefix_end(prefix: &[u8]) -> Option<Bytes> {
    // drop trailing 0xff bytes, then bump the last remaining one
    let last_incrementable = prefix.iter().rposition(|byte| *byte != u8::MAX)?;
    let mut end = BytesMut::from(&prefix[..=last_incrementable]);
    end[last_incrementable] += 1;
    Some(end.freeze())
}
