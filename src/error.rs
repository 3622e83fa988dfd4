/// Failures reported by a storage engine through its raw cursor.
///
/// Cloneable so a cursor can keep reporting the same error on every
/// status query after it first surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("i/o error: {0}")]
    Io(String),

    #[error("corrupted entry at key {key:?}")]
    Corruption { key: Vec<u8> },

    #[error("failed to release cursor: {0}")]
    Release(String),
}
