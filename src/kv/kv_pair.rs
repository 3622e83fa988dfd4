use bytes::Bytes;

#[derive(Debug, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct KeyValuePair {
    pub key: Bytes,
    pub value: Bytes,
}
