use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use bytes::Bytes;
use tracing::{debug, info};

use crate::{
    iterator::{bounded_iterator::BoundedIterator, OrderedKv},
    memory::memtable::{iterator::MemTableIterator, MemTable},
    utils::prefix_end,
};

use self::store_options::StoreOptions;

pub mod store_options;

pub type StoreIterator = BoundedIterator<MemTableIterator>;

/// Key-value store whose range reads go through [`BoundedIterator`].
pub struct Store {
    memtable: MemTable,
    options: StoreOptions,
}

impl Store {
    pub fn open(options: StoreOptions) -> Result<Store> {
        options.validate()?;
        info!(?options, "opening store");
        Ok(Self {
            memtable: MemTable::new(),
            options,
        })
    }

    pub fn close(self) -> Result<()> {
        info!(entries = self.memtable.len(), "closing store");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.memtable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        self.check_key(key)?;
        Ok(self.memtable.get(key))
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_key(key)?;
        if value.len() > self.options.max_value_size_bytes {
            debug!(size = value.len(), "rejected oversized value");
            bail!(
                "value of {} bytes exceeds the maximum of {} bytes",
                value.len(),
                self.options.max_value_size_bytes
            );
        }
        self.memtable.put(key, value)
    }

    /// Deleting a key that does not exist is a no-op.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.check_key(key)?;
        if !self.memtable.delete(key) {
            debug!(?key, "delete of missing key");
        }
        Ok(())
    }

    pub fn scan(&self, lower: Option<&[u8]>, upper: Option<&[u8]>) -> Result<StoreIterator> {
        check_bounds(lower, upper)?;
        Ok(self.memtable.iterator(lower, upper))
    }

    pub fn reverse_scan(&self, lower: Option<&[u8]>, upper: Option<&[u8]>) -> Result<StoreIterator> {
        check_bounds(lower, upper)?;
        Ok(self.memtable.reverse_iterator(lower, upper))
    }

    /// Forward scan over every key starting with `prefix`.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<StoreIterator> {
        self.check_key(prefix)?;
        let upper = prefix_end(prefix);
        self.scan(Some(prefix), upper.as_deref())
    }

    /// Load `key=value` lines from a file, skipping blank lines and `#`
    /// comments. Returns the number of pairs written.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut loaded = 0;
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("{}:{}: expected key=value", path.display(), index + 1))?;
            self.put(key.as_bytes(), value.as_bytes())
                .with_context(|| format!("{}:{}", path.display(), index + 1))?;
            loaded += 1;
        }
        info!(loaded, path = %path.display(), "loaded entries");
        Ok(loaded)
    }

    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            bail!("key cannot be empty");
        }
        if key.len() > self.options.max_key_size_bytes {
            debug!(size = key.len(), "rejected oversized key");
            bail!(
                "key of {} bytes exceeds the maximum of {} bytes",
                key.len(),
                self.options.max_key_size_bytes
            );
        }
        Ok(())
    }
}

fn check_bounds(lower: Option<&[u8]>, upper: Option<&[u8]>) -> Result<()> {
    // an absent bound means unbounded, an empty one is a caller mistake
    if lower.is_some_and(|bound| bound.is_empty()) || upper.is_some_and(|bound| bound.is_empty()) {
        bail!("range bound cannot be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::store::store_options::StoreOptions;

    use super::Store;

    fn open_with(keys: &[&str]) -> Store {
        let store = Store::open(StoreOptions::new_with_defaults()).unwrap();
        for key in keys {
            store.put(key.as_bytes(), format!("value@{}", key).as_bytes()).unwrap();
        }
        store
    }

    #[test]
    fn test_put_get_delete() {
        let store = open_with(&[]);
        store.put("k1".as_bytes(), "v1".as_bytes()).unwrap();
        assert_eq!(store.get("k1".as_bytes()).unwrap().unwrap(), "v1");

        store.delete("k1".as_bytes()).unwrap();
        assert!(store.get("k1".as_bytes()).unwrap().is_none());
        // deleting again is fine
        store.delete("k1".as_bytes()).unwrap();
        assert!(store.is_empty());
        store.close().unwrap();
    }

    #[test]
    fn test_rejects_bad_keys() {
        let options = StoreOptions {
            max_key_size_bytes: 4,
            max_value_size_bytes: 4,
        };
        let store = Store::open(options).unwrap();
        assert!(store.put("".as_bytes(), "v".as_bytes()).is_err());
        assert!(store.get("".as_bytes()).is_err());
        assert!(store.put("toolong".as_bytes(), "v".as_bytes()).is_err());
        assert!(store.put("k".as_bytes(), "toolong".as_bytes()).is_err());
        assert!(store.put("k".as_bytes(), "".as_bytes()).is_ok());
    }

    #[test]
    fn test_scan() {
        let store = open_with(&["a", "b", "c", "d", "e", "f"]);

        let keys: Vec<_> = store
            .scan(Some("b".as_bytes()), Some("e".as_bytes()))
            .unwrap()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["b", "c", "d"]);

        let keys: Vec<_> = store
            .reverse_scan(Some("b".as_bytes()), Some("e".as_bytes()))
            .unwrap()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["d", "c", "b"]);

        let iterator = store.scan(None, None).unwrap();
        assert_eq!(iterator.count(), 6);

        let mut iterator = store.scan(Some("c".as_bytes()), Some("c".as_bytes())).unwrap();
        assert!(!iterator.is_valid());
        assert!(iterator.next().is_none());
        assert!(iterator.error().is_ok());
    }

    #[test]
    fn test_scan_rejects_empty_bounds() {
        let store = open_with(&["a"]);
        assert!(store.scan(Some("".as_bytes()), None).is_err());
        assert!(store.reverse_scan(None, Some("".as_bytes())).is_err());
    }

    #[test]
    fn test_scan_prefix() {
        let store = open_with(&["app", "apple", "apply", "apq", "b"]);
        let keys: Vec<_> = store
            .scan_prefix("app".as_bytes())
            .unwrap()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["app", "apple", "apply"]);

        store.put(&[0xff, 0x01], "v".as_bytes()).unwrap();
        let keys: Vec<_> = store.scan_prefix(&[0xff]).unwrap().map(|kv| kv.key).collect();
        assert_eq!(keys, vec![vec![0xff, 0x01]]);
    }

    #[test]
    fn test_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# seed data").unwrap();
        writeln!(file, "k1=v1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "k2=v=2").unwrap();
        file.flush().unwrap();

        let store = open_with(&[]);
        assert_eq!(store.load(file.path()).unwrap(), 2);
        assert_eq!(store.get("k1".as_bytes()).unwrap().unwrap(), "v1");
        assert_eq!(store.get("k2".as_bytes()).unwrap().unwrap(), "v=2");
    }

    #[test]
    fn test_load_rejects_malformed_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "k1=v1").unwrap();
        writeln!(file, "no separator").unwrap();
        file.flush().unwrap();

        let store = open_with(&[]);
        let err = store.load(file.path()).unwrap_err();
        assert!(err.to_string().ends_with(":2: expected key=value"));
        // lines before the bad one were applied
        assert_eq!(store.len(), 1);
    }
}
